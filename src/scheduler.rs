//! Cyclic round-robin scheduler.
//!
//! Each round visits the feeds in registration order. Every feed draws its next
//! quota from its cycle (even when its pool is already empty) and emits up to
//! that many tokens. The run stops after the first round in which no feed
//! emitted anything.
//!
//! Which tokens a draw returns is unspecified because pools are unordered. The
//! number of tokens per feed per round is fully determined by the initial pool
//! sizes and the cycles, and [`Scheduler::plan`] computes it up front.

use crate::consumer::{ConsumeError, Consumer, Emission};
use crate::cycle::CycleCursor;
use crate::feed::Feed;
use crate::report::{FeedStats, RoundRecord, RunReport};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::hash::Hash;

/// What to do when the consumption action fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the whole run at the first failure.
    #[default]
    Abort,
    /// Log the failure, count it and keep going.
    Skip,
}

/// A consumption failure that ended the run.
///
/// `report` holds everything done up to and including the failing token. The
/// failing token counts as emitted and failed, not consumed.
#[derive(Debug)]
pub struct RunError<T> {
    pub round: usize,
    pub feed: usize,
    pub label: String,
    pub token: T,
    pub source: ConsumeError,
    pub report: RunReport,
}

impl<T: fmt::Debug> fmt::Display for RunError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "consuming {:?} from '{}' failed in round {}: {}",
            self.token, self.label, self.round, self.source
        )
    }
}

impl<T: fmt::Debug> Error for RunError<T> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.source)
    }
}

// Failure details before the report is attached.
struct Failure<T> {
    round: usize,
    feed: usize,
    label: String,
    token: T,
    source: ConsumeError,
}

pub struct Scheduler<T> {
    feeds: Vec<Feed<T>>,
    policy: FailurePolicy,
}

impl<T> Scheduler<T>
where
    T: Eq + Hash + Clone + fmt::Debug,
{
    pub fn new(feeds: Vec<Feed<T>>) -> Self {
        Self {
            feeds,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn feeds(&self) -> &[Feed<T>] {
        &self.feeds
    }

    /// True when every pool is empty.
    pub fn is_exhausted(&self) -> bool {
        self.feeds.iter().all(Feed::is_exhausted)
    }

    /// Predict the per-round draw counts of [`Scheduler::run`] without
    /// touching any pool.
    pub fn plan(&self) -> Vec<RoundRecord> {
        let mut remaining: Vec<usize> = self.feeds.iter().map(Feed::remaining).collect();
        let mut cursors: Vec<CycleCursor> = self.feeds.iter().map(|f| f.cursor().clone()).collect();
        let mut rounds = Vec::new();

        loop {
            let mut draws = vec![0; self.feeds.len()];

            for (index, cursor) in cursors.iter_mut().enumerate() {
                let quota = cursor.next_quota() as usize;
                let take = quota.min(remaining[index]);
                remaining[index] -= take;
                draws[index] = take;
            }

            if draws.iter().all(|&d| d == 0) {
                break;
            }

            rounds.push(RoundRecord {
                round: rounds.len() + 1,
                draws,
            });
        }

        rounds
    }

    /// Run rounds until one emits nothing.
    ///
    /// Every emitted token is announced and then consumed before the next one
    /// is drawn. Under [`FailurePolicy::Abort`] the first failing action ends
    /// the run with a [`RunError`]; tokens not yet drawn stay in their pools.
    /// A failed announce ends the run under either policy.
    pub fn run<C: Consumer<T>>(&mut self, mut consumer: C) -> Result<RunReport, RunError<T>> {
        let mut report = RunReport {
            feeds: self
                .feeds
                .iter()
                .map(|feed| FeedStats {
                    label: feed.label().to_string(),
                    initial: feed.remaining(),
                    remaining: feed.remaining(),
                    ..Default::default()
                })
                .collect(),
            rounds: Vec::new(),
        };

        log::info!(
            "Starting run over {} feeds ({} tokens)",
            self.feeds.len(),
            report.feeds.iter().map(|f| f.initial).sum::<usize>()
        );

        loop {
            let round = report.rounds.len() + 1;
            let result = self.run_round(round, &mut consumer, &mut report);
            self.sync_remaining(&mut report);

            match result {
                Ok(true) => continue,
                Ok(false) => {
                    log::info!(
                        "Run complete after {} rounds: {} emitted, {} failed, {} left",
                        report.productive_rounds(),
                        report.total_emitted(),
                        report.total_failed(),
                        report.total_remaining()
                    );
                    return Ok(report);
                }
                Err(failure) => {
                    log::error!(
                        "Aborting run in round {}: {:?} from '{}' failed: {}",
                        failure.round,
                        failure.token,
                        failure.label,
                        failure.source
                    );
                    return Err(RunError {
                        round: failure.round,
                        feed: failure.feed,
                        label: failure.label,
                        token: failure.token,
                        source: failure.source,
                        report,
                    });
                }
            }
        }
    }

    /// One pass over all feeds. Returns whether anything was emitted.
    fn run_round<C: Consumer<T>>(
        &mut self,
        round: usize,
        consumer: &mut C,
        report: &mut RunReport,
    ) -> Result<bool, Failure<T>> {
        let policy = self.policy;
        let mut draws = vec![0; self.feeds.len()];
        let mut progressed = false;

        log::debug!("Round {round}");

        for (index, feed) in self.feeds.iter_mut().enumerate() {
            let quota = feed.next_quota();

            if feed.is_exhausted() {
                log::trace!("Feed '{}' is empty, quota {} discarded", feed.label(), quota);
                continue;
            }

            for slot in 0..quota as usize {
                let Some(token) = feed.take() else {
                    break;
                };

                progressed = true;
                draws[index] += 1;
                report.feeds[index].emitted += 1;

                let emission = Emission {
                    round,
                    feed: index,
                    label: feed.label(),
                    token: &token,
                    quota,
                    slot,
                };

                log::trace!("Round {round}: '{}' emits {:?}", feed.label(), token);
                // A failed announce ends the run under any policy
                let (source, fatal) = match consumer.announce(&emission) {
                    Err(source) => (source, true),
                    Ok(()) => match consumer.consume(&emission) {
                        Ok(()) => {
                            report.feeds[index].consumed += 1;
                            continue;
                        }
                        Err(source) => (source, policy == FailurePolicy::Abort),
                    },
                };

                report.feeds[index].failed += 1;

                if !fatal {
                    log::warn!("Skipping {:?} from '{}': {}", token, feed.label(), source);
                    continue;
                }

                report.rounds.push(RoundRecord { round, draws });
                return Err(Failure {
                    round,
                    feed: index,
                    label: feed.label().to_string(),
                    token,
                    source,
                });
            }
        }

        if progressed {
            report.rounds.push(RoundRecord { round, draws });
        }

        Ok(progressed)
    }

    fn sync_remaining(&self, report: &mut RunReport) {
        for (stats, feed) in report.feeds.iter_mut().zip(&self.feeds) {
            stats.remaining = feed.remaining();
        }
    }
}
