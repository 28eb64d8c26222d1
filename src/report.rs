//! Run statistics and the serialized forms printed by the CLI.

use serde::Serialize;

/// Per-feed counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    pub label: String,
    /// Pool size when the run started.
    pub initial: usize,
    /// Tokens drawn from the pool, whether or not the action succeeded.
    pub emitted: usize,
    pub consumed: usize,
    pub failed: usize,
    /// Tokens still in the pool when the run ended.
    pub remaining: usize,
}

/// Tokens drawn from each feed in one productive round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundRecord {
    /// 1-based round number.
    pub round: usize,
    /// Draw count per feed, in registration order.
    pub draws: Vec<usize>,
}

impl RoundRecord {
    pub fn total(&self) -> usize {
        self.draws.iter().sum()
    }
}

/// Outcome of a run, complete or cut short.
///
/// `rounds` lists only rounds that emitted something; the final idle round that
/// ends a complete run is not recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub feeds: Vec<FeedStats>,
    pub rounds: Vec<RoundRecord>,
}

impl RunReport {
    pub fn total_emitted(&self) -> usize {
        self.feeds.iter().map(|f| f.emitted).sum()
    }

    pub fn total_consumed(&self) -> usize {
        self.feeds.iter().map(|f| f.consumed).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.feeds.iter().map(|f| f.failed).sum()
    }

    pub fn total_remaining(&self) -> usize {
        self.feeds.iter().map(|f| f.remaining).sum()
    }

    /// Number of rounds that emitted at least one token.
    pub fn productive_rounds(&self) -> usize {
        self.rounds.len()
    }

    /// Draw counts of one feed across all recorded rounds.
    pub fn draws_for(&self, feed: usize) -> Vec<usize> {
        self.rounds
            .iter()
            .map(|r| r.draws.get(feed).copied().unwrap_or(0))
            .collect()
    }
}

/// One emitted token as printed by `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct EmissionRecord {
    pub round: usize,
    pub feed: usize,
    pub source: String,
    pub path: String,
    pub emitted_at: String,
}

/// Final line printed by `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary<'a> {
    pub status: &'static str,
    pub started_at: String,
    pub finished_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub report: &'a RunReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> RunReport {
        RunReport {
            feeds: vec![
                FeedStats {
                    label: "a".to_string(),
                    initial: 3,
                    emitted: 3,
                    consumed: 2,
                    failed: 1,
                    remaining: 0,
                },
                FeedStats {
                    label: "b".to_string(),
                    initial: 4,
                    emitted: 2,
                    consumed: 2,
                    failed: 0,
                    remaining: 2,
                },
            ],
            rounds: vec![
                RoundRecord {
                    round: 1,
                    draws: vec![2, 2],
                },
                RoundRecord {
                    round: 2,
                    draws: vec![1, 0],
                },
            ],
        }
    }

    #[test]
    fn test_totals() {
        let report = sample_report();
        assert_eq!(report.total_emitted(), 5);
        assert_eq!(report.total_consumed(), 4);
        assert_eq!(report.total_failed(), 1);
        assert_eq!(report.total_remaining(), 2);
        assert_eq!(report.productive_rounds(), 2);
        assert_eq!(report.rounds[0].total(), 4);
    }

    #[test]
    fn test_draws_for() {
        let report = sample_report();
        assert_eq!(report.draws_for(0), vec![2, 1]);
        assert_eq!(report.draws_for(1), vec![2, 0]);
        assert_eq!(report.draws_for(5), vec![0, 0]);
    }

    #[test]
    fn test_summary_serializes_without_error_field() {
        let report = sample_report();
        let summary = RunSummary {
            status: "complete",
            started_at: "start".to_string(),
            finished_at: "end".to_string(),
            error: None,
            report: &report,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["status"], "complete");
        assert!(json.get("error").is_none());
        assert_eq!(json["report"]["feeds"][1]["remaining"], 2);
        assert_eq!(json["report"]["rounds"][0]["draws"][0], 2);
    }
}
