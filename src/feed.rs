//! Feeds: one source's token pool paired with its repeating quota.
//!
//! A [`Pool`] is an unordered set. Tokens leave it in no particular order and
//! never come back, so a pool only shrinks. A [`Feed`] owns a pool and the
//! cursor into its [`Cycle`].

use crate::cycle::{Cycle, CycleCursor};
use crate::error::SetupError;
use crate::utils::scan::{ScanOptions, list_entries};
use std::collections::HashSet;
use std::hash::Hash;
use std::path::{Path, PathBuf};

/// Unordered, duplicate-free collection of tokens that only shrinks.
///
/// Which token [`Pool::take_any`] returns is unspecified. The backing set uses
/// a randomized hasher, so the order differs between runs.
#[derive(Debug, Clone)]
pub struct Pool<T> {
    items: HashSet<T>,
}

impl<T: Eq + Hash + Clone> Pool<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, token: &T) -> bool {
        self.items.contains(token)
    }

    /// Remove and return an arbitrary token.
    pub fn take_any(&mut self) -> Option<T> {
        let token = self.items.iter().next()?.clone();
        let taken = self.items.take(&token);

        // Keep iteration from crawling over a mostly empty table
        if self.items.capacity() > 64 && self.items.len() < self.items.capacity() / 4 {
            self.items.shrink_to_fit();
        }

        taken
    }
}

impl<T: Eq + Hash> FromIterator<T> for Pool<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// A source's pool together with its quota cycle.
#[derive(Debug, Clone)]
pub struct Feed<T> {
    label: String,
    pool: Pool<T>,
    cursor: CycleCursor,
}

impl<T: Eq + Hash + Clone> Feed<T> {
    /// Create a feed. Duplicate tokens collapse into one.
    pub fn new<I>(label: impl Into<String>, tokens: I, cycle: Cycle) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self {
            label: label.into(),
            pool: tokens.into_iter().collect(),
            cursor: CycleCursor::new(cycle),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn pool(&self) -> &Pool<T> {
        &self.pool
    }

    pub fn cycle(&self) -> &Cycle {
        self.cursor.cycle()
    }

    pub fn cursor(&self) -> &CycleCursor {
        &self.cursor
    }

    /// Tokens still waiting in the pool.
    pub fn remaining(&self) -> usize {
        self.pool.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.pool.is_empty()
    }

    pub(crate) fn next_quota(&mut self) -> u32 {
        self.cursor.next_quota()
    }

    pub(crate) fn take(&mut self) -> Option<T> {
        self.pool.take_any()
    }
}

/// A validated (location, cycle) pair, ready to be enumerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub path: PathBuf,
    pub cycle: Cycle,
}

impl SourceSpec {
    /// Parse the cycle specification for `path`.
    pub fn parse(path: impl Into<PathBuf>, cycle: &str) -> Result<Self, SetupError> {
        let path = path.into();
        match cycle.parse::<Cycle>() {
            Ok(cycle) => Ok(Self { path, cycle }),
            Err(source) => Err(SetupError::Config {
                path,
                spec: cycle.to_string(),
                source,
            }),
        }
    }

    /// Validate every pair before anything is enumerated.
    pub fn parse_all<I, P, S>(pairs: I) -> Result<Vec<Self>, SetupError>
    where
        I: IntoIterator<Item = (P, S)>,
        P: Into<PathBuf>,
        S: AsRef<str>,
    {
        pairs
            .into_iter()
            .map(|(path, cycle)| Self::parse(path, cycle.as_ref()))
            .collect()
    }

    /// Enumerate the source and build its feed.
    pub fn into_feed(self, options: &ScanOptions) -> Result<Feed<PathBuf>, SetupError> {
        let entries = enumerate(&self.path, options)?;
        log::debug!(
            "Source {} yielded {} entries (cycle {})",
            self.path.display(),
            entries.len(),
            self.cycle
        );
        Ok(Feed::new(
            self.path.display().to_string(),
            entries,
            self.cycle,
        ))
    }
}

fn enumerate(path: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>, SetupError> {
    list_entries(path, options).map_err(|source| SetupError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })
}

/// Build feeds for every source, failing on the first unreadable one.
pub fn build_feeds(
    specs: Vec<SourceSpec>,
    options: &ScanOptions,
) -> Result<Vec<Feed<PathBuf>>, SetupError> {
    specs
        .into_iter()
        .map(|spec| spec.into_feed(options))
        .collect()
}
