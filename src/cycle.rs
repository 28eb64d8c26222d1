//! Repeating quota sequences.
//!
//! A cycle is written as dash-separated non-negative integers (`"2-1-3"`) and
//! is consumed one value per round, wrapping back to the start when it runs
//! out. The sequence itself is finite; the repetition lives in [`CycleCursor`].

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Message shown for any malformed cycle specification.
pub const CYCLE_FORMAT_HINT: &str = "format must be 'A-B-C-...-Z'";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    #[error("{}", CYCLE_FORMAT_HINT)]
    Malformed { spec: String },
}

/// Ordered, non-empty sequence of per-round quotas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    values: Vec<u32>,
}

impl Cycle {
    /// Build a cycle from explicit values. Returns `None` for an empty slice.
    pub fn new(values: Vec<u32>) -> Option<Self> {
        if values.is_empty() {
            None
        } else {
            Some(Self { values })
        }
    }

    /// A cycle that always yields the same quota.
    pub fn constant(quota: u32) -> Self {
        Self {
            values: vec![quota],
        }
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Quota at `position`, wrapping around the end of the sequence.
    pub fn quota_at(&self, position: usize) -> u32 {
        self.values[position % self.values.len()]
    }

    /// True when no round can ever draw from a feed using this cycle.
    pub fn is_all_zero(&self) -> bool {
        self.values.iter().all(|&v| v == 0)
    }
}

impl FromStr for Cycle {
    type Err = CycleError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let malformed = || CycleError::Malformed {
            spec: spec.to_string(),
        };

        let values = spec
            .split('-')
            .map(|segment| segment.trim().parse::<u32>().map_err(|_| malformed()))
            .collect::<Result<Vec<_>, _>>()?;

        // split always yields at least one segment, so this only guards the type
        Self::new(values).ok_or_else(malformed)
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.values.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", parts.join("-"))
    }
}

/// Per-feed position inside a [`Cycle`].
#[derive(Debug, Clone)]
pub struct CycleCursor {
    cycle: Cycle,
    position: usize,
}

impl CycleCursor {
    pub fn new(cycle: Cycle) -> Self {
        Self { cycle, position: 0 }
    }

    pub fn cycle(&self) -> &Cycle {
        &self.cycle
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Current quota, then advance one step.
    pub fn next_quota(&mut self) -> u32 {
        let quota = self.cycle.quota_at(self.position);
        self.position = (self.position + 1) % self.cycle.len();
        quota
    }
}
