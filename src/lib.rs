//! Round-robin interleaving of several token pools by repeating quota cycles.
//!
//! A [`Scheduler`] owns a list of [`Feed`]s. Each round it visits them in
//! order, draws the next quota from every feed's [`Cycle`] and hands up to that
//! many tokens from the feed's pool to a [`Consumer`]. The run ends after the
//! first round in which nothing was emitted.
//!
//! ```
//! use cyclefeed::{Cycle, Discard, Feed, Scheduler};
//!
//! let feeds = vec![
//!     Feed::new("a", ["a1", "a2", "a3"], "1".parse::<Cycle>().unwrap()),
//!     Feed::new("b", ["b1", "b2", "b3"], "2".parse::<Cycle>().unwrap()),
//! ];
//! let mut scheduler = Scheduler::new(feeds);
//! let report = scheduler.run(Discard).unwrap();
//! assert_eq!(report.draws_for(1), vec![2, 1, 0]);
//! assert_eq!(report.total_emitted(), 6);
//! ```

pub mod config;
pub mod constants;
pub mod consumer;
pub mod cycle;
pub mod error;
pub mod feed;
pub mod report;
pub mod scheduler;
pub mod utils;

#[cfg(feature = "player")]
pub mod player;

pub use consumer::{ConsumeError, Consumer, Discard, Emission};
pub use cycle::{Cycle, CycleError};
pub use error::{ConfigError, SetupError};
pub use feed::{Feed, Pool, SourceSpec};
pub use report::{FeedStats, RoundRecord, RunReport};
pub use scheduler::{FailurePolicy, RunError, Scheduler};
