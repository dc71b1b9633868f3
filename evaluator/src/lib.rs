//! Evaluator (SPEC_FULL.md §4.9): the Tracker registry builder plus the
//! periodic pipelined-SQL evaluation process running against the telemetry
//! table `db-writer` populates.

mod error;
mod runner;
mod trackers;

pub use error::{Error, Result};
pub use runner::{Evaluator, TrackerResult};
pub use trackers::build_trackers;
