//! Recorder (SPEC_FULL.md §4.7): consumes CaptureAggregator's observation
//! stream and writes `{N}.jpeg`/`{N}.bin` pairs to a configured directory.

mod error;
mod writer;

pub use error::{Error, Result};
pub use writer::Recorder;
