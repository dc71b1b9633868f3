/// Errors raised constructing the types this crate owns outright
/// (SPEC_FULL.md §4.10, §6 "Agent action shape"). Collaborator failures
/// (simulator launch, capture services, action delivery) are each the
/// associated `Error` type of their own trait (`SimulatorLauncher::Error`,
/// `CaptureServices::Error`, `ActionSink::Error`) rather than a variant
/// here, since this crate ships no concrete collaborator to produce a
/// richer error type from.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("action field {field} = {value} is outside its valid range {range}")]
    InvalidAction {
        field: &'static str,
        value: f32,
        range: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
