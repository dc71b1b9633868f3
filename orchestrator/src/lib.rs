//! The Orchestrator (SPEC_FULL.md §4.10): the live agent state machine
//! `CONFIGURE → LAUNCH_SIM → WAIT_READY → START_CAPTURE → START_EVAL →
//! SESSION_LOADED → DRIVING → SHUTDOWN`, the `behaviour`/`teardown`/
//! `termination_condition` trait, and the collaborator interfaces (§1, §9)
//! for simulator-launch, action-emission, and capture-service lifecycle —
//! each specified only as a trait, since a concrete implementation is
//! platform glue out of this repository's scope.
//!
//! Grounded on `original_source/src/aci/interface.py` and
//! `src/aci/launchers/*` for the state machine shape; the collaborator-trait
//! pattern is grounded on `ci2::CameraModule`/`ci2::Camera`'s trait-based
//! hardware abstraction.

mod action;
mod agent;
mod collaborators;
mod driving;
mod error;
mod session;

pub use action::Action;
pub use agent::{Agent, AgentError, CheckOutcome, TerminationTracker};
pub use collaborators::{ActionSink, CaptureServices, SimulatorLauncher};
pub use driving::{run as run_driving_loop, StopReason};
pub use error::{Error, Result};
pub use session::{run_session, OrchestratorState, SessionOutcome, SESSION_LOADED_SETTLE};
