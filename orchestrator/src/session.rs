//! The `CONFIGURE → LAUNCH_SIM → WAIT_READY → START_CAPTURE → START_EVAL →
//! SESSION_LOADED → DRIVING → SHUTDOWN` state machine (SPEC_FULL.md §4.10).
//! Grounded on `original_source/src/aci/interface.py` and
//! `src/aci/launchers/*`.

use crate::agent::Agent;
use crate::collaborators::{ActionSink, CaptureServices, SimulatorLauncher};
use crate::driving::{self, StopReason};
use harness_config::TerminationConfig;
use harness_types::Observation;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Mirrors SPEC_FULL.md §4.10's state names, surfaced purely for logging
/// and test introspection; `run_session` drives through them in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Configure,
    LaunchSim,
    WaitReady,
    StartCapture,
    StartEval,
    SessionLoaded,
    Driving,
    Shutdown,
}

/// The settle wait after `SESSION_LOADED`'s UI-click sequence in a real
/// deployment (SPEC_FULL.md §4.10). `run_session` takes this as a
/// parameter rather than hardcoding it so tests can pass `Duration::ZERO`.
pub const SESSION_LOADED_SETTLE: Duration = Duration::from_secs(2);

/// How a session ended.
#[derive(Debug)]
pub enum SessionOutcome<LaunchErr, ServicesErr, ObsErr, SinkErr> {
    Driven(StopReason<ObsErr, SinkErr>),
    LaunchFailed(LaunchErr),
    ServicesFailed(ServicesErr),
}

/// Runs one full session: launches the simulator, waits for it to report
/// ready, starts whatever capture/persistence/evaluation services the
/// deployment has configured, confirms the session loaded, drives the
/// agent loop, then tears everything down in reverse order regardless of
/// how the driving loop ended (SPEC_FULL.md §4.10 `SHUTDOWN`, §7 policy:
/// teardown always runs).
///
/// `wait_ready` is `WAIT_READY` (SPEC_FULL.md §4.3, §4.10): a deployment
/// typically closes over a `state_client::StateClient` and blocks on
/// `wait_until_ready()`. It is a plain closure here rather than a
/// `&StateClient` parameter so this state machine stays agnostic of how
/// readiness is determined.
#[allow(clippy::too_many_arguments)]
pub fn run_session<Launcher, Services, Sink, Obs>(
    launcher: &mut Launcher,
    services: &mut Services,
    observation_loop: impl FnMut() -> Result<Observation, Obs>,
    agent: &mut impl Agent,
    action_sink: &mut Sink,
    termination: &TerminationConfig,
    running: &Arc<AtomicBool>,
    wait_ready: impl FnOnce(),
    session_loaded_settle: Duration,
) -> SessionOutcome<Launcher::Error, Services::Error, Obs, Sink::Error>
where
    Launcher: SimulatorLauncher,
    Services: CaptureServices,
    Sink: ActionSink,
{
    info!(state = ?OrchestratorState::Configure, "orchestrator starting");

    info!(state = ?OrchestratorState::LaunchSim, "launching simulator");
    if let Err(source) = launcher.launch() {
        return SessionOutcome::LaunchFailed(source);
    }

    info!(state = ?OrchestratorState::WaitReady, "waiting for simulator readiness");
    wait_ready();

    info!(state = ?OrchestratorState::StartCapture, "starting capture services");
    if let Err(source) = services.start() {
        return SessionOutcome::ServicesFailed(source);
    }

    info!(state = ?OrchestratorState::StartEval, "evaluation services active");

    info!(state = ?OrchestratorState::SessionLoaded, "confirming session loaded");
    if let Err(source) = launcher.confirm_session_loaded() {
        let _ = services.stop();
        return SessionOutcome::LaunchFailed(source);
    }
    std::thread::sleep(session_loaded_settle);

    info!(state = ?OrchestratorState::Driving, "entering driving loop");
    let stop_reason = driving::run(observation_loop, agent, action_sink, termination, running);

    agent.teardown();

    info!(state = ?OrchestratorState::Shutdown, "shutting down");
    let _ = services.stop();
    let _ = launcher.shutdown();

    SessionOutcome::Driven(stop_reason)
}
