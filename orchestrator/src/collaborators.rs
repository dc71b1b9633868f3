//! Collaborator seams (SPEC_FULL.md §1, §9): platform glue this repository
//! deliberately ships no implementation for. Each trait is the boundary a
//! deployment plugs a concrete backend into; this crate only drives them.
//!
//! Grounded on `ci2::CameraModule`/`ci2::Camera`'s hardware-abstraction
//! trait shape, generalised from a physical camera SDK to simulator-launch,
//! action-emission, and capture-service lifecycle collaborators.

use crate::action::Action;

/// Launches and shuts down the simulator process, and performs whatever
/// UI-click sequence is needed to confirm a session has loaded
/// (SPEC_FULL.md §4.10 `SESSION_LOADED`). The two divergent `launch.py`
/// styles upstream (named-pipe vs subprocess spawn) are exactly the kind of
/// decision this trait defers to a deployment (SPEC_FULL.md §9 Open
/// Questions).
pub trait SimulatorLauncher: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Starts the simulator. Called repeatedly by `LAUNCH_SIM` until
    /// `WAIT_READY` succeeds (SPEC_FULL.md §7 TransientConnection).
    fn launch(&mut self) -> std::result::Result<(), Self::Error>;

    /// Performs the UI-click sequence confirming the driving session has
    /// loaded (SPEC_FULL.md §4.10 `SESSION_LOADED`). The 2-second settle
    /// wait after this returns is the state machine's responsibility, not
    /// the collaborator's.
    fn confirm_session_loaded(&mut self) -> std::result::Result<(), Self::Error>;

    /// Shuts the simulator down (SPEC_FULL.md §4.10 `SHUTDOWN`).
    fn shutdown(&mut self) -> std::result::Result<(), Self::Error>;
}

/// Emits one driving command to the external virtual-gamepad collaborator,
/// applying whatever rescaling that emitter's input range requires
/// (SPEC_FULL.md §6 "Agent action shape").
pub trait ActionSink: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    fn send(&mut self, action: Action) -> std::result::Result<(), Self::Error>;
}

/// Starts and stops whatever combination of CaptureAggregator, Recorder,
/// DatabaseWriter, and Evaluator a deployment has configured
/// (SPEC_FULL.md §4.10 `START_CAPTURE`/`START_EVAL`/`SHUTDOWN`). Which of
/// those run, and how persistence is wired, is a configuration-time
/// decision (SPEC_FULL.md §6 `recording`/`postgres`/`evaluation` keys) made
/// by the deployment, not by this state machine.
pub trait CaptureServices: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    fn start(&mut self) -> std::result::Result<(), Self::Error>;
    fn stop(&mut self) -> std::result::Result<(), Self::Error>;
}
