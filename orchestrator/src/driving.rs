//! The `DRIVING` loop (SPEC_FULL.md §4.10): `obs = capture(); if
//! termination_reached(obs) → stop; act(behaviour(obs))`, run as the
//! `run(observation_loop, config)` free function named in SPEC_FULL.md §9's
//! design note.

use crate::agent::{Agent, CheckOutcome, TerminationTracker};
use crate::collaborators::ActionSink;
use harness_config::TerminationConfig;
use harness_types::Observation;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Why the driving loop stopped.
#[derive(Debug)]
pub enum StopReason<ObsErr, SinkErr> {
    /// `termination_condition` was positive for `max_consecutive_failures`
    /// consecutive checks (SPEC_FULL.md §8 invariant, scenario S6).
    TerminationReached,
    /// `running` was cleared externally (Ctrl-C; SPEC_FULL.md §4.10).
    ExternallyStopped,
    /// `behaviour` returned an error (SPEC_FULL.md §7 AgentError).
    AgentError(crate::agent::AgentError),
    /// The observation source itself failed. Ingestion paths are
    /// fatal-on-configuration-error (SPEC_FULL.md §7), so this also stops
    /// the loop rather than skipping a tick.
    ObservationError(ObsErr),
    /// The action sink rejected or failed to deliver an action.
    ActionSinkError(SinkErr),
}

/// Runs the driving loop until it stops for any of the reasons in
/// [`StopReason`]. `observation_loop` is deliberately a plain closure, not a
/// concrete capture type: it is whatever a deployment wires up to produce
/// one fresh [`Observation`] per call (typically a blocking
/// `capture_aggregator::CaptureAggregator::capture`).
pub fn run<Obs, Sink>(
    mut observation_loop: impl FnMut() -> Result<Observation, Obs>,
    agent: &mut impl Agent,
    action_sink: &mut Sink,
    config: &TerminationConfig,
    running: &Arc<AtomicBool>,
) -> StopReason<Obs, Sink::Error>
where
    Sink: ActionSink,
{
    let mut tracker = TerminationTracker::new(config.check_every_n, config.max_consecutive_failures);

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("driving loop stopped externally");
            return StopReason::ExternallyStopped;
        }

        let observation = match observation_loop() {
            Ok(observation) => observation,
            Err(source) => {
                error!("observation source failed, stopping driving loop");
                return StopReason::ObservationError(source);
            }
        };

        let outcome = tracker.step(|| agent.termination_condition(&observation));

        if outcome == CheckOutcome::ThresholdReached {
            info!("termination condition reached, stopping driving loop");
            return StopReason::TerminationReached;
        }

        let action = match agent.behaviour(&observation) {
            Ok(action) => action,
            Err(source) => {
                error!(%source, "agent behaviour failed, stopping driving loop");
                return StopReason::AgentError(source);
            }
        };

        if let Err(source) = action_sink.send(action) {
            warn!(%source, "action sink rejected action, stopping driving loop");
            return StopReason::ActionSinkError(source);
        }
    }
}
