//! The `behaviour`/`teardown`/`termination_condition` collaborator
//! (SPEC_FULL.md §4.10, §9 design note: "abstract orchestrator base class
//! with three abstract methods collapses to a trait/interface ... plus a
//! `run(observation_loop, config)` free function"). Grounded on
//! `original_source/src/aci/interface.py`'s `Interface` abstract base.

use crate::action::Action;
use harness_types::Observation;

/// Boxed so a user-supplied `behaviour` can fail with whatever error type
/// it likes (SPEC_FULL.md §7 AgentError); the loop only needs to log it.
pub type AgentError = Box<dyn std::error::Error + Send + Sync>;

/// The control policy driving one session. Implemented by whatever agent
/// code (scripted, learned, human-in-the-loop) is using this harness.
pub trait Agent: Send {
    /// Maps one observation to one action. An `Err` here is an
    /// [`AgentError`] (SPEC_FULL.md §7): logged, and the driving loop stops
    /// cleanly without corrupting storage (each insert/write upstream of
    /// this loop is independently atomic).
    fn behaviour(&mut self, observation: &Observation) -> Result<Action, AgentError>;

    /// Evaluated on the cadence configured by `check_every_n`. Returning
    /// `true` for `max_consecutive_failures` consecutive checks stops the
    /// driving loop (SPEC_FULL.md §4.10, §8 scenario S6).
    fn termination_condition(&mut self, observation: &Observation) -> bool;

    /// Runs once, however the loop ended (clean termination, agent error,
    /// or external stop), before `SHUTDOWN` proceeds.
    fn teardown(&mut self) {}
}

/// Tracks `check_every_n`/`max_consecutive_failures` bookkeeping
/// (SPEC_FULL.md §4.10) independently of the loop it gates, so its edge
/// cases can be tested directly.
#[derive(Debug, Clone, Copy)]
pub struct TerminationTracker {
    check_every_n: i64,
    max_consecutive: u32,
    step: u64,
    consecutive: u32,
}

/// What a termination check decided for one step of the driving loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Not a checking step this tick (off-cadence, or checking disabled).
    NotChecked,
    /// Checked, `termination_condition` returned false; counter reset.
    Negative,
    /// Checked, positive, but the consecutive-positive streak hasn't yet
    /// reached `max_consecutive_failures`.
    PositiveBelowThreshold,
    /// Checked, positive, streak reached `max_consecutive_failures`: the
    /// driving loop must stop without calling `behaviour` this step.
    ThresholdReached,
}

impl TerminationTracker {
    pub fn new(check_every_n: i64, max_consecutive: u32) -> Self {
        Self {
            check_every_n,
            max_consecutive,
            step: 0,
            consecutive: 0,
        }
    }

    /// Advances the step counter and, only on a checking step (every
    /// `check_every_n` steps; never, if `check_every_n <= 0`), invokes
    /// `termination_condition` and folds the result into the
    /// consecutive-positive streak.
    pub fn step(&mut self, termination_condition: impl FnOnce() -> bool) -> CheckOutcome {
        self.step += 1;
        if self.check_every_n <= 0 || self.step % self.check_every_n as u64 != 0 {
            return CheckOutcome::NotChecked;
        }
        if !termination_condition() {
            self.consecutive = 0;
            return CheckOutcome::Negative;
        }
        self.consecutive += 1;
        if self.consecutive >= self.max_consecutive {
            CheckOutcome::ThresholdReached
        } else {
            CheckOutcome::PositiveBelowThreshold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_consecutive_positives_reach_threshold_on_the_third() {
        let mut tracker = TerminationTracker::new(1, 3);
        assert_eq!(tracker.step(|| true), CheckOutcome::PositiveBelowThreshold);
        assert_eq!(tracker.step(|| true), CheckOutcome::PositiveBelowThreshold);
        assert_eq!(tracker.step(|| true), CheckOutcome::ThresholdReached);
    }

    #[test]
    fn a_negative_check_resets_the_streak() {
        let mut tracker = TerminationTracker::new(1, 3);
        assert_eq!(tracker.step(|| true), CheckOutcome::PositiveBelowThreshold);
        assert_eq!(tracker.step(|| true), CheckOutcome::PositiveBelowThreshold);
        assert_eq!(tracker.step(|| false), CheckOutcome::Negative);
        assert_eq!(tracker.step(|| true), CheckOutcome::PositiveBelowThreshold);
        assert_eq!(tracker.step(|| true), CheckOutcome::PositiveBelowThreshold);
        assert_eq!(tracker.step(|| true), CheckOutcome::ThresholdReached);
    }

    #[test]
    fn negative_one_disables_checking_entirely() {
        let mut tracker = TerminationTracker::new(-1, 3);
        for _ in 0..10 {
            assert_eq!(
                tracker.step(|| panic!("termination_condition must not be evaluated when disabled")),
                CheckOutcome::NotChecked
            );
        }
    }

    #[test]
    fn only_every_nth_step_is_checked() {
        let mut tracker = TerminationTracker::new(3, 2);
        assert_eq!(tracker.step(|| true), CheckOutcome::NotChecked);
        assert_eq!(tracker.step(|| true), CheckOutcome::NotChecked);
        assert_eq!(tracker.step(|| true), CheckOutcome::PositiveBelowThreshold);
        assert_eq!(tracker.step(|| true), CheckOutcome::NotChecked);
        assert_eq!(tracker.step(|| true), CheckOutcome::NotChecked);
        assert_eq!(tracker.step(|| true), CheckOutcome::ThresholdReached);
    }
}
