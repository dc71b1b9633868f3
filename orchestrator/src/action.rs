//! Agent action shape (SPEC_FULL.md §6): `[steering, throttle, brake]`,
//! handed to the [`crate::ActionSink`] collaborator for rescaling onto the
//! external virtual-gamepad emitter.

use crate::error::{Error, Result};

/// A validated driving command. Construction is the only way to get one,
/// so every `ActionSink` implementation can assume the ranges already hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Action {
    pub steering: f32,
    pub throttle: f32,
    pub brake: f32,
}

impl Action {
    pub fn new(steering: f32, throttle: f32, brake: f32) -> Result<Self> {
        if !(-1.0..=1.0).contains(&steering) {
            return Err(Error::InvalidAction {
                field: "steering",
                value: steering,
                range: "[-1, 1]",
            });
        }
        if !(0.0..=1.0).contains(&throttle) {
            return Err(Error::InvalidAction {
                field: "throttle",
                value: throttle,
                range: "[0, 1]",
            });
        }
        if !(0.0..=1.0).contains(&brake) {
            return Err(Error::InvalidAction {
                field: "brake",
                value: brake,
                range: "[0, 1]",
            });
        }
        Ok(Self {
            steering,
            throttle,
            brake,
        })
    }

    /// The wire shape a collaborator receives: `[steering, throttle, brake]`.
    pub fn to_array(self) -> [f32; 3] {
        [self.steering, self.throttle, self.brake]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_boundary_values() {
        assert!(Action::new(-1.0, 0.0, 1.0).is_ok());
        assert!(Action::new(1.0, 1.0, 0.0).is_ok());
    }

    #[test]
    fn rejects_out_of_range_steering() {
        let err = Action::new(1.5, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, Error::InvalidAction { field: "steering", .. }));
    }

    #[test]
    fn rejects_negative_throttle_or_brake() {
        assert!(matches!(
            Action::new(0.0, -0.1, 0.0).unwrap_err(),
            Error::InvalidAction { field: "throttle", .. }
        ));
        assert!(matches!(
            Action::new(0.0, 0.0, -0.1).unwrap_err(),
            Error::InvalidAction { field: "brake", .. }
        ));
    }
}
