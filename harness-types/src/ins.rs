//! Simulated inertial-measurement readings (SPEC_FULL.md §10.5), a pure
//! function over a decoded state row. Folded in from the original
//! `simulate_ins_readings` state post-processor rather than a new external
//! dependency or subsystem.

use crate::decoder::DecodedState;
use serde::{Deserialize, Serialize};

/// Accumulated distance travelled, carried between ticks by the caller
/// (CaptureAggregator's state post-processor owns one of these).
#[derive(Debug, Default, Clone, Copy)]
pub struct OdometerState {
    pub distance_m: f64,
}

/// A simulated INS reading derived from the decoded physics fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatedIns {
    pub accel_g: [f32; 3],
    pub gyro_rad_s: [f32; 3],
    pub gps_position: [f32; 3],
    pub odometer_m: f64,
}

fn field_f32(state: &DecodedState, name: &str) -> f32 {
    state.get(name).and_then(|v| v.as_f64()).unwrap_or(0.0) as f32
}

/// Derives one simulated INS reading and advances `odometer` by the distance
/// implied by `speed_kmh` over `dt_seconds`.
pub fn simulate_ins(
    state: &DecodedState,
    odometer: &mut OdometerState,
    dt_seconds: f64,
) -> SimulatedIns {
    let accel_g = [
        field_f32(state, "acc_g_x"),
        field_f32(state, "acc_g_y"),
        field_f32(state, "acc_g_z"),
    ];
    let gyro_rad_s = [
        field_f32(state, "local_angular_vel_x"),
        field_f32(state, "local_angular_vel_y"),
        field_f32(state, "local_angular_vel_z"),
    ];
    let gps_position = [
        field_f32(state, "ego_location_x"),
        field_f32(state, "ego_location_y"),
        field_f32(state, "ego_location_z"),
    ];

    let speed_kmh = state
        .get("speed_kmh")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let speed_m_s = speed_kmh * (1000.0 / 3600.0);
    odometer.distance_m += speed_m_s * dt_seconds;

    SimulatedIns {
        accel_g,
        gyro_rad_s,
        gps_position,
        odometer_m: odometer.distance_m,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{FieldValue, StateDecoder};
    use crate::schema::{FieldKind, SchemaField, StateSchema};

    fn schema() -> StateSchema {
        StateSchema::new(vec![SchemaField::new("speed_kmh", FieldKind::Float, 4)])
    }

    #[test]
    fn odometer_accumulates_distance_from_speed() {
        let schema = schema();
        let payload = 36.0f32.to_le_bytes().to_vec(); // 36 km/h = 10 m/s
        let decoded = StateDecoder::decode(&schema, &payload).unwrap();
        let mut odo = OdometerState::default();

        let r1 = simulate_ins(&decoded, &mut odo, 1.0);
        assert!((r1.odometer_m - 10.0).abs() < 1e-9);
        let r2 = simulate_ins(&decoded, &mut odo, 1.0);
        assert!((r2.odometer_m - 20.0).abs() < 1e-9);
    }

    #[test]
    fn missing_fields_default_to_zero_rather_than_panicking() {
        let schema = StateSchema::new(vec![]);
        let decoded = StateDecoder::decode(&schema, &[]).unwrap();
        let mut odo = OdometerState::default();
        let r = simulate_ins(&decoded, &mut odo, 1.0);
        assert_eq!(r.accel_g, [0.0, 0.0, 0.0]);
        let _ = FieldValue::Null;
    }
}
