//! The declarative layout of the simulator's physics+graphics shared-memory
//! block (SPEC_FULL.md §3, §6). This is data, not code: the field list is
//! built once by [`physics_graphics_schema`] and is process-wide constant for
//! the lifetime of a run.

use serde::{Deserialize, Serialize};

/// The wire kind of one scalar field in the state payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    SignedInt,
    UnsignedInt,
    Float,
    Text,
}

/// One named, fixed-width field in [`StateSchema`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub kind: FieldKind,
    pub width_bytes: usize,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, kind: FieldKind, width_bytes: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            width_bytes,
        }
    }
}

/// An ordered list of [`SchemaField`]s describing a state payload byte-for-byte.
///
/// `current_time` is the one field renamed on the way to durable storage
/// (`current_laptime`, reserved-keyword avoidance) — see
/// [`StateSchema::storage_name`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSchema {
    fields: Vec<SchemaField>,
}

impl StateSchema {
    pub fn new(fields: Vec<SchemaField>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Total width in bytes; every valid state payload has exactly this length.
    pub fn payload_len(&self) -> usize {
        self.fields.iter().map(|f| f.width_bytes).sum()
    }

    /// The column name a field is stored under, after the one documented rename.
    pub fn storage_name(name: &str) -> &str {
        if name == "current_time" {
            "current_laptime"
        } else {
            name
        }
    }
}

fn scalar(fields: &mut Vec<SchemaField>, name: &str, kind: FieldKind) {
    fields.push(SchemaField::new(name, kind, 4));
}

fn per_wheel(fields: &mut Vec<SchemaField>, base: &str, kind: FieldKind) {
    for corner in ["fl", "fr", "rl", "rr"] {
        fields.push(SchemaField::new(format!("{base}_{corner}"), kind, 4));
    }
}

fn xyz(fields: &mut Vec<SchemaField>, base: &str) {
    for axis in ["x", "y", "z"] {
        fields.push(SchemaField::new(format!("{base}_{axis}"), FieldKind::Float, 4));
    }
}

fn per_wheel_xyz(fields: &mut Vec<SchemaField>, base: &str) {
    for corner in ["fl", "fr", "rl", "rr"] {
        xyz(fields, &format!("{base}_{corner}"));
    }
}

/// The authoritative field list for the simulator's combined graphics+physics
/// block (SPEC_FULL.md §3, §6), grounded on the original `SHMStruct` layout.
/// Field order matters: it is the byte order of the wire payload.
pub fn physics_graphics_schema() -> StateSchema {
    let mut f = Vec::new();
    use FieldKind::*;

    // Graphics block: lap timing and session state.
    scalar(&mut f, "current_time", Float);
    scalar(&mut f, "last_time", Float);
    scalar(&mut f, "best_time", Float);
    scalar(&mut f, "i_current_time", UnsignedInt);
    scalar(&mut f, "i_last_time", UnsignedInt);
    scalar(&mut f, "i_best_time", UnsignedInt);
    scalar(&mut f, "completed_laps", UnsignedInt);
    scalar(&mut f, "number_of_laps", UnsignedInt);
    scalar(&mut f, "normalised_car_position", Float);
    scalar(&mut f, "car_coordinates_x", Float);
    scalar(&mut f, "car_coordinates_y", Float);
    scalar(&mut f, "car_coordinates_z", Float);
    f.push(SchemaField::new("tyre_compound", Text, 33));
    scalar(&mut f, "flag", SignedInt);
    scalar(&mut f, "penalty", SignedInt);
    scalar(&mut f, "ideal_line_on", SignedInt);
    scalar(&mut f, "is_in_pit", SignedInt);
    scalar(&mut f, "surface_grip", Float);
    scalar(&mut f, "mandatory_pit_done", SignedInt);

    // Physics block: controls.
    scalar(&mut f, "throttle", Float);
    scalar(&mut f, "brake", Float);
    scalar(&mut f, "clutch", Float);
    scalar(&mut f, "steer_angle", Float);
    scalar(&mut f, "gear", SignedInt);
    scalar(&mut f, "rpm", Float);
    scalar(&mut f, "speed_kmh", Float);
    xyz(&mut f, "velocity");
    xyz(&mut f, "acc_g");
    xyz(&mut f, "local_velocity");
    xyz(&mut f, "local_angular_vel");

    // Per-wheel dynamics (FL, FR, RL, RR).
    per_wheel(&mut f, "wheel_slip", Float);
    per_wheel(&mut f, "wheel_load", Float);
    per_wheel(&mut f, "wheel_pressure", Float);
    per_wheel(&mut f, "wheel_angular_speed", Float);
    per_wheel(&mut f, "tyre_wear", Float);
    per_wheel(&mut f, "tyre_dirty_level", Float);
    per_wheel(&mut f, "tyre_core_temp", Float);
    per_wheel(&mut f, "camber_rad", Float);
    per_wheel(&mut f, "suspension_travel", Float);
    per_wheel(&mut f, "suspension_damage", Float);
    per_wheel(&mut f, "tyre_temp_i", Float);
    per_wheel(&mut f, "tyre_temp_m", Float);
    per_wheel(&mut f, "tyre_temp_o", Float);
    per_wheel(&mut f, "brake_temp", Float);
    per_wheel(&mut f, "brake_pressure", Float);
    per_wheel(&mut f, "pad_life", Float);
    per_wheel(&mut f, "disc_life", Float);
    per_wheel(&mut f, "mz", Float);
    per_wheel(&mut f, "fx", Float);
    per_wheel(&mut f, "fy", Float);
    per_wheel(&mut f, "slip_ratio", Float);
    per_wheel(&mut f, "slip_angle", Float);
    per_wheel_xyz(&mut f, "tyre_contact_point");
    per_wheel_xyz(&mut f, "tyre_contact_normal");
    per_wheel_xyz(&mut f, "tyre_contact_heading");

    // Damage, aero, fuel, assists.
    scalar(&mut f, "car_damage_front", Float);
    scalar(&mut f, "car_damage_rear", Float);
    scalar(&mut f, "car_damage_left", Float);
    scalar(&mut f, "car_damage_right", Float);
    scalar(&mut f, "car_damage_centre", Float);
    scalar(&mut f, "number_of_tyres_out", SignedInt);
    scalar(&mut f, "pit_limiter_on", SignedInt);
    scalar(&mut f, "abs_in_action", SignedInt);
    scalar(&mut f, "tc_in_action", SignedInt);
    scalar(&mut f, "kers_charge", Float);
    scalar(&mut f, "kers_input", Float);
    scalar(&mut f, "is_automatic", SignedInt);
    scalar(&mut f, "ride_height_front", Float);
    scalar(&mut f, "ride_height_rear", Float);
    scalar(&mut f, "turbo_boost", Float);
    scalar(&mut f, "ballast", Float);
    scalar(&mut f, "air_density", Float);
    scalar(&mut f, "air_temp", Float);
    scalar(&mut f, "road_temp", Float);
    scalar(&mut f, "final_ff", Float);
    scalar(&mut f, "performance_meter", Float);
    scalar(&mut f, "engine_brake", SignedInt);
    scalar(&mut f, "ers_recovery_level", SignedInt);
    scalar(&mut f, "ers_power_level", SignedInt);
    scalar(&mut f, "ers_heat_charging", SignedInt);
    scalar(&mut f, "ers_is_charging", SignedInt);
    scalar(&mut f, "kers_charge_max", Float);
    scalar(&mut f, "drs", SignedInt);
    scalar(&mut f, "fuel", Float);
    scalar(&mut f, "p2p_activation", SignedInt);
    scalar(&mut f, "p2p_status", SignedInt);
    scalar(&mut f, "current_max_rpm", Float);
    scalar(&mut f, "is_ai_controlled", SignedInt);
    scalar(&mut f, "brake_bias", Float);
    scalar(&mut f, "water_temp", Float);
    scalar(&mut f, "front_brake_compound", SignedInt);
    scalar(&mut f, "rear_brake_compound", SignedInt);
    scalar(&mut f, "ignition_on", SignedInt);
    scalar(&mut f, "starter_engine_on", SignedInt);
    scalar(&mut f, "is_engine_running", SignedInt);
    scalar(&mut f, "kerb_vibration", Float);
    scalar(&mut f, "slip_vibrations", Float);
    scalar(&mut f, "g_vibrations", Float);
    scalar(&mut f, "abs_vibrations", Float);

    // Pose, used by the offline camera-pose derivation (§4.11).
    scalar(&mut f, "heading", Float);
    scalar(&mut f, "pitch", Float);
    scalar(&mut f, "roll", Float);
    scalar(&mut f, "cg_height", Float);
    scalar(&mut f, "ego_location_x", Float);
    scalar(&mut f, "ego_location_y", Float);
    scalar(&mut f, "ego_location_z", Float);

    StateSchema::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_len_is_sum_of_widths() {
        let schema = physics_graphics_schema();
        let expected: usize = schema.fields().iter().map(|f| f.width_bytes).sum();
        assert_eq!(schema.payload_len(), expected);
        assert!(schema.payload_len() > 600);
    }

    #[test]
    fn current_time_is_renamed_for_storage() {
        assert_eq!(StateSchema::storage_name("current_time"), "current_laptime");
        assert_eq!(StateSchema::storage_name("throttle"), "throttle");
    }

    #[test]
    fn field_names_are_unique() {
        let schema = physics_graphics_schema();
        let mut names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        let len_before = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), len_before, "duplicate field name in schema");
    }
}
