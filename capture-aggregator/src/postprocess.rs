//! The three state post-processors `capture()` applies to raw state bytes
//! before handing an observation to a consumer (SPEC_FULL.md §4.5, §6,
//! §10.5). Grounded on the original `GameCapture`'s `use_dicts`/`simulate_ins`
//! configuration switches.

use harness_types::{simulate_ins, DecodedState, OdometerState, SimulatedIns, StateDecoder, StateSchema};

/// A post-processed state payload, the shape `capture()` actually hands back.
#[derive(Debug, Clone)]
pub enum StatePayload {
    /// `use_dicts=false`: the raw bytes, untouched.
    Raw(Vec<u8>),
    /// `use_dicts=true`, `simulate_ins=false`: decoded against the schema.
    Decoded(DecodedState),
    /// `use_dicts=true`, `simulate_ins=true`: decoded, plus a simulated
    /// inertial-measurement reading derived from the decoded fields.
    DecodedWithIns(DecodedState, SimulatedIns),
}

/// Configures which post-processor `capture()` runs, and owns the odometer
/// state the simulated-INS processor accumulates across ticks.
pub struct StatePostProcessor {
    schema: StateSchema,
    mode: Mode,
    odometer: OdometerState,
}

enum Mode {
    Identity,
    Decode,
    DecodeWithIns,
}

impl StatePostProcessor {
    /// Picks a mode from `capture.state`'s `use_dicts`/`simulate_ins` switches
    /// (SPEC_FULL.md §6, §10.5).
    pub fn from_config(state_config: &harness_config::CaptureStateConfig, schema: StateSchema) -> Self {
        match (state_config.use_dicts, state_config.simulate_ins) {
            (false, _) => Self::identity(schema),
            (true, false) => Self::decode(schema),
            (true, true) => Self::decode_with_simulated_ins(schema),
        }
    }

    pub fn identity(schema: StateSchema) -> Self {
        Self {
            schema,
            mode: Mode::Identity,
            odometer: OdometerState::default(),
        }
    }

    pub fn decode(schema: StateSchema) -> Self {
        Self {
            schema,
            mode: Mode::Decode,
            odometer: OdometerState::default(),
        }
    }

    pub fn decode_with_simulated_ins(schema: StateSchema) -> Self {
        Self {
            schema,
            mode: Mode::DecodeWithIns,
            odometer: OdometerState::default(),
        }
    }

    /// Applies the configured mode to one tick's raw state bytes.
    ///
    /// `dt_seconds` is only consulted in `DecodeWithIns` mode, where it
    /// advances the running odometer by the distance implied by the current
    /// tick's `speed_kmh`.
    pub fn apply(&mut self, raw: &[u8], dt_seconds: f64) -> harness_types::Result<StatePayload> {
        match self.mode {
            Mode::Identity => Ok(StatePayload::Raw(raw.to_vec())),
            Mode::Decode => {
                let decoded = StateDecoder::decode(&self.schema, raw)?;
                Ok(StatePayload::Decoded(decoded))
            }
            Mode::DecodeWithIns => {
                let decoded = StateDecoder::decode(&self.schema, raw)?;
                let ins = simulate_ins(&decoded, &mut self.odometer, dt_seconds);
                Ok(StatePayload::DecodedWithIns(decoded, ins))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harness_types::{FieldKind, SchemaField};

    fn tiny_schema() -> StateSchema {
        StateSchema::new(vec![SchemaField::new("speed_kmh", FieldKind::Float, 4)])
    }

    fn payload(speed_kmh: f32) -> Vec<u8> {
        speed_kmh.to_le_bytes().to_vec()
    }

    #[test]
    fn identity_mode_passes_bytes_through_unchanged() {
        let mut pp = StatePostProcessor::identity(tiny_schema());
        let raw = payload(36.0);
        match pp.apply(&raw, 1.0).unwrap() {
            StatePayload::Raw(bytes) => assert_eq!(bytes, raw),
            other => panic!("expected Raw, got {other:?}"),
        }
    }

    #[test]
    fn decode_mode_produces_named_fields() {
        let mut pp = StatePostProcessor::decode(tiny_schema());
        match pp.apply(&payload(36.0), 1.0).unwrap() {
            StatePayload::Decoded(state) => {
                assert_eq!(state.get("speed_kmh").unwrap().as_f64(), Some(36.0f32 as f64));
            }
            other => panic!("expected Decoded, got {other:?}"),
        }
    }

    #[test]
    fn from_config_picks_the_mode_the_switches_select() {
        let mut use_dicts_off = harness_config::CaptureStateConfig::default();
        use_dicts_off.use_dicts = false;
        let mut pp = StatePostProcessor::from_config(&use_dicts_off, tiny_schema());
        assert!(matches!(pp.apply(&payload(1.0), 0.0).unwrap(), StatePayload::Raw(_)));

        let mut decode_only = harness_config::CaptureStateConfig::default();
        decode_only.use_dicts = true;
        decode_only.simulate_ins = false;
        let mut pp = StatePostProcessor::from_config(&decode_only, tiny_schema());
        assert!(matches!(pp.apply(&payload(1.0), 0.0).unwrap(), StatePayload::Decoded(_)));

        let mut with_ins = harness_config::CaptureStateConfig::default();
        with_ins.use_dicts = true;
        with_ins.simulate_ins = true;
        let mut pp = StatePostProcessor::from_config(&with_ins, tiny_schema());
        assert!(matches!(
            pp.apply(&payload(1.0), 0.0).unwrap(),
            StatePayload::DecodedWithIns(_, _)
        ));
    }

    #[test]
    fn simulated_ins_mode_accumulates_odometer_across_calls() {
        let mut pp = StatePostProcessor::decode_with_simulated_ins(tiny_schema());
        let raw = payload(36.0); // 10 m/s
        let first = match pp.apply(&raw, 1.0).unwrap() {
            StatePayload::DecodedWithIns(_, ins) => ins,
            other => panic!("expected DecodedWithIns, got {other:?}"),
        };
        assert!((first.odometer_m - 10.0).abs() < 1e-9);

        let second = match pp.apply(&raw, 1.0).unwrap() {
            StatePayload::DecodedWithIns(_, ins) => ins,
            other => panic!("expected DecodedWithIns, got {other:?}"),
        };
        assert!((second.odometer_m - 20.0).abs() < 1e-9);
    }
}
