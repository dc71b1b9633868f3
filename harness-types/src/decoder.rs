//! StateDecoder (SPEC_FULL.md §4.6): turns a raw state payload into a typed,
//! named record using the declarative [`StateSchema`].

use crate::error::{Error, Result};
use crate::schema::{FieldKind, StateSchema};
use byteorder::{ByteOrder, LittleEndian};
use std::collections::HashMap;

/// One decoded field value. `Null` only ever appears after
/// [`DecodedState::sanitize_for_storage`] maps a non-finite float to absent.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    SignedInt(i32),
    UnsignedInt(u32),
    Float(f32),
    Text(String),
    Null,
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::SignedInt(v) => Some(*v as f64),
            FieldValue::UnsignedInt(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v as f64),
            FieldValue::Text(_) | FieldValue::Null => None,
        }
    }
}

/// A fully decoded state payload, keyed by schema field name (not the
/// storage-renamed name — see [`StateSchema::storage_name`]).
#[derive(Debug, Clone, Default)]
pub struct DecodedState {
    values: HashMap<String, FieldValue>,
}

impl DecodedState {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Strip interior/trailing null bytes from text fields (already done at
    /// decode time, kept idempotent here) and map ±infinity floats to
    /// `Null`, matching `replace_infinity`/`remove_null_characters` in the
    /// upstream database writer.
    pub fn sanitize_for_storage(&mut self) {
        for value in self.values.values_mut() {
            if let FieldValue::Float(v) = value {
                if !v.is_finite() {
                    *value = FieldValue::Null;
                }
            }
        }
    }
}

/// Decodes a raw byte payload against a [`StateSchema`].
pub struct StateDecoder;

impl StateDecoder {
    pub fn decode(schema: &StateSchema, payload: &[u8]) -> Result<DecodedState> {
        if payload.len() != schema.payload_len() {
            return Err(Error::SchemaMismatch {
                expected: schema.payload_len(),
                got: payload.len(),
            });
        }

        let mut values = HashMap::with_capacity(schema.fields().len());
        let mut offset = 0usize;
        for field in schema.fields() {
            let bytes = &payload[offset..offset + field.width_bytes];
            let value = match field.kind {
                FieldKind::SignedInt => FieldValue::SignedInt(LittleEndian::read_i32(bytes)),
                FieldKind::UnsignedInt => FieldValue::UnsignedInt(LittleEndian::read_u32(bytes)),
                FieldKind::Float => FieldValue::Float(LittleEndian::read_f32(bytes)),
                FieldKind::Text => {
                    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                    let text = std::str::from_utf8(&bytes[..end])
                        .map_err(|_| Error::NonUtf8Field(field.name.clone()))?;
                    FieldValue::Text(text.trim_end_matches('\0').to_string())
                }
            };
            values.insert(field.name.clone(), value);
            offset += field.width_bytes;
        }

        Ok(DecodedState { values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaField, StateSchema};

    fn tiny_schema() -> StateSchema {
        StateSchema::new(vec![
            SchemaField::new("throttle", FieldKind::Float, 4),
            SchemaField::new("gear", FieldKind::SignedInt, 4),
            SchemaField::new("tyre_compound", FieldKind::Text, 8),
        ])
    }

    #[test]
    fn round_trips_finite_fields() {
        let schema = tiny_schema();
        let mut payload = Vec::new();
        payload.extend_from_slice(&0.75f32.to_le_bytes());
        payload.extend_from_slice(&3i32.to_le_bytes());
        payload.extend_from_slice(b"soft\0\0\0\0");

        let decoded = StateDecoder::decode(&schema, &payload).unwrap();
        assert_eq!(decoded.get("throttle"), Some(&FieldValue::Float(0.75)));
        assert_eq!(decoded.get("gear"), Some(&FieldValue::SignedInt(3)));
        assert_eq!(
            decoded.get("tyre_compound"),
            Some(&FieldValue::Text("soft".to_string()))
        );
    }

    #[test]
    fn rejects_wrong_length_payload() {
        let schema = tiny_schema();
        let err = StateDecoder::decode(&schema, &[0u8; 4]).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }

    #[test]
    fn sanitize_maps_non_finite_floats_to_null() {
        let schema = tiny_schema();
        let mut payload = Vec::new();
        payload.extend_from_slice(&f32::INFINITY.to_le_bytes());
        payload.extend_from_slice(&0i32.to_le_bytes());
        payload.extend_from_slice(&[0u8; 8]);

        let mut decoded = StateDecoder::decode(&schema, &payload).unwrap();
        decoded.sanitize_for_storage();
        assert_eq!(decoded.get("throttle"), Some(&FieldValue::Null));
    }
}
