//! [`StateSnapshot`] and its wire encoding (SPEC_FULL.md §3, §6).

use byteorder::{ByteOrder, LittleEndian};
use std::sync::Arc;

/// An immutable, shareable snapshot of one StateReader tick.
///
/// `payload` is the concatenation of the graphics block then the physics
/// block, exact byte size (`StateSchema::payload_len()`). Cloning is cheap:
/// the payload is reference-counted.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    pub physics_packet_id: u32,
    pub graphics_packet_id: u32,
    pub payload: Arc<[u8]>,
}

impl StateSnapshot {
    pub fn new(physics_packet_id: u32, graphics_packet_id: u32, payload: Vec<u8>) -> Self {
        Self {
            physics_packet_id,
            graphics_packet_id,
            payload: Arc::from(payload),
        }
    }

    /// Wire form: `u32 physics_packet_id | u32 graphics_packet_id | u32 payload_len | payload`.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(12 + self.payload.len());
        let mut header = [0u8; 12];
        LittleEndian::write_u32(&mut header[0..4], self.physics_packet_id);
        LittleEndian::write_u32(&mut header[4..8], self.graphics_packet_id);
        LittleEndian::write_u32(&mut header[8..12], self.payload.len() as u32);
        buf.extend_from_slice(&header);
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Decodes one snapshot from the front of `buf`, returning the snapshot
    /// and the number of bytes consumed, or `None` if `buf` does not yet
    /// contain a full message.
    pub fn decode(buf: &[u8]) -> Option<(Self, usize)> {
        if buf.len() < 12 {
            return None;
        }
        let physics_packet_id = LittleEndian::read_u32(&buf[0..4]);
        let graphics_packet_id = LittleEndian::read_u32(&buf[4..8]);
        let payload_len = LittleEndian::read_u32(&buf[8..12]) as usize;
        let total = 12 + payload_len;
        if buf.len() < total {
            return None;
        }
        let payload = buf[12..total].to_vec();
        Some((
            Self::new(physics_packet_id, graphics_packet_id, payload),
            total,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_the_wire_format() {
        let snap = StateSnapshot::new(10, 1, vec![1, 2, 3, 4, 5]);
        let wire = snap.encode();
        let (decoded, consumed) = StateSnapshot::decode(&wire).unwrap();
        assert_eq!(consumed, wire.len());
        assert_eq!(decoded, snap);
    }

    #[test]
    fn decode_reports_none_on_partial_buffer() {
        let snap = StateSnapshot::new(1, 1, vec![9; 16]);
        let wire = snap.encode();
        assert!(StateSnapshot::decode(&wire[..wire.len() - 1]).is_none());
        assert!(StateSnapshot::decode(&wire[..8]).is_none());
    }

    #[test]
    fn decode_leaves_trailing_bytes_for_the_next_message() {
        let a = StateSnapshot::new(1, 1, vec![1, 2, 3]);
        let b = StateSnapshot::new(2, 2, vec![4, 5, 6, 7]);
        let mut wire = a.encode();
        wire.extend_from_slice(&b.encode());

        let (decoded_a, consumed_a) = StateSnapshot::decode(&wire).unwrap();
        assert_eq!(decoded_a, a);
        let (decoded_b, _) = StateSnapshot::decode(&wire[consumed_a..]).unwrap();
        assert_eq!(decoded_b, b);
    }
}
