//! ZigZag mapping between signed integers and varints.
//!
//! Small magnitudes of either sign map to small unsigned values:
//! 0 → 0, -1 → 1, 1 → 2, -2 → 3, ...

use bytes::Bytes;

use crate::error::Result;
use crate::varint::{decode_varint, encode_varint};

/// Map a 32-bit signed value onto its unsigned zigzag form.
pub fn zigzag_encode_32(value: i32) -> u64 {
    u64::from(((value << 1) ^ (value >> 31)) as u32)
}

/// Map a 64-bit signed value onto its unsigned zigzag form.
pub fn zigzag_encode_64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Invert the zigzag mapping. Width-agnostic: a value produced by either
/// encoder decodes back to its input.
pub fn zigzag_decode(zigzaged: u64) -> i64 {
    ((zigzaged >> 1) as i64) ^ -((zigzaged & 1) as i64)
}

/// Encode a `sint32` value.
pub fn encode_zigzaged_varint_32(value: i32) -> Bytes {
    encode_varint(zigzag_encode_32(value))
}

/// Encode a `sint64` value.
pub fn encode_zigzaged_varint_64(value: i64) -> Bytes {
    encode_varint(zigzag_encode_64(value))
}

/// Decode a zigzag varint from the start of `bytes`.
pub fn decode_zigzaged_varint(bytes: &[u8]) -> Result<i64> {
    decode_varint(bytes).map(zigzag_decode)
}
