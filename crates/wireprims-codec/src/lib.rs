//! Protobuf-compatible scalar wire encoding.
//!
//! Pure, stateless conversions between native values and their wire bytes:
//! - Base-128 varints (unsigned, little-endian groups of 7 bits)
//! - ZigZag varints for `sint32`/`sint64`
//! - Little-endian IEEE-754 `float`/`double`
//! - Length-delimited `string`/`bytes`
//! - `bool` as varint 0/1
//!
//! Every function here is reentrant and safe to call from any thread.

pub mod error;
pub mod scalar;
pub mod value;
pub mod varint;
pub mod zigzag;

use bytes::Bytes;

pub use error::{CodecError, Result};
pub use scalar::ScalarType;
pub use value::{Value, WireStr};
pub use varint::{
    decode_varint, decode_varint_pos, encode_nonnegative_varint, encode_varint, encoded_len,
    put_varint, try_decode_varint, VarintDecoder, MAX_VARINT_LEN,
};
pub use zigzag::{
    decode_zigzaged_varint, encode_zigzaged_varint_32, encode_zigzaged_varint_64, zigzag_decode,
    zigzag_encode_32, zigzag_encode_64,
};

/// Decode a value of the named wire type from the start of `bytes`.
///
/// `type_name` is one of the tags accepted by [`ScalarType`]'s `FromStr`;
/// anything else fails with [`CodecError::UnsupportedType`].
pub fn decode(bytes: &[u8], type_name: &str) -> Result<Value> {
    type_name.parse::<ScalarType>()?.decode(bytes)
}

/// Encode `value` as the named wire type.
pub fn encode(value: &Value, type_name: &str) -> Result<Bytes> {
    type_name.parse::<ScalarType>()?.encode(value)
}
