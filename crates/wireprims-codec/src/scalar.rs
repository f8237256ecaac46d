use std::fmt;
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CodecError, Result};
use crate::value::{Value, WireStr};
use crate::varint::{decode_varint_pos, encoded_len, put_varint};
use crate::zigzag::{zigzag_decode, zigzag_encode_32, zigzag_encode_64};

/// The fixed set of scalar wire types.
///
/// Dispatch is a plain `match`; the set is closed, so an unknown tag can only
/// arise when parsing a type name (see [`FromStr`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Varint,
    ZigzagedVarint,
    Sint32,
    Sint64,
    Uint32,
    Uint64,
    Float,
    Double,
    Bool,
    String,
    Bytes,
}

impl ScalarType {
    /// Every supported type, in declaration order.
    pub const ALL: [ScalarType; 11] = [
        ScalarType::Varint,
        ScalarType::ZigzagedVarint,
        ScalarType::Sint32,
        ScalarType::Sint64,
        ScalarType::Uint32,
        ScalarType::Uint64,
        ScalarType::Float,
        ScalarType::Double,
        ScalarType::Bool,
        ScalarType::String,
        ScalarType::Bytes,
    ];

    /// The type tag as written in schemas and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Varint => "varint",
            ScalarType::ZigzagedVarint => "zigzaged_varint",
            ScalarType::Sint32 => "sint32",
            ScalarType::Sint64 => "sint64",
            ScalarType::Uint32 => "uint32",
            ScalarType::Uint64 => "uint64",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
            ScalarType::Bool => "bool",
            ScalarType::String => "string",
            ScalarType::Bytes => "bytes",
        }
    }

    /// Decode a value from the start of `bytes`.
    pub fn decode(self, bytes: &[u8]) -> Result<Value> {
        self.decode_prefix(bytes).map(|(value, _)| value)
    }

    /// Decode a value from the start of `bytes`, returning it with the number
    /// of bytes it occupied.
    pub fn decode_prefix(self, bytes: &[u8]) -> Result<(Value, usize)> {
        match self {
            ScalarType::Varint | ScalarType::Uint32 | ScalarType::Uint64 => {
                let (value, len) = decode_varint_pos(bytes)?;
                Ok((Value::Unsigned(value), len))
            }
            ScalarType::ZigzagedVarint | ScalarType::Sint32 | ScalarType::Sint64 => {
                let (zigzaged, len) = decode_varint_pos(bytes)?;
                Ok((Value::Signed(zigzag_decode(zigzaged)), len))
            }
            ScalarType::Float => {
                let raw = fixed::<4>(bytes)?;
                Ok((Value::Float(f32::from_le_bytes(raw)), 4))
            }
            ScalarType::Double => {
                let raw = fixed::<8>(bytes)?;
                Ok((Value::Double(f64::from_le_bytes(raw)), 8))
            }
            ScalarType::Bool => {
                let (value, len) = decode_varint_pos(bytes)?;
                Ok((Value::Bool(value != 0), len))
            }
            ScalarType::String => {
                let (payload, len) = length_delimited(bytes)?;
                let s = WireStr::from_wire(Bytes::copy_from_slice(payload));
                Ok((Value::String(s), len))
            }
            ScalarType::Bytes => {
                let (payload, len) = length_delimited(bytes)?;
                Ok((Value::Bytes(Bytes::copy_from_slice(payload)), len))
            }
        }
    }

    /// Encode `value` as this type.
    pub fn encode(self, value: &Value) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        self.encode_into(value, &mut buf)?;
        Ok(buf.freeze())
    }

    /// Append the encoding of `value` to `dst`.
    ///
    /// On error nothing is written.
    pub fn encode_into(self, value: &Value, dst: &mut BytesMut) -> Result<()> {
        match self {
            ScalarType::Varint | ScalarType::Uint32 | ScalarType::Uint64 => {
                put_varint(self.unsigned(value)?, dst);
            }
            ScalarType::ZigzagedVarint | ScalarType::Sint64 => {
                put_varint(zigzag_encode_64(self.signed(value)?), dst);
            }
            ScalarType::Sint32 => {
                let wide = self.signed(value)?;
                let narrow = i32::try_from(wide).map_err(|_| CodecError::OutOfRange {
                    ty: self,
                    value: i128::from(wide),
                })?;
                put_varint(zigzag_encode_32(narrow), dst);
            }
            // f32 is written as-is so NaN payloads survive unchanged.
            ScalarType::Float => match value {
                Value::Float(v) => dst.put_f32_le(*v),
                other => dst.put_f32_le(self.float(other)? as f32),
            },
            ScalarType::Double => dst.put_f64_le(self.float(value)?),
            ScalarType::Bool => match value {
                Value::Bool(b) => put_varint(u64::from(*b), dst),
                other => return Err(self.mismatch(other)),
            },
            ScalarType::String => match value {
                Value::String(s) => put_length_delimited(s.as_bytes(), dst),
                other => return Err(self.mismatch(other)),
            },
            ScalarType::Bytes => match value {
                Value::Bytes(b) => put_length_delimited(b, dst),
                other => return Err(self.mismatch(other)),
            },
        }
        Ok(())
    }

    fn unsigned(self, value: &Value) -> Result<u64> {
        match value {
            Value::Unsigned(v) => Ok(*v),
            Value::Signed(v) => u64::try_from(*v).map_err(|_| CodecError::Negative(*v)),
            other => Err(self.mismatch(other)),
        }
    }

    fn signed(self, value: &Value) -> Result<i64> {
        match value {
            Value::Signed(v) => Ok(*v),
            Value::Unsigned(v) => i64::try_from(*v).map_err(|_| CodecError::OutOfRange {
                ty: self,
                value: i128::from(*v),
            }),
            other => Err(self.mismatch(other)),
        }
    }

    fn float(self, value: &Value) -> Result<f64> {
        match value {
            Value::Float(v) => Ok(f64::from(*v)),
            Value::Double(v) => Ok(*v),
            Value::Unsigned(v) => Ok(*v as f64),
            Value::Signed(v) => Ok(*v as f64),
            other => Err(self.mismatch(other)),
        }
    }

    fn mismatch(self, value: &Value) -> CodecError {
        CodecError::TypeMismatch {
            ty: self,
            found: value.kind(),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScalarType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        ScalarType::ALL
            .into_iter()
            .find(|ty| ty.name() == s)
            .ok_or_else(|| CodecError::UnsupportedType(s.to_string()))
    }
}

fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N]> {
    bytes
        .get(..N)
        .and_then(|head| head.try_into().ok())
        .ok_or(CodecError::Truncated {
            needed: N,
            available: bytes.len(),
        })
}

fn length_delimited(bytes: &[u8]) -> Result<(&[u8], usize)> {
    let (len, header) = decode_varint_pos(bytes)?;
    let rest = &bytes[header..];
    let needed = usize::try_from(len).unwrap_or(usize::MAX);
    if needed > rest.len() {
        return Err(CodecError::Truncated {
            needed,
            available: rest.len(),
        });
    }
    Ok((&rest[..needed], header + needed))
}

fn put_length_delimited(payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(encoded_len(payload.len() as u64) + payload.len());
    put_varint(payload.len() as u64, dst);
    dst.put_slice(payload);
}
