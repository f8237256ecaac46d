use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CodecError, Result};

/// Longest varint accepted on decode: 10 groups of 7 bits cover 64 bits.
pub const MAX_VARINT_LEN: usize = 10;

const PAYLOAD_MASK: u8 = 0x7F;
const CONTINUATION: u8 = 0x80;

/// Incremental varint decoder fed one byte at a time.
///
/// Used wherever bytes trickle in from a stream: push each byte as it arrives
/// and the decoder yields the value once the terminating byte (high bit
/// clear) is seen. After a value or an error the decoder is reset and can be
/// reused for the next varint.
#[derive(Debug, Default, Clone)]
pub struct VarintDecoder {
    value: u64,
    shift: u32,
    len: usize,
}

impl VarintDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next byte.
    ///
    /// Returns `Ok(Some(value))` on the terminating byte, `Ok(None)` when more
    /// bytes are needed, and `Err(MalformedVarint)` once the value needs more
    /// than 64 bits.
    pub fn push(&mut self, byte: u8) -> Result<Option<u64>> {
        // The tenth group only has room for bit 63.
        if self.len + 1 == MAX_VARINT_LEN && byte & PAYLOAD_MASK > 0x01 {
            self.reset();
            return Err(CodecError::MalformedVarint("varint exceeds 64 bits"));
        }
        self.value |= u64::from(byte & PAYLOAD_MASK) << self.shift;
        self.len += 1;

        if byte & CONTINUATION == 0 {
            let value = self.value;
            self.reset();
            return Ok(Some(value));
        }

        self.shift += 7;
        if self.shift >= 64 {
            self.reset();
            return Err(CodecError::MalformedVarint(
                "too many bytes when decoding varint",
            ));
        }
        Ok(None)
    }

    /// Number of bytes pushed for the varint currently in progress.
    pub fn pending_len(&self) -> usize {
        self.len
    }

    /// Discard any partially decoded state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Decode a varint from the start of `bytes`.
///
/// Returns `Ok(None)` when `bytes` ends before the terminating byte, so
/// callers accumulating a buffer can wait for more data.
pub fn try_decode_varint(bytes: &[u8]) -> Result<Option<(u64, usize)>> {
    let mut decoder = VarintDecoder::new();
    for (pos, &byte) in bytes.iter().enumerate() {
        if let Some(value) = decoder.push(byte)? {
            return Ok(Some((value, pos + 1)));
        }
    }
    Ok(None)
}

/// Decode a varint from the start of `bytes`, returning the value and the
/// number of bytes consumed.
pub fn decode_varint_pos(bytes: &[u8]) -> Result<(u64, usize)> {
    if bytes.is_empty() {
        return Err(CodecError::MalformedVarint(
            "can't decode varint from empty byte buffer",
        ));
    }
    try_decode_varint(bytes)?.ok_or(CodecError::MalformedVarint("unterminated varint"))
}

/// Decode a varint from the start of `bytes`.
pub fn decode_varint(bytes: &[u8]) -> Result<u64> {
    decode_varint_pos(bytes).map(|(value, _)| value)
}

/// Number of bytes `value` occupies once varint-encoded.
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Append the varint encoding of `value` to `dst`.
pub fn put_varint(mut value: u64, dst: &mut BytesMut) {
    dst.reserve(encoded_len(value));
    while value >= u64::from(CONTINUATION) {
        dst.put_u8((value as u8 & PAYLOAD_MASK) | CONTINUATION);
        value >>= 7;
    }
    dst.put_u8(value as u8);
}

/// Encode `value` as a varint.
pub fn encode_varint(value: u64) -> Bytes {
    let mut buf = BytesMut::with_capacity(encoded_len(value));
    put_varint(value, &mut buf);
    buf.freeze()
}

/// Encode a signed integer as a plain varint, rejecting negative values.
///
/// Backs `uint32`/`uint64`.
pub fn encode_nonnegative_varint(value: i64) -> Result<Bytes> {
    let value = u64::try_from(value).map_err(|_| CodecError::Negative(value))?;
    Ok(encode_varint(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_byte_boundaries() {
        assert_eq!(encode_varint(0).as_ref(), &[0x00]);
        assert_eq!(encode_varint(1).as_ref(), &[0x01]);
        assert_eq!(encode_varint(127).as_ref(), &[0x7F]);
        assert_eq!(encode_varint(128).as_ref(), &[0x80, 0x01]);
        assert_eq!(encode_varint(300).as_ref(), &[0xAC, 0x02]);
    }

    #[test]
    fn max_value_takes_ten_bytes() {
        let bytes = encode_varint(u64::MAX);
        assert_eq!(bytes.len(), MAX_VARINT_LEN);
        assert_eq!(bytes[9], 0x01);
        assert_eq!(decode_varint_pos(&bytes).unwrap(), (u64::MAX, 10));
    }

    #[test]
    fn encoded_len_matches_output() {
        for value in [0, 1, 127, 128, 16_383, 16_384, 83_752_476_526_753, u64::MAX] {
            assert_eq!(encoded_len(value), encode_varint(value).len(), "{value}");
        }
    }

    #[test]
    fn decode_reports_consumed_bytes() {
        let bytes = [0xAC, 0x02, 0xFF, 0xFF];
        assert_eq!(decode_varint_pos(&bytes).unwrap(), (300, 2));
        assert_eq!(decode_varint(&bytes).unwrap(), 300);
    }

    #[test]
    fn empty_input_is_malformed() {
        let err = decode_varint(&[]).unwrap_err();
        assert!(matches!(err, CodecError::MalformedVarint(_)));
    }

    #[test]
    fn unterminated_input_is_malformed() {
        let err = decode_varint(&[0x80, 0x80]).unwrap_err();
        assert!(matches!(err, CodecError::MalformedVarint(_)));
        assert_eq!(try_decode_varint(&[0x80, 0x80]).unwrap(), None);
    }

    #[test]
    fn eleventh_byte_is_rejected() {
        let mut overlong = vec![0xFF; 10];
        overlong.push(0x01);
        let err = decode_varint(&overlong).unwrap_err();
        assert!(matches!(err, CodecError::MalformedVarint(_)));
    }

    #[test]
    fn tenth_byte_overflow_is_rejected() {
        let mut overflow = vec![0xFF; 9];
        overflow.push(0x7F);
        let err = decode_varint_pos(&overflow).unwrap_err();
        assert!(matches!(err, CodecError::MalformedVarint(_)));

        overflow[9] = 0x02;
        assert_eq!(
            try_decode_varint(&overflow).unwrap_err(),
            CodecError::MalformedVarint("varint exceeds 64 bits")
        );
    }

    #[test]
    fn incremental_decoder_matches_slice_decoder() {
        let value = 83_752_476_526_753u64;
        let bytes = encode_varint(value);

        let mut decoder = VarintDecoder::new();
        let mut decoded = None;
        for (i, &byte) in bytes.iter().enumerate() {
            decoded = decoder.push(byte).unwrap();
            if i + 1 < bytes.len() {
                assert!(decoded.is_none());
                assert_eq!(decoder.pending_len(), i + 1);
            }
        }
        assert_eq!(decoded, Some(value));
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn decoder_resets_after_error() {
        let mut decoder = VarintDecoder::new();
        for _ in 0..9 {
            assert_eq!(decoder.push(0xFF).unwrap(), None);
        }
        assert!(decoder.push(0xFF).is_err());
        assert_eq!(decoder.push(0x05).unwrap(), Some(5));
    }

    #[test]
    fn nonnegative_encoder_rejects_negative() {
        assert_eq!(encode_nonnegative_varint(128).unwrap().as_ref(), &[0x80, 0x01]);
        assert_eq!(
            encode_nonnegative_varint(-1).unwrap_err(),
            CodecError::Negative(-1)
        );
    }

    #[test]
    fn put_varint_appends() {
        let mut buf = BytesMut::from(&b"x"[..]);
        put_varint(150, &mut buf);
        assert_eq!(buf.as_ref(), &[b'x', 0x96, 0x01]);
    }
}
