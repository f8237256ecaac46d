use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use wireprims_codec::{encoded_len, put_varint, try_decode_varint};

use crate::config::DEFAULT_MAX_MESSAGE_SIZE;
use crate::error::ConnectionError;

/// `tokio_util` codec for varint-length-delimited messages.
///
/// Wire format: `varint(len) || payload`. Decoding yields the payload only.
#[derive(Debug, Clone)]
pub struct DelimitedCodec {
    max_message_size: usize,
}

impl DelimitedCodec {
    /// Codec with the default 16 MiB message limit.
    pub fn new() -> Self {
        Self::with_max_message_size(DEFAULT_MAX_MESSAGE_SIZE)
    }

    pub fn with_max_message_size(max_message_size: usize) -> Self {
        Self { max_message_size }
    }

    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    fn check_size(&self, size: u64) -> Result<usize, ConnectionError> {
        usize::try_from(size)
            .ok()
            .filter(|len| *len <= self.max_message_size)
            .ok_or(ConnectionError::MessageTooLarge {
                size,
                max: self.max_message_size,
            })
    }
}

impl Default for DelimitedCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for DelimitedCodec {
    type Item = Bytes;
    type Error = ConnectionError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some((len, prefix)) = try_decode_varint(&src[..])? else {
            return Ok(None);
        };
        let len = self.check_size(len)?;

        let total = prefix + len;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(prefix);
        Ok(Some(src.split_to(len).freeze()))
    }
}

impl Encoder<Bytes> for DelimitedCodec {
    type Error = ConnectionError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Encoder::<&[u8]>::encode(self, &item[..], dst)
    }
}

impl Encoder<&[u8]> for DelimitedCodec {
    type Error = ConnectionError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.check_size(item.len() as u64)?;
        dst.reserve(encoded_len(item.len() as u64) + item.len());
        put_varint(item.len() as u64, dst);
        dst.put_slice(item);
        Ok(())
    }
}
