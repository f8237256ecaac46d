use wireprims_codec::CodecError;
use wireprims_transport::TransportError;

/// Errors that can occur on a framed connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Connecting or configuring the underlying stream failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// An I/O error occurred while reading or writing.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes received from the peer do not form a valid value.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The stream reached EOF before the requested bytes arrived.
    #[error("connection closed after {received} of {expected} bytes")]
    ShortRead { expected: usize, received: usize },

    /// The stream accepted no more bytes while writing.
    #[error("connection closed while writing")]
    Closed,

    /// The operation was attempted after `close`.
    #[error("connection is not open")]
    NotConnected,

    /// A message length exceeds the configured maximum.
    #[error("message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: u64, max: usize },
}

impl ConnectionError {
    /// True when the peer went away or the stream failed, as opposed to the
    /// peer sending bad data or the caller misusing the connection.
    pub fn is_disconnect(&self) -> bool {
        match self {
            ConnectionError::ShortRead { .. } | ConnectionError::Closed => true,
            ConnectionError::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConnectionError>;
