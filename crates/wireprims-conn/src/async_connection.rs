use std::future::Future;
use std::io::ErrorKind;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace};
use wireprims_codec::{put_varint, VarintDecoder};
use wireprims_transport::TransportError;

use crate::config::ConnectionConfig;
use crate::error::{ConnectionError, Result};

/// Async counterpart of [`crate::Connection`].
///
/// Each partial read is a suspension point; bytes already received are held
/// in the operation's buffer across suspensions. Timeouts from
/// [`ConnectionConfig`] bound each `send`/`recv*` call.
#[derive(Debug)]
pub struct AsyncConnection<S = TcpStream> {
    stream: Option<S>,
    config: ConnectionConfig,
}

impl AsyncConnection<TcpStream> {
    /// Connect to `host:port` over TCP with default configuration.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        Self::connect_with_config(host, port, ConnectionConfig::default()).await
    }

    /// Connect to `host:port` over TCP with explicit configuration.
    pub async fn connect_with_config(
        host: &str,
        port: u16,
        config: ConnectionConfig,
    ) -> Result<Self> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| TransportError::Connect {
                addr: format!("{host}:{port}"),
                source: e,
            })?;
        stream.set_nodelay(config.nodelay)?;
        debug!(host, port, "async connection open");
        Ok(Self::with_config(stream, config))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> AsyncConnection<S> {
    /// Wrap an already-connected stream with default configuration.
    pub fn from_stream(stream: S) -> Self {
        Self::with_config(stream, ConnectionConfig::default())
    }

    /// Wrap an already-connected stream with explicit configuration.
    pub fn with_config(stream: S, config: ConnectionConfig) -> Self {
        Self {
            stream: Some(stream),
            config,
        }
    }

    /// Write all of `bytes` to the stream.
    pub async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let timeout = self.config.write_timeout;
        let stream = self.stream.as_mut().ok_or(ConnectionError::NotConnected)?;
        with_timeout(timeout, async {
            stream.write_all(bytes).await.map_err(|err| match err.kind() {
                ErrorKind::WriteZero => ConnectionError::Closed,
                _ => ConnectionError::Io(err),
            })?;
            stream.flush().await?;
            Ok(())
        })
        .await
    }

    /// Read exactly `n` bytes.
    pub async fn recv(&mut self, n: usize) -> Result<Bytes> {
        let mut buf = vec![0u8; n];
        self.fill(&mut buf).await?;
        Ok(Bytes::from(buf))
    }

    /// Read one varint, a single byte at a time.
    pub async fn recv_varint(&mut self) -> Result<u64> {
        let mut decoder = VarintDecoder::new();
        let mut byte = [0u8; 1];
        loop {
            self.fill(&mut byte).await?;
            if let Some(value) = decoder.push(byte[0])? {
                return Ok(value);
            }
        }
    }

    /// Write `varint(len) || payload`.
    pub async fn send_message(&mut self, payload: &[u8]) -> Result<()> {
        let max = self.config.max_message_size;
        if payload.len() > max {
            return Err(ConnectionError::MessageTooLarge {
                size: payload.len() as u64,
                max,
            });
        }
        let mut buf = BytesMut::with_capacity(payload.len() + wireprims_codec::MAX_VARINT_LEN);
        put_varint(payload.len() as u64, &mut buf);
        buf.put_slice(payload);
        self.send(&buf).await
    }

    /// Read a varint length prefix, then exactly that many bytes.
    pub async fn recv_message(&mut self) -> Result<Bytes> {
        let len = self.recv_varint().await?;
        let max = self.config.max_message_size;
        let size = usize::try_from(len)
            .ok()
            .filter(|size| *size <= max)
            .ok_or(ConnectionError::MessageTooLarge { size: len, max })?;
        self.recv(size).await
    }

    /// Whether the connection is open. No I/O.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Close the connection. `true` on the first call, `false` afterwards.
    pub fn close(&mut self) -> bool {
        let closed = self.stream.take().is_some();
        if closed {
            debug!("async connection closed");
        }
        closed
    }

    async fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let timeout = self.config.read_timeout;
        let stream = self.stream.as_mut().ok_or(ConnectionError::NotConnected)?;
        with_timeout(timeout, async {
            let expected = buf.len();
            let mut filled = 0usize;
            while filled < expected {
                match stream.read(&mut buf[filled..]).await {
                    Ok(0) => {
                        return Err(ConnectionError::ShortRead {
                            expected,
                            received: filled,
                        })
                    }
                    Ok(n) => {
                        filled += n;
                        trace!(read = n, filled, expected, "partial read");
                    }
                    Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                    Err(err) => return Err(ConnectionError::Io(err)),
                }
            }
            Ok(())
        })
        .await
    }
}

async fn with_timeout<T>(
    timeout: Option<Duration>,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ConnectionError::Io(std::io::Error::from(ErrorKind::TimedOut)))?,
        None => fut.await,
    }
}
