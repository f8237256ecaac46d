use std::fmt;
use std::io::{ErrorKind, Read, Write};
use std::net::SocketAddr;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};
use wireprims_codec::{put_varint, VarintDecoder};
use wireprims_transport::{TcpTransport, WireStream};

use crate::config::ConnectionConfig;
use crate::error::{ConnectionError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// A framed connection over a blocking duplex stream.
///
/// Owns the stream exclusively. Every `send`/`recv*` call blocks the calling
/// thread until it completes or fails; there is no internal timeout unless
/// one is set through [`ConnectionConfig`]. Not internally synchronized: use
/// from one owner at a time.
pub struct Connection<S = WireStream> {
    stream: Option<S>,
    write_buf: BytesMut,
    config: ConnectionConfig,
}

impl Connection<WireStream> {
    /// Connect to `host:port` over TCP with default configuration.
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        Self::connect_with_config(host, port, ConnectionConfig::default())
    }

    /// Connect to `host:port` over TCP with explicit configuration.
    pub fn connect_with_config(host: &str, port: u16, config: ConnectionConfig) -> Result<Self> {
        let stream = TcpTransport::connect(host, port)?;
        Self::with_config_wire(stream, config)
    }

    /// Wrap a `WireStream` and apply timeouts and `nodelay` from config.
    pub fn with_config_wire(stream: WireStream, config: ConnectionConfig) -> Result<Self> {
        stream.set_read_timeout(config.read_timeout)?;
        stream.set_write_timeout(config.write_timeout)?;
        stream.set_nodelay(config.nodelay)?;
        debug!(?stream, "connection open");
        Ok(Self::with_config(stream, config))
    }

    /// Remote address for TCP connections, `None` once closed.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(WireStream::peer_addr)
    }
}

impl<S: Read + Write> Connection<S> {
    /// Wrap an already-connected stream with default configuration.
    pub fn from_stream(stream: S) -> Self {
        Self::with_config(stream, ConnectionConfig::default())
    }

    /// Wrap an already-connected stream with explicit configuration.
    ///
    /// Timeouts in `config` are not applied to `stream`; see
    /// [`Connection::with_config_wire`].
    pub fn with_config(stream: S, config: ConnectionConfig) -> Self {
        Self {
            stream: Some(stream),
            write_buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write all of `bytes` to the stream (blocking).
    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(ConnectionError::NotConnected)?;
        write_all(stream, bytes)
    }

    /// Read exactly `n` bytes (blocking).
    ///
    /// Loops over partial reads, so the peer may deliver the bytes in chunks
    /// of any size. Fails with [`ConnectionError::ShortRead`] if the stream
    /// ends first.
    pub fn recv(&mut self, n: usize) -> Result<Bytes> {
        let mut buf = vec![0u8; n];
        self.fill(&mut buf)?;
        Ok(Bytes::from(buf))
    }

    /// Read one varint, a single byte at a time (blocking).
    pub fn recv_varint(&mut self) -> Result<u64> {
        let mut decoder = VarintDecoder::new();
        let mut byte = [0u8; 1];
        loop {
            self.fill(&mut byte)?;
            if let Some(value) = decoder.push(byte[0])? {
                trace!(value, "received varint");
                return Ok(value);
            }
        }
    }

    /// Write `varint(len) || payload`.
    pub fn send_message(&mut self, payload: &[u8]) -> Result<()> {
        let max = self.config.max_message_size;
        if payload.len() > max {
            return Err(ConnectionError::MessageTooLarge {
                size: payload.len() as u64,
                max,
            });
        }

        let stream = self.stream.as_mut().ok_or(ConnectionError::NotConnected)?;
        self.write_buf.clear();
        put_varint(payload.len() as u64, &mut self.write_buf);
        self.write_buf.put_slice(payload);
        write_all(stream, &self.write_buf)
    }

    /// Read a varint length prefix, then exactly that many bytes.
    pub fn recv_message(&mut self) -> Result<Bytes> {
        let len = self.recv_varint()?;
        let max = self.config.max_message_size;
        let size = usize::try_from(len)
            .ok()
            .filter(|size| *size <= max)
            .ok_or(ConnectionError::MessageTooLarge { size: len, max })?;
        self.recv(size)
    }

    /// Whether the connection is open. No I/O.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Close the connection, releasing the stream.
    ///
    /// Returns `true` if this call closed it and `false` if it was already
    /// closed.
    pub fn close(&mut self) -> bool {
        match self.stream.take() {
            Some(stream) => {
                drop(stream);
                debug!("connection closed");
                true
            }
            None => false,
        }
    }

    /// Borrow the underlying stream, if still open.
    pub fn get_ref(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    /// Mutably borrow the underlying stream, if still open.
    pub fn get_mut(&mut self) -> Option<&mut S> {
        self.stream.as_mut()
    }

    /// Current connection configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(ConnectionError::NotConnected)?;
        let expected = buf.len();
        let mut filled = 0usize;
        while filled < expected {
            match stream.read(&mut buf[filled..]) {
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
    }
}

fn write_all<S: Write>(stream: &mut S, bytes: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < bytes.len() {
        match stream.write(&bytes[offset..]) {
            Ok(0) => return Err(ConnectionError::Closed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(ConnectionError::Io(err)),
        }
    }

    loop {
        match stream.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(ConnectionError::Io(err)),
        }
    }
}

impl<S> fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.stream.is_some())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use wireprims_codec::{encode_varint, CodecError};

    use super::*;

    /// Hands out one byte per `read` call.
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
        written: Vec<u8>,
    }

    impl ByteByByteReader {
        fn new(bytes: &[u8]) -> Self {
            Self {
                bytes: bytes.to_vec(),
                pos: 0,
                written: Vec::new(),
            }
        }
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    impl Write for ByteByByteReader {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Fails the first read and write with `Interrupted`, then behaves.
    struct InterruptedOnce {
        inner: Cursor<Vec<u8>>,
        read_interrupted: bool,
        write_interrupted: bool,
        written: Vec<u8>,
    }

    impl Read for InterruptedOnce {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.read_interrupted {
                self.read_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    impl Write for InterruptedOnce {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.write_interrupted {
                self.write_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Accepts at most `limit` bytes per `write` call.
    struct TrickleWriter {
        limit: usize,
        written: Vec<u8>,
        calls: usize,
    }

    impl Read for TrickleWriter {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Ok(0)
        }
    }

    impl Write for TrickleWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.calls += 1;
            let n = buf.len().min(self.limit);
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Read for ZeroWriter {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Ok(0)
        }
    }

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn recv_coalesces_single_byte_reads() {
        let mut conn = Connection::from_stream(ByteByByteReader::new(b"foobar"));
        assert_eq!(conn.recv(3).unwrap().as_ref(), b"foo");
        assert_eq!(conn.recv(3).unwrap().as_ref(), b"bar");
    }

    #[test]
    fn recv_zero_bytes_is_empty() {
        let mut conn = Connection::from_stream(Cursor::new(Vec::<u8>::new()));
        assert!(conn.recv(0).unwrap().is_empty());
    }

    #[test]
    fn recv_reports_short_read() {
        let mut conn = Connection::from_stream(Cursor::new(b"fo".to_vec()));
        let err = conn.recv(3).unwrap_err();
        assert!(matches!(
            err,
            ConnectionError::ShortRead {
                expected: 3,
                received: 2
            }
        ));
    }

    #[test]
    fn recv_varint_over_fragmented_stream() {
        let value = 83_752_476_526_753u64;
        let wire = encode_varint(value);
        let mut conn = Connection::from_stream(ByteByByteReader::new(&wire));
        assert_eq!(conn.recv_varint().unwrap(), value);
    }

    #[test]
    fn recv_varint_leaves_following_bytes() {
        let mut wire = encode_varint(300).to_vec();
        wire.extend_from_slice(b"tail");
        let mut conn = Connection::from_stream(Cursor::new(wire));
        assert_eq!(conn.recv_varint().unwrap(), 300);
        assert_eq!(conn.recv(4).unwrap().as_ref(), b"tail");
    }

    #[test]
    fn recv_varint_rejects_overlong_input() {
        let mut conn = Connection::from_stream(Cursor::new(vec![0xFF; 11]));
        let err = conn.recv_varint().unwrap_err();
        assert!(matches!(
            err,
            ConnectionError::Codec(CodecError::MalformedVarint(_))
        ));
    }

    #[test]
    fn recv_varint_rejects_value_wider_than_64_bits() {
        let mut wire = vec![0xFF; 9];
        wire.push(0x7F);
        let mut conn = Connection::from_stream(Cursor::new(wire));
        let err = conn.recv_varint().unwrap_err();
        assert!(matches!(
            err,
            ConnectionError::Codec(CodecError::MalformedVarint(_))
        ));
    }

    #[test]
    fn recv_varint_short_read_mid_value() {
        let mut conn = Connection::from_stream(Cursor::new(vec![0x80, 0x80]));
        let err = conn.recv_varint().unwrap_err();
        assert!(matches!(err, ConnectionError::ShortRead { .. }));
    }

    #[test]
    fn interrupted_reads_and_writes_retry() {
        let mut conn = Connection::from_stream(InterruptedOnce {
            inner: Cursor::new(b"ok".to_vec()),
            read_interrupted: false,
            write_interrupted: false,
            written: Vec::new(),
        });

        conn.send(b"hi").unwrap();
        assert_eq!(conn.recv(2).unwrap().as_ref(), b"ok");
        assert_eq!(conn.get_ref().unwrap().written, b"hi");
    }

    #[test]
    fn send_loops_over_partial_writes() {
        let mut conn = Connection::from_stream(TrickleWriter {
            limit: 2,
            written: Vec::new(),
            calls: 0,
        });
        conn.send(b"abcdefg").unwrap();

        let inner = conn.get_ref().unwrap();
        assert_eq!(inner.written, b"abcdefg");
        assert_eq!(inner.calls, 4);
    }

    #[test]
    fn send_reports_closed_stream() {
        let mut conn = Connection::from_stream(ZeroWriter);
        let err = conn.send(b"x").unwrap_err();
        assert!(matches!(err, ConnectionError::Closed));
    }

    #[test]
    fn message_round_trip_through_buffer() {
        let mut conn = Connection::from_stream(ByteByByteReader::new(&[]));
        conn.send_message(b"hello").unwrap();
        conn.send_message(b"").unwrap();
        let written = conn.get_ref().unwrap().written.clone();
        assert_eq!(written, b"\x05hello\x00");

        let mut conn = Connection::from_stream(ByteByByteReader::new(&written));
        assert_eq!(conn.recv_message().unwrap().as_ref(), b"hello");
        assert!(conn.recv_message().unwrap().is_empty());
    }

    #[test]
    fn recv_message_enforces_max_size() {
        let config = ConnectionConfig {
            max_message_size: 4,
            ..ConnectionConfig::default()
        };
        let wire = [&encode_varint(5)[..], &b"12345"[..]].concat();
        let mut conn = Connection::with_config(Cursor::new(wire), config);
        let err = conn.recv_message().unwrap_err();
        assert!(matches!(
            err,
            ConnectionError::MessageTooLarge { size: 5, max: 4 }
        ));
    }

    #[test]
    fn send_message_enforces_max_size() {
        let config = ConnectionConfig {
            max_message_size: 2,
            ..ConnectionConfig::default()
        };
        let mut conn = Connection::with_config(Cursor::new(Vec::new()), config);
        let err = conn.send_message(b"abc").unwrap_err();
        assert!(matches!(err, ConnectionError::MessageTooLarge { .. }));
    }

    #[test]
    fn connected_state_and_double_close() {
        let mut conn = Connection::from_stream(Cursor::new(Vec::<u8>::new()));
        assert!(conn.is_connected());
        assert!(conn.is_connected());

        assert!(conn.close());
        assert!(!conn.is_connected());
        assert!(!conn.close());
        assert!(!conn.close());
        assert!(!conn.is_connected());
    }

    #[test]
    fn operations_after_close_fail() {
        let mut conn = Connection::from_stream(Cursor::new(b"data".to_vec()));
        conn.close();

        assert!(matches!(conn.send(b"x"), Err(ConnectionError::NotConnected)));
        assert!(matches!(conn.recv(1), Err(ConnectionError::NotConnected)));
        assert!(matches!(
            conn.recv_varint(),
            Err(ConnectionError::NotConnected)
        ));
        assert!(matches!(
            conn.send_message(b"x"),
            Err(ConnectionError::NotConnected)
        ));
        assert!(conn.get_ref().is_none());
        assert!(conn.get_mut().is_none());
    }

    #[test]
    fn io_errors_propagate() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::from(ErrorKind::ConnectionReset))
            }
        }
        impl Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::from(ErrorKind::BrokenPipe))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut conn = Connection::from_stream(Broken);
        let err = conn.recv(1).unwrap_err();
        assert!(matches!(err, ConnectionError::Io(ref e) if e.kind() == ErrorKind::ConnectionReset));
        assert!(err.is_disconnect());
        let err = conn.send(b"x").unwrap_err();
        assert!(matches!(err, ConnectionError::Io(ref e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn debug_shows_state() {
        let mut conn = Connection::from_stream(Cursor::new(Vec::<u8>::new()));
        assert!(format!("{conn:?}").contains("connected: true"));
        conn.close();
        assert!(format!("{conn:?}").contains("connected: false"));
    }

    #[test]
    #[cfg(unix)]
    fn socket_pair_round_trip() {
        let (left, right) = WireStream::pair().unwrap();
        let mut client = Connection::with_config_wire(left, ConnectionConfig::default()).unwrap();
        let mut server = Connection::from_stream(right);

        client.send_message(b"ping").unwrap();
        assert_eq!(server.recv_message().unwrap().as_ref(), b"ping");
        assert_eq!(client.peer_addr(), None);

        assert!(client.close());
        let err = server.recv(1).unwrap_err();
        assert!(matches!(
            err,
            ConnectionError::ShortRead {
                expected: 1,
                received: 0
            }
        ));
    }

    #[test]
    #[cfg(unix)]
    fn read_timeout_from_config_applies() {
        let (left, _right) = WireStream::pair().unwrap();
        let config = ConnectionConfig {
            read_timeout: Some(std::time::Duration::from_millis(20)),
            ..ConnectionConfig::default()
        };
        let mut conn = Connection::with_config_wire(left, config).unwrap();
        let err = conn.recv(1).unwrap_err();
        assert!(matches!(
            err,
            ConnectionError::Io(ref e)
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
        ));
        assert!(conn.is_connected());
    }
}
