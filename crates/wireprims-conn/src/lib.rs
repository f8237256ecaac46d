//! Framed connection over a blocking duplex stream.
//!
//! Layers read framing on top of a raw stream:
//! - `recv(n)` blocks until exactly `n` bytes have arrived, however the peer
//!   fragments them
//! - `recv_varint()` reads a base-128 varint one byte at a time
//! - `send_message`/`recv_message` carry varint-length-delimited payloads
//!
//! Connections are `Open` until closed; closing is idempotent.

pub mod config;
pub mod connection;
pub mod error;

#[cfg(feature = "async")]
pub mod async_connection;
#[cfg(feature = "async")]
pub mod codec;

pub use config::{ConnectionConfig, DEFAULT_MAX_MESSAGE_SIZE};
pub use connection::Connection;
pub use error::{ConnectionError, Result};

#[cfg(feature = "async")]
pub use async_connection::AsyncConnection;
#[cfg(feature = "async")]
pub use codec::DelimitedCodec;
