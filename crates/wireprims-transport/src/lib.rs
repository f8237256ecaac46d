//! Blocking duplex stream transport.
//!
//! Provides one stream type over the reliable, ordered byte streams the
//! connection layer runs on:
//! - TCP (all platforms)
//! - Unix domain sockets (unix only)
//!
//! This is the lowest layer of wireprims. Framing lives in `wireprims-conn`
//! on top of the [`WireStream`] type provided here.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::WireStream;
pub use tcp::TcpTransport;
