//! Protobuf-style scalar wire codec and framed socket connections.
//!
//! # Crate Structure
//!
//! - [`codec`]: stateless encode/decode of the eleven scalar wire types
//! - [`transport`]: duplex byte streams over TCP (and Unix sockets on unix)
//! - [`conn`]: framed connections with exact-size reads, streaming varint
//!   reads and varint-length-delimited messages
//!
//! ```
//! use wireprims::codec::{decode, encode, Value};
//!
//! let wire = encode(&Value::Signed(-1), "sint32").unwrap();
//! assert_eq!(wire.as_ref(), &[0x01]);
//! assert_eq!(decode(&wire, "sint32").unwrap(), Value::Signed(-1));
//! ```

/// Re-export codec types.
pub mod codec {
    pub use wireprims_codec::*;
}

/// Re-export transport types.
pub mod transport {
    pub use wireprims_transport::*;
}

/// Re-export connection types.
pub mod conn {
    pub use wireprims_conn::*;
}

pub use wireprims_codec::{decode, encode, ScalarType, Value};
pub use wireprims_conn::Connection;
