use std::time::Duration;

/// Default maximum length accepted by `recv_message`: 16 MiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Configuration for a framed connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Read timeout applied to the stream. Default: none (block forever).
    pub read_timeout: Option<Duration>,
    /// Write timeout applied to the stream. Default: none.
    pub write_timeout: Option<Duration>,
    /// Largest length prefix `recv_message` will honor, and the largest
    /// payload `send_message` will write. Default: 16 MiB.
    pub max_message_size: usize,
    /// Disable Nagle's algorithm on TCP streams. Default: true.
    pub nodelay: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            read_timeout: None,
            write_timeout: None,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            nodelay: true,
        }
    }
}
