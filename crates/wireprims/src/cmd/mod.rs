use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Args, Subcommand};
use wireprims_codec::ScalarType;

use crate::exit::{CliError, CliResult, DATA_INVALID, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod echo;
pub mod encode;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a value as a scalar wire type and print the bytes as hex.
    Encode(EncodeArgs),
    /// Decode hex bytes as a scalar wire type.
    Decode(DecodeArgs),
    /// Start a TCP echo server.
    Echo(EchoArgs),
    /// Send a payload to a TCP peer.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Echo(args) => echo::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Wire type (varint, zigzaged_varint, sint32, sint64, uint32, uint64,
    /// float, double, bool, string, bytes).
    #[arg(value_name = "TYPE")]
    pub ty: ScalarType,
    /// Value to encode. `bytes` takes hex.
    #[arg(allow_hyphen_values = true)]
    pub value: String,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Wire type to decode as.
    #[arg(value_name = "TYPE")]
    pub ty: ScalarType,
    /// Hex-encoded input bytes (`0x` prefix and whitespace allowed).
    pub hex: String,
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Address to bind (e.g. 127.0.0.1:0 for an ephemeral port).
    pub addr: String,
    /// Trickle replies back a byte at a time.
    #[arg(long)]
    pub chunked: bool,
    /// Delay before each of the first `--chunk-limit` bytes of a read (e.g. 200ms, 1s).
    #[arg(long, default_value = "200ms")]
    pub chunk_delay: String,
    /// Number of delayed bytes per read in chunked mode.
    #[arg(long, default_value_t = 7)]
    pub chunk_limit: usize,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("payload").required(true).args(["data", "hex", "file"])))]
pub struct SendArgs {
    /// Peer address as HOST:PORT.
    pub addr: String,
    /// Raw string payload.
    #[arg(long)]
    pub data: Option<String>,
    /// Hex-encoded payload.
    #[arg(long)]
    pub hex: Option<String>,
    /// Read payload from file.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Prefix the payload with its varint length.
    #[arg(long)]
    pub framed: bool,
    /// Wait for the echoed payload and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the reply when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}

/// Parse hex input, ignoring an optional `0x` prefix and any whitespace.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let trimmed = input.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&digits).map_err(|err| CliError::new(DATA_INVALID, format!("invalid hex: {err}")))
}

/// Split `HOST:PORT`, accepting bracketed IPv6 hosts.
pub fn parse_host_port(addr: &str) -> CliResult<(String, u16)> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| CliError::new(USAGE, format!("expected HOST:PORT, got {addr}")))?;
    let port = port
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid port in {addr}")))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(CliError::new(USAGE, format!("missing host in {addr}")));
    }
    Ok((host.to_string(), port))
}
