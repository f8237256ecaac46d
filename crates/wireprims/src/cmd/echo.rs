use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use wireprims_transport::TcpTransport;

use crate::cmd::{parse_duration, EchoArgs};
use crate::exit::{transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_listening, OutputFormat};

/// How replies are written back to the client.
#[derive(Debug, Clone, Copy)]
enum EchoMode {
    /// Write each read back in one go.
    Plain,
    /// Write a byte at a time, sleeping `delay` before each of the first
    /// `limit` bytes of every read.
    Chunked { delay: Duration, limit: usize },
}

pub fn run(args: EchoArgs, format: OutputFormat) -> CliResult<i32> {
    let mode = if args.chunked {
        EchoMode::Chunked {
            delay: parse_duration(&args.chunk_delay)?,
            limit: args.chunk_limit,
        }
    } else {
        EchoMode::Plain
    };

    let listener =
        TcpTransport::bind(&args.addr).map_err(|err| transport_error("bind failed", err))?;
    let local_addr = listener.local_addr();

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone(), local_addr)?;

    print_listening(local_addr, args.chunked, format);

    while running.load(Ordering::SeqCst) {
        let stream = match listener.accept() {
            Ok(stream) => stream,
            Err(err) => return Err(transport_error("accept failed", err)),
        };
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let peer = stream.peer_addr();
        thread::spawn(move || {
            tracing::info!(?peer, "client connected");
            match serve(stream, mode) {
                Ok(total) => tracing::info!(?peer, total, "client disconnected"),
                Err(err) => tracing::warn!(?peer, error = %err, "echo session failed"),
            }
        });
    }

    tracing::info!("echo server stopped");
    Ok(SUCCESS)
}

/// Echo until the client closes its side. Returns the number of bytes echoed.
fn serve<S: Read + Write>(mut stream: S, mode: EchoMode) -> io::Result<u64> {
    let mut buf = [0u8; 8192];
    let mut total = 0u64;
    loop {
        let n = match stream.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        tracing::debug!(size = n, "echoing chunk");
        reply(&mut stream, &buf[..n], mode)?;
        total += n as u64;
    }
}

fn reply<W: Write>(out: &mut W, chunk: &[u8], mode: EchoMode) -> io::Result<()> {
    match mode {
        EchoMode::Plain => out.write_all(chunk)?,
        EchoMode::Chunked { delay, limit } => {
            for (i, byte) in chunk.iter().enumerate() {
                if i < limit && !delay.is_zero() {
                    thread::sleep(delay);
                }
                out.write_all(std::slice::from_ref(byte))?;
                out.flush()?;
            }
        }
    }
    out.flush()
}

fn install_ctrlc_handler(running: Arc<AtomicBool>, local_addr: SocketAddr) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
        // Wake the blocking accept so the loop observes the flag.
        wake(local_addr);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

fn wake(local_addr: SocketAddr) {
    let host = if local_addr.ip().is_unspecified() {
        "127.0.0.1".to_string()
    } else {
        local_addr.ip().to_string()
    };
    if let Ok(stream) = TcpTransport::connect(&host, local_addr.port()) {
        let _ = stream.shutdown();
    }
}
