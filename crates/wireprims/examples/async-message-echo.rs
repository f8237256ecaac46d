//! Async echo server built on `DelimitedCodec`.
//!
//! Run with:
//!   cargo run --example async-message-echo --features async
//!
//! In another terminal:
//!   cargo run --features cli -- send 127.0.0.1:7879 --data hello --framed --wait

use tokio::net::TcpListener;
use wireprims::conn::AsyncConnection;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:7879").await?;
    eprintln!("Listening on {}", listener.local_addr()?);

    loop {
        let (stream, peer) = listener.accept().await?;
        eprintln!("Client connected: {peer}");

        tokio::spawn(async move {
            let mut conn = AsyncConnection::from_stream(stream);
            loop {
                match conn.recv_message().await {
                    Ok(message) => {
                        eprintln!("Received {} bytes from {peer}", message.len());
                        if let Err(e) = conn.send_message(&message).await {
                            eprintln!("Reply to {peer} failed: {e}");
                            break;
                        }
                    }
                    Err(e) if e.is_disconnect() => {
                        eprintln!("Client disconnected: {peer}");
                        break;
                    }
                    Err(e) => {
                        eprintln!("Receive from {peer} failed: {e}");
                        break;
                    }
                }
            }
        });
    }
}
