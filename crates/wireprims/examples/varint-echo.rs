//! Message echo server: reads varint-delimited messages, decodes each as a
//! `sint64`, and replies with the value incremented by one.
//!
//! Run with:
//!   cargo run --example varint-echo
//!
//! In another terminal (`0x03` is -2 zigzag-encoded; the reply is -1):
//!   cargo run --features cli -- send 127.0.0.1:7878 --hex 03 --framed --wait

use wireprims::codec::{ScalarType, Value};
use wireprims::conn::Connection;
use wireprims::transport::TcpTransport;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpTransport::bind("127.0.0.1:7878")?;
    eprintln!("Listening on {}", listener.local_addr());

    let mut conn = Connection::from_stream(listener.accept()?);
    eprintln!("Client connected");

    loop {
        let message = match conn.recv_message() {
            Ok(message) => message,
            Err(e) if e.is_disconnect() => {
                eprintln!("Client disconnected");
                break;
            }
            Err(e) => return Err(e.into()),
        };

        let value = ScalarType::Sint64.decode(&message)?;
        let next = value.as_i64().unwrap_or_default().saturating_add(1);
        eprintln!("Received {value}, replying {next}");

        let reply = ScalarType::Sint64.encode(&Value::Signed(next))?;
        conn.send_message(&reply)?;
    }

    Ok(())
}
