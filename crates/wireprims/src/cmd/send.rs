use std::fs;

use wireprims_conn::{Connection, ConnectionConfig};

use crate::cmd::{parse_duration, parse_hex, parse_host_port, SendArgs};
use crate::exit::{conn_error, io_error, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let (host, port) = parse_host_port(&args.addr)?;
    let payload = resolve_payload(&args)?;
    let config = ConnectionConfig {
        read_timeout: args
            .wait
            .then(|| parse_duration(&args.wait_timeout))
            .transpose()?,
        ..ConnectionConfig::default()
    };

    let mut conn = Connection::connect_with_config(&host, port, config)
        .map_err(|err| conn_error("connect failed", err))?;

    let sent = if args.framed {
        conn.send_message(&payload)
    } else {
        conn.send(&payload)
    };
    sent.map_err(|err| conn_error("send failed", err))?;
    tracing::debug!(size = payload.len(), framed = args.framed, "payload sent");

    if args.wait {
        let reply = if args.framed {
            conn.recv_message()
        } else {
            conn.recv(payload.len())
        }
        .map_err(|err| conn_error("receive failed", err))?;
        print_message(&reply, format);
    }

    conn.close();
    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(hex) = &args.hex {
        return parse_hex(hex);
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Vec::new())
}
