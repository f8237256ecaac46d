use std::io::{IsTerminal, Write};
use std::net::SocketAddr;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use wireprims_codec::{ScalarType, Value};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct EncodeOutput<'a> {
    #[serde(rename = "type")]
    ty: &'a str,
    value: serde_json::Value,
    hex: String,
    size: usize,
}

#[derive(Serialize)]
struct DecodeOutput<'a> {
    #[serde(rename = "type")]
    ty: &'a str,
    value: serde_json::Value,
    consumed: usize,
    trailing: usize,
}

#[derive(Serialize)]
struct MessageOutput {
    size: usize,
    payload: String,
    hex: String,
}

#[derive(Serialize)]
struct ListeningOutput {
    event: &'static str,
    addr: String,
    chunked: bool,
}

pub fn print_encoded(ty: ScalarType, value: &Value, wire: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&EncodeOutput {
            ty: ty.name(),
            value: value_to_json(value),
            hex: hex::encode(wire),
            size: wire.len(),
        }),
        OutputFormat::Table => print_table(
            vec!["TYPE", "VALUE", "HEX", "SIZE"],
            vec![
                ty.name().to_string(),
                value.to_string(),
                hex::encode(wire),
                wire.len().to_string(),
            ],
        ),
        OutputFormat::Pretty => println!("{ty} {value} => {}", hex::encode(wire)),
        OutputFormat::Raw => print_raw(wire),
    }
}

pub fn print_decoded(
    ty: ScalarType,
    value: &Value,
    consumed: usize,
    trailing: usize,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => print_json(&DecodeOutput {
            ty: ty.name(),
            value: value_to_json(value),
            consumed,
            trailing,
        }),
        OutputFormat::Table => print_table(
            vec!["TYPE", "VALUE", "CONSUMED", "TRAILING"],
            vec![
                ty.name().to_string(),
                value.to_string(),
                consumed.to_string(),
                trailing.to_string(),
            ],
        ),
        OutputFormat::Pretty => {
            println!("{ty} {value} (consumed={consumed} trailing={trailing})")
        }
        OutputFormat::Raw => match value.as_bytes() {
            Some(payload) => print_raw(payload),
            None => println!("{value}"),
        },
    }
}

pub fn print_message(payload: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&MessageOutput {
            size: payload.len(),
            payload: payload_preview(payload),
            hex: hex::encode(payload),
        }),
        OutputFormat::Table => print_table(
            vec!["SIZE", "PAYLOAD"],
            vec![payload.len().to_string(), payload_preview(payload)],
        ),
        OutputFormat::Pretty => {
            println!("size={} payload={}", payload.len(), payload_preview(payload))
        }
        OutputFormat::Raw => print_raw(payload),
    }
}

pub fn print_listening(addr: SocketAddr, chunked: bool, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&ListeningOutput {
            event: "listening",
            addr: addr.to_string(),
            chunked,
        }),
        OutputFormat::Raw => println!("{addr}"),
        OutputFormat::Table | OutputFormat::Pretty => {
            let mode = if chunked { "chunked" } else { "plain" };
            println!("listening on {addr} ({mode} echo)");
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json(out: &impl Serialize) {
    println!(
        "{}",
        serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
    );
}

fn print_table(header: Vec<&str>, row: Vec<String>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header)
        .add_row(row);
    println!("{table}");
}

/// JSON rendering of a decoded value. Byte strings become lowercase hex;
/// non-finite floats become `null`.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Unsigned(v) => serde_json::Value::from(*v),
        Value::Signed(v) => serde_json::Value::from(*v),
        Value::Float(v) => float_to_json(f64::from(*v)),
        Value::Double(v) => float_to_json(*v),
        Value::Bool(v) => serde_json::Value::Bool(*v),
        Value::String(s) => serde_json::Value::String(s.to_string_lossy().into_owned()),
        Value::Bytes(b) => serde_json::Value::String(hex::encode(b)),
    }
}

fn float_to_json(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}
