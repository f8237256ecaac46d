#![cfg(feature = "cli")]

use std::process::{Command, Output};

fn wireprims(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_wireprims"))
        .args(["--log-level", "error", "--format", "json"])
        .args(args)
        .output()
        .expect("wireprims should run")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be json")
}

#[test]
fn encode_prints_hex() {
    let cases = [
        (["encode", "varint", "300"], "ac02"),
        (["encode", "sint32", "-1"], "01"),
        (["encode", "zigzaged_varint", "-2"], "03"),
        (["encode", "bool", "true"], "01"),
        (["encode", "string", "testing"], "0774657374696e67"),
        (["encode", "bytes", "0102"], "020102"),
        (["encode", "double", "1"], "000000000000f03f"),
    ];

    for (args, hex) in cases {
        let output = wireprims(&args);
        assert!(output.status.success(), "{args:?}: {output:?}");
        let json = stdout_json(&output);
        assert_eq!(json["hex"], hex, "{args:?}");
        assert_eq!(json["type"], args[1]);
    }
}

#[test]
fn decode_reports_value_and_consumed() {
    let output = wireprims(&["decode", "varint", "ac02ff"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["value"], 300);
    assert_eq!(json["consumed"], 2);
    assert_eq!(json["trailing"], 1);

    let output = wireprims(&["decode", "sint64", "0x03"]);
    assert_eq!(stdout_json(&output)["value"], -2);

    let output = wireprims(&["decode", "string", "0774657374696e67"]);
    assert_eq!(stdout_json(&output)["value"], "testing");
}

#[test]
fn pretty_format_is_single_line() {
    let output = Command::new(env!("CARGO_BIN_EXE_wireprims"))
        .args(["--format", "pretty", "encode", "uint64", "1"])
        .output()
        .expect("wireprims should run");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "uint64 1 => 01\n");
}

#[test]
fn invalid_data_exits_60() {
    for args in [
        &["encode", "uint32", "-5"][..],
        &["encode", "sint32", "4294967296"][..],
        &["decode", "varint", ""][..],
        &["decode", "double", "0000"][..],
        &["decode", "bytes", "zz"][..],
    ] {
        let output = wireprims(args);
        assert_eq!(output.status.code(), Some(60), "{args:?}");
        assert!(String::from_utf8_lossy(&output.stderr).starts_with("error: "));
    }
}

#[test]
fn usage_errors_exit_64() {
    for args in [
        &["encode", "int8", "1"][..],
        &["encode", "bool", "maybe"][..],
        &["send", "127.0.0.1:9"][..],
        &["frobnicate"][..],
    ] {
        let output = wireprims(args);
        assert_eq!(output.status.code(), Some(64), "{args:?}");
    }
}

#[test]
fn version_reports_package_version() {
    let output = wireprims(&["version"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("wireprims {}", env!("CARGO_PKG_VERSION"))
    );

    let output = wireprims(&["version", "--extended"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("scalar_types: varint, zigzaged_varint"));
}
