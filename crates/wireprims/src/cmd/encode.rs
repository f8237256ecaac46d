use bytes::Bytes;
use wireprims_codec::{ScalarType, Value};

use crate::cmd::{parse_hex, EncodeArgs};
use crate::exit::{codec_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let value = parse_value(args.ty, &args.value)?;
    let wire = args
        .ty
        .encode(&value)
        .map_err(|err| codec_error("encode failed", err))?;

    tracing::debug!(ty = %args.ty, size = wire.len(), "encoded value");
    print_encoded(args.ty, &value, &wire, format);
    Ok(SUCCESS)
}

/// Interpret command-line text as a value for `ty`.
///
/// Integers that do not fit `u64` are retried as `i64` so negative input
/// reaches the codec and fails with its range error.
/// String values are taken verbatim; everything else ignores surrounding
/// whitespace.
pub fn parse_value(ty: ScalarType, raw: &str) -> CliResult<Value> {
    let text = raw.trim();
    match ty {
        ScalarType::Varint
        | ScalarType::Uint32
        | ScalarType::Uint64
        | ScalarType::ZigzagedVarint
        | ScalarType::Sint32
        | ScalarType::Sint64 => text
            .parse::<u64>()
            .map(Value::Unsigned)
            .or_else(|_| text.parse::<i64>().map(Value::Signed))
            .map_err(|_| usage(ty, text)),
        ScalarType::Float => text
            .parse::<f32>()
            .map(Value::Float)
            .map_err(|_| usage(ty, text)),
        ScalarType::Double => text
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| usage(ty, text)),
        ScalarType::Bool => match text {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(usage(ty, text)),
        },
        ScalarType::String => Ok(Value::from(raw)),
        ScalarType::Bytes => parse_hex(text).map(|raw| Value::Bytes(Bytes::from(raw))),
    }
}

fn usage(ty: ScalarType, text: &str) -> CliError {
    CliError::new(USAGE, format!("cannot parse {text:?} as {ty}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::DATA_INVALID;

    #[test]
    fn integers_prefer_unsigned() {
        assert_eq!(
            parse_value(ScalarType::Uint64, "300").unwrap(),
            Value::Unsigned(300)
        );
        assert_eq!(
            parse_value(ScalarType::Sint32, "-1").unwrap(),
            Value::Signed(-1)
        );
        assert_eq!(
            parse_value(ScalarType::Varint, "18446744073709551615").unwrap(),
            Value::Unsigned(u64::MAX)
        );
    }

    #[test]
    fn negative_unsigned_reaches_codec() {
        let value = parse_value(ScalarType::Uint32, "-5").unwrap();
        let err = ScalarType::Uint32.encode(&value).unwrap_err();
        assert_eq!(codec_error("encode failed", err).code, DATA_INVALID);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_value(ScalarType::Sint64, "ten").unwrap_err().code, USAGE);
        assert_eq!(parse_value(ScalarType::Bool, "yes").unwrap_err().code, USAGE);
        assert_eq!(parse_value(ScalarType::Double, "").unwrap_err().code, USAGE);
    }

    #[test]
    fn other_types() {
        assert_eq!(
            parse_value(ScalarType::Float, "1.5").unwrap(),
            Value::Float(1.5)
        );
        assert_eq!(
            parse_value(ScalarType::Bool, "0").unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            parse_value(ScalarType::String, "testing").unwrap(),
            Value::from("testing")
        );
        assert_eq!(
            parse_value(ScalarType::Bytes, "0102").unwrap(),
            Value::Bytes(Bytes::from_static(&[1, 2]))
        );
    }

    #[test]
    fn string_keeps_surrounding_whitespace() {
        assert_eq!(
            parse_value(ScalarType::String, "  a ").unwrap(),
            Value::from("  a ")
        );
        assert_eq!(
            parse_value(ScalarType::Uint32, " 7 ").unwrap(),
            Value::Unsigned(7)
        );
    }
}
