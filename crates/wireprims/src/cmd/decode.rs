use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{codec_error, CliResult, SUCCESS};
use crate::output::{print_decoded, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = parse_hex(&args.hex)?;
    let (value, consumed) = args
        .ty
        .decode_prefix(&input)
        .map_err(|err| codec_error("decode failed", err))?;

    let trailing = input.len() - consumed;
    if trailing > 0 {
        tracing::warn!(ty = %args.ty, consumed, trailing, "ignoring trailing bytes");
    }
    print_decoded(args.ty, &value, consumed, trailing, format);
    Ok(SUCCESS)
}
