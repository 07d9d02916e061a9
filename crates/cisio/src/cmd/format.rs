use cisio_format::FormatDescriptor;

use crate::cmd::FormatArgs;
use crate::exit::{format_error, CliResult, SUCCESS};
use crate::output::{print_descriptor, OutputFormat};

pub fn run(args: FormatArgs, format: OutputFormat) -> CliResult<i32> {
    let descriptor = FormatDescriptor::parse_escaped(&args.format)
        .map_err(|err| format_error("invalid format string", err))?;
    print_descriptor(&descriptor, format);
    Ok(SUCCESS)
}
