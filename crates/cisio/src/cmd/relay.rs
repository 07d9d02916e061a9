use std::borrow::Borrow;

use cisio_channel::{ChannelConfig, ChannelRegistry, Deliver, Receive};
use cisio_format::FormatDescriptor;
use tracing::{info, warn};

use crate::cmd::{EndpointArgs, LineRelayArgs, RelayMode, TypedRelayArgs};
use crate::exit::{channel_error, format_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{self, OutputFormat};

const INPUT: &str = "input";
const OUTPUT: &str = "output";

#[derive(Debug, Clone, Copy, Default)]
pub struct RelayOptions {
    pub propagate_eof: bool,
    pub count: Option<usize>,
}

impl From<&EndpointArgs> for RelayOptions {
    fn from(args: &EndpointArgs) -> Self {
        Self {
            propagate_eof: args.propagate_eof,
            count: args.count,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RelaySummary {
    pub relayed: usize,
    pub dropped: usize,
    pub drained: bool,
}

impl RelaySummary {
    fn exit_code(&self) -> i32 {
        if self.dropped > 0 {
            DATA_INVALID
        } else {
            SUCCESS
        }
    }
}

pub fn run(mode: RelayMode, format: OutputFormat) -> CliResult<i32> {
    let summary = match mode {
        RelayMode::Line(args) => relay_lines(args, format)?,
        RelayMode::Row(args) => relay_rows(args, format)?,
        RelayMode::Array(args) => relay_arrays(args, format)?,
    };
    info!(
        relayed = summary.relayed,
        dropped = summary.dropped,
        drained = summary.drained,
        "relay finished"
    );
    Ok(summary.exit_code())
}

fn registry(endpoints: &EndpointArgs, config: ChannelConfig) -> ChannelRegistry {
    let mut registry = ChannelRegistry::with_config(config);
    registry.register(INPUT, endpoints.input.clone());
    if let Some(output) = &endpoints.output {
        registry.register(OUTPUT, output.clone());
    }
    registry
}

fn descriptor(format: Option<&str>) -> CliResult<Option<FormatDescriptor>> {
    format
        .map(FormatDescriptor::parse_escaped)
        .transpose()
        .map_err(|err| format_error("invalid format string", err))
}

fn relay_lines(args: LineRelayArgs, format: OutputFormat) -> CliResult<RelaySummary> {
    let config = ChannelConfig {
        max_line_len: args.max_line_len,
        ..ChannelConfig::default()
    };
    let registry = registry(&args.endpoints, config);
    let mut input = registry
        .open_line_input(INPUT)
        .map_err(|err| channel_error("open input", err))?;
    let mut forward = match args.endpoints.output {
        Some(_) => Some(
            registry
                .open_line_output(OUTPUT)
                .map_err(|err| channel_error("open output", err))?,
        ),
        None => None,
    };

    let quiet = args.endpoints.quiet;
    relay(
        &mut input,
        forward.as_mut(),
        RelayOptions::from(&args.endpoints),
        |line: &String| {
            if !quiet {
                output::print_line(line, INPUT, format);
            }
        },
    )
}

fn relay_rows(args: TypedRelayArgs, format: OutputFormat) -> CliResult<RelaySummary> {
    let config = ChannelConfig {
        write_header: args.header,
        ..ChannelConfig::default()
    };
    let registry = registry(&args.endpoints, config);
    let mut input = registry
        .open_row_input(INPUT, descriptor(args.format.as_deref())?)
        .map_err(|err| channel_error("open input", err))?;
    let descriptor = input.format().clone();
    let mut forward = match args.endpoints.output {
        Some(_) => Some(
            registry
                .open_row_output(OUTPUT, descriptor.clone())
                .map_err(|err| channel_error("open output", err))?,
        ),
        None => None,
    };

    let quiet = args.endpoints.quiet;
    relay(
        &mut input,
        forward.as_mut(),
        RelayOptions::from(&args.endpoints),
        |values: &Vec<cisio_format::Value>| {
            if !quiet {
                output::print_row(values, &descriptor, INPUT, format);
            }
        },
    )
}

fn relay_arrays(args: TypedRelayArgs, format: OutputFormat) -> CliResult<RelaySummary> {
    let config = ChannelConfig {
        write_header: args.header,
        ..ChannelConfig::default()
    };
    let registry = registry(&args.endpoints, config);
    let mut input = registry
        .open_array_input(INPUT, descriptor(args.format.as_deref())?)
        .map_err(|err| channel_error("open input", err))?;
    let descriptor = input.format().clone();
    let mut forward = match args.endpoints.output {
        Some(_) => Some(
            registry
                .open_array_output(OUTPUT, descriptor.clone())
                .map_err(|err| channel_error("open output", err))?,
        ),
        None => None,
    };

    let quiet = args.endpoints.quiet;
    relay(
        &mut input,
        forward.as_mut(),
        RelayOptions::from(&args.endpoints),
        |table: &cisio_format::Table| {
            if !quiet {
                output::print_array(table, &descriptor, INPUT, format);
            }
        },
    )
}

/// Receive until end-of-stream (or `count` items), showing and forwarding
/// each item. Messages that fail to decode are logged and skipped.
pub fn relay<R, D>(
    input: &mut R,
    mut output: Option<&mut D>,
    options: RelayOptions,
    mut show: impl FnMut(&R::Item),
) -> CliResult<RelaySummary>
where
    R: Receive,
    D: Deliver,
    R::Item: Borrow<D::Item>,
{
    let mut summary = RelaySummary::default();
    while options.count.is_none_or(|count| summary.relayed < count) {
        match input.receive() {
            Ok(item) => {
                show(&item);
                if let Some(output) = output.as_deref_mut() {
                    output
                        .deliver(item.borrow())
                        .map_err(|err| channel_error("send", err))?;
                }
                summary.relayed += 1;
            }
            Err(err) if err.is_end_of_stream() => {
                info!("no more input");
                summary.drained = true;
                break;
            }
            Err(err) if err.is_recoverable() => {
                warn!(%err, "message dropped");
                summary.dropped += 1;
            }
            Err(err) => return Err(channel_error("receive", err)),
        }
    }

    if options.propagate_eof {
        if let Some(output) = output {
            output
                .close()
                .map_err(|err| channel_error("close output", err))?;
        }
    }
    Ok(summary)
}
