use clap::{Args, Subcommand};
use std::path::PathBuf;

use cisio_channel::{ChannelAddress, DEFAULT_MAX_LINE_LEN};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod format;
pub mod relay;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Receive from one channel, print each message and forward it to another.
    #[command(subcommand)]
    Relay(RelayMode),
    /// Parse a format string and list its fields.
    Format(FormatArgs),
    /// Encode one row of values with a format string.
    Encode(EncodeArgs),
    /// Decode formatted rows from a file or stdin.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Relay(mode) => relay::run(mode, format),
        Command::Format(args) => format::run(args, format),
        Command::Encode(args) => encode::run(args),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Subcommand, Debug)]
pub enum RelayMode {
    /// Relay text lines verbatim.
    Line(LineRelayArgs),
    /// Relay one formatted row per message.
    Row(TypedRelayArgs),
    /// Relay whole tables.
    Array(TypedRelayArgs),
}

#[derive(Args, Debug)]
pub struct EndpointArgs {
    /// Input channel address (unix:<path>, file:<path>).
    #[arg(long, short = 'i', env = "CISIO_INPUT", value_name = "ADDRESS")]
    pub input: ChannelAddress,
    /// Output channel address (unix:<path>, file:<path>, append:<path>).
    #[arg(long, short = 'o', env = "CISIO_OUTPUT", value_name = "ADDRESS")]
    pub output: Option<ChannelAddress>,
    /// Send end-of-stream on the output when the relay stops.
    #[arg(long)]
    pub propagate_eof: bool,
    /// Stop after relaying N messages.
    #[arg(long, value_name = "N")]
    pub count: Option<usize>,
    /// Do not print received messages.
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

#[derive(Args, Debug)]
pub struct LineRelayArgs {
    #[command(flatten)]
    pub endpoints: EndpointArgs,
    /// Longest line accepted, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_LEN)]
    pub max_line_len: usize,
}

#[derive(Args, Debug)]
pub struct TypedRelayArgs {
    #[command(flatten)]
    pub endpoints: EndpointArgs,
    /// Row format string (escapes like \t and \n are expanded). Optional when
    /// the input file carries a format header.
    #[arg(long, short = 'f', env = "CISIO_FORMAT", value_name = "FORMAT")]
    pub format: Option<String>,
    /// Write a `# <format>` header line to an empty output file.
    #[arg(long)]
    pub header: bool,
}

#[derive(Args, Debug)]
pub struct FormatArgs {
    /// Format string (escapes like \t and \n are expanded).
    pub format: String,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Format string (escapes like \t and \n are expanded).
    #[arg(long, short = 'f', env = "CISIO_FORMAT", value_name = "FORMAT")]
    pub format: String,
    /// One value per field; a complex value is written RE,IM or as two values.
    #[arg(allow_hyphen_values = true)]
    pub values: Vec<String>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Format string (escapes like \t and \n are expanded). Optional when the
    /// file carries a format header.
    #[arg(long, short = 'f', env = "CISIO_FORMAT", value_name = "FORMAT")]
    pub format: Option<String>,
    /// Read from this file instead of stdin.
    pub path: Option<PathBuf>,
    /// Decode the whole input as one table.
    #[arg(long)]
    pub table: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
