mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "cisio", version, about = "Typed line, row and array channels")]
struct Cli {
    /// How received messages are printed to stdout.
    #[arg(long, value_name = "FORMAT", global = true)]
    output_format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli
        .output_format
        .unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::RelayMode;
    use cisio_channel::ChannelAddress;

    #[test]
    fn parses_row_relay() {
        let cli = Cli::try_parse_from([
            "cisio",
            "relay",
            "row",
            "--input",
            "file:/tmp/in.txt",
            "--output",
            "unix:/tmp/out.sock",
            "--format",
            "%5s\\t%ld\\n",
            "--propagate-eof",
        ])
        .expect("row relay args should parse");

        let Command::Relay(RelayMode::Row(args)) = cli.command else {
            panic!("expected row relay");
        };
        assert_eq!(
            args.endpoints.input,
            ChannelAddress::File("/tmp/in.txt".into())
        );
        assert_eq!(
            args.endpoints.output,
            Some(ChannelAddress::Unix("/tmp/out.sock".into()))
        );
        assert_eq!(args.format.as_deref(), Some("%5s\\t%ld\\n"));
        assert!(args.endpoints.propagate_eof);
    }

    #[test]
    fn rejects_unknown_address_scheme() {
        let err = Cli::try_parse_from([
            "cisio",
            "relay",
            "line",
            "--input",
            "tcp:localhost",
        ])
        .expect_err("unknown scheme should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn encode_accepts_negative_values() {
        let cli = Cli::try_parse_from([
            "cisio", "encode", "--format", "%d %f\\n", "-3", "-0.5",
        ])
        .expect("encode args should parse");

        let Command::Encode(args) = cli.command else {
            panic!("expected encode");
        };
        assert_eq!(args.values, ["-3", "-0.5"]);
    }

    #[test]
    fn output_format_is_global() {
        let cli = Cli::try_parse_from([
            "cisio",
            "format",
            "%s\\n",
            "--output-format",
            "json",
        ])
        .expect("global flag after subcommand should parse");

        assert_eq!(cli.output_format, Some(OutputFormat::Json));
    }
}
