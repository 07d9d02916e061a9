use std::io::Read;

use cisio_channel::{ChannelConfig, FileArrayInput, FileRowInput};
use cisio_format::{FormatDescriptor, Table, Value};
use tracing::warn;

use crate::cmd::DecodeArgs;
use crate::exit::{
    channel_error, format_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS,
};
use crate::output::{print_array, print_row, OutputFormat};

const SOURCE: &str = "decode";

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let descriptor = args
        .format
        .as_deref()
        .map(FormatDescriptor::parse_escaped)
        .transpose()
        .map_err(|err| format_error("invalid format string", err))?;

    match (&args.path, descriptor) {
        (Some(path), descriptor) if args.table => {
            let mut input = FileArrayInput::open(path, descriptor)
                .map_err(|err| channel_error("open input", err))?;
            let table = input
                .recv()
                .map_err(|err| channel_error("decode table", err))?;
            print_array(&table, input.format(), SOURCE, format);
            Ok(SUCCESS)
        }
        (Some(path), descriptor) => {
            let mut input = FileRowInput::open(path, descriptor)
                .map_err(|err| channel_error("open input", err))?;
            let descriptor = input.format().clone();
            let mut dropped = 0usize;
            for row in input.rows() {
                match row {
                    Ok(values) => print_row(&values, &descriptor, SOURCE, format),
                    Err(err) if err.is_recoverable() => {
                        warn!(%err, "row skipped");
                        dropped += 1;
                    }
                    Err(err) => return Err(channel_error("decode row", err)),
                }
            }
            Ok(if dropped > 0 { DATA_INVALID } else { SUCCESS })
        }
        (None, None) => Err(CliError::usage(
            "--format is required when reading from stdin",
        )),
        (None, Some(descriptor)) => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| io_error("read stdin", err))?;
            if args.table {
                let table = decode_table(&descriptor, &text)?;
                print_array(&table, &descriptor, SOURCE, format);
                return Ok(SUCCESS);
            }
            let (rows, dropped) = decode_rows(&descriptor, &text);
            for values in &rows {
                print_row(values, &descriptor, SOURCE, format);
            }
            Ok(if dropped > 0 { DATA_INVALID } else { SUCCESS })
        }
    }
}

fn data_lines(text: &str) -> impl Iterator<Item = &str> {
    let comment = ChannelConfig::default().comment_prefix;
    text.split_inclusive('\n').filter(move |line| {
        !line.starts_with(comment.as_str()) && !matches!(*line, "\n" | "\r\n")
    })
}

/// Decode one record per line, skipping comments and empty lines, the same
/// way a row file input does. Returns the decoded rows and the number of
/// lines that did not match.
pub fn decode_rows(descriptor: &FormatDescriptor, text: &str) -> (Vec<Vec<Value>>, usize) {
    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for line in data_lines(text) {
        match descriptor.decode_str(line) {
            Ok(values) => rows.push(values),
            Err(err) => {
                warn!(%err, line = line.trim_end(), "row skipped");
                dropped += 1;
            }
        }
    }
    (rows, dropped)
}

pub fn decode_table(descriptor: &FormatDescriptor, text: &str) -> CliResult<Table> {
    let body: String = data_lines(text).collect();
    descriptor
        .decode_table(body.as_bytes())
        .map_err(|err| CliError::new(DATA_INVALID, format!("decode table: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_skip_comments_and_count_mismatches() {
        let descriptor = FormatDescriptor::parse("%s\t%d\n").unwrap();
        let text = "# %s\\t%d\\n\napples\t3\n\npears\tmany\nplums\t7\n";
        let (rows, dropped) = decode_rows(&descriptor, text);
        assert_eq!(dropped, 1);
        assert_eq!(
            rows,
            vec![
                vec![Value::from("apples"), Value::Integer(3)],
                vec![Value::from("plums"), Value::Integer(7)],
            ]
        );
    }

    #[test]
    fn space_only_lines_are_records() {
        let descriptor = FormatDescriptor::parse("%3s\n").unwrap();
        let (rows, dropped) = decode_rows(&descriptor, "  a\n   \n\n");
        assert_eq!(dropped, 0);
        assert_eq!(rows, vec![vec![Value::from("a")], vec![Value::from("")]]);
    }

    #[test]
    fn table_from_text() {
        let descriptor = FormatDescriptor::parse("%d\t%d\n").unwrap();
        let table = decode_table(&descriptor, "# header\n1\t4\n2\t5\n3\t6\n").unwrap();
        assert_eq!(table.rows(), 3);
        assert_eq!(table.row(2), Some(vec![Value::Integer(3), Value::Integer(6)]));
    }

    #[test]
    fn empty_text_is_an_empty_table() {
        let descriptor = FormatDescriptor::parse("%d\n").unwrap();
        assert_eq!(decode_table(&descriptor, "").unwrap().rows(), 0);
    }
}
