use std::io::{IsTerminal, Write};

use cisio_format::{escape, FormatDescriptor, Table as DataTable, Value};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Raw
        }
    }
}

#[derive(Serialize)]
struct LineOutput<'a> {
    channel: &'a str,
    line: &'a str,
}

#[derive(Serialize)]
struct RowOutput<'a> {
    channel: &'a str,
    values: &'a [Value],
}

#[derive(Serialize)]
struct ArrayOutput<'a> {
    channel: &'a str,
    rows: usize,
    columns: &'a DataTable,
}

#[derive(Serialize)]
struct FieldOutput {
    index: usize,
    kind: &'static str,
    specifier: String,
    width: Option<usize>,
    precision: Option<usize>,
    literal: String,
}

#[derive(Serialize)]
struct DescriptorOutput<'a> {
    format: String,
    prefix: String,
    field_count: usize,
    fields: &'a [FieldOutput],
}

pub fn print_line(line: &str, channel: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&LineOutput { channel, line }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["CHANNEL", "LINE"]);
            table.add_row(vec![channel.to_string(), escape(line)]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{channel}: {}", line.trim_end_matches('\n')),
        OutputFormat::Raw => print_raw(line.as_bytes()),
    }
}

pub fn print_row(
    values: &[Value],
    descriptor: &FormatDescriptor,
    channel: &str,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => print_json(&RowOutput { channel, values }),
        OutputFormat::Table => {
            let mut table = new_table(field_headers(descriptor));
            table.add_row(values.iter().map(Value::to_string).collect::<Vec<_>>());
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let joined = values
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            println!("{channel}: {joined}");
        }
        OutputFormat::Raw => match descriptor.encode(values) {
            Ok(text) => print_raw(text.as_bytes()),
            Err(err) => tracing::warn!(%err, "row cannot be re-encoded"),
        },
    }
}

pub fn print_array(
    data: &DataTable,
    descriptor: &FormatDescriptor,
    channel: &str,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => print_json(&ArrayOutput {
            channel,
            rows: data.rows(),
            columns: data,
        }),
        OutputFormat::Table => {
            let mut table = new_table(field_headers(descriptor));
            for index in 0..data.rows() {
                if let Some(row) = data.row(index) {
                    table.add_row(row.iter().map(Value::to_string).collect::<Vec<_>>());
                }
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{channel}: {} rows", data.rows());
            for index in 0..data.rows() {
                if let Some(row) = data.row(index) {
                    let joined = row
                        .iter()
                        .map(Value::to_string)
                        .collect::<Vec<_>>()
                        .join(" ");
                    println!("  {joined}");
                }
            }
        }
        OutputFormat::Raw => match descriptor.encode_table(data) {
            Ok(text) => print_raw(text.as_bytes()),
            Err(err) => tracing::warn!(%err, "table cannot be re-encoded"),
        },
    }
}

pub fn print_descriptor(descriptor: &FormatDescriptor, format: OutputFormat) {
    let fields: Vec<FieldOutput> = descriptor
        .fields()
        .iter()
        .enumerate()
        .map(|(index, field)| FieldOutput {
            index,
            kind: field.kind.as_str(),
            specifier: field.specifier_text(),
            width: field.width(),
            precision: field.precision(),
            literal: escape(&field.literal),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&DescriptorOutput {
            format: escape(descriptor.as_str()),
            prefix: escape(descriptor.prefix()),
            field_count: fields.len(),
            fields: &fields,
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["#", "KIND", "SPEC", "WIDTH", "PRECISION", "LITERAL"]);
            for field in &fields {
                table.add_row(vec![
                    field.index.to_string(),
                    field.kind.to_string(),
                    field.specifier.clone(),
                    optional(field.width),
                    optional(field.precision),
                    field.literal.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!("format: {}", escape(descriptor.as_str()));
            if !descriptor.prefix().is_empty() {
                println!("prefix: {}", escape(descriptor.prefix()));
            }
            for field in &fields {
                println!(
                    "  {}: {} {} literal={:?}",
                    field.index, field.kind, field.specifier, field.literal
                );
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout().lock();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn new_table<T: ToString>(header: Vec<T>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().map(ToString::to_string).collect::<Vec<_>>());
    table
}

fn field_headers(descriptor: &FormatDescriptor) -> Vec<String> {
    descriptor
        .fields()
        .iter()
        .map(|field| field.specifier_text())
        .collect()
}

fn optional(value: Option<usize>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
