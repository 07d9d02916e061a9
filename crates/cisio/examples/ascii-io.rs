//! Copies a text file line by line, a table row by row and a table as a
//! whole array, printing everything it receives.
//!
//! Run with:
//!   cargo run --example ascii-io

use std::fs;

use cisio::channel::{FileArrayInput, FileArrayOutput, FileLineInput, FileLineOutput, FileMode};
use cisio::channel::{FileRowInput, FileRowOutput};
use cisio::FormatDescriptor;

const FORMAT: &str = "%5s\t%ld\t%3.1f\t%3.1lf%+3.1lfj\n";

const LINES: &str = "# A comment line is copied like any other\nline one\nline two\n";
const TABLE: &str = "# %5s\\t%ld\\t%3.1f\\t%3.1lf%+3.1lfj\\n\n\
one\t1\t1.0\t1.0+0.1j\n\
two\t2\t2.0\t2.0-0.2j\n\
three\t3\t3.0\t3.0+0.3j\n";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join(format!("cisio-ascii-io-{}", std::process::id()));
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("input.txt"), LINES)?;
    fs::write(dir.join("table.txt"), TABLE)?;

    let format = FormatDescriptor::parse(FORMAT)?;

    println!("ascii-io: receiving/sending text file");
    let mut file_in = FileLineInput::open(dir.join("input.txt"))?;
    let mut file_out = FileLineOutput::create(dir.join("output.txt"), FileMode::Truncate)?;
    for line in file_in.lines() {
        let line = line?;
        print!("File: {line}");
        file_out.send_line(&line)?;
    }
    println!("End of file input");
    file_out.close()?;

    println!("ascii-io: receiving/sending table");
    let mut table_in = FileRowInput::open(dir.join("table.txt"), None)?;
    let mut table_out =
        FileRowOutput::create(dir.join("table-rows.txt"), FileMode::Truncate, format.clone())?;
    loop {
        match table_in.recv_as::<(String, i64, f64, f64, f64)>() {
            Ok((name, number, value, re, im)) => {
                println!("Table: {name:.5}, {number}, {value:3.1}, {re:3.1}{im:+3.1}j");
                table_out.send_row((name, number, value, re, im))?;
            }
            Err(err) if err.is_end_of_stream() => {
                println!("End of table input");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }
    table_out.close()?;

    println!("ascii-io: receiving/sending table as array");
    let mut array_in = FileArrayInput::open(dir.join("table.txt"), None)?;
    let mut array_out =
        FileArrayOutput::create(dir.join("table-array.txt"), FileMode::Truncate, format)?;
    for table in array_in.tables() {
        let table = table?;
        println!("Array: ({} rows)", table.rows());
        for index in 0..table.rows() {
            if let Some(row) = table.row(index) {
                let row: Vec<String> = row.iter().map(ToString::to_string).collect();
                println!("{}", row.join(", "));
            }
        }
        array_out.send(&table)?;
    }
    println!("End of array input");
    array_out.close()?;

    for name in ["output.txt", "table-rows.txt", "table-array.txt"] {
        println!("--- {name}");
        print!("{}", fs::read_to_string(dir.join(name))?);
    }

    fs::remove_dir_all(&dir)?;
    Ok(())
}
