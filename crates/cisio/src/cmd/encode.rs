use cisio_format::{FormatDescriptor, Value};

use crate::cmd::EncodeArgs;
use crate::exit::{format_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::print_raw;

pub fn run(args: EncodeArgs) -> CliResult<i32> {
    let descriptor = FormatDescriptor::parse_escaped(&args.format)
        .map_err(|err| format_error("invalid format string", err))?;
    let values = parse_values(&descriptor, &args.values)?;
    let text = descriptor
        .encode(&values)
        .map_err(|err| CliError::new(DATA_INVALID, format!("encode: {err}")))?;
    print_raw(text.as_bytes());
    Ok(SUCCESS)
}

/// Parse command-line tokens into values of the descriptor's field kinds.
/// Complex fields are read either as one `RE,IM` token or as two tokens.
pub fn parse_values(descriptor: &FormatDescriptor, tokens: &[String]) -> CliResult<Vec<Value>> {
    let kinds = if tokens.len() == descriptor.len() {
        descriptor.kinds()
    } else if tokens.len() == descriptor.value_count() {
        descriptor.split_kinds()
    } else {
        return Err(CliError::usage(format!(
            "format has {} fields but {} values were given",
            descriptor.value_count(),
            tokens.len()
        )));
    };
    kinds
        .into_iter()
        .zip(tokens)
        .enumerate()
        .map(|(index, (kind, token))| {
            Value::parse_as(kind, token).ok_or_else(|| {
                CliError::usage(format!("value {index}: cannot read {token:?} as {kind}"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cisio_format::Complex;

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn parses_reference_row() {
        let descriptor =
            FormatDescriptor::parse("%5s\t%ld\t%3.1f\t%3.1lf%+3.1lfj\n").unwrap();
        let values =
            parse_values(&descriptor, &tokens(&["abcde", "5", "1.5", "2.0,-0.5"])).unwrap();
        assert_eq!(
            values,
            vec![
                Value::from("abcde"),
                Value::Integer(5),
                Value::Float(1.5),
                Value::Complex(Complex::new(2.0, -0.5)),
            ]
        );
        assert_eq!(
            descriptor.encode(&values).unwrap(),
            "abcde\t5\t1.5\t2.0-0.5j\n"
        );
    }

    #[test]
    fn complex_field_as_two_tokens() {
        let descriptor =
            FormatDescriptor::parse("%5s\t%ld\t%3.1f\t%3.1lf%+3.1lfj\n").unwrap();
        let values = parse_values(
            &descriptor,
            &tokens(&["abcde", "5", "1.5", "2.0", "-0.5"]),
        )
        .unwrap();
        assert_eq!(values.len(), 5);
        assert_eq!(
            descriptor.encode(&values).unwrap(),
            "abcde\t5\t1.5\t2.0-0.5j\n"
        );
    }

    #[test]
    fn wrong_count_is_usage_error() {
        let descriptor = FormatDescriptor::parse("%s %d\n").unwrap();
        let err = parse_values(&descriptor, &tokens(&["only"])).unwrap_err();
        assert_eq!(err.code, crate::exit::USAGE);
    }

    #[test]
    fn bad_token_names_the_field() {
        let descriptor = FormatDescriptor::parse("%s %d\n").unwrap();
        let err = parse_values(&descriptor, &tokens(&["a", "seven"])).unwrap_err();
        assert!(err.message.starts_with("value 1:"), "{}", err.message);
    }
}
