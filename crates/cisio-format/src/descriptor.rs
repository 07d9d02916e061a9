use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::{CodecError, FormatError};
use crate::escape::unescape;
use crate::parser;
use crate::render::{render_float, render_integer, render_text, truncate};
use crate::scan::{check_int_range, Scanner};
use crate::spec::{FieldKind, FieldSpec};
use crate::table::{Column, Table};
use crate::value::{Complex, Value, ValueRef};

/// A parsed printf-style format: literal prefix, then typed fields each
/// followed by their own literal text.
///
/// Descriptors are immutable once parsed and cheap to clone; every endpoint
/// carries its own copy.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatDescriptor {
    source: String,
    prefix: String,
    fields: Vec<FieldSpec>,
}

impl FormatDescriptor {
    /// Parse a format string as written (real tabs and newlines).
    pub fn parse(format: &str) -> Result<Self, FormatError> {
        let parsed = parser::parse(format)?;
        tracing::debug!(
            format = %crate::escape::escape(format),
            fields = parsed.fields.len(),
            "parsed format descriptor"
        );
        Ok(Self {
            source: format.to_string(),
            prefix: parsed.prefix,
            fields: parsed.fields,
        })
    }

    /// Parse a format string written with `\t`/`\n` escapes.
    pub fn parse_escaped(format: &str) -> Result<Self, FormatError> {
        Self::parse(&unescape(format))
    }

    /// The format string this descriptor was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Literal text before the first field.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Number of fields per record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false: a descriptor without fields fails to parse.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn kinds(&self) -> Vec<FieldKind> {
        self.fields.iter().map(|f| f.kind).collect()
    }

    /// Number of scalar values per record. A complex field counts twice,
    /// once for its real part and once for its imaginary part.
    pub fn value_count(&self) -> usize {
        self.fields
            .iter()
            .map(|f| if f.kind == FieldKind::Complex { 2 } else { 1 })
            .sum()
    }

    /// Kinds of the split row layout, with each complex field as two floats.
    pub fn split_kinds(&self) -> Vec<FieldKind> {
        self.fields
            .iter()
            .flat_map(|f| match f.kind {
                FieldKind::Complex => vec![FieldKind::Float, FieldKind::Float],
                kind => vec![kind],
            })
            .collect()
    }

    /// Check a caller-supplied field count.
    pub fn check_arity(&self, found: usize) -> Result<(), CodecError> {
        if found == self.fields.len() {
            Ok(())
        } else {
            Err(CodecError::FieldCount {
                expected: self.fields.len(),
                found,
            })
        }
    }

    /// Check caller-supplied kinds against the fields. `None` accepts any
    /// kind.
    pub fn check_kinds(&self, kinds: &[Option<FieldKind>]) -> Result<(), CodecError> {
        self.check_arity(kinds.len())?;
        for (field, (spec, kind)) in self.fields.iter().zip(kinds).enumerate() {
            if let Some(found) = *kind {
                if found != spec.kind {
                    return Err(CodecError::TypeMismatch {
                        field,
                        expected: spec.kind,
                        found,
                    });
                }
            }
        }
        Ok(())
    }

    /// Check the kinds of a caller-supplied row. Rows carry either one value
    /// per field or the split layout of [`split_kinds`](Self::split_kinds).
    pub fn check_row_kinds(&self, kinds: &[Option<FieldKind>]) -> Result<(), CodecError> {
        if kinds.len() == self.fields.len() {
            return self.check_kinds(kinds);
        }
        if kinds.len() != self.value_count() {
            return Err(self.row_count_error(kinds.len()));
        }
        for (field, (expected, kind)) in self.split_kinds().into_iter().zip(kinds).enumerate() {
            if let Some(found) = *kind {
                if found != expected {
                    return Err(CodecError::TypeMismatch {
                        field,
                        expected,
                        found,
                    });
                }
            }
        }
        Ok(())
    }

    fn row_count_error(&self, found: usize) -> CodecError {
        CodecError::FieldCount {
            expected: self.value_count(),
            found,
        }
    }

    /// Fold a split row into one value per field: each complex field takes
    /// the next two floats as its real and imaginary parts.
    pub fn join_complex<'a>(&self, values: &'a [Value]) -> Result<Cow<'a, [Value]>, CodecError> {
        if values.len() == self.fields.len() {
            return Ok(Cow::Borrowed(values));
        }
        if values.len() != self.value_count() {
            return Err(self.row_count_error(values.len()));
        }

        let mut joined = Vec::with_capacity(self.fields.len());
        let mut rest = values.iter();
        for field in &self.fields {
            let Some(first) = rest.next() else { break };
            if field.kind != FieldKind::Complex {
                joined.push(first.clone());
                continue;
            }
            let re = float_part(joined.len(), first)?;
            let im = match rest.next() {
                Some(second) => float_part(joined.len(), second)?,
                None => return Err(self.row_count_error(values.len())),
            };
            joined.push(Value::Complex(Complex::new(re, im)));
        }
        Ok(Cow::Owned(joined))
    }

    /// Render one record from one value per field or from the split layout.
    pub fn encode(&self, values: &[Value]) -> Result<String, CodecError> {
        let values = self.join_complex(values)?;
        let mut out = self.prefix.clone();
        for (index, (field, value)) in self.fields.iter().zip(values.iter()).enumerate() {
            encode_field(&mut out, index, field, value.view())?;
        }
        Ok(out)
    }

    /// Render every row of `table`, one record after another. A zero-row
    /// table renders as an empty string.
    pub fn encode_table(&self, table: &Table) -> Result<String, CodecError> {
        let kinds: Vec<Option<FieldKind>> = table.kinds().into_iter().map(Some).collect();
        self.check_kinds(&kinds)?;

        let mut out = String::new();
        for row in 0..table.rows() {
            out.push_str(&self.prefix);
            for (index, (field, column)) in self.fields.iter().zip(table.columns()).enumerate() {
                let value = column.get(row).ok_or(CodecError::ColumnLength {
                    column: index,
                    len: column.len(),
                    expected: table.rows(),
                })?;
                encode_field(&mut out, index, field, value)?;
            }
        }
        Ok(out)
    }

    /// Decode exactly one record; the whole input must be consumed.
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<Value>, CodecError> {
        self.decode_str(std::str::from_utf8(bytes)?)
    }

    pub fn decode_str(&self, input: &str) -> Result<Vec<Value>, CodecError> {
        let (values, used) = self.decode_prefix(input)?;
        if used != input.len() {
            return Err(CodecError::TrailingBytes { offset: used });
        }
        Ok(values)
    }

    /// Decode one record from the start of `input`, returning the values and
    /// the number of bytes consumed.
    pub fn decode_prefix(&self, input: &str) -> Result<(Vec<Value>, usize), CodecError> {
        let mut scanner = Scanner::new(input);
        scanner.literal(&self.prefix)?;
        let mut values = Vec::with_capacity(self.fields.len());
        for (index, field) in self.fields.iter().enumerate() {
            values.push(scanner.field(index, field)?);
            scanner.literal_or_end(&field.literal)?;
        }
        Ok((values, scanner.pos()))
    }

    /// Decode a sequence of records into columns. Empty input is a
    /// zero-row table.
    pub fn decode_table(&self, bytes: &[u8]) -> Result<Table, CodecError> {
        let input = std::str::from_utf8(bytes)?;
        let mut columns: Vec<Column> =
            self.fields.iter().map(|f| Column::empty(f.kind)).collect();

        let mut pos = 0;
        while pos < input.len() {
            let (values, used) = self
                .decode_prefix(&input[pos..])
                .map_err(|err| err.shifted(pos))?;
            if used == 0 {
                return Err(CodecError::TrailingBytes { offset: pos });
            }
            for (field, (column, value)) in columns.iter_mut().zip(values).enumerate() {
                column.push(field, value)?;
            }
            pos += used;
        }
        Table::new(columns)
    }
}

fn float_part(field: usize, value: &Value) -> Result<f64, CodecError> {
    value.as_float().ok_or(CodecError::TypeMismatch {
        field,
        expected: FieldKind::Float,
        found: value.kind(),
    })
}

fn encode_field(
    out: &mut String,
    index: usize,
    field: &FieldSpec,
    value: ValueRef<'_>,
) -> Result<(), CodecError> {
    match (field.kind, value) {
        (FieldKind::Text, ValueRef::Text(text)) => {
            let shown = truncate(text, field.precision());
            check_text(index, field, shown)?;
            render_text(out, &field.conversion, shown);
        }
        (FieldKind::Integer, ValueRef::Integer(v)) => {
            check_int_range(index, v, field.conversion.int_bits())?;
            render_integer(out, &field.conversion, v);
        }
        (FieldKind::Float, ValueRef::Float(v)) => render_float(out, &field.conversion, v),
        (FieldKind::Complex, ValueRef::Complex(v)) => {
            render_float(out, &field.conversion, v.re);
            let imag = field.imaginary.as_ref().unwrap_or(&field.conversion);
            render_float(out, imag, v.im);
            out.push('j');
        }
        (expected, found) => {
            return Err(CodecError::TypeMismatch {
                field: index,
                expected,
                found: found.kind(),
            })
        }
    }
    out.push_str(&field.literal);
    Ok(())
}

/// Reject text that would not scan back as the same value.
fn check_text(index: usize, field: &FieldSpec, text: &str) -> Result<(), CodecError> {
    let invalid = |reason: &str| CodecError::InvalidValue {
        field: index,
        reason: reason.to_string(),
    };
    let conv = &field.conversion;

    if let Some(max) = conv.width {
        if text.len() > max {
            return Err(CodecError::Overflow {
                field: index,
                len: text.len(),
                max,
            });
        }
    }
    if text.contains('\n') {
        return Err(invalid("text contains a newline"));
    }
    if !field.literal.is_empty() && text.contains(field.literal.as_str()) {
        return Err(invalid("text contains the field delimiter"));
    }
    if field.literal.is_empty()
        && conv.width.is_none()
        && (text.is_empty() || text.contains(char::is_whitespace))
    {
        return Err(invalid("undelimited text must be a single non-empty word"));
    }
    if conv.pads_left() && text.starts_with(' ') {
        return Err(invalid("leading space in right-aligned text"));
    }
    if conv.pads_right() && text.ends_with(' ') {
        return Err(invalid("trailing space in left-aligned text"));
    }
    Ok(())
}

impl FromStr for FormatDescriptor {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::IntoTable;
    use crate::value::Complex;

    const TABLE_FORMAT: &str = "%5s\t%ld\t%3.1f\t%3.1lf%+3.1lfj\n";

    fn table_row(name: &str, n: i64, x: f64, z: Complex) -> Vec<Value> {
        vec![Value::from(name), Value::from(n), Value::from(x), Value::from(z)]
    }

    #[test]
    fn reference_row_encodes_and_decodes() {
        let desc = FormatDescriptor::parse(TABLE_FORMAT).unwrap();
        assert_eq!(
            desc.kinds(),
            vec![
                FieldKind::Text,
                FieldKind::Integer,
                FieldKind::Float,
                FieldKind::Complex
            ]
        );

        let row = table_row("one", 1, 1.0, Complex::new(1.0, 1.0));
        let line = desc.encode(&row).unwrap();
        assert_eq!(line, "  one\t1\t1.0\t1.0+1.0j\n");
        assert_eq!(desc.decode(line.as_bytes()).unwrap(), row);
    }

    #[test]
    fn each_kind_survives_encode_decode() {
        let cases: &[(&str, Value)] = &[
            ("%s\n", Value::from("word")),
            ("%-8s|\n", Value::from("left")),
            ("%d\n", Value::Integer(-17)),
            ("%+06d\n", Value::Integer(42)),
            ("%lld\n", Value::Integer(i64::MAX)),
            ("%.3e\n", Value::Float(1.25e-7)),
            ("%10.4f\n", Value::Float(-2.5)),
            ("%f%+fj\n", Value::from(Complex::new(-1.5, 0.25))),
        ];
        for (format, value) in cases {
            let desc = FormatDescriptor::parse(format).unwrap();
            let encoded = desc.encode(std::slice::from_ref(value)).unwrap();
            assert_eq!(
                desc.decode_str(&encoded).unwrap(),
                vec![value.clone()],
                "format {format:?} encoded as {encoded:?}"
            );
        }
    }

    #[test]
    fn prefix_literal_is_rendered_and_checked() {
        let desc = FormatDescriptor::parse("row=%d;\n").unwrap();
        assert_eq!(desc.prefix(), "row=");
        assert_eq!(desc.encode(&[Value::Integer(3)]).unwrap(), "row=3;\n");
        assert!(matches!(
            desc.decode_str("col=3;\n").err().unwrap(),
            CodecError::Literal { offset: 0, .. }
        ));
    }

    #[test]
    fn encode_checks_count_and_kinds() {
        let desc = FormatDescriptor::parse(TABLE_FORMAT).unwrap();
        assert_eq!(
            desc.encode(&[Value::from("a")]).err().unwrap(),
            CodecError::FieldCount {
                expected: 5,
                found: 1
            }
        );
        let err = desc
            .encode(&[
                Value::from("a"),
                Value::from(1.0),
                Value::from(1.0),
                Value::from(Complex::default()),
            ])
            .err()
            .unwrap();
        assert_eq!(
            err,
            CodecError::TypeMismatch {
                field: 1,
                expected: FieldKind::Integer,
                found: FieldKind::Float
            }
        );
    }

    #[test]
    fn complex_field_accepts_two_adjacent_floats() {
        let desc = FormatDescriptor::parse(TABLE_FORMAT).unwrap();
        assert_eq!(desc.len(), 4);
        assert_eq!(desc.value_count(), 5);
        assert_eq!(
            desc.split_kinds(),
            vec![
                FieldKind::Text,
                FieldKind::Integer,
                FieldKind::Float,
                FieldKind::Float,
                FieldKind::Float
            ]
        );

        let split = [
            Value::from("abcde"),
            Value::from(5i64),
            Value::from(1.5),
            Value::from(2.0),
            Value::from(-0.5),
        ];
        let line = desc.encode(&split).unwrap();
        assert_eq!(line, "abcde\t5\t1.5\t2.0-0.5j\n");
        assert_eq!(
            desc.encode(&table_row("abcde", 5, 1.5, Complex::new(2.0, -0.5)))
                .unwrap(),
            line
        );
        assert_eq!(
            crate::value::split_complex(desc.decode_str(&line).unwrap()),
            split.to_vec()
        );
    }

    #[test]
    fn split_layout_checks_each_part() {
        let desc = FormatDescriptor::parse("%d %f%+fj\n").unwrap();
        let err = desc
            .encode(&[Value::Integer(1), Value::Float(1.0), Value::Integer(2)])
            .err()
            .unwrap();
        assert_eq!(
            err,
            CodecError::TypeMismatch {
                field: 1,
                expected: FieldKind::Float,
                found: FieldKind::Integer
            }
        );

        desc.check_row_kinds(&[Some(FieldKind::Integer), None, Some(FieldKind::Float)])
            .unwrap();
        desc.check_row_kinds(&[Some(FieldKind::Integer), Some(FieldKind::Complex)])
            .unwrap();
        assert_eq!(
            desc.check_row_kinds(&[Some(FieldKind::Integer), Some(FieldKind::Complex), None])
                .err()
                .unwrap(),
            CodecError::TypeMismatch {
                field: 1,
                expected: FieldKind::Float,
                found: FieldKind::Complex
            }
        );
        assert_eq!(
            desc.check_row_kinds(&[None; 4]).err().unwrap(),
            CodecError::FieldCount {
                expected: 3,
                found: 4
            }
        );
    }

    #[test]
    fn encode_rejects_text_that_would_not_scan_back() {
        let desc = FormatDescriptor::parse(TABLE_FORMAT).unwrap();
        let overflow = desc
            .encode(&table_row("toolong", 1, 1.0, Complex::default()))
            .err()
            .unwrap();
        assert_eq!(
            overflow,
            CodecError::Overflow {
                field: 0,
                len: 7,
                max: 5
            }
        );
        assert!(overflow.is_overflow());

        let tab = desc
            .encode(&table_row("a\tb", 1, 1.0, Complex::default()))
            .err()
            .unwrap();
        assert!(matches!(tab, CodecError::InvalidValue { field: 0, .. }));

        let padded = desc
            .encode(&table_row(" ab", 1, 1.0, Complex::default()))
            .err()
            .unwrap();
        assert!(padded.is_contract());

        let word = FormatDescriptor::parse("%s %d\n").unwrap();
        assert!(word
            .encode(&[Value::from("two words"), Value::Integer(1)])
            .is_err());
    }

    #[test]
    fn encode_checks_integer_size() {
        let desc = FormatDescriptor::parse("%d\n").unwrap();
        let err = desc.encode(&[Value::Integer(1 << 40)]).err().unwrap();
        assert!(matches!(err, CodecError::IntegerRange { bits: 32, .. }));
    }

    #[test]
    fn precision_truncates_before_width_check() {
        let desc = FormatDescriptor::parse("%3.3s|\n").unwrap();
        let line = desc.encode(&[Value::from("abcdef")]).unwrap();
        assert_eq!(line, "abc|\n");
    }

    #[test]
    fn decode_rejects_trailing_bytes_and_bad_utf8() {
        let desc = FormatDescriptor::parse("%d\n").unwrap();
        assert_eq!(
            desc.decode(b"1\n2\n").err().unwrap(),
            CodecError::TrailingBytes { offset: 2 }
        );
        assert!(matches!(
            desc.decode(&[0xff, b'\n']).err().unwrap(),
            CodecError::InvalidUtf8(_)
        ));
    }

    #[test]
    fn decode_accepts_missing_final_newline() {
        let desc = FormatDescriptor::parse("%d\t%d\n").unwrap();
        assert_eq!(
            desc.decode_str("1\t2").unwrap(),
            vec![Value::Integer(1), Value::Integer(2)]
        );
    }

    #[test]
    fn three_row_integer_table() {
        let desc = FormatDescriptor::parse("%d\n").unwrap();
        let table = (vec![1i64, 2, 3],).into_table().unwrap();
        let encoded = desc.encode_table(&table).unwrap();
        assert_eq!(encoded, "1\n2\n3\n");
        let decoded = desc.decode_table(encoded.as_bytes()).unwrap();
        assert_eq!(decoded, table);
        assert_eq!(decoded.rows(), 3);
    }

    #[test]
    fn zero_row_table() {
        let desc = FormatDescriptor::parse(TABLE_FORMAT).unwrap();
        let empty = Table::empty(&desc.kinds());
        assert_eq!(desc.encode_table(&empty).unwrap(), "");
        let decoded = desc.decode_table(b"").unwrap();
        assert_eq!(decoded.rows(), 0);
        assert_eq!(decoded.kinds(), desc.kinds());
    }

    #[test]
    fn mixed_table_matches_row_encoding() {
        let desc = FormatDescriptor::parse(TABLE_FORMAT).unwrap();
        let table = (
            vec!["one", "two", "three"],
            vec![1i64, 2, 3],
            vec![1.0, 2.0, 3.0],
            vec![
                Complex::new(1.0, 1.0),
                Complex::new(2.0, 2.0),
                Complex::new(3.0, 3.0),
            ],
        )
            .into_table()
            .unwrap();

        let encoded = desc.encode_table(&table).unwrap();
        let by_rows: String = (0..3)
            .map(|i| desc.encode(&table.row(i).unwrap()).unwrap())
            .collect();
        assert_eq!(encoded, by_rows);
        assert_eq!(desc.decode_table(encoded.as_bytes()).unwrap(), table);
    }

    #[test]
    fn table_kind_mismatch_is_contract_error() {
        let desc = FormatDescriptor::parse("%d\n").unwrap();
        let table = (vec![1.0],).into_table().unwrap();
        assert!(desc.encode_table(&table).err().unwrap().is_contract());
    }

    #[test]
    fn table_parse_error_offset_is_absolute() {
        let desc = FormatDescriptor::parse("%d\n").unwrap();
        let err = desc.decode_table(b"1\n2\nx\n").err().unwrap();
        assert_eq!(
            err,
            CodecError::Token {
                field: 0,
                expected: "integer",
                offset: 4
            }
        );
    }

    #[test]
    fn escaped_form_parses_the_same() {
        let plain = FormatDescriptor::parse(TABLE_FORMAT).unwrap();
        let escaped =
            FormatDescriptor::parse_escaped("%5s\\t%ld\\t%3.1f\\t%3.1lf%+3.1lfj\\n").unwrap();
        assert_eq!(plain, escaped);
        assert_eq!(escaped.to_string(), TABLE_FORMAT);
        let parsed: FormatDescriptor = TABLE_FORMAT.parse().unwrap();
        assert_eq!(parsed.as_str(), TABLE_FORMAT);
    }
}
