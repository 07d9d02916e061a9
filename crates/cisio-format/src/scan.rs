//! Cursor over an incoming record, the inverse of `render`.

use crate::error::CodecError;
use crate::spec::{Conversion, FieldKind, FieldSpec};
use crate::value::{Complex, Value};

pub(crate) fn check_int_range(field: usize, value: i64, bits: u32) -> Result<(), CodecError> {
    let fits = match bits {
        8 => i8::try_from(value).is_ok(),
        16 => i16::try_from(value).is_ok(),
        32 => i32::try_from(value).is_ok(),
        _ => true,
    };
    if fits {
        Ok(())
    } else {
        Err(CodecError::IntegerRange {
            field,
            value: value.to_string(),
            bits,
        })
    }
}

pub(crate) struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.pos == self.input.len()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    pub(crate) fn literal(&mut self, expected: &str) -> Result<(), CodecError> {
        if self.rest().starts_with(expected) {
            self.pos += expected.len();
            Ok(())
        } else {
            Err(CodecError::Literal {
                expected: expected.to_string(),
                offset: self.pos,
            })
        }
    }

    /// Like [`Scanner::literal`], but a whitespace-only literal may be cut
    /// off by the end of input (a last line without its newline).
    pub(crate) fn literal_or_end(&mut self, expected: &str) -> Result<(), CodecError> {
        if self.is_at_end() && expected.trim().is_empty() {
            return Ok(());
        }
        self.literal(expected)
    }

    pub(crate) fn field(&mut self, index: usize, field: &FieldSpec) -> Result<Value, CodecError> {
        match field.kind {
            FieldKind::Text => self.text(index, field).map(Value::Text),
            FieldKind::Integer => self.integer(index, &field.conversion).map(Value::Integer),
            FieldKind::Float => self.float(index, &field.conversion).map(Value::Float),
            FieldKind::Complex => {
                let re = self.float(index, &field.conversion)?;
                let imag = field.imaginary.as_ref().unwrap_or(&field.conversion);
                let im = self.float(index, imag)?;
                self.literal("j")?;
                Ok(Value::Complex(Complex::new(re, im)))
            }
        }
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    /// Consume right-hand padding of a left-justified numeric field, never
    /// reading past its declared width.
    fn skip_right_pad(&mut self, conv: &Conversion, field_start: usize) {
        if let (true, Some(width)) = (conv.pads_right(), conv.width) {
            while self.pos - field_start < width && self.peek() == Some(b' ') {
                self.pos += 1;
            }
        }
    }

    fn digits(&self, from: usize) -> usize {
        self.input.as_bytes()[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    }

    fn integer(&mut self, index: usize, conv: &Conversion) -> Result<i64, CodecError> {
        let field_start = self.pos;
        self.skip_spaces();
        let start = self.pos;
        let mut end = start;
        if matches!(self.peek(), Some(b'+' | b'-')) {
            end += 1;
        }
        let digits = self.digits(end);
        end += digits;

        let value = if digits == 0 {
            // `%.0d` renders zero as no digits at all.
            if conv.precision == Some(0) && end == start {
                0
            } else {
                return Err(CodecError::Token {
                    field: index,
                    expected: "integer",
                    offset: start,
                });
            }
        } else {
            let token = &self.input[start..end];
            token.parse::<i64>().map_err(|_| CodecError::IntegerRange {
                field: index,
                value: token.to_string(),
                bits: 64,
            })?
        };
        check_int_range(index, value, conv.int_bits())?;

        self.pos = end;
        self.skip_right_pad(conv, field_start);
        Ok(value)
    }

    fn float(&mut self, index: usize, conv: &Conversion) -> Result<f64, CodecError> {
        let field_start = self.pos;
        self.skip_spaces();
        let start = self.pos;
        let bytes = self.input.as_bytes();
        let mut end = start;
        if matches!(bytes.get(end), Some(b'+' | b'-')) {
            end += 1;
        }

        let special = ["infinity", "inf", "nan"].into_iter().find(|word| {
            bytes
                .get(end..end + word.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(word.as_bytes()))
        });

        if let Some(word) = special {
            end += word.len();
        } else {
            let int_digits = self.digits(end);
            end += int_digits;
            let mut frac_digits = 0;
            if bytes.get(end) == Some(&b'.') {
                frac_digits = self.digits(end + 1);
                if frac_digits > 0 {
                    end += 1 + frac_digits;
                }
            }
            if int_digits + frac_digits == 0 {
                return Err(CodecError::Token {
                    field: index,
                    expected: "float",
                    offset: start,
                });
            }
            if matches!(bytes.get(end), Some(b'e' | b'E')) {
                let mut exp = end + 1;
                if matches!(bytes.get(exp), Some(b'+' | b'-')) {
                    exp += 1;
                }
                let exp_digits = self.digits(exp);
                if exp_digits > 0 {
                    end = exp + exp_digits;
                }
            }
        }

        let value = self.input[start..end]
            .parse::<f64>()
            .map_err(|_| CodecError::Token {
                field: index,
                expected: "float",
                offset: start,
            })?;
        self.pos = end;
        self.skip_right_pad(conv, field_start);
        Ok(value)
    }

    fn text(&mut self, index: usize, field: &FieldSpec) -> Result<String, CodecError> {
        let conv = &field.conversion;
        let start = self.pos;
        let rest = self.rest();

        let raw = if !field.literal.is_empty() {
            match rest.find(field.literal.as_str()) {
                Some(end) => &rest[..end],
                None if field.literal.trim().is_empty() => rest,
                None => {
                    return Err(CodecError::Literal {
                        expected: field.literal.clone(),
                        offset: self.input.len(),
                    })
                }
            }
        } else if let Some(width) = conv.width {
            let end = width.min(rest.len());
            if !rest.is_char_boundary(end) {
                return Err(CodecError::Token {
                    field: index,
                    expected: "text",
                    offset: start + end,
                });
            }
            &rest[..end]
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            if end == 0 {
                return Err(CodecError::Token {
                    field: index,
                    expected: "text",
                    offset: start,
                });
            }
            &rest[..end]
        };

        let value = if conv.pads_left() {
            raw.trim_start_matches(' ')
        } else if conv.pads_right() {
            raw.trim_end_matches(' ')
        } else {
            raw
        };
        if let Some(max) = conv.width {
            if value.len() > max {
                return Err(CodecError::Overflow {
                    field: index,
                    len: value.len(),
                    max,
                });
            }
        }

        self.pos += raw.len();
        Ok(value.to_string())
    }
}
