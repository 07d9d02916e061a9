use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::FormatError;
use crate::spec::{Conversion, FieldKind, FieldSpec, Flags, LengthModifier, Specifier};

pub(crate) struct Parsed {
    pub prefix: String,
    pub fields: Vec<FieldSpec>,
}

enum Token {
    Literal(String),
    Conversion(Conversion),
}

pub(crate) fn parse(format: &str) -> Result<Parsed, FormatError> {
    let tokens = tokenize(format)?;
    assemble(format, &tokens)
}

fn tokenize(format: &str) -> Result<Vec<Token>, FormatError> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = format.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }
        if let Some(&(_, '%')) = chars.peek() {
            chars.next();
            literal.push('%');
            continue;
        }
        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }
        tokens.push(Token::Conversion(parse_conversion(
            format, offset, &mut chars,
        )?));
    }
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

fn parse_conversion(
    format: &str,
    start: usize,
    chars: &mut Peekable<CharIndices<'_>>,
) -> Result<Conversion, FormatError> {
    let mut flags = Flags::default();
    while let Some(&(offset, c)) = chars.peek() {
        match c {
            '-' => flags.left = true,
            '+' => flags.plus = true,
            ' ' => flags.space = true,
            '0' => flags.zero = true,
            '#' => return Err(FormatError::UnsupportedFlag { flag: c, offset }),
            _ => break,
        }
        chars.next();
    }

    let width = parse_number(chars)?;
    let precision = match chars.peek() {
        Some(&(_, '.')) => {
            chars.next();
            Some(parse_number(chars)?.unwrap_or(0))
        }
        _ => None,
    };

    let length = match chars.peek().map(|&(_, c)| c) {
        Some('h') => {
            chars.next();
            if chars.next_if(|&(_, c)| c == 'h').is_some() {
                LengthModifier::Char
            } else {
                LengthModifier::Short
            }
        }
        Some('l') => {
            chars.next();
            if chars.next_if(|&(_, c)| c == 'l').is_some() {
                LengthModifier::LongLong
            } else {
                LengthModifier::Long
            }
        }
        Some('L') => {
            chars.next();
            LengthModifier::LongDouble
        }
        _ => LengthModifier::None,
    };

    let (offset, c) = chars
        .next()
        .ok_or(FormatError::Incomplete { offset: start })?;
    let text = format[start..offset + c.len_utf8()].to_string();

    let specifier = match c {
        's' => Specifier::Text,
        'd' | 'i' => Specifier::Decimal,
        'f' => Specifier::Fixed { upper: false },
        'F' => Specifier::Fixed { upper: true },
        'e' => Specifier::Exponent { upper: false },
        'E' => Specifier::Exponent { upper: true },
        _ => {
            return Err(FormatError::UnsupportedSpecifier {
                specifier: text,
                offset: start,
            })
        }
    };

    let length_ok = match specifier {
        Specifier::Text => length == LengthModifier::None,
        Specifier::Decimal => length != LengthModifier::LongDouble,
        Specifier::Fixed { .. } | Specifier::Exponent { .. } => matches!(
            length,
            LengthModifier::None | LengthModifier::Long | LengthModifier::LongDouble
        ),
    };
    if !length_ok {
        return Err(FormatError::InvalidLength {
            specifier: text,
            offset: start,
        });
    }

    Ok(Conversion {
        flags,
        width,
        precision,
        length,
        specifier,
        text,
    })
}

fn parse_number(chars: &mut Peekable<CharIndices<'_>>) -> Result<Option<usize>, FormatError> {
    if let Some(&(offset, '*')) = chars.peek() {
        return Err(FormatError::UnsupportedFlag { flag: '*', offset });
    }
    let mut value: Option<usize> = None;
    while let Some(&(offset, c)) = chars.peek() {
        let Some(digit) = c.to_digit(10) else {
            break;
        };
        let next = value
            .unwrap_or(0)
            .checked_mul(10)
            .and_then(|v| v.checked_add(digit as usize))
            .ok_or(FormatError::InvalidWidth { offset })?;
        value = Some(next);
        chars.next();
    }
    Ok(value)
}

/// Group conversions into fields. A float conversion directly followed by a
/// second float conversion and a literal `j` becomes one complex field.
fn assemble(format: &str, tokens: &[Token]) -> Result<Parsed, FormatError> {
    let mut prefix = String::new();
    let mut fields: Vec<FieldSpec> = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            Token::Literal(text) => {
                match fields.last_mut() {
                    Some(field) => field.literal.push_str(text),
                    None => prefix.push_str(text),
                }
                i += 1;
            }
            Token::Conversion(conversion) => {
                let kind = match conversion.specifier {
                    Specifier::Text => FieldKind::Text,
                    Specifier::Decimal => FieldKind::Integer,
                    Specifier::Fixed { .. } | Specifier::Exponent { .. } => FieldKind::Float,
                };
                let mut field = FieldSpec {
                    kind,
                    conversion: conversion.clone(),
                    imaginary: None,
                    literal: String::new(),
                };
                i += 1;

                if kind == FieldKind::Float {
                    if let (Some(Token::Conversion(imag)), Some(Token::Literal(after))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        let rest = after.strip_prefix('j');
                        if let (true, Some(rest)) = (imag.specifier.is_float(), rest) {
                            field.kind = FieldKind::Complex;
                            field.imaginary = Some(imag.clone());
                            field.literal.push_str(rest);
                            i += 2;
                        }
                    }
                }
                fields.push(field);
            }
        }
    }

    if fields.is_empty() {
        return Err(FormatError::NoFields(format.to_string()));
    }
    Ok(Parsed { prefix, fields })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reference_table_format() {
        let parsed = parse("%5s\t%ld\t%3.1f\t%3.1lf%+3.1lfj\n").unwrap();
        assert!(parsed.prefix.is_empty());

        let kinds: Vec<FieldKind> = parsed.fields.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FieldKind::Text,
                FieldKind::Integer,
                FieldKind::Float,
                FieldKind::Complex
            ]
        );

        let literals: Vec<&str> = parsed.fields.iter().map(|f| f.literal.as_str()).collect();
        assert_eq!(literals, vec!["\t", "\t", "\t", "\n"]);

        assert_eq!(parsed.fields[0].width(), Some(5));
        assert_eq!(parsed.fields[1].conversion.length, LengthModifier::Long);
        assert_eq!(parsed.fields[1].conversion.int_bits(), 64);
        assert_eq!(parsed.fields[2].width(), Some(3));
        assert_eq!(parsed.fields[2].precision(), Some(1));

        let complex = &parsed.fields[3];
        let imag = complex.imaginary.as_ref().unwrap();
        assert!(imag.flags.plus);
        assert_eq!(imag.precision, Some(1));
        assert_eq!(complex.specifier_text(), "%3.1lf%+3.1lfj");
    }

    #[test]
    fn flags_width_precision_and_lengths() {
        let parsed = parse("%-08.3hd|% hhi|%lld|%.2Le").unwrap();
        let first = &parsed.fields[0].conversion;
        assert!(first.flags.left && first.flags.zero);
        assert_eq!(first.width, Some(8));
        assert_eq!(first.precision, Some(3));
        assert_eq!(first.int_bits(), 16);

        assert!(parsed.fields[1].conversion.flags.space);
        assert_eq!(parsed.fields[1].conversion.int_bits(), 8);
        assert_eq!(parsed.fields[2].conversion.int_bits(), 64);
        assert_eq!(
            parsed.fields[3].conversion.specifier,
            Specifier::Exponent { upper: false }
        );
    }

    #[test]
    fn percent_escape_is_literal() {
        let parsed = parse("load %d%%\n").unwrap();
        assert_eq!(parsed.prefix, "load ");
        assert_eq!(parsed.fields.len(), 1);
        assert_eq!(parsed.fields[0].literal, "%\n");
    }

    #[test]
    fn bare_precision_dot_means_zero() {
        let parsed = parse("%.f").unwrap();
        assert_eq!(parsed.fields[0].precision(), Some(0));
    }

    #[test]
    fn two_floats_without_j_stay_separate() {
        let parsed = parse("%f%f\n").unwrap();
        assert_eq!(parsed.fields.len(), 2);
        assert!(parsed.fields.iter().all(|f| f.kind == FieldKind::Float));
    }

    #[test]
    fn float_then_integer_then_j_is_not_complex() {
        let parsed = parse("%f%dj").unwrap();
        assert_eq!(parsed.fields.len(), 2);
        assert_eq!(parsed.fields[1].literal, "j");
    }

    #[test]
    fn rejects_unknown_specifier() {
        let err = parse("%5s\t%x\n").err().unwrap();
        assert_eq!(
            err,
            FormatError::UnsupportedSpecifier {
                specifier: "%x".to_string(),
                offset: 4
            }
        );
    }

    #[test]
    fn rejects_incomplete_conversion() {
        assert_eq!(
            parse("%d\t%3.").err().unwrap(),
            FormatError::Incomplete { offset: 3 }
        );
    }

    #[test]
    fn rejects_star_and_hash() {
        assert!(matches!(
            parse("%*d").err().unwrap(),
            FormatError::UnsupportedFlag { flag: '*', .. }
        ));
        assert!(matches!(
            parse("%#f").err().unwrap(),
            FormatError::UnsupportedFlag { flag: '#', .. }
        ));
    }

    #[test]
    fn rejects_length_on_text() {
        assert!(matches!(
            parse("%ls").err().unwrap(),
            FormatError::InvalidLength { .. }
        ));
        assert!(matches!(
            parse("%hf").err().unwrap(),
            FormatError::InvalidLength { .. }
        ));
    }

    #[test]
    fn rejects_format_without_fields() {
        assert!(matches!(
            parse("just text\n").err().unwrap(),
            FormatError::NoFields(_)
        ));
    }

    #[test]
    fn rejects_huge_width() {
        assert!(matches!(
            parse("%99999999999999999999999d").err().unwrap(),
            FormatError::InvalidWidth { .. }
        ));
    }
}
