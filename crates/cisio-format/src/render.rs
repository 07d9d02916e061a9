//! printf-compatible rendering of single conversions.

use crate::spec::{Conversion, Specifier};

pub(crate) fn render_integer(out: &mut String, conv: &Conversion, value: i64) {
    let mut digits = value.unsigned_abs().to_string();
    match conv.precision {
        Some(0) if value == 0 => digits.clear(),
        Some(p) if digits.len() < p => digits = format!("{digits:0>p$}"),
        _ => {}
    }
    let sign = sign(value < 0, conv);
    pad(out, conv, sign, &digits, conv.flags.zero && conv.precision.is_none());
}

pub(crate) fn render_float(out: &mut String, conv: &Conversion, value: f64) {
    let sign = sign(value.is_sign_negative() && !value.is_nan(), conv);
    let abs = value.abs();
    let precision = conv.precision.unwrap_or(6);

    let (body, upper) = match conv.specifier {
        _ if value.is_nan() => ("nan".to_string(), upper(conv.specifier)),
        _ if value.is_infinite() => ("inf".to_string(), upper(conv.specifier)),
        Specifier::Exponent { upper } => (exponent(abs, precision), upper),
        Specifier::Fixed { upper } => (format!("{abs:.precision$}"), upper),
        Specifier::Text | Specifier::Decimal => (format!("{abs:.precision$}"), false),
    };
    let body = if upper { body.to_uppercase() } else { body };
    pad(out, conv, sign, &body, conv.flags.zero && value.is_finite());
}

pub(crate) fn render_text(out: &mut String, conv: &Conversion, value: &str) {
    pad(out, conv, "", truncate(value, conv.precision), false);
}

/// Text precision caps the byte length, cut back to a char boundary.
pub(crate) fn truncate(value: &str, precision: Option<usize>) -> &str {
    match precision {
        Some(p) if value.len() > p => {
            let mut end = p;
            while !value.is_char_boundary(end) {
                end -= 1;
            }
            &value[..end]
        }
        _ => value,
    }
}

fn upper(specifier: Specifier) -> bool {
    matches!(
        specifier,
        Specifier::Fixed { upper: true } | Specifier::Exponent { upper: true }
    )
}

fn sign(negative: bool, conv: &Conversion) -> &'static str {
    if negative {
        "-"
    } else if conv.flags.plus {
        "+"
    } else if conv.flags.space {
        " "
    } else {
        ""
    }
}

/// C writes at least two exponent digits with an explicit sign: `1.5e+03`.
fn exponent(abs: f64, precision: usize) -> String {
    let raw = format!("{abs:.precision$e}");
    let Some((mantissa, exp)) = raw.split_once('e') else {
        return raw;
    };
    let (exp_sign, exp_digits) = match exp.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exp),
    };
    format!("{mantissa}e{exp_sign}{exp_digits:0>2}")
}

fn pad(out: &mut String, conv: &Conversion, sign: &str, body: &str, zero: bool) {
    let len = sign.len() + body.len();
    let fill = conv.width.map_or(0, |w| w.saturating_sub(len));

    if conv.flags.left {
        out.push_str(sign);
        out.push_str(body);
        out.extend(std::iter::repeat_n(' ', fill));
    } else if zero {
        out.push_str(sign);
        out.extend(std::iter::repeat_n('0', fill));
        out.push_str(body);
    } else {
        out.extend(std::iter::repeat_n(' ', fill));
        out.push_str(sign);
        out.push_str(body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn conv(format: &str) -> Conversion {
        parse(format).unwrap().fields.remove(0).conversion
    }

    fn int(format: &str, value: i64) -> String {
        let mut out = String::new();
        render_integer(&mut out, &conv(format), value);
        out
    }

    fn float(format: &str, value: f64) -> String {
        let mut out = String::new();
        render_float(&mut out, &conv(format), value);
        out
    }

    fn text(format: &str, value: &str) -> String {
        let mut out = String::new();
        render_text(&mut out, &conv(format), value);
        out
    }

    #[test]
    fn integers() {
        assert_eq!(int("%d", 42), "42");
        assert_eq!(int("%d", -42), "-42");
        assert_eq!(int("%5d", 42), "   42");
        assert_eq!(int("%-5d|", 42), "42   ");
        assert_eq!(int("%05d", -42), "-0042");
        assert_eq!(int("%+d", 7), "+7");
        assert_eq!(int("% d", 7), " 7");
        assert_eq!(int("%.3d", 7), "007");
        assert_eq!(int("%08.3d", 7), "     007");
        assert_eq!(int("%.0d", 0), "");
        assert_eq!(int("%ld", i64::MIN), "-9223372036854775808");
    }

    #[test]
    fn fixed_floats() {
        assert_eq!(float("%f", 1.5), "1.500000");
        assert_eq!(float("%3.1f", 1.5), "1.5");
        assert_eq!(float("%6.2f", -3.14159), " -3.14");
        assert_eq!(float("%+.1f", 0.3), "+0.3");
        assert_eq!(float("%08.2f", -1.0), "-0001.00");
        assert_eq!(float("%-7.1f|", 2.0), "2.0    ");
        assert_eq!(float("%.0f", 2.4), "2");
        assert_eq!(float("%.1f", -0.0), "-0.0");
    }

    #[test]
    fn exponent_floats() {
        assert_eq!(float("%e", 1234.5), "1.234500e+03");
        assert_eq!(float("%.2e", 0.000123), "1.23e-04");
        assert_eq!(float("%.1E", 5.0e100), "5.0E+100");
        assert_eq!(float("%.0e", 0.0), "0e+00");
    }

    #[test]
    fn non_finite_floats() {
        assert_eq!(float("%f", f64::NAN), "nan");
        assert_eq!(float("%F", f64::INFINITY), "INF");
        assert_eq!(float("%06f", f64::NEG_INFINITY), "  -inf");
    }

    #[test]
    fn text_width_and_precision() {
        assert_eq!(text("%5s", "ab"), "   ab");
        assert_eq!(text("%-5s|", "ab"), "ab   ");
        assert_eq!(text("%.2s", "abcdef"), "ab");
        assert_eq!(text("%.2s", "é!"), "é");
        assert_eq!(text("%s", ""), "");
    }
}
