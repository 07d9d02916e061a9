//! Backslash escapes for format strings that travel through environment
//! variables, command lines and file headers, where a literal tab or
//! newline is awkward.

/// Replace `\`, newline, tab and carriage return with their escapes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

/// Inverse of [`escape`]. Unknown escapes are kept as written.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_control_characters() {
        assert_eq!(escape("%5s\t%ld\n"), "%5s\\t%ld\\n");
        assert_eq!(escape("a\\b\r"), "a\\\\b\\r");
    }

    #[test]
    fn unescape_inverts_escape() {
        let format = "%5s\t%ld\t%3.1f\t%3.1lf%+3.1lfj\n";
        assert_eq!(unescape(&escape(format)), format);
    }

    #[test]
    fn unknown_and_dangling_escapes_are_kept() {
        assert_eq!(unescape("\\x\\"), "\\x\\");
    }
}
