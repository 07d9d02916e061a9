use crate::spec::FieldKind;

/// Errors raised while parsing a format string.
///
/// These are fatal for the descriptor being built: nothing is sent or
/// received with a format that fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The string ends inside a conversion specifier.
    #[error("format string ends inside a conversion at byte {offset}")]
    Incomplete { offset: usize },

    /// The conversion character is not one of `s`, `d`, `i`, `f`, `F`, `e`, `E`.
    #[error("unsupported conversion {specifier:?} at byte {offset}")]
    UnsupportedSpecifier { specifier: String, offset: usize },

    /// A flag or width form that cannot be expressed on the wire (`#`, `*`).
    #[error("unsupported flag {flag:?} at byte {offset}")]
    UnsupportedFlag { flag: char, offset: usize },

    /// The length modifier does not apply to the conversion (e.g. `%hs`).
    #[error("length modifier not valid for {specifier:?} at byte {offset}")]
    InvalidLength { specifier: String, offset: usize },

    /// Width or precision digits do not fit in a `usize`.
    #[error("width or precision out of range at byte {offset}")]
    InvalidWidth { offset: usize },

    /// The format string has no conversions at all.
    #[error("format string {0:?} contains no fields")]
    NoFields(String),
}

/// Errors raised while encoding values or decoding bytes with a descriptor.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// The caller supplied a different number of values/slots than fields.
    #[error("expected {expected} fields, got {found}")]
    FieldCount { expected: usize, found: usize },

    /// A value or slot kind does not match the field kind.
    #[error("field {field}: expected {expected}, got {found}")]
    TypeMismatch {
        field: usize,
        expected: FieldKind,
        found: FieldKind,
    },

    /// The value cannot be rendered without corrupting the record layout.
    #[error("field {field}: {reason}")]
    InvalidValue { field: usize, reason: String },

    /// Text longer than the field's declared width.
    #[error("field {field}: {len} bytes exceed declared width {max}")]
    Overflow { field: usize, len: usize, max: usize },

    /// An integer does not fit the field's declared size.
    #[error("field {field}: integer {value} does not fit in {bits} bits")]
    IntegerRange {
        field: usize,
        value: String,
        bits: u32,
    },

    /// The input does not contain the literal text the format requires.
    #[error("expected literal {expected:?} at byte {offset}")]
    Literal { expected: String, offset: usize },

    /// A field's token is malformed (no digits, empty text, ...).
    #[error("field {field}: malformed {expected} at byte {offset}")]
    Token {
        field: usize,
        expected: &'static str,
        offset: usize,
    },

    /// Bytes are left over after a complete row.
    #[error("unexpected trailing data at byte {offset}")]
    TrailingBytes { offset: usize },

    /// The message is not valid UTF-8 text.
    #[error("message is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// The rendered record would be skipped by a file input as a comment
    /// or empty line.
    #[error("record line {line} would be read back as a {kind} line")]
    SkippedLine { line: usize, kind: &'static str },

    /// Table columns have different lengths.
    #[error("column {column} has {len} rows, expected {expected}")]
    ColumnLength {
        column: usize,
        len: usize,
        expected: usize,
    },
}

impl CodecError {
    /// Incoming bytes do not match the descriptor.
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            CodecError::Literal { .. }
                | CodecError::Token { .. }
                | CodecError::TrailingBytes { .. }
                | CodecError::InvalidUtf8(_)
        )
    }

    /// A value is too large for its field.
    pub fn is_overflow(&self) -> bool {
        matches!(
            self,
            CodecError::Overflow { .. } | CodecError::IntegerRange { .. }
        )
    }

    /// The caller broke the descriptor contract (count, kind, layout).
    pub fn is_contract(&self) -> bool {
        matches!(
            self,
            CodecError::FieldCount { .. }
                | CodecError::TypeMismatch { .. }
                | CodecError::InvalidValue { .. }
                | CodecError::SkippedLine { .. }
                | CodecError::ColumnLength { .. }
        )
    }
}

impl CodecError {
    /// Move a byte offset forward, for errors raised while decoding a slice
    /// of a larger message.
    pub(crate) fn shifted(self, by: usize) -> Self {
        match self {
            CodecError::Literal { expected, offset } => CodecError::Literal {
                expected,
                offset: offset + by,
            },
            CodecError::Token {
                field,
                expected,
                offset,
            } => CodecError::Token {
                field,
                expected,
                offset: offset + by,
            },
            CodecError::TrailingBytes { offset } => CodecError::TrailingBytes {
                offset: offset + by,
            },
            other => other,
        }
    }
}
