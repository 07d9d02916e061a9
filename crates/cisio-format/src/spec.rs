//! Field specifications produced by the format parser.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The value type a field carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Complex,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Complex => "complex",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// printf flags accepted by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
    /// `-`: pad on the right.
    pub left: bool,
    /// `+`: always print a sign on numbers.
    pub plus: bool,
    /// ` `: print a space where a `+` would go.
    pub space: bool,
    /// `0`: pad numbers with zeros after the sign.
    pub zero: bool,
}

/// Size modifier between precision and conversion character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthModifier {
    #[default]
    None,
    /// `hh`
    Char,
    /// `h`
    Short,
    /// `l`
    Long,
    /// `ll`
    LongLong,
    /// `L`
    LongDouble,
}

impl LengthModifier {
    pub fn as_str(self) -> &'static str {
        match self {
            LengthModifier::None => "",
            LengthModifier::Char => "hh",
            LengthModifier::Short => "h",
            LengthModifier::Long => "l",
            LengthModifier::LongLong => "ll",
            LengthModifier::LongDouble => "L",
        }
    }
}

/// Conversion character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specifier {
    /// `%s`
    Text,
    /// `%d` / `%i`
    Decimal,
    /// `%f` / `%F`
    Fixed { upper: bool },
    /// `%e` / `%E`
    Exponent { upper: bool },
}

impl Specifier {
    pub fn is_float(self) -> bool {
        matches!(self, Specifier::Fixed { .. } | Specifier::Exponent { .. })
    }
}

/// One `%...` conversion exactly as written in the format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub flags: Flags,
    pub width: Option<usize>,
    pub precision: Option<usize>,
    pub length: LengthModifier,
    pub specifier: Specifier,
    /// Source text, e.g. `%+3.1lf`.
    pub text: String,
}

impl Conversion {
    /// Bit size an integer conversion must fit in.
    ///
    /// Plain `%d` is a C `int`; `l`/`ll` are 64-bit.
    pub fn int_bits(&self) -> u32 {
        match self.length {
            LengthModifier::Char => 8,
            LengthModifier::Short => 16,
            LengthModifier::None => 32,
            LengthModifier::Long | LengthModifier::LongLong | LengthModifier::LongDouble => 64,
        }
    }

    /// Right-aligned padding may precede the token.
    pub(crate) fn pads_left(&self) -> bool {
        self.width.is_some() && !self.flags.left
    }

    /// Left-aligned padding may follow the token.
    pub(crate) fn pads_right(&self) -> bool {
        self.width.is_some() && self.flags.left
    }
}

/// One field of a record: its kind, how it is rendered, and the literal
/// text that follows it on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub kind: FieldKind,
    /// The conversion (the real part for complex fields).
    pub conversion: Conversion,
    /// Imaginary part conversion for complex fields.
    pub imaginary: Option<Conversion>,
    /// Literal text between this field and the next one (or the end).
    pub literal: String,
}

impl FieldSpec {
    /// Declared width of the field (real part for complex).
    pub fn width(&self) -> Option<usize> {
        self.conversion.width
    }

    /// Declared precision of the field (real part for complex).
    pub fn precision(&self) -> Option<usize> {
        self.conversion.precision
    }

    /// The specifier as written, e.g. `%3.1lf%+3.1lfj` for a complex field.
    pub fn specifier_text(&self) -> String {
        match &self.imaginary {
            Some(imag) => format!("{}{}j", self.conversion.text, imag.text),
            None => self.conversion.text.clone(),
        }
    }
}
