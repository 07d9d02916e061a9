//! Typed field values and the conversions between them and Rust types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::spec::FieldKind;

/// A complex number carried by a `%f%fj`-style field.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

impl From<(f64, f64)> for Complex {
    fn from((re, im): (f64, f64)) -> Self {
        Self { re, im }
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:+}j", self.re, self.im)
    }
}

/// One decoded field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Complex(Complex),
}

/// Borrowed view of a [`Value`], used when encoding table columns in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRef<'a> {
    Text(&'a str),
    Integer(i64),
    Float(f64),
    Complex(Complex),
}

impl ValueRef<'_> {
    pub fn kind(&self) -> FieldKind {
        match self {
            ValueRef::Text(_) => FieldKind::Text,
            ValueRef::Integer(_) => FieldKind::Integer,
            ValueRef::Float(_) => FieldKind::Float,
            ValueRef::Complex(_) => FieldKind::Complex,
        }
    }

    pub fn to_value(&self) -> Value {
        match *self {
            ValueRef::Text(text) => Value::Text(text.to_string()),
            ValueRef::Integer(v) => Value::Integer(v),
            ValueRef::Float(v) => Value::Float(v),
            ValueRef::Complex(v) => Value::Complex(v),
        }
    }
}

impl Value {
    pub fn kind(&self) -> FieldKind {
        self.view().kind()
    }

    pub fn view(&self) -> ValueRef<'_> {
        match self {
            Value::Text(text) => ValueRef::Text(text),
            Value::Integer(v) => ValueRef::Integer(*v),
            Value::Float(v) => ValueRef::Float(*v),
            Value::Complex(v) => ValueRef::Complex(*v),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<Complex> {
        match self {
            Value::Complex(v) => Some(*v),
            _ => None,
        }
    }

    /// Widen a value to `kind` where no information is lost: integers to
    /// floats, integers and floats to complex. Everything else must already
    /// have the requested kind.
    pub fn coerce(self, kind: FieldKind) -> Option<Value> {
        match (self, kind) {
            (value, kind) if value.kind() == kind => Some(value),
            (Value::Integer(v), FieldKind::Float) => Some(Value::Float(v as f64)),
            (Value::Integer(v), FieldKind::Complex) => {
                Some(Value::Complex(Complex::new(v as f64, 0.0)))
            }
            (Value::Float(v), FieldKind::Complex) => Some(Value::Complex(Complex::new(v, 0.0))),
            _ => None,
        }
    }

    /// Parse a command-line style token as a value of `kind`.
    ///
    /// Complex values are written `RE,IM`.
    pub fn parse_as(kind: FieldKind, token: &str) -> Option<Value> {
        match kind {
            FieldKind::Text => Some(Value::Text(token.to_string())),
            FieldKind::Integer => token.trim().parse().ok().map(Value::Integer),
            FieldKind::Float => token.trim().parse().ok().map(Value::Float),
            FieldKind::Complex => {
                let (re, im) = token.split_once(',')?;
                let re = re.trim().parse().ok()?;
                let im = im.trim().parse().ok()?;
                Some(Value::Complex(Complex::new(re, im)))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => f.write_str(text),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Complex(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

macro_rules! integer_into_value {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(value: $t) -> Self {
                Value::Integer(i64::from(value))
            }
        }
    )*};
}

integer_into_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Complex> for Value {
    fn from(value: Complex) -> Self {
        Value::Complex(value)
    }
}

impl From<(f64, f64)> for Value {
    fn from(value: (f64, f64)) -> Self {
        Value::Complex(value.into())
    }
}

/// Extract a Rust value from a decoded field.
pub trait FromValue: Sized {
    /// Field kind this type accepts, or `None` for any kind.
    const KIND: Option<FieldKind>;

    fn from_value(field: usize, value: Value) -> Result<Self, CodecError>;
}

fn mismatch(field: usize, expected: FieldKind, value: &Value) -> CodecError {
    CodecError::TypeMismatch {
        field,
        expected,
        found: value.kind(),
    }
}

impl FromValue for Value {
    const KIND: Option<FieldKind> = None;

    fn from_value(_field: usize, value: Value) -> Result<Self, CodecError> {
        Ok(value)
    }
}

impl FromValue for String {
    const KIND: Option<FieldKind> = Some(FieldKind::Text);

    fn from_value(field: usize, value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Text(text) => Ok(text),
            other => Err(mismatch(field, FieldKind::Text, &other)),
        }
    }
}

impl FromValue for i64 {
    const KIND: Option<FieldKind> = Some(FieldKind::Integer);

    fn from_value(field: usize, value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Integer(v) => Ok(v),
            other => Err(mismatch(field, FieldKind::Integer, &other)),
        }
    }
}

macro_rules! narrow_integer_from_value {
    ($($t:ty => $bits:expr),*) => {$(
        impl FromValue for $t {
            const KIND: Option<FieldKind> = Some(FieldKind::Integer);

            fn from_value(field: usize, value: Value) -> Result<Self, CodecError> {
                let wide = i64::from_value(field, value)?;
                <$t>::try_from(wide).map_err(|_| CodecError::IntegerRange {
                    field,
                    value: wide.to_string(),
                    bits: $bits,
                })
            }
        }
    )*};
}

narrow_integer_from_value!(i32 => 32, i16 => 16, i8 => 8);

impl FromValue for f64 {
    const KIND: Option<FieldKind> = Some(FieldKind::Float);

    fn from_value(field: usize, value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Float(v) => Ok(v),
            other => Err(mismatch(field, FieldKind::Float, &other)),
        }
    }
}

impl FromValue for f32 {
    const KIND: Option<FieldKind> = Some(FieldKind::Float);

    fn from_value(field: usize, value: Value) -> Result<Self, CodecError> {
        f64::from_value(field, value).map(|v| v as f32)
    }
}

impl FromValue for Complex {
    const KIND: Option<FieldKind> = Some(FieldKind::Complex);

    fn from_value(field: usize, value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Complex(v) => Ok(v),
            other => Err(mismatch(field, FieldKind::Complex, &other)),
        }
    }
}

/// Expand every complex value into two floats, real part first. This is the
/// split row layout accepted by [`FormatDescriptor::check_row_kinds`].
///
/// [`FormatDescriptor::check_row_kinds`]: crate::FormatDescriptor::check_row_kinds
pub fn split_complex(values: Vec<Value>) -> Vec<Value> {
    let mut split = Vec::with_capacity(values.len() + 1);
    for value in values {
        match value {
            Value::Complex(z) => {
                split.push(Value::Float(z.re));
                split.push(Value::Float(z.im));
            }
            other => split.push(other),
        }
    }
    split
}

/// A caller-provided destination for one decoded field.
///
/// Row inputs check every slot's kind against the descriptor before they
/// read anything, so a mismatched slot list never consumes a message.
pub trait FieldSlot {
    fn expected_kind(&self) -> Option<FieldKind>;

    fn assign(&mut self, field: usize, value: Value) -> Result<(), CodecError>;
}

impl<T: FromValue> FieldSlot for T {
    fn expected_kind(&self) -> Option<FieldKind> {
        T::KIND
    }

    fn assign(&mut self, field: usize, value: Value) -> Result<(), CodecError> {
        *self = T::from_value(field, value)?;
        Ok(())
    }
}

/// A fixed-arity row type, implemented for tuples of [`FromValue`] types.
pub trait FromRow: Sized {
    const ARITY: usize;

    fn kinds() -> Vec<Option<FieldKind>>;

    fn from_row(values: Vec<Value>) -> Result<Self, CodecError>;
}

/// A fixed-arity row that can be sent, implemented for tuples of
/// `Into<Value>` types.
pub trait IntoRow {
    const ARITY: usize;

    fn into_row(self) -> Vec<Value>;
}

macro_rules! tuple_rows {
    ($len:expr; $($name:ident $idx:tt),+) => {
        impl<$($name: FromValue),+> FromRow for ($($name,)+) {
            const ARITY: usize = $len;

            fn kinds() -> Vec<Option<FieldKind>> {
                vec![$($name::KIND),+]
            }

            fn from_row(values: Vec<Value>) -> Result<Self, CodecError> {
                let found = values.len();
                if found != $len {
                    return Err(CodecError::FieldCount { expected: $len, found });
                }
                let mut values = values.into_iter();
                Ok(($(
                    $name::from_value(
                        $idx,
                        values
                            .next()
                            .ok_or(CodecError::FieldCount { expected: $len, found })?,
                    )?,
                )+))
            }
        }

        impl<$($name: Into<Value>),+> IntoRow for ($($name,)+) {
            const ARITY: usize = $len;

            fn into_row(self) -> Vec<Value> {
                vec![$(self.$idx.into()),+]
            }
        }
    };
}

tuple_rows!(1; A 0);
tuple_rows!(2; A 0, B 1);
tuple_rows!(3; A 0, B 1, C 2);
tuple_rows!(4; A 0, B 1, C 2, D 3);
tuple_rows!(5; A 0, B 1, C 2, D 3, E 4);
tuple_rows!(6; A 0, B 1, C 2, D 3, E 4, F 5);
tuple_rows!(7; A 0, B 1, C 2, D 3, E 4, F 5, G 6);
tuple_rows!(8; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
