//! Column-major tables: one typed column per field, all the same length.

use serde::Serialize;

use crate::error::CodecError;
use crate::spec::FieldKind;
use crate::value::{Complex, FromValue, Value, ValueRef};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Column {
    Text(Vec<String>),
    Integer(Vec<i64>),
    Float(Vec<f64>),
    Complex(Vec<Complex>),
}

impl Column {
    pub fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Text => Column::Text(Vec::new()),
            FieldKind::Integer => Column::Integer(Vec::new()),
            FieldKind::Float => Column::Float(Vec::new()),
            FieldKind::Complex => Column::Complex(Vec::new()),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Column::Text(_) => FieldKind::Text,
            Column::Integer(_) => FieldKind::Integer,
            Column::Float(_) => FieldKind::Float,
            Column::Complex(_) => FieldKind::Complex,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Text(v) => v.len(),
            Column::Integer(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Complex(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, row: usize) -> Option<ValueRef<'_>> {
        match self {
            Column::Text(v) => v.get(row).map(|s| ValueRef::Text(s.as_str())),
            Column::Integer(v) => v.get(row).copied().map(ValueRef::Integer),
            Column::Float(v) => v.get(row).copied().map(ValueRef::Float),
            Column::Complex(v) => v.get(row).copied().map(ValueRef::Complex),
        }
    }

    /// Append a value of this column's kind. `field` is only used for the
    /// error.
    pub fn push(&mut self, field: usize, value: Value) -> Result<(), CodecError> {
        match (self, value) {
            (Column::Text(v), Value::Text(x)) => v.push(x),
            (Column::Integer(v), Value::Integer(x)) => v.push(x),
            (Column::Float(v), Value::Float(x)) => v.push(x),
            (Column::Complex(v), Value::Complex(x)) => v.push(x),
            (column, value) => {
                return Err(CodecError::TypeMismatch {
                    field,
                    expected: column.kind(),
                    found: value.kind(),
                })
            }
        }
        Ok(())
    }
}

impl From<Vec<String>> for Column {
    fn from(v: Vec<String>) -> Self {
        Column::Text(v)
    }
}

impl From<Vec<&str>> for Column {
    fn from(v: Vec<&str>) -> Self {
        Column::Text(v.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<i64>> for Column {
    fn from(v: Vec<i64>) -> Self {
        Column::Integer(v)
    }
}

impl From<Vec<i32>> for Column {
    fn from(v: Vec<i32>) -> Self {
        Column::Integer(v.into_iter().map(i64::from).collect())
    }
}

impl From<Vec<f64>> for Column {
    fn from(v: Vec<f64>) -> Self {
        Column::Float(v)
    }
}

impl From<Vec<Complex>> for Column {
    fn from(v: Vec<Complex>) -> Self {
        Column::Complex(v)
    }
}

/// A whole array message: `rows` records stored as one column per field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Build a table, rejecting columns of unequal length.
    pub fn new(columns: Vec<Column>) -> Result<Self, CodecError> {
        let rows = columns.first().map_or(0, Column::len);
        for (column, c) in columns.iter().enumerate() {
            if c.len() != rows {
                return Err(CodecError::ColumnLength {
                    column,
                    len: c.len(),
                    expected: rows,
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// A zero-row table with the given column kinds.
    pub fn empty(kinds: &[FieldKind]) -> Self {
        Self {
            columns: kinds.iter().copied().map(Column::empty).collect(),
            rows: 0,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn kinds(&self) -> Vec<FieldKind> {
        self.columns.iter().map(Column::kind).collect()
    }

    /// Copy out one record.
    pub fn row(&self, index: usize) -> Option<Vec<Value>> {
        if index >= self.rows {
            return None;
        }
        self.columns
            .iter()
            .map(|c| c.get(index).map(|v| v.to_value()))
            .collect()
    }
}

/// A Rust element type that a whole column converts into.
pub trait FromColumn: Sized {
    const KIND: FieldKind;

    fn from_column(field: usize, column: Column) -> Result<Vec<Self>, CodecError>;
}

fn column_mismatch(field: usize, expected: FieldKind, column: &Column) -> CodecError {
    CodecError::TypeMismatch {
        field,
        expected,
        found: column.kind(),
    }
}

macro_rules! direct_column {
    ($($t:ty => $variant:ident),*) => {$(
        impl FromColumn for $t {
            const KIND: FieldKind = FieldKind::$variant;

            fn from_column(field: usize, column: Column) -> Result<Vec<Self>, CodecError> {
                match column {
                    Column::$variant(v) => Ok(v),
                    other => Err(column_mismatch(field, FieldKind::$variant, &other)),
                }
            }
        }
    )*};
}

direct_column!(String => Text, i64 => Integer, f64 => Float, Complex => Complex);

impl FromColumn for i32 {
    const KIND: FieldKind = FieldKind::Integer;

    fn from_column(field: usize, column: Column) -> Result<Vec<Self>, CodecError> {
        i64::from_column(field, column)?
            .into_iter()
            .map(|v| i32::from_value(field, Value::Integer(v)))
            .collect()
    }
}

/// A tuple of column vectors, e.g. `(Vec<String>, Vec<i64>)`.
pub trait FromTable: Sized {
    const ARITY: usize;

    fn kinds() -> Vec<FieldKind>;

    fn from_table(table: Table) -> Result<Self, CodecError>;
}

pub trait IntoTable {
    fn into_table(self) -> Result<Table, CodecError>;
}

macro_rules! tuple_tables {
    ($len:expr; $($name:ident $idx:tt),+) => {
        impl<$($name: FromColumn),+> FromTable for ($(Vec<$name>,)+) {
            const ARITY: usize = $len;

            fn kinds() -> Vec<FieldKind> {
                vec![$($name::KIND),+]
            }

            fn from_table(table: Table) -> Result<Self, CodecError> {
                let found = table.columns.len();
                if found != $len {
                    return Err(CodecError::FieldCount { expected: $len, found });
                }
                let mut columns = table.columns.into_iter();
                Ok(($(
                    $name::from_column(
                        $idx,
                        columns
                            .next()
                            .ok_or(CodecError::FieldCount { expected: $len, found })?,
                    )?,
                )+))
            }
        }

        impl<$($name),+> IntoTable for ($(Vec<$name>,)+)
        where
            $(Vec<$name>: Into<Column>),+
        {
            fn into_table(self) -> Result<Table, CodecError> {
                Table::new(vec![$(self.$idx.into()),+])
            }
        }
    };
}

tuple_tables!(1; A 0);
tuple_tables!(2; A 0, B 1);
tuple_tables!(3; A 0, B 1, C 2);
tuple_tables!(4; A 0, B 1, C 2, D 3);
tuple_tables!(5; A 0, B 1, C 2, D 3, E 4);
tuple_tables!(6; A 0, B 1, C 2, D 3, E 4, F 5);
tuple_tables!(7; A 0, B 1, C 2, D 3, E 4, F 5, G 6);
tuple_tables!(8; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
