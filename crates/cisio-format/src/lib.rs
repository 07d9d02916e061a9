//! printf-style format descriptors for cisio rows and tables.
//!
//! A format string such as `"%5s\t%ld\t%3.1f\t%3.1lf%+3.1lfj\n"` is parsed
//! once into a [`FormatDescriptor`]: an ordered list of typed fields (text,
//! integer, float, complex) plus the literal text around them. The
//! descriptor renders values to bytes and scans bytes back into values, one
//! row at a time or a whole column-major [`Table`] at once.
//!
//! ```
//! use cisio_format::{Complex, FormatDescriptor, Value};
//!
//! let desc = FormatDescriptor::parse("%5s\t%ld\t%3.1f\t%3.1lf%+3.1lfj\n").unwrap();
//! let row = vec![
//!     Value::from("abcde"),
//!     Value::from(5i64),
//!     Value::from(1.5),
//!     Value::from(Complex::new(2.0, -0.5)),
//! ];
//! let line = desc.encode(&row).unwrap();
//! assert_eq!(line, "abcde\t5\t1.5\t2.0-0.5j\n");
//! assert_eq!(desc.decode(line.as_bytes()).unwrap(), row);
//!
//! // A complex field may also be given as two adjacent floats.
//! let split = vec![
//!     Value::from("abcde"),
//!     Value::from(5i64),
//!     Value::from(1.5),
//!     Value::from(2.0),
//!     Value::from(-0.5),
//! ];
//! assert_eq!(desc.value_count(), 5);
//! assert_eq!(desc.encode(&split).unwrap(), line);
//! ```

pub mod descriptor;
pub mod error;
pub mod escape;
mod parser;
mod render;
mod scan;
pub mod spec;
pub mod table;
pub mod value;

pub use descriptor::FormatDescriptor;
pub use error::{CodecError, FormatError};
pub use escape::{escape, unescape};
pub use spec::{Conversion, FieldKind, FieldSpec, Flags, LengthModifier, Specifier};
pub use table::{Column, FromColumn, FromTable, IntoTable, Table};
pub use value::{split_complex, Complex, FieldSlot, FromRow, FromValue, IntoRow, Value, ValueRef};
