//! Typed projection of parsed records
//!
//! A parse produces a dynamically-typed [`Record`]. This module provides the
//! conversions used to view it, or any of its fields, as ordinary Rust types:
//!
//!  * [`FromValue`] converts a single [`Value`].
//!  * [`FromRecord`] converts a whole record into a struct-like type, and is
//!    usually derived with `#[derive(FromRecord)]`, which also provides the
//!    matching `FromValue` impl so that derived types nest.
//!
//! Integers convert from any integer variant, provided the value is in range
//! for the target type; a `u8` field can thus be projected onto a `usize`,
//! and a `u32` onto an `i64`, but `-1i8` onto a `u32` is an error.

use crate::error::{ProjectError, ProjectResult, WidthError};
use crate::value::{Kind, Record, Value};

/// Conversion from a single parsed [`Value`].
///
/// Errors are reported with an empty field path; [`Record::project`] and
/// the container impls prefix the path on the way out.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> ProjectResult<Self>;
}

/// Conversion from a whole parsed [`Record`]
pub trait FromRecord: Sized {
    fn from_record(record: &Record) -> ProjectResult<Self>;
}

#[inline]
fn mismatch<T>(expected: &'static str, found: Kind) -> ProjectResult<T> {
    Err(ProjectError::Mismatch {
        field: String::new(),
        expected,
        found,
    })
}

/// Borrows `value` as a nested record
pub fn expect_record(value: &Value) -> ProjectResult<&Record> {
    match value {
        Value::Record(record) => Ok(record),
        other => mismatch("record", other.kind()),
    }
}

macro_rules! integral_from_value {
    ( $( $t:ty ),+ $(,)? ) => {
        $(
            impl FromValue for $t {
                fn from_value(value: &Value) -> ProjectResult<Self> {
                    match value.as_integer() {
                        Some(n) => <$t>::try_from(n).map_err(|_| ProjectError::OutOfRange {
                            field: String::new(),
                            value: n,
                        }),
                        None => mismatch(stringify!($t), value.kind()),
                    }
                }
            }
        )+
    };
}

integral_from_value!(u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, usize, isize);

impl FromValue for f64 {
    fn from_value(value: &Value) -> ProjectResult<Self> {
        match value.as_f64() {
            Some(x) => Ok(x),
            None => mismatch("f64", value.kind()),
        }
    }
}

impl FromValue for f32 {
    /// Only `F32` converts losslessly; wider floats are rejected.
    fn from_value(value: &Value) -> ProjectResult<Self> {
        match value {
            Value::F32(x) => Ok(*x),
            other => mismatch("f32", other.kind()),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> ProjectResult<Self> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            other => mismatch("text", other.kind()),
        }
    }
}

/// Sequences convert element-wise from [`Value::Seq`]; byte-spans convert
/// from [`Value::Bytes`] as if each byte were a `U8` value, so that
/// `Vec<u8>` projects raw bytes directly.
impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> ProjectResult<Self> {
        let element = |ix: usize, item: &Value| {
            T::from_value(item).map_err(|err| err.within(&format!("[{ix}]")))
        };
        match value {
            Value::Seq(items) => items
                .iter()
                .enumerate()
                .map(|(ix, item)| element(ix, item))
                .collect(),
            Value::Bytes(bytes) => bytes
                .iter()
                .enumerate()
                .map(|(ix, &byte)| element(ix, &Value::U8(byte)))
                .collect(),
            other => mismatch("sequence", other.kind()),
        }
    }
}

impl<const N: usize> FromValue for [u8; N] {
    fn from_value(value: &Value) -> ProjectResult<Self> {
        match value {
            Value::Bytes(bytes) => {
                <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| ProjectError::Width {
                    field: String::new(),
                    source: WidthError::WrongWidth {
                        exact: N,
                        actual: bytes.len(),
                    },
                })
            }
            other => mismatch("bytes", other.kind()),
        }
    }
}

impl FromValue for Record {
    fn from_value(value: &Value) -> ProjectResult<Self> {
        expect_record(value).cloned()
    }
}

impl FromRecord for Record {
    fn from_record(record: &Record) -> ProjectResult<Self> {
        Ok(record.clone())
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> ProjectResult<Self> {
        Ok(value.clone())
    }
}
