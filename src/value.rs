//! Dynamically-typed values produced by parsing
//!
//! Every field combinator stores its result as a [`Value`] under a name in
//! a [`Record`]. The record is the accumulator threaded through a
//! [`Context`](crate::parse::Context), and, at the end of a parse, the
//! decoded structure itself.
//!
//! Records preserve insertion order, which is parse order. Re-reading a
//! field replaces its value without moving it.

use std::fmt::{self, Display, Formatter, Write};

use indexmap::IndexMap;

use crate::error::{ProjectError, ProjectResult};
use crate::project::FromValue;

/// Tagged union over every kind of value a combinator can produce
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    /// Fixed-length text decoded under some [`Encoding`](crate::read::Encoding)
    Text(String),
    /// Raw byte-span, copied out of the parse-buffer
    Bytes(Vec<u8>),
    /// Ordered sequence, as produced by the repetition combinators
    Seq(Vec<Value>),
    /// Nested record
    Record(Record),
}

/// Discriminant of a [`Value`], used when reporting type mismatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    Text,
    Bytes,
    Seq,
    Record,
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::U8 => "u8",
            Kind::I8 => "i8",
            Kind::U16 => "u16",
            Kind::I16 => "i16",
            Kind::U32 => "u32",
            Kind::I32 => "i32",
            Kind::U64 => "u64",
            Kind::I64 => "i64",
            Kind::F32 => "f32",
            Kind::F64 => "f64",
            Kind::Text => "text",
            Kind::Bytes => "bytes",
            Kind::Seq => "sequence",
            Kind::Record => "record",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Returns the [`Kind`] of this value
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Value::U8(_) => Kind::U8,
            Value::I8(_) => Kind::I8,
            Value::U16(_) => Kind::U16,
            Value::I16(_) => Kind::I16,
            Value::U32(_) => Kind::U32,
            Value::I32(_) => Kind::I32,
            Value::U64(_) => Kind::U64,
            Value::I64(_) => Kind::I64,
            Value::F32(_) => Kind::F32,
            Value::F64(_) => Kind::F64,
            Value::Text(_) => Kind::Text,
            Value::Bytes(_) => Kind::Bytes,
            Value::Seq(_) => Kind::Seq,
            Value::Record(_) => Kind::Record,
        }
    }

    /// Returns the value of any integer variant, widened to `i128`
    ///
    /// `i128` holds every `u64` and every `i64`, so no integer variant
    /// is rejected here; narrowing is left to the caller.
    #[must_use]
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            Value::U8(v) => Some(v.into()),
            Value::I8(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::I16(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::I32(v) => Some(v.into()),
            Value::U64(v) => Some(v.into()),
            Value::I64(v) => Some(v.into()),
            _ => None,
        }
    }

    /// Returns any integer variant that is non-negative and fits in a `u64`
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        self.as_integer().and_then(|v| u64::try_from(v).ok())
    }

    /// Returns any integer variant that fits in an `i64`
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(|v| i64::try_from(v).ok())
    }

    /// Returns either float variant as an `f64`
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v.into()),
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }
}

macro_rules! value_from {
    ( $( $t:ty => $variant:ident ),+ $(,)? ) => {
        $( impl From<$t> for Value {
            #[inline]
            fn from(v: $t) -> Self {
                Value::$variant(v)
            }
        }
        )+
    };
}

value_from! {
    u8 => U8, i8 => I8, u16 => U16, i16 => I16, u32 => U32, i32 => I32,
    u64 => U64, i64 => I64, f32 => F32, f64 => F64,
    String => Text, Vec<u8> => Bytes, Vec<Value> => Seq, Record => Record,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

/// Ordered mapping from field-name to [`Value`]
///
/// This is the accumulator of a [`Context`](crate::parse::Context). Keys
/// keep the position of their first insertion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(IndexMap<String, Value>);

impl Record {
    /// Constructs a new, empty `Record`
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Stores `value` under `name`, returning any value it replaced.
    ///
    /// A replaced key keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Appends `value` to the sequence stored under `name`.
    ///
    /// If `name` is absent, or holds something other than a sequence, it is
    /// replaced by a one-element sequence.
    pub fn append(&mut self, name: &str, value: Value) {
        match self.0.get_mut(name) {
            Some(Value::Seq(items)) => items.push(value),
            Some(other) => *other = Value::Seq(vec![value]),
            None => {
                self.0.insert(name.to_owned(), Value::Seq(vec![value]));
            }
        }
    }

    /// Iterates over fields in parse order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over field names in parse order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Converts the field `name` into a `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::Missing`] if the field is absent, or whatever
    /// error `T::from_value` reports, with `name` prefixed to its path.
    pub fn project<T: FromValue>(&self, name: &str) -> ProjectResult<T> {
        match self.get(name) {
            Some(value) => T::from_value(value).map_err(|err| err.within(name)),
            None => Err(ProjectError::Missing {
                field: name.to_owned(),
            }),
        }
    }

    /// Borrows the text field `name`
    pub fn text(&self, name: &str) -> ProjectResult<&str> {
        match self.get(name) {
            Some(Value::Text(s)) => Ok(s),
            Some(other) => Err(ProjectError::Mismatch {
                field: name.to_owned(),
                expected: "text",
                found: other.kind(),
            }),
            None => Err(ProjectError::Missing {
                field: name.to_owned(),
            }),
        }
    }

    /// Reads the integer field `name` as a length or count
    pub fn usize(&self, name: &str) -> ProjectResult<usize> {
        self.project(name)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Number of leading bytes shown when displaying a byte-span
const BYTES_PREVIEW: usize = 16;

fn write_indent(f: &mut Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str("  ")?;
    }
    Ok(())
}

fn write_bytes(f: &mut Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("<Bytes")?;
    for b in bytes.iter().take(BYTES_PREVIEW) {
        write!(f, " {b:02x}")?;
    }
    if bytes.len() > BYTES_PREVIEW {
        write!(f, " ... {} more bytes", bytes.len() - BYTES_PREVIEW)?;
    }
    f.write_char('>')
}

fn write_text(f: &mut Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('\'')?;
    for c in s.chars() {
        match c {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            c if c.is_control() => write!(f, "\\x{:02x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('\'')
}

/// Writes `value`, breaking nested records and sequences across lines
/// when `pretty` is set.
fn write_value(f: &mut Formatter<'_>, value: &Value, depth: usize, pretty: bool) -> fmt::Result {
    match value {
        Value::U8(v) => write!(f, "{v}"),
        Value::I8(v) => write!(f, "{v}"),
        Value::U16(v) => write!(f, "{v}"),
        Value::I16(v) => write!(f, "{v}"),
        Value::U32(v) => write!(f, "{v}"),
        Value::I32(v) => write!(f, "{v}"),
        Value::U64(v) => write!(f, "{v}n"),
        Value::I64(v) => write!(f, "{v}n"),
        Value::F32(v) => write!(f, "{v}"),
        Value::F64(v) => write!(f, "{v}"),
        Value::Text(s) => write_text(f, s),
        Value::Bytes(b) => write_bytes(f, b),
        Value::Seq(items) => {
            if items.is_empty() {
                return f.write_str("[]");
            }
            f.write_char('[')?;
            for (ix, item) in items.iter().enumerate() {
                if ix > 0 {
                    f.write_char(',')?;
                }
                if pretty {
                    f.write_char('\n')?;
                    write_indent(f, depth + 1)?;
                } else {
                    f.write_char(' ')?;
                }
                write_value(f, item, depth + 1, pretty)?;
            }
            if pretty {
                f.write_char('\n')?;
                write_indent(f, depth)?;
            } else {
                f.write_char(' ')?;
            }
            f.write_char(']')
        }
        Value::Record(record) => write_record(f, record, depth, pretty),
    }
}

fn write_record(f: &mut Formatter<'_>, record: &Record, depth: usize, pretty: bool) -> fmt::Result {
    if record.is_empty() {
        return f.write_str("{}");
    }
    f.write_char('{')?;
    for (ix, (name, value)) in record.iter().enumerate() {
        if ix > 0 {
            f.write_char(',')?;
        }
        if pretty {
            f.write_char('\n')?;
            write_indent(f, depth + 1)?;
        } else {
            f.write_char(' ')?;
        }
        write!(f, "{name}: ")?;
        write_value(f, value, depth + 1, pretty)?;
    }
    if pretty {
        f.write_char('\n')?;
        write_indent(f, depth)?;
    } else {
        f.write_char(' ')?;
    }
    f.write_char('}')
}

/// Single-line by default; the alternate flag (`{:#}`) spreads nested
/// structure over indented lines.
impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_value(f, self, 0, f.alternate())
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_record(f, self, 0, f.alternate())
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "serde_impls")] {
        use serde::{Serialize, Serializer};

        impl Serialize for Value {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                match self {
                    Value::U8(v) => v.serialize(serializer),
                    Value::I8(v) => v.serialize(serializer),
                    Value::U16(v) => v.serialize(serializer),
                    Value::I16(v) => v.serialize(serializer),
                    Value::U32(v) => v.serialize(serializer),
                    Value::I32(v) => v.serialize(serializer),
                    Value::U64(v) => v.serialize(serializer),
                    Value::I64(v) => v.serialize(serializer),
                    Value::F32(v) => v.serialize(serializer),
                    Value::F64(v) => v.serialize(serializer),
                    Value::Text(s) => s.serialize(serializer),
                    Value::Bytes(b) => b.serialize(serializer),
                    Value::Seq(items) => items.serialize(serializer),
                    Value::Record(r) => r.serialize(serializer),
                }
            }
        }

        impl Serialize for Record {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                self.0.serialize(serializer)
            }
        }
    }
}
