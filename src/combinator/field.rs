//! Field combinators: named reads that advance the cursor
//!
//! [`read_value`] lifts any reader `(buffer, offset) -> (value, consumed)`
//! into a [`Combinator`] that stores the value under a field name and
//! moves the offset forward by exactly `consumed` bytes. The remaining
//! functions are `read_value` applied to the readers of [`crate::read`].

use crate::parse::{Combinator, ParseResult};
use crate::read::{
    read_bytes, read_fixed_string, read_primitive, Encoding, Endian, Primitive, ValueLength,
};
use crate::value::Value;

/// Converts the decoded half of a reader result into a [`Value`]
#[inline]
fn lift<T: Into<Value>>(res: ParseResult<ValueLength<T>>) -> ParseResult<ValueLength<Value>> {
    res.map(|(value, consumed)| (value.into(), consumed))
}

/// Lifts `reader` into a step that records its value under `name`.
///
/// The reader is handed the current view and offset. On success the value
/// replaces any previous value of `name` and the offset advances by the
/// consumed length; on failure the error is wrapped with `name` and the
/// offset the read started at.
pub fn read_value<R>(name: impl Into<String>, reader: R) -> Combinator
where
    R: Fn(&[u8], usize) -> ParseResult<ValueLength<Value>> + Send + Sync + 'static,
{
    let name = name.into();
    Combinator::new(move |ctx| {
        let offset = ctx.offset();
        let (value, consumed) = reader(ctx.view(), offset)
            .map_err(|err| err.in_field(name.as_str(), offset))?;
        Ok(ctx.apply_value(&name, value, consumed))
    })
}

/// Reads any [`Primitive`] under `name` with the given byte order
pub fn primitive<T>(name: impl Into<String>, endian: Endian) -> Combinator
where
    T: Primitive + Into<Value>,
{
    read_value(name, move |buffer: &[u8], offset: usize| {
        lift(read_primitive::<T>(buffer, offset, endian))
    })
}

pub fn uint8(name: impl Into<String>) -> Combinator {
    primitive::<u8>(name, Endian::Big)
}

pub fn int8(name: impl Into<String>) -> Combinator {
    primitive::<i8>(name, Endian::Big)
}

macro_rules! endian_fields {
    ( $( $name:ident, $le:ident, $be:ident => $t:ty ),+ $(,)? ) => {
        $(
            #[doc = concat!("Reads a `", stringify!($t), "` under `name` with the given byte order")]
            pub fn $name(name: impl Into<String>, endian: Endian) -> Combinator {
                primitive::<$t>(name, endian)
            }

            #[doc = concat!("Reads a little-endian `", stringify!($t), "` under `name`")]
            pub fn $le(name: impl Into<String>) -> Combinator {
                $name(name, Endian::Little)
            }

            #[doc = concat!("Reads a big-endian `", stringify!($t), "` under `name`")]
            pub fn $be(name: impl Into<String>) -> Combinator {
                $name(name, Endian::Big)
            }
        )+
    };
}

endian_fields! {
    uint16, uint16_le, uint16_be => u16,
    int16, int16_le, int16_be => i16,
    uint32, uint32_le, uint32_be => u32,
    int32, int32_le, int32_be => i32,
    uint64, uint64_le, uint64_be => u64,
    int64, int64_le, int64_be => i64,
    float32, float32_le, float32_be => f32,
    float64, float64_le, float64_be => f64,
}

/// Copies `length` raw bytes under `name`
pub fn bytes(name: impl Into<String>, length: usize) -> Combinator {
    read_value(name, move |buffer: &[u8], offset: usize| {
        lift(read_bytes(buffer, offset, length))
    })
}

/// Decodes `length` bytes of text under `name`
pub fn fixed_string(name: impl Into<String>, encoding: Encoding, length: usize) -> Combinator {
    read_value(name, move |buffer: &[u8], offset: usize| {
        lift(read_fixed_string(buffer, offset, length, encoding))
    })
}

pub fn fixed_ascii_string(name: impl Into<String>, length: usize) -> Combinator {
    fixed_string(name, Encoding::Ascii, length)
}

pub fn fixed_utf8_string(name: impl Into<String>, length: usize) -> Combinator {
    fixed_string(name, Encoding::Utf8, length)
}

pub fn fixed_utf16_string(name: impl Into<String>, length: usize) -> Combinator {
    fixed_string(name, Encoding::Utf16Le, length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::error::{ErrorKind, ParseError, WindowError};
    use crate::parse::Context;

    #[test]
    fn offset_advances_by_width() {
        let buf = [0xffu8; 16];
        let cases: [(Combinator, usize); 6] = [
            (uint8("v"), 1),
            (int16_le("v"), 2),
            (uint32_be("v"), 4),
            (float32_le("v"), 4),
            (int64_be("v"), 8),
            (float64_be("v"), 8),
        ];
        for (comb, width) in cases.iter() {
            for start in [0usize, 3, 8] {
                let ctx = comb.run(&buf, start).unwrap();
                assert_eq!(ctx.offset(), start + width);
            }
        }
    }

    #[test]
    fn values_are_typed() {
        let buf = [0x00, 0x00, 0x01, 0x2c];
        let rec = uint32_be("n").parse(&buf).unwrap();
        assert_eq!(rec.get("n"), Some(&Value::U32(300)));
        let rec = uint32_le("n").parse(&buf).unwrap();
        assert_eq!(rec.get("n"), Some(&Value::U32(0x2c01_0000)));
        let rec = int8("n").parse(&[0x80]).unwrap();
        assert_eq!(rec.get("n"), Some(&Value::I8(-128)));
    }

    #[test]
    fn reread_overwrites_in_place() {
        let buf = [1u8, 2, 3];
        let first = uint8("a").apply(Context::new(&buf)).unwrap();
        let second = uint8("b").apply(first).unwrap();
        let third = uint8("a").apply(second).unwrap();
        assert_eq!(third.offset(), 3);
        assert_eq!(third.values().keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(third.values().get("a"), Some(&Value::U8(3)));
    }

    #[test]
    fn text_and_bytes() {
        let buf = b"IHDRxyz";
        let ctx = fixed_ascii_string("type", 4).run(buf, 0).unwrap();
        assert_eq!(ctx.values().get("type"), Some(&Value::Text("IHDR".into())));
        let ctx = bytes("data", 3).apply(ctx).unwrap();
        assert_eq!(ctx.values().get("data"), Some(&Value::Bytes(b"xyz".to_vec())));
        assert_eq!(ctx.offset(), 7);
    }

    #[test]
    fn zero_length_reads_do_not_move() {
        let ctx = bytes("empty", 0).run(&[9, 9], 2).unwrap();
        assert_eq!(ctx.offset(), 2);
        assert_eq!(ctx.values().get("empty"), Some(&Value::Bytes(vec![])));
    }

    #[test]
    fn failure_names_field() {
        let err = uint32_be("width").parse(&[0x01, 0x02]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);
        assert_eq!(err.field_path(), vec!["width"]);
        assert!(matches!(
            err,
            ParseError::Field { offset: 0, .. }
        ));
        assert!(matches!(
            err.root(),
            ParseError::Window(WindowError::ConsumeWouldExceedLimit { requested: 4, limit: 2, .. })
        ));
    }

    #[test]
    fn strict_text_failure() {
        let err = fixed_utf8_string("name", 2).parse(&[0xc3, 0x28]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decoding);
        assert_eq!(err.field_path(), vec!["name"]);
    }

    #[test]
    fn custom_reader() {
        let nibble = read_value("hi", |buffer: &[u8], offset: usize| {
            crate::read::read_u8(buffer, offset).map(|(b, n)| (Value::U8(b >> 4), n))
        });
        let rec = nibble.parse(&[0xab]).unwrap();
        assert_eq!(rec.get("hi"), Some(&Value::U8(0xa)));
    }
}
