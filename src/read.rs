//! Byte readers: stateless decoding of primitive values
//!
//! Every reader is a pure function of a buffer and an offset, returning the
//! decoded value together with the number of bytes it consumed. Readers
//! never advance anything themselves; lifting a reader into a step that
//! moves the cursor is the job of [`read_value`](crate::combinator::field::read_value).
//!
//! All readers check that the bytes they would consume lie inside the
//! buffer they are handed, and fail with
//! [`WindowError::ConsumeWouldExceedLimit`] otherwise. When called through
//! a [`Context`](crate::parse::Context), that buffer is the current view,
//! so context-windows are honored without the readers knowing about them.
//!
//! [`WindowError::ConsumeWouldExceedLimit`]: crate::parse::error::WindowError::ConsumeWouldExceedLimit

use crate::internal::offset::claim;
use crate::parse::error::{coerce_slice, ParseResult, TextError};

/// Decoded value paired with the number of bytes consumed to produce it
pub type ValueLength<T> = (T, usize);

/// Byte order of a multi-byte numeric value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endian {
    Little,
    #[default]
    Big,
}

/// Text encodings understood by [`read_fixed_string`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Single-byte encoding that never fails: every byte maps to the
    /// `char` with the same code point, printable or not.
    Ascii,
    /// Strict UTF-8
    Utf8,
    /// Strict little-endian UTF-16
    Utf16Le,
}

mod private {
    pub trait Sealed {}
}

/// Fixed-width numeric types that can be read directly out of a buffer
///
/// This trait is sealed; it is implemented for every integer type from
/// 8 to 64 bits, and for `f32` and `f64`.
pub trait Primitive: Sized + Copy + private::Sealed {
    /// Number of bytes consumed by every read of this type
    const WIDTH: usize;

    /// Decodes a value from exactly `WIDTH` bytes.
    ///
    /// # Errors
    ///
    /// Returns an `InternalError` if `bytes.len() != WIDTH`; callers are
    /// expected to have bounds-checked beforehand.
    fn from_slice(bytes: &[u8], endian: Endian) -> ParseResult<Self>;
}

macro_rules! impl_primitive {
    ( $( $t:ty ),+ $(,)? ) => {
        $(
            impl private::Sealed for $t {}

            impl Primitive for $t {
                const WIDTH: usize = std::mem::size_of::<$t>();

                #[inline]
                fn from_slice(bytes: &[u8], endian: Endian) -> ParseResult<Self> {
                    let arr = coerce_slice::<{ std::mem::size_of::<$t>() }>(bytes)?;
                    Ok(match endian {
                        Endian::Little => <$t>::from_le_bytes(arr),
                        Endian::Big => <$t>::from_be_bytes(arr),
                    })
                }
            }
        )+
    };
}

impl_primitive!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Reads a `T` at `offset`, honoring `endian` for multi-byte types.
///
/// The consumed length is always `T::WIDTH`, whatever value is read.
///
/// # Errors
///
/// Fails with `ConsumeWouldExceedLimit` if fewer than `T::WIDTH` bytes
/// remain after `offset`.
#[inline]
pub fn read_primitive<T: Primitive>(
    buffer: &[u8],
    offset: usize,
    endian: Endian,
) -> ParseResult<ValueLength<T>> {
    let range = claim(offset, T::WIDTH, buffer.len())?;
    Ok((T::from_slice(&buffer[range], endian)?, T::WIDTH))
}

macro_rules! endian_readers {
    ( $( $(#[$doc:meta])* $name:ident => $t:ty ),+ $(,)? ) => {
        $(
            $(#[$doc])*
            #[inline]
            pub fn $name(buffer: &[u8], offset: usize, endian: Endian) -> ParseResult<ValueLength<$t>> {
                read_primitive::<$t>(buffer, offset, endian)
            }
        )+
    };
}

/// Reads a single unsigned byte
#[inline]
pub fn read_u8(buffer: &[u8], offset: usize) -> ParseResult<ValueLength<u8>> {
    read_primitive::<u8>(buffer, offset, Endian::Big)
}

/// Reads a single signed byte
#[inline]
pub fn read_i8(buffer: &[u8], offset: usize) -> ParseResult<ValueLength<i8>> {
    read_primitive::<i8>(buffer, offset, Endian::Big)
}

endian_readers! {
    read_u16 => u16,
    read_i16 => i16,
    read_u32 => u32,
    read_i32 => i32,
    read_u64 => u64,
    read_i64 => i64,
    /// Reads an IEEE-754 single-precision float
    read_f32 => f32,
    /// Reads an IEEE-754 double-precision float
    read_f64 => f64,
}

/// Copies the `length` bytes starting at `offset` out of `buffer`.
///
/// The returned vector is independent of the buffer.
pub fn read_bytes(buffer: &[u8], offset: usize, length: usize) -> ParseResult<ValueLength<Vec<u8>>> {
    let range = claim(offset, length, buffer.len())?;
    Ok((buffer[range].to_vec(), length))
}

/// Decodes the `length` bytes starting at `offset` as text.
///
/// # Errors
///
/// Besides the bounds check shared by all readers, fails with a
/// [`TextError`] when the bytes are not valid in a strict `encoding`.
/// [`Encoding::Ascii`] never fails.
pub fn read_fixed_string(
    buffer: &[u8],
    offset: usize,
    length: usize,
    encoding: Encoding,
) -> ParseResult<ValueLength<String>> {
    let range = claim(offset, length, buffer.len())?;
    let bytes = &buffer[range];
    let text: String = match encoding {
        Encoding::Ascii => bytes.iter().map(|&b| char::from(b)).collect(),
        Encoding::Utf8 => std::str::from_utf8(bytes)
            .map_err(TextError::from)?
            .to_owned(),
        Encoding::Utf16Le => {
            if bytes.len() % 2 != 0 {
                return Err(TextError::OddLength {
                    length: bytes.len(),
                }
                .into());
            }
            let units = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
            char::decode_utf16(units)
                .collect::<Result<String, _>>()
                .map_err(TextError::from)?
        }
    };
    Ok((text, length))
}
