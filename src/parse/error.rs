//! Error types used to report failure in low-level parsing
//!
//! This module contains a hierarchy of types representing specific
//! classes of error that may arise while a [`Combinator`] threads a
//! [`Context`] through a buffer. Readers in [`crate::read`] produce the
//! leaf errors; field and structural combinators wrap them in
//! [`ParseError::Field`] so that the terminal failure names the field
//! that was being parsed.
//!
//! # Layout
//!
//! This module defines the primary type `ParseError`, the alias
//! `ParseResult<T>`, and the coarse classification [`ErrorKind`]; it
//! additionally defines type-level refinements of `ParseError`, grouped
//! according to similar provenance.
//!
//! [`Combinator`]: crate::parse::Combinator
//! [`Context`]: crate::parse::Context

use std::array::TryFromSliceError;
use std::error::Error;
use std::fmt::{Display, Formatter, Result};
use std::str::Utf8Error;
use std::char::DecodeUtf16Error;

use crate::error::ProjectError;

/// Enumeration type over all errors that may be encountered when running
/// a combinator over a buffer.
#[derive(Debug)]
pub enum ParseError {
    /// Error class encountered when a read, seek, or context-window
    /// would step outside the readable view of the buffer.
    Window(WindowError),
    /// Error class encountered when bytes were read successfully but could
    /// not be decoded as text under the requested encoding.
    Text(TextError),
    /// Error class encountered when a dispatch selector could not interpret
    /// a previously parsed field.
    Record(ProjectError),
    /// Error class encountered when internal invariants are violated
    Internal(InternalError),
    /// Wrapper recording which field was being parsed, and where, when
    /// `source` was raised.
    Field {
        field: String,
        offset: usize,
        source: Box<ParseError>,
    },
}

/// Coarse classification of a [`ParseError`] by its innermost cause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A primitive read would have consumed bytes past the readable view
    OutOfBounds,
    /// Text could not be decoded under a strict encoding
    Decoding,
    /// Misuse of seeks or context-windows
    Window,
    /// A previously parsed field was missing or had the wrong type
    Record,
    /// Implementation bug
    Internal,
}

impl ParseError {
    /// Wraps `self` with the name and starting offset of the field being parsed
    #[must_use]
    pub fn in_field(self, field: impl Into<String>, offset: usize) -> Self {
        Self::Field {
            field: field.into(),
            offset,
            source: Box::new(self),
        }
    }

    /// Strips every [`ParseError::Field`] layer and returns the innermost cause
    #[must_use]
    pub fn root(&self) -> &ParseError {
        let mut cur = self;
        while let ParseError::Field { source, .. } = cur {
            cur = source;
        }
        cur
    }

    /// Returns the dotted path of fields that were in progress when the
    /// error was raised, outermost first.
    #[must_use]
    pub fn field_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut cur = self;
        while let ParseError::Field { field, source, .. } = cur {
            path.push(field.as_str());
            cur = source;
        }
        path
    }

    /// Classifies this error according to its innermost cause
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            ParseError::Window(err) => err.kind(),
            ParseError::Text(_) => ErrorKind::Decoding,
            ParseError::Record(_) => ErrorKind::Record,
            ParseError::Internal(_) => ErrorKind::Internal,
            ParseError::Field { .. } => unreachable!("root() never returns a Field layer"),
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            ParseError::Window(err) => Display::fmt(err, f),
            ParseError::Text(err) => Display::fmt(err, f),
            ParseError::Record(err) => Display::fmt(err, f),
            ParseError::Internal(err) => Display::fmt(err, f),
            ParseError::Field {
                field,
                offset,
                source,
            } => write!(f, "field `{field}` at byte {offset}: {source}"),
        }
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ParseError::Window(err) => Some(err),
            ParseError::Text(err) => Some(err),
            ParseError::Record(err) => Some(err),
            ParseError::Internal(err) => Some(err),
            ParseError::Field { source, .. } => Some(source.as_ref()),
        }
    }
}

/// Type alias for Result with an error type of [`ParseError`]
///
/// Every reader and every combinator returns a `ParseResult`.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Errors related to the readable view of a buffer
///
/// Reads, seeks, and the opening and closing of context-windows installed
/// by [`within`](crate::combinator::structure::within) all report through
/// this type. Offsets are always absolute indices into the parse-buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowError {
    /// Error case when a read of `requested` bytes starting at `offset`
    /// would pass `limit`, the end of the current view.
    ///
    /// The distinction between absolute end-of-buffer and the end of a
    /// context-window is not made at this level.
    ConsumeWouldExceedLimit {
        offset: usize,
        requested: usize,
        limit: usize,
    },
    /// Error case when a context-window would extend past the end of the
    /// current view.
    OpenWouldExceedWindow { remaining: usize, request: usize },
    /// Error case when a context-window is closed with unconsumed bytes
    /// remaining within it.
    CloseWithResidue { residual: usize },
    /// Error case when the offset has been moved past the end of a
    /// context-window (e.g. by `skip`) by the time it is closed.
    OffsetOverflow { excess: usize },
    /// Error case when a seek would move the offset before the start of
    /// the buffer.
    SeekBeforeStart { from: usize, delta: i64 },
    /// Error case when a complete parse was required but bytes remain.
    TrailingBytes { residual: usize },
}

impl WindowError {
    fn kind(&self) -> ErrorKind {
        match self {
            WindowError::ConsumeWouldExceedLimit { .. }
            | WindowError::OpenWouldExceedWindow { .. } => ErrorKind::OutOfBounds,
            WindowError::CloseWithResidue { .. }
            | WindowError::OffsetOverflow { .. }
            | WindowError::SeekBeforeStart { .. }
            | WindowError::TrailingBytes { .. } => ErrorKind::Window,
        }
    }
}

impl From<WindowError> for ParseError {
    fn from(err: WindowError) -> Self {
        Self::Window(err)
    }
}

impl Display for WindowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match *self {
            WindowError::ConsumeWouldExceedLimit {
                limit,
                offset,
                requested,
            } => {
                write!(
                    f,
                    "cannot read {} bytes (currently at byte {} out of limit {})",
                    requested, offset, limit
                )
            }
            WindowError::OpenWouldExceedWindow { remaining, request } => {
                if remaining == 0 {
                    write!(
                        f,
                        "cannot open {}-byte context window: view has been fully consumed",
                        request
                    )
                } else {
                    write!(
                        f,
                        "cannot open {}-byte context window: only {} bytes remain in view",
                        request, remaining
                    )
                }
            }
            WindowError::CloseWithResidue { residual } => {
                write!(
                    f,
                    "cannot close context window with {} residual bytes",
                    residual
                )
            }
            WindowError::OffsetOverflow { excess } => {
                write!(
                    f,
                    "offset passed the end of the context window by {} bytes",
                    excess
                )
            }
            WindowError::SeekBeforeStart { from, delta } => {
                write!(
                    f,
                    "cannot seek by {} bytes from byte {}: before start of buffer",
                    delta, from
                )
            }
            WindowError::TrailingBytes { residual } => {
                write!(f, "parse finished with {} unconsumed bytes", residual)
            }
        }
    }
}

impl Error for WindowError {}

/// Errors arising from decoding a fixed-length byte-span as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    /// Bytes were not valid UTF-8
    Utf8(Utf8Error),
    /// Code units were not valid UTF-16
    Utf16(DecodeUtf16Error),
    /// A 16-bit encoding was requested over an odd number of bytes
    OddLength { length: usize },
}

impl From<TextError> for ParseError {
    fn from(err: TextError) -> Self {
        Self::Text(err)
    }
}

impl From<Utf8Error> for TextError {
    fn from(err: Utf8Error) -> Self {
        Self::Utf8(err)
    }
}

impl From<DecodeUtf16Error> for TextError {
    fn from(err: DecodeUtf16Error) -> Self {
        Self::Utf16(err)
    }
}

impl Display for TextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            TextError::Utf8(err) => write!(f, "byte-span is not valid UTF-8: {}", err),
            TextError::Utf16(err) => write!(f, "byte-span is not valid UTF-16: {}", err),
            TextError::OddLength { length } => {
                write!(f, "cannot decode {}-byte span as 16-bit code units", length)
            }
        }
    }
}

impl Error for TextError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TextError::Utf8(err) => Some(err),
            TextError::Utf16(err) => Some(err),
            TextError::OddLength { .. } => None,
        }
    }
}

impl From<ProjectError> for ParseError {
    fn from(err: ProjectError) -> Self {
        Self::Record(err)
    }
}

/// Implementation-internal errors
///
/// This error class represents certain 'impossible' cases, which signify
/// an implementation bug in a reader rather than malformed input.
#[derive(Debug, Clone, Copy)]
pub enum InternalError {
    SliceCoerceFailure(TryFromSliceError),
}

impl From<TryFromSliceError> for InternalError {
    fn from(err: TryFromSliceError) -> Self {
        Self::SliceCoerceFailure(err)
    }
}

impl From<InternalError> for ParseError {
    fn from(err: InternalError) -> Self {
        Self::Internal(err)
    }
}

impl Display for InternalError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            InternalError::SliceCoerceFailure(_err) => {
                write!(f, "failed to coerce from byte-slice to fixed-length array")
            }
        }
    }
}

impl Error for InternalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            InternalError::SliceCoerceFailure(err) => Some(err),
        }
    }
}

/// Converts a borrowed byte-slice into an owned byte-array
///
/// Returns a [`ParseError`] if this conversion cannot be performed.
/// This error is guaranteed to be an `InternalError`, as callers
/// are expected to have bounds-checked `bytes` beforehand.
pub(crate) fn coerce_slice<const N: usize>(bytes: &'_ [u8]) -> ParseResult<[u8; N]> {
    match <[u8; N] as std::convert::TryFrom<&'_ [u8]>>::try_from(bytes) {
        Ok(array) => Ok(array),
        Err(err) => Err(ParseError::from(InternalError::from(err))),
    }
}
