//! The parse cursor and the combinator type
//!
//! This module defines the two types every other part of the crate is
//! built around:
//!
//!  * [`Context<'a>`], an immutable cursor over a borrowed buffer, made of
//!    the buffer itself, the current offset, the limit of the readable view,
//!    and the [`Record`] of fields parsed so far.
//!  * [`Combinator`], a shareable handle to a pure transform
//!    `Context<'a> -> ParseResult<Context<'a>>`.
//!
//! # Model
//!
//!  * A `Context` is created once per top-level parse, at offset 0 unless
//!    another start is requested, with an empty record.
//!  * A combinator takes its input context by value and returns a new one.
//!    Nothing is ever mutated behind another step's back, so isolating a
//!    nested sub-parse is just a matter of handing it a fresh context.
//!  * A read may only consume bytes in `offset..limit`. Outside of a
//!    context-window, `limit` is the length of the buffer.
//!  * `skip` and `seek` may move the offset past `limit`; the overrun is
//!    reported by the next read rather than by the move itself.
//!
//! The `error` submodule defines the hierarchy of errors returned when
//! any of this goes wrong.

pub mod error;

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

pub use error::{ErrorKind, ParseError, ParseResult};

use crate::value::Record;

/// Immutable parse cursor
///
/// The buffer is shared by every context derived from the same parse; the
/// record is owned, so the context handed to a step is the only copy of
/// the fields accumulated so far.
#[derive(Clone, PartialEq)]
pub struct Context<'a> {
    buffer: &'a [u8],
    offset: usize,
    limit: usize,
    values: Record,
}

impl<'a> Context<'a> {
    /// Creates a context over `buffer` at offset 0 with an empty record
    #[must_use]
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::at(buffer, 0)
    }

    /// Creates a context over `buffer` at `offset` with an empty record
    #[must_use]
    pub fn at(buffer: &'a [u8], offset: usize) -> Self {
        Self {
            buffer,
            offset,
            limit: buffer.len(),
            values: Record::new(),
        }
    }

    /// Returns the entire parse-buffer, regardless of any context-window
    #[inline]
    #[must_use]
    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    /// Returns the readable view, `buffer[..limit]`.
    ///
    /// Readers are handed this slice, so the bounds check they already
    /// perform against its length also enforces context-windows.
    #[inline]
    #[must_use]
    pub fn view(&self) -> &'a [u8] {
        &self.buffer[..self.limit]
    }

    #[inline]
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the end of the readable view
    #[inline]
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the number of bytes that can still be read; zero if the
    /// offset has been skipped past the limit.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.offset)
    }

    /// Returns `true` once no byte of the view is left to read
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.offset >= self.limit
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> &Record {
        &self.values
    }

    /// Discards the cursor and returns the accumulated record
    #[must_use]
    pub fn into_values(self) -> Record {
        self.values
    }

    /// Returns a context identical to `self` except for its offset
    #[must_use]
    pub fn with_offset(self, offset: usize) -> Self {
        Self { offset, ..self }
    }

    /// Returns a context identical to `self` except for its record
    #[must_use]
    pub fn with_values(self, values: Record) -> Self {
        Self { values, ..self }
    }

    /// Returns a context identical to `self` except for its limit
    #[must_use]
    pub(crate) fn with_limit(self, limit: usize) -> Self {
        debug_assert!(limit <= self.buffer.len());
        Self { limit, ..self }
    }

    /// Stores `value` under `name` and advances the offset by `consumed`
    #[must_use]
    pub fn apply_value(
        mut self,
        name: &str,
        value: impl Into<crate::value::Value>,
        consumed: usize,
    ) -> Self {
        self.values.insert(name, value);
        self.offset += consumed;
        self
    }

    /// Splits off a context at the same position over the same view,
    /// with an empty record, returning it along with the parent's record.
    pub(crate) fn fork(self) -> (Self, Record) {
        let Self {
            buffer,
            offset,
            limit,
            values,
        } = self;
        (
            Self {
                buffer,
                offset,
                limit,
                values: Record::new(),
            },
            values,
        )
    }
}

impl Debug for Context<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("len", &self.buffer.len())
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .field("values", &self.values)
            .finish()
    }
}

/// A single parsing step: a pure transform between contexts
///
/// This trait is implemented for every suitable closure, and is what a
/// [`Combinator`] holds. Implement it directly only for steps that carry
/// state too awkward to capture in a closure.
pub trait Step: Send + Sync {
    fn step<'a>(&self, ctx: Context<'a>) -> ParseResult<Context<'a>>;
}

impl<F> Step for F
where
    F: for<'a> Fn(Context<'a>) -> ParseResult<Context<'a>> + Send + Sync,
{
    #[inline]
    fn step<'a>(&self, ctx: Context<'a>) -> ParseResult<Context<'a>> {
        self(ctx)
    }
}

/// Shareable, thread-safe handle to a parsing [`Step`]
///
/// Cloning a `Combinator` is cheap, and the same combinator may be applied
/// any number of times, from any number of threads.
#[derive(Clone)]
pub struct Combinator(Arc<dyn Step>);

impl Combinator {
    /// Wraps a closure as a combinator
    pub fn new<F>(f: F) -> Self
    where
        F: for<'a> Fn(Context<'a>) -> ParseResult<Context<'a>> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Wraps a custom [`Step`] implementation as a combinator
    pub fn from_step<S: Step + 'static>(step: S) -> Self {
        Self(Arc::new(step))
    }

    /// Runs this combinator on `ctx`
    #[inline]
    pub fn apply<'a>(&self, ctx: Context<'a>) -> ParseResult<Context<'a>> {
        self.0.step(ctx)
    }

    /// Runs this combinator over `buffer` from `offset`, returning the
    /// final context.
    pub fn run<'a>(&self, buffer: &'a [u8], offset: usize) -> ParseResult<Context<'a>> {
        self.apply(Context::at(buffer, offset))
    }

    /// Parses `buffer` from the start and returns the decoded record
    pub fn parse(&self, buffer: &[u8]) -> ParseResult<Record> {
        self.parse_at(buffer, 0)
    }

    /// Parses `buffer` from `offset` and returns the decoded record
    ///
    /// With the `check_complete_parse` feature enabled, this fails with
    /// [`WindowError::TrailingBytes`](error::WindowError::TrailingBytes)
    /// unless the whole buffer was consumed.
    pub fn parse_at(&self, buffer: &[u8], offset: usize) -> ParseResult<Record> {
        let ctx = self.run(buffer, offset)?;
        cfg_if::cfg_if! {
            if #[cfg(feature = "check_complete_parse")] {
                if ctx.offset() != buffer.len() {
                    return Err(error::WindowError::TrailingBytes {
                        residual: buffer.len().saturating_sub(ctx.offset()),
                    }
                    .into());
                }
            }
        }
        Ok(ctx.into_values())
    }
}

impl Debug for Combinator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Combinator(..)")
    }
}

/// Runs `parser` over `buffer` from `offset` and returns the decoded record
///
/// Free-function form of [`Combinator::parse_at`].
pub fn reduce_buffer(parser: &Combinator, buffer: &[u8], offset: usize) -> ParseResult<Record> {
    parser.parse_at(buffer, offset)
}
