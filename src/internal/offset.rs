//! Offsets and context windows for the immutable parse cursor
//!
//! A [`Context`](crate::parse::Context) never mutates an index in place;
//! instead, every movement of the cursor is computed here as a pure
//! function of the old offset, the requested width, and the limit of the
//! current view, and either yields the new position or the
//! [`WindowError`] describing why the movement is illegal.

use std::cmp::Ordering;
use std::io::SeekFrom;
use std::ops::Range;

use crate::parse::error::WindowError;

/// Computes the byte range claimed by a read of `requested` bytes at
/// `offset`, provided it lies entirely within `0..limit`.
///
/// A read of zero bytes is valid anywhere up to and including `limit`.
/// The sum `offset + requested` is computed with overflow checking, so
/// an absurd request fails rather than wrapping around.
///
/// The following assertions hold for all inputs:
///
/// ```ignore
/// if let Ok(range) = claim(offset, requested, limit) {
///     assert_eq!(range.start, offset);
///     assert_eq!(range.len(), requested);
///     assert!(range.end <= limit);
/// }
/// ```
#[inline]
pub(crate) fn claim(offset: usize, requested: usize, limit: usize) -> Result<Range<usize>, WindowError> {
    match offset.checked_add(requested) {
        Some(end) if end <= limit => Ok(offset..end),
        _ => Err(WindowError::ConsumeWouldExceedLimit {
            offset,
            requested,
            limit,
        }),
    }
}

/// Determines the limit of a new context-window of `width` bytes opened
/// at `offset`, which must nest inside the current view ending at `limit`.
#[inline]
pub(crate) fn open_window(offset: usize, width: usize, limit: usize) -> Result<usize, WindowError> {
    match offset.checked_add(width) {
        Some(target) if target <= limit => Ok(target),
        _ => Err(WindowError::OpenWouldExceedWindow {
            remaining: limit.saturating_sub(offset),
            request: width,
        }),
    }
}

/// Checks that a context-window whose end is `target` can be closed with
/// the cursor at `offset`, i.e. that every byte inside it was consumed.
#[inline]
pub(crate) fn close_window(offset: usize, target: usize) -> Result<(), WindowError> {
    match target.cmp(&offset) {
        Ordering::Equal => Ok(()),
        Ordering::Greater => Err(WindowError::CloseWithResidue {
            residual: target - offset,
        }),
        Ordering::Less => Err(WindowError::OffsetOverflow {
            excess: offset - target,
        }),
    }
}

/// Resolves a seek relative to the cursor at `offset` within a buffer of
/// `len` bytes.
///
/// Targets past the end of the buffer are permitted, matching `skip`;
/// the overrun is reported by the next read. Targets before byte 0 are not.
pub(crate) fn resolve_seek(offset: usize, pos: SeekFrom, len: usize) -> Result<usize, WindowError> {
    let (base, delta) = match pos {
        SeekFrom::Start(abs) => return Ok(usize::try_from(abs).unwrap_or(usize::MAX)),
        SeekFrom::Current(delta) => (offset, delta),
        SeekFrom::End(delta) => (len, delta),
    };
    let target = if delta >= 0 {
        usize::try_from(delta)
            .ok()
            .and_then(|d| base.checked_add(d))
            .unwrap_or(usize::MAX)
    } else {
        usize::try_from(delta.unsigned_abs())
            .ok()
            .and_then(|d| base.checked_sub(d))
            .ok_or(WindowError::SeekBeforeStart { from: offset, delta })?
    };
    Ok(target)
}
