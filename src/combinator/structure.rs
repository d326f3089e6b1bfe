//! Structural combinators
//!
//! These compose other combinators without reading any value of their own:
//! [`sequence`] chains steps, [`skip`] and [`seek`] move the cursor,
//! [`push`], [`repeat`] and [`repeat_to_end`] collect nested records into
//! arrays, and [`within`] confines a sub-parse to a context-window.

use std::io::SeekFrom;

use crate::internal::offset::{close_window, open_window, resolve_seek};
use crate::parse::{Combinator, Context, ParseResult};
use crate::value::{Record, Value};

/// Chains `steps` left to right, feeding each the context returned by the
/// one before. The first failure aborts the chain.
///
/// An empty sequence is the identity.
pub fn sequence(steps: impl IntoIterator<Item = Combinator>) -> Combinator {
    let steps: Vec<Combinator> = steps.into_iter().collect();
    Combinator::new(move |ctx| steps.iter().try_fold(ctx, |ctx, step| step.apply(ctx)))
}

/// Advances the offset by `length` bytes without reading them.
///
/// No bounds check is performed; skipping past the end of the view is
/// reported by whichever read comes next.
pub fn skip(length: usize) -> Combinator {
    Combinator::new(move |ctx| {
        let offset = ctx.offset().saturating_add(length);
        Ok(ctx.with_offset(offset))
    })
}

/// Repositions the cursor.
///
/// `SeekFrom::End` is relative to the end of the whole buffer. As with
/// [`skip`], positions past the end are accepted; positions before byte 0
/// fail with [`WindowError::SeekBeforeStart`](crate::parse::error::WindowError::SeekBeforeStart).
pub fn seek(pos: SeekFrom) -> Combinator {
    Combinator::new(move |ctx| {
        let target = resolve_seek(ctx.offset(), pos, ctx.buffer().len())?;
        Ok(ctx.with_offset(target))
    })
}

/// Discards every field parsed so far, leaving the offset unchanged
pub fn clear() -> Combinator {
    Combinator::new(|ctx| Ok(ctx.with_values(Record::new())))
}

/// Number of elements already collected under `name`
fn seq_len(values: &Record, name: &str) -> usize {
    match values.get(name) {
        Some(Value::Seq(items)) => items.len(),
        _ => 0,
    }
}

/// Makes sure `name` holds a sequence, so that zero repetitions still
/// leave an (empty) array behind.
fn ensure_seq(values: &mut Record, name: &str) {
    if !matches!(values.get(name), Some(Value::Seq(_))) {
        values.insert(name, Value::Seq(Vec::new()));
    }
}

fn push_once<'a>(ctx: Context<'a>, name: &str, sub: &Combinator) -> ParseResult<Context<'a>> {
    let offset = ctx.offset();
    let (child, mut values) = ctx.fork();
    let index = seq_len(&values, name);
    let child = sub
        .apply(child)
        .map_err(|err| err.in_field(format!("{name}[{index}]"), offset))?;
    let (ctx, element) = child.fork();
    values.append(name, Value::Record(element));
    Ok(ctx.with_values(values))
}

/// Runs `sub` in isolation and appends its record to the array `name`.
///
/// The sub-parse starts at the current offset with an empty record, so it
/// can neither see nor disturb the fields of its parent. Its final offset
/// is adopted by the parent.
pub fn push(name: impl Into<String>, sub: Combinator) -> Combinator {
    let name = name.into();
    Combinator::new(move |ctx| push_once(ctx, &name, &sub))
}

/// Applies [`push`] `count` times in a row
pub fn repeat(count: usize, sub: Combinator, name: impl Into<String>) -> Combinator {
    let name = name.into();
    Combinator::new(move |ctx| {
        let (ctx, mut values) = ctx.fork();
        ensure_seq(&mut values, &name);
        let mut ctx = ctx.with_values(values);
        for _ in 0..count {
            ctx = push_once(ctx, &name, &sub)?;
        }
        Ok(ctx)
    })
}

/// Applies [`push`] for as long as any byte of the view remains.
///
/// The check happens before each attempt: a view that is already exhausted
/// produces an empty array, and input ending exactly on an element boundary
/// stops cleanly. Trailing bytes too short for a whole element make the
/// final attempt fail. An element that consumes no bytes ends the loop
/// after being recorded once.
pub fn repeat_to_end(sub: Combinator, name: impl Into<String>) -> Combinator {
    let name = name.into();
    Combinator::new(move |ctx| {
        let (ctx, mut values) = ctx.fork();
        ensure_seq(&mut values, &name);
        let mut ctx = ctx.with_values(values);
        while !ctx.is_exhausted() {
            let before = ctx.offset();
            ctx = push_once(ctx, &name, &sub)?;
            if ctx.offset() == before {
                // an element that consumes nothing would repeat forever
                break;
            }
        }
        Ok(ctx)
    })
}

/// Runs `sub` inside a context-window of exactly `length` bytes.
///
/// Reads within `sub` cannot see past the window, and `sub` must consume
/// the window exactly: leftover bytes fail with `CloseWithResidue` and a
/// cursor moved beyond the window fails with `OffsetOverflow`. Opening a
/// window wider than the current view fails with `OpenWouldExceedWindow`.
pub fn within(length: usize, sub: Combinator) -> Combinator {
    Combinator::new(move |ctx| {
        let outer = ctx.limit();
        let target = open_window(ctx.offset(), length, outer)?;
        let ctx = sub.apply(ctx.with_limit(target))?;
        close_window(ctx.offset(), target)?;
        Ok(ctx.with_limit(outer))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinator::field::{bytes, uint16_be, uint8};
    use crate::parse::error::{ErrorKind, ParseError, WindowError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn pair() -> Combinator {
        sequence([uint8("a"), uint8("b")])
    }

    #[test]
    fn sequence_is_a_fold() {
        let buf = [1u8, 2, 3];
        let folded = uint8("b").apply(uint8("a").apply(Context::new(&buf)).unwrap()).unwrap();
        assert_eq!(pair().run(&buf, 0).unwrap(), folded);
        let empty = sequence(Vec::<Combinator>::new()).run(&buf, 1).unwrap();
        assert_eq!(empty, Context::at(&buf, 1));
    }

    #[test]
    fn sequence_is_not_commutative() {
        let buf = [0x00, 0x01, 0x02];
        let ab = sequence([uint8("a"), uint16_be("b")]).parse(&buf).unwrap();
        let ba = sequence([uint16_be("b"), uint8("a")]).parse(&buf).unwrap();
        assert_eq!(ab.get("a"), Some(&Value::U8(0)));
        assert_eq!(ba.get("a"), Some(&Value::U8(2)));
        assert_ne!(ab, ba);
    }

    #[test]
    fn sequence_short_circuits() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = {
            let hits = hits.clone();
            Combinator::new(move |ctx| {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(ctx)
            })
        };
        let err = sequence([uint16_be("x"), counter]).parse(&[1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn skip_is_lazy() {
        let ctx = skip(10).run(&[0u8; 2], 0).unwrap();
        assert_eq!(ctx.offset(), 10);
        let err = sequence([skip(10), uint8("x")]).parse(&[0u8; 2]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);
    }

    #[test]
    fn seek_origins() {
        let buf = [0u8, 1, 2, 3, 4, 5];
        let ctx = sequence([seek(SeekFrom::Start(4)), uint8("x")]).run(&buf, 0).unwrap();
        assert_eq!(ctx.values().get("x"), Some(&Value::U8(4)));
        let ctx = sequence([uint8("a"), seek(SeekFrom::Current(-1)), uint8("b")])
            .run(&buf, 0)
            .unwrap();
        assert_eq!(ctx.values().get("b"), Some(&Value::U8(0)));
        let ctx = sequence([seek(SeekFrom::End(-2)), uint8("y")]).run(&buf, 0).unwrap();
        assert_eq!(ctx.offset(), 5);
        assert_eq!(ctx.values().get("y"), Some(&Value::U8(4)));
    }

    #[test]
    fn seek_before_start() {
        let err = sequence([uint8("a"), seek(SeekFrom::Current(-2))])
            .parse(&[0u8; 4])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Window);
        assert!(matches!(
            err,
            ParseError::Window(WindowError::SeekBeforeStart { from: 1, delta: -2 })
        ));
    }

    #[test]
    fn clear_drops_fields() {
        let ctx = sequence([uint8("a"), clear(), uint8("b")]).run(&[1, 2], 0).unwrap();
        assert_eq!(ctx.offset(), 2);
        assert_eq!(ctx.values().keys().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn push_isolates_and_appends() {
        let buf = [7u8, 1, 2, 3, 4];
        let grammar = sequence([uint8("n"), push("items", pair()), push("items", pair())]);
        let ctx = grammar.run(&buf, 0).unwrap();
        assert_eq!(ctx.offset(), 5);
        let items = ctx.values().get("items").and_then(Value::as_seq).unwrap();
        assert_eq!(items.len(), 2);
        let first = items[0].as_record().unwrap();
        assert_eq!(first.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(first.get("a"), Some(&Value::U8(1)));
        assert!(!first.contains("n"));
        assert_eq!(ctx.values().get("n"), Some(&Value::U8(7)));
    }

    #[test]
    fn repeat_counts() {
        let buf = [1u8, 2, 3, 4, 5, 6];
        let rec = repeat(3, pair(), "pairs").parse(&buf).unwrap();
        let pairs = rec.get("pairs").and_then(Value::as_seq).unwrap();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[2].as_record().unwrap().get("b"), Some(&Value::U8(6)));

        let ctx = repeat(0, pair(), "pairs").run(&buf, 0).unwrap();
        assert_eq!(ctx.offset(), 0);
        assert_eq!(ctx.values().get("pairs"), Some(&Value::Seq(vec![])));
    }

    #[test]
    fn repeat_failure_names_index() {
        let err = repeat(2, pair(), "pairs").parse(&[1, 2, 3]).unwrap_err();
        assert_eq!(err.field_path(), vec!["pairs[1]", "b"]);
        assert!(matches!(err, ParseError::Field { offset: 2, .. }));
    }

    #[test]
    fn repeat_to_end_exact() {
        let buf = [1u8, 2, 3, 4];
        let ctx = repeat_to_end(pair(), "pairs").run(&buf, 0).unwrap();
        assert_eq!(ctx.offset(), 4);
        assert_eq!(ctx.values().get("pairs").and_then(Value::as_seq).map(<[_]>::len), Some(2));
    }

    #[test]
    fn repeat_to_end_empty_at_entry() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = {
            let hits = hits.clone();
            Combinator::new(move |ctx| {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(ctx)
            })
        };
        let rec = repeat_to_end(counter.clone(), "xs").parse(&[]).unwrap();
        assert_eq!(rec.get("xs"), Some(&Value::Seq(vec![])));
        let ctx = sequence([skip(5), repeat_to_end(counter, "xs")])
            .run(&[1, 2], 0)
            .unwrap();
        assert_eq!(ctx.values().get("xs"), Some(&Value::Seq(vec![])));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn repeat_to_end_partial_tail() {
        let err = repeat_to_end(pair(), "pairs").parse(&[1, 2, 3]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);
        assert_eq!(err.field_path(), vec!["pairs[1]", "b"]);
    }

    #[test]
    fn repeat_to_end_stops_on_empty_element() {
        let ctx = repeat_to_end(sequence(Vec::<Combinator>::new()), "xs")
            .run(&[1], 0)
            .unwrap();
        assert_eq!(ctx.offset(), 0);
        assert_eq!(ctx.values().get("xs").and_then(Value::as_seq).map(<[_]>::len), Some(1));
    }

    #[test]
    fn within_exact() {
        let buf = [1u8, 2, 3, 4, 5];
        let grammar = sequence([within(3, repeat_to_end(uint8("x"), "xs")), uint8("after")]);
        let ctx = grammar.run(&buf, 0).unwrap();
        assert_eq!(ctx.limit(), 5);
        assert_eq!(ctx.offset(), 4);
        assert_eq!(ctx.values().get("xs").and_then(Value::as_seq).map(<[_]>::len), Some(3));
        assert_eq!(ctx.values().get("after"), Some(&Value::U8(4)));
    }

    #[test]
    fn within_hides_outer_bytes() {
        let err = within(1, uint16_be("x")).parse(&[1, 2, 3]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);
    }

    #[test]
    fn within_residue_and_overflow() {
        let buf = [0u8; 8];
        let err = within(4, uint8("x")).parse(&buf).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Window(WindowError::CloseWithResidue { residual: 3 })
        ));
        let err = within(2, skip(3)).parse(&buf).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Window(WindowError::OffsetOverflow { excess: 1 })
        ));
        let err = within(9, bytes("all", 9)).parse(&buf).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Window(WindowError::OpenWouldExceedWindow { remaining: 8, request: 9 })
        ));
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);
    }

    #[test]
    fn nested_windows() {
        let buf = [1u8, 2, 3, 4];
        let inner = within(2, sequence([uint8("a"), uint8("b")]));
        let rec = within(4, sequence([inner, skip(2)])).parse(&buf).unwrap();
        assert_eq!(rec.get("b"), Some(&Value::U8(2)));
        let err = within(2, within(3, skip(3))).parse(&buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);
    }
}
