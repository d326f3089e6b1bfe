//! Value-dependent dispatch
//!
//! Grammars whose shape depends on earlier fields (a length prefix, a type
//! tag) are expressed with [`use_values`], which hands the record parsed so
//! far to a selector that returns the combinator to run next. [`Cases`] and
//! [`when`] cover the common case of choosing by a discriminator.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use crate::parse::{Combinator, ParseResult};
use crate::value::Record;

/// Runs whichever combinator `selector` builds from the current record.
///
/// The selector sees the accumulated fields but not the cursor, and cannot
/// alter either. Projection failures inside the selector (a missing or
/// mistyped discriminator) propagate as
/// [`ParseError::Record`](crate::parse::ParseError::Record) through `?`.
pub fn use_values<F>(selector: F) -> Combinator
where
    F: Fn(&Record) -> ParseResult<Combinator> + Send + Sync + 'static,
{
    Combinator::new(move |ctx| {
        let next = selector(ctx.values())?;
        next.apply(ctx)
    })
}

/// Table mapping discriminator values to combinators
#[derive(Debug, Clone)]
pub struct Cases<K> {
    table: HashMap<K, Combinator>,
}

impl<K: Hash + Eq> Cases<K> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Adds (or replaces) the combinator selected by `key`
    #[must_use]
    pub fn case(mut self, key: impl Into<K>, combinator: Combinator) -> Self {
        self.table.insert(key.into(), combinator);
        self
    }

    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&Combinator>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl<K: Hash + Eq> Default for Cases<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Looks `value` up in `cases`, falling back to `default`.
///
/// The lookup is exact: keys are not normalised in any way, so callers that
/// want case-insensitive matching must normalise both sides themselves.
pub fn when<K, Q>(value: &Q, cases: &Cases<K>, default: Combinator) -> Combinator
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
{
    cases.get(value).cloned().unwrap_or(default)
}
