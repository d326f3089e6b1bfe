//! Building blocks for declarative grammars
//!
//! A grammar is a tree of [`Combinator`](crate::parse::Combinator) values
//! assembled from the functions in this module:
//!
//!   * `field` lifts the [readers](crate::read) into steps that store a
//!     named value and advance the cursor.
//!   * `structure` composes steps: sequencing, skipping and seeking,
//!     repetition into arrays of nested records, and context-windows.
//!   * `dispatch` chooses the next step from the values parsed so far.
//!   * `trace` logs the state of a parse without altering it.
//!
//! Everything is re-exported at this level, so a format definition only
//! needs `use weft::combinator::*`.

pub mod dispatch;
pub mod field;
pub mod structure;
pub mod trace;

pub use dispatch::{use_values, when, Cases};
pub use field::*;
pub use structure::{clear, push, repeat, repeat_to_end, seek, sequence, skip, within};
pub use trace::{trace, trace_field};
