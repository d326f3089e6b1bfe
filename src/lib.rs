//! Declarative binary parsing from small, composable pieces
//!
//! # Overview
//!
//! `weft` describes binary formats as trees of *combinators*: small, pure
//! steps that each read a named field, move the cursor, or compose other
//! steps. A grammar is built once, shared freely, and applied to any number
//! of buffers, producing an ordered, dynamically-typed [`Record`] of the
//! fields it decoded. That record can in turn be projected onto ordinary
//! Rust structs with `#[derive(FromRecord)]`.
//!
//! The crate is organized in layers:
//!
//!  * [`read`] holds stateless readers of primitive values: integers and
//!    floats of either byte order, raw byte-spans, and fixed-length text.
//!  * [`parse`] defines the immutable cursor, [`Context`], and the
//!    [`Combinator`] handle, along with the [`ParseError`] hierarchy.
//!  * [`combinator`] provides the building blocks: named fields, sequencing,
//!    repetition, context-windows, and value-dependent dispatch.
//!  * [`value`] and [`project`] define the decoded representation and its
//!    conversion into typed structs.
//!  * [`formats`] contains complete grammars; currently PNG.
//!
//! # Example
//!
//! ```
//! use weft::combinator::*;
//! use weft::value::Value;
//!
//! let pascal = sequence([
//!     uint8("len"),
//!     use_values(|rec| Ok(fixed_ascii_string("text", rec.usize("len")?))),
//! ]);
//! let rec = pascal.parse(b"\x02hi").unwrap();
//! assert_eq!(rec.get("text"), Some(&Value::Text("hi".into())));
//! ```
//!
//! # Features
//!
//!  * `serde_impls`: `Serialize` for [`Value`] and [`Record`], and JSON
//!    output from the command-line tool.
//!  * `check_complete_parse`: top-level parses fail unless they consume
//!    the whole buffer.
//!
//! [`Value`]: value::Value

extern crate self as weft;

pub mod combinator;
pub mod error;
pub mod formats;
mod internal;
pub mod parse;
pub mod prelude;
pub mod project;
pub mod read;
pub mod value;

pub use parse::{reduce_buffer, Combinator, Context, ParseError, ParseResult};
pub use project::{FromRecord, FromValue};
pub use record_derive::FromRecord;
pub use value::Record;
