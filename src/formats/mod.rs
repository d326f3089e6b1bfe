//! Format definitions built from the combinators of this crate

pub mod png;
