//! Offset arithmetic shared by readers and structural combinators
//!
//! Nothing in this module is exported; it exists so that every bounds
//! check in the crate is performed in exactly one place.

pub(crate) mod offset;
