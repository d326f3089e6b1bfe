//! Everything needed to write a format definition
//!
//! ```
//! use weft::prelude::*;
//!
//! let point = sequence([int16_be("x"), int16_be("y")]);
//! let rec: Record = point.parse(&[0, 1, 0xff, 0xff]).unwrap();
//! assert_eq!(rec.project::<i16>("y"), Ok(-1));
//! ```

pub use crate::combinator::*;
pub use crate::error::{ProjectError, ProjectResult};
pub use crate::parse::{Combinator, Context, ErrorKind, ParseError, ParseResult};
pub use crate::read::{Encoding, Endian};
pub use crate::value::{Record, Value};
pub use crate::{FromRecord, FromValue};
pub use std::io::SeekFrom;
