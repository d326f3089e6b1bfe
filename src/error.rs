//! General error types
//!
//! This module contains the errors raised when a parsed [`Record`] is
//! viewed through a typed lens, either by a dispatch selector reading a
//! discriminator field or by a [`FromRecord`] projection. Errors raised
//! while reading the buffer itself live in [`crate::parse::error`].
//!
//! [`Record`]: crate::value::Record
//! [`FromRecord`]: crate::project::FromRecord

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::value::Kind;

/// Error type for byte-spans whose width does not match the fixed
/// width of the type they are projected onto.
#[derive(Clone, PartialEq, PartialOrd, Eq, Ord, Debug)]
pub enum WidthError {
    /// Requirement of precise byte-width not satisfied
    WrongWidth { exact: usize, actual: usize },
}

impl Display for WidthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WidthError::WrongWidth { exact, actual } => {
                write!(
                    f,
                    "{actual}-byte value violated requirement of {exact} bytes"
                )
            }
        }
    }
}

impl Error for WidthError {}

/// Enumerated error type for failures to interpret a field of a
/// [`Record`](crate::value::Record) as a particular Rust type.
///
/// The `field` of each variant is the key that was being looked up; for
/// values nested inside sequences it is a path such as `chunks[2].width`.
#[derive(Clone, PartialEq, Debug)]
pub enum ProjectError {
    /// No value is stored under the requested key
    Missing { field: String },
    /// A value exists but its variant cannot be converted to the target type
    Mismatch {
        field: String,
        expected: &'static str,
        found: Kind,
    },
    /// An integral value does not fit into the target integer type
    OutOfRange { field: String, value: i128 },
    /// A byte-span does not have the width demanded by the target type
    Width { field: String, source: WidthError },
}

impl ProjectError {
    /// Prefixes the field path of this error with `parent`.
    ///
    /// Nested projections call this on the way out, so that the error
    /// reported for a deeply nested field names its full path.
    #[must_use]
    pub fn within(self, parent: &str) -> Self {
        let join = |field: String| {
            if field.is_empty() {
                parent.to_owned()
            } else if field.starts_with('[') {
                format!("{parent}{field}")
            } else {
                format!("{parent}.{field}")
            }
        };
        match self {
            Self::Missing { field } => Self::Missing { field: join(field) },
            Self::Mismatch {
                field,
                expected,
                found,
            } => Self::Mismatch {
                field: join(field),
                expected,
                found,
            },
            Self::OutOfRange { field, value } => Self::OutOfRange {
                field: join(field),
                value,
            },
            Self::Width { field, source } => Self::Width {
                field: join(field),
                source,
            },
        }
    }

    /// Returns the path of the field this error refers to
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Missing { field }
            | Self::Mismatch { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::Width { field, .. } => field,
        }
    }
}

impl Display for ProjectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectError::Missing { field } => write!(f, "missing field `{field}`"),
            ProjectError::Mismatch {
                field,
                expected,
                found,
            } => write!(f, "field `{field}`: expected {expected}, found {found}"),
            ProjectError::OutOfRange { field, value } => {
                write!(f, "field `{field}`: value {value} out of range for target type")
            }
            ProjectError::Width { field, source } => write!(f, "field `{field}`: {source}"),
        }
    }
}

impl Error for ProjectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ProjectError::Width { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Type alias for Result with an error type of [`ProjectError`]
pub type ProjectResult<T> = std::result::Result<T, ProjectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_paths() {
        let err = ProjectError::Missing {
            field: "width".into(),
        };
        let err = err.within("[0]").within("chunks");
        assert_eq!(err.field(), "chunks[0].width");
        assert_eq!(err.to_string(), "missing field `chunks[0].width`");
    }

    #[test]
    fn project_error_threadsafe() {
        fn dummy<T: Send + Sync>() {}
        dummy::<ProjectError>()
    }
}
