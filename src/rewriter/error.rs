use std::fmt;

/// Rewrite failures are deterministic and synchronous: the same tree and
/// request always fail the same way. Nothing here is retryable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    /// A sort property carried punctuation other than `.`/`_` and was not
    /// marked raw. Rejected before any rewriting happens.
    UnsafeSortProperty(String),
    /// A transformation needed the primary alias but introspection found
    /// none declared on the first FROM root.
    MissingPrimaryAlias,
    /// The keyset position lacks a value for one of the sort properties.
    MissingKeysetValue(String),
    /// Keyset pagination was requested without any sort keys.
    EmptyKeysetSort,
    /// The statement contains a construct the requested transformation does
    /// not cover. Reported instead of producing best-effort wrong text.
    Unsupported { operation: &'static str, construct: String },
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewriteError::UnsafeSortProperty(property) => {
                write!(f, "unsafe sort property '{}'", property)
            }
            RewriteError::MissingPrimaryAlias => {
                write!(f, "no primary alias declared on the first FROM root")
            }
            RewriteError::MissingKeysetValue(property) => {
                write!(f, "keyset position has no value for sort property '{}'", property)
            }
            RewriteError::EmptyKeysetSort => {
                write!(f, "keyset pagination requires at least one sort key")
            }
            RewriteError::Unsupported { operation, construct } => {
                write!(f, "{} does not support {}", operation, construct)
            }
        }
    }
}

impl std::error::Error for RewriteError {}

impl RewriteError {
    pub fn err<T>(self) -> Result<T, RewriteError> {
        Err(self)
    }
}
