//! Response filter subsystem.
//!
//! # Data Flow
//! ```text
//! base bytes → stream → filter[0] → filter[1] → … → filter[n-1] → drained output
//! ```
//!
//! # Design Decisions
//! - A filter is a single stream-to-stream capability; the pipeline knows nothing else about it
//! - Filters are shared (`Arc`) and must be safe to run from many requests at once
//! - A filter failure carries a human-readable message that may be shown to clients

use std::fmt;
use std::io;
use std::sync::Arc;
use thiserror::Error;

use crate::content::ContentStream;

pub mod builtin;

pub use builtin::{build_filter, ReplaceFilter, TimestampFilter, UppercaseFilter};

/// A byte-stream transformation stage.
pub trait ResponseFilter: Send + Sync + fmt::Debug {
    /// Transform `input` into a new stream.
    fn filter(&self, input: ContentStream) -> Result<ContentStream, FilterError>;
}

/// Shared handle to a filter.
pub type SharedFilter = Arc<dyn ResponseFilter>;

/// Failure raised by a filter.
///
/// Displays as its message alone.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct FilterError {
    message: String,
    source: Option<io::Error>,
}

impl FilterError {
    /// Create a filter error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// The message shown for this failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<io::Error> for FilterError {
    fn from(e: io::Error) -> Self {
        Self {
            message: e.to_string(),
            source: Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_filter_error_displays_message_only() {
        let err = FilterError::new("boom");
        assert_eq!(err.to_string(), "boom");
        assert_eq!(err.message(), "boom");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_filter_error_from_io_keeps_source() {
        let err = FilterError::from(io::Error::new(io::ErrorKind::Other, "disk gone"));
        assert_eq!(err.to_string(), "disk gone");
        assert!(err.source().is_some());
    }
}
