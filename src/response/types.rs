//! Response error definitions.

use std::path::PathBuf;
use thiserror::Error;

use crate::filter::FilterError;

/// Errors raised while building or rendering a response.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// Construction input was missing or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A response's body file could not be opened.
    #[error("response '{response}': cannot open body file '{}': {source}", path.display())]
    BodyFile {
        response: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Producing or draining content failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A filter in the chain failed.
    #[error(transparent)]
    Filter(#[from] FilterError),
}
