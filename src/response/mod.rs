//! Mock response subsystem.
//!
//! # Data Flow
//! ```text
//! ResponseConfig[] (from config file)
//!     → registry.rs (build one pipeline per response)
//!     → pipeline.rs (materialize content once, filter per request)
//!     → HTTP handler writes bytes + content type
//! ```

pub mod pipeline;
pub mod registry;
pub mod types;

pub use pipeline::{ResponseBuilder, ResponsePipeline, DEFAULT_CONTENT_TYPE};
pub use registry::ResponseRegistry;
pub use types::ResponseError;
