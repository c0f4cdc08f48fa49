//! Mock HTTP server library.
//!
//! Serves canned responses defined in a configuration file. Each response
//! owns its content (inline text or a file drained on first request), an
//! ordered filter chain re-applied on every request, a content type and an
//! artificial delay.

pub mod config;
pub mod content;
pub mod filter;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod response;
pub mod routing;

pub use config::ServerConfig;
pub use content::ContentSource;
pub use filter::{FilterError, ResponseFilter};
pub use http::MockServer;
pub use lifecycle::Shutdown;
pub use response::{ResponseError, ResponsePipeline, ResponseRegistry};
