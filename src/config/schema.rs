//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the mock server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::response::DEFAULT_CONTENT_TYPE;

/// Root configuration for the mock server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Canned responses served by the mock.
    pub responses: Vec<ResponseConfig>,

    /// Route definitions mapping requests to responses.
    pub routes: Vec<RouteConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time including artificial delay) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A canned response.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Unique response identifier, referenced by routes.
    pub id: String,

    /// Inline response body.
    pub content: Option<String>,

    /// File holding the response body, read on first request.
    /// Relative paths resolve against the config file's directory.
    pub file: Option<PathBuf>,

    /// MIME content type.
    pub content_type: String,

    /// Artificial delay before responding, in milliseconds.
    pub delay_ms: u64,

    /// Filters applied in order on every request.
    pub filters: Vec<FilterConfig>,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            content: None,
            file: None,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            delay_ms: 0,
            filters: Vec::new(),
        }
    }
}

/// A filter stage of a response.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterConfig {
    /// Replace every occurrence of `from` with `to`.
    Replace { from: String, to: String },

    /// ASCII upper-case the body.
    Uppercase,

    /// Replace `token` with the current Unix time in milliseconds.
    Timestamp {
        #[serde(default = "default_timestamp_token")]
        token: String,
    },
}

fn default_timestamp_token() -> String {
    "${timestamp}".to_string()
}

/// Route configuration mapping requests to a response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// HTTP method to match (any if unset).
    pub method: Option<String>,

    /// Exact path to match.
    pub path: Option<String>,

    /// Path prefix to match.
    pub path_prefix: Option<String>,

    /// Id of the response to serve.
    pub response: String,

    /// Route priority (higher = checked first).
    #[serde(default)]
    pub priority: u32,
}
