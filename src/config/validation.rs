//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing responses)
//! - Validate addresses and HTTP methods
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use axum::http::Method;
use thiserror::Error;

use crate::config::schema::{FilterConfig, ServerConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("response #{0} has an empty id")]
    EmptyResponseId(usize),

    #[error("duplicate response id '{0}'")]
    DuplicateResponseId(String),

    #[error("response '{0}' must set exactly one of `content` or `file`")]
    ContentSource(String),

    #[error("response '{response}' body file '{}' is not a readable file", path.display())]
    BodyFile { response: String, path: PathBuf },

    #[error("response '{0}' has an empty filter pattern")]
    EmptyFilterPattern(String),

    #[error("route #{0} has an empty name")]
    EmptyRouteName(usize),

    #[error("route '{route}' references unknown response '{response}'")]
    UnknownResponse { route: String, response: String },

    #[error("route '{route}' has invalid method '{method}'")]
    InvalidMethod { route: String, method: String },
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let mut ids = HashSet::new();
    for (i, response) in config.responses.iter().enumerate() {
        if response.id.trim().is_empty() {
            errors.push(ValidationError::EmptyResponseId(i));
            continue;
        }
        if !ids.insert(response.id.as_str()) {
            errors.push(ValidationError::DuplicateResponseId(response.id.clone()));
        }
        if response.content.is_some() == response.file.is_some() {
            errors.push(ValidationError::ContentSource(response.id.clone()));
        } else if let Some(path) = response.file.as_ref().filter(|p| !p.is_file()) {
            errors.push(ValidationError::BodyFile {
                response: response.id.clone(),
                path: path.clone(),
            });
        }
        let empty_pattern = response.filters.iter().any(|f| match f {
            FilterConfig::Replace { from, .. } => from.is_empty(),
            FilterConfig::Timestamp { token } => token.is_empty(),
            FilterConfig::Uppercase => false,
        });
        if empty_pattern {
            errors.push(ValidationError::EmptyFilterPattern(response.id.clone()));
        }
    }

    for (i, route) in config.routes.iter().enumerate() {
        if route.name.trim().is_empty() {
            errors.push(ValidationError::EmptyRouteName(i));
        }
        if !ids.contains(route.response.as_str()) {
            errors.push(ValidationError::UnknownResponse {
                route: route.name.clone(),
                response: route.response.clone(),
            });
        }
        if let Some(method) = &route.method {
            if Method::from_bytes(method.to_uppercase().as_bytes()).is_err() {
                errors.push(ValidationError::InvalidMethod {
                    route: route.name.clone(),
                    method: method.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{ResponseConfig, RouteConfig};

    fn response(id: &str) -> ResponseConfig {
        ResponseConfig {
            id: id.into(),
            content: Some("body".into()),
            ..ResponseConfig::default()
        }
    }

    fn route(name: &str, response: &str) -> RouteConfig {
        RouteConfig {
            name: name.into(),
            method: None,
            path: None,
            path_prefix: Some("/".into()),
            response: response.into(),
            priority: 0,
        }
    }

    #[test]
    fn test_valid_config() {
        let config = ServerConfig {
            responses: vec![response("a"), response("b")],
            routes: vec![route("r1", "a"), route("r2", "b")],
            ..ServerConfig::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut both = response("both");
        both.file = Some(PathBuf::from("x.txt"));

        let mut bad_filter = response("bad_filter");
        bad_filter.filters.push(FilterConfig::Replace {
            from: String::new(),
            to: "x".into(),
        });

        let mut bad_method = route("r3", "a");
        bad_method.method = Some("GE T".into());

        let mut config = ServerConfig {
            responses: vec![response("a"), response("a"), response(""), both, bad_filter],
            routes: vec![route("r1", "missing"), route("", "a"), bad_method],
            ..ServerConfig::default()
        };
        config.listener.bind_address = "not-an-address".into();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::BindAddress("not-an-address".into())));
        assert!(errors.contains(&ValidationError::DuplicateResponseId("a".into())));
        assert!(errors.contains(&ValidationError::EmptyResponseId(2)));
        assert!(errors.contains(&ValidationError::ContentSource("both".into())));
        assert!(errors.contains(&ValidationError::EmptyFilterPattern("bad_filter".into())));
        assert!(errors.contains(&ValidationError::UnknownResponse {
            route: "r1".into(),
            response: "missing".into(),
        }));
        assert!(errors.contains(&ValidationError::EmptyRouteName(1)));
        assert!(errors.contains(&ValidationError::InvalidMethod {
            route: "r3".into(),
            method: "GE T".into(),
        }));
        assert_eq!(errors.len(), 8);
    }

    #[test]
    fn test_body_file_must_exist() {
        let existing = std::env::temp_dir().join(format!("mock_validation_{}.txt", std::process::id()));
        std::fs::write(&existing, "body").unwrap();

        let mut present = response("present");
        present.content = None;
        present.file = Some(existing.clone());

        let mut absent = response("absent");
        absent.content = None;
        absent.file = Some(PathBuf::from("/definitely/not/here.txt"));

        let mut directory = response("directory");
        directory.content = None;
        directory.file = Some(std::env::temp_dir());

        let config = ServerConfig {
            responses: vec![present, absent, directory],
            ..ServerConfig::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BodyFile {
                    response: "absent".into(),
                    path: PathBuf::from("/definitely/not/here.txt"),
                },
                ValidationError::BodyFile {
                    response: "directory".into(),
                    path: std::env::temp_dir(),
                },
            ]
        );
        assert_eq!(
            errors[0].to_string(),
            "response 'absent' body file '/definitely/not/here.txt' is not a readable file"
        );

        std::fs::remove_file(&existing).unwrap_or_default();
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = ServerConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::MetricsAddress("nope".into())]
        );
    }
}
