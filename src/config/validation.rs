//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, status codes are errors)
//! - Check that CORS, URL and address strings parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::StatusCode;

use crate::config::schema::ServerConfig;
use crate::http::middleware::cors::build_cors_layer;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub reason: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Check a parsed configuration, returning every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let server = &config.server;
    if server.port == 0 {
        errors.push(ValidationError::new("server.port", "must be non-zero"));
    }
    if server.max_results_limit == 0 {
        errors.push(ValidationError::new(
            "server.max_results_limit",
            "must be greater than zero",
        ));
    }
    if server.default_results_limit == 0 || server.default_results_limit > server.max_results_limit {
        errors.push(ValidationError::new(
            "server.default_results_limit",
            format!(
                "must be between 1 and max_results_limit ({})",
                server.max_results_limit
            ),
        ));
    }
    if server.body_limit_bytes == 0 {
        errors.push(ValidationError::new(
            "server.body_limit_bytes",
            "must be greater than zero",
        ));
    }
    if server.host.trim().is_empty() {
        errors.push(ValidationError::new("server.host", "must not be empty"));
    }

    if let Err(e) = build_cors_layer(&config.cors) {
        errors.push(ValidationError::new("cors", e.to_string()));
    }

    let observability = &config.observability;
    if !matches!(observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format `{}` (expected pretty or json)", observability.log_format),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", observability.metrics_address),
        ));
    }

    for (kind, code) in &config.errors.status_codes {
        let valid = StatusCode::from_u16(*code)
            .map(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::new(
                format!("errors.status_codes.{kind}"),
                format!("{code} is not a 4xx or 5xx status code"),
            ));
        }
        if kind.trim().is_empty() {
            errors.push(ValidationError::new(
                "errors.status_codes",
                "error kind names must not be empty",
            ));
        }
    }

    if let Some(raw) = &config.identity.introspection_url {
        if let Err(e) = url::Url::parse(raw) {
            errors.push(ValidationError::new(
                "identity.introspection_url",
                format!("`{raw}` is not a URL: {e}"),
            ));
        }
    }
    if config.identity.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "identity.timeout_secs",
            "must be greater than zero",
        ));
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

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = ServerConfig::default();
        config.server.port = 0;
        config.server.max_results_limit = 0;
        config.server.body_limit_bytes = 0;
        config.observability.log_format = "xml".into();
        config.errors.status_codes.insert("TeapotError".into(), 200);

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"server.port"));
        assert!(fields.contains(&"server.max_results_limit"));
        assert!(fields.contains(&"server.default_results_limit"));
        assert!(fields.contains(&"server.body_limit_bytes"));
        assert!(fields.contains(&"observability.log_format"));
        assert!(fields.contains(&"errors.status_codes.TeapotError"));
    }

    #[test]
    fn rejects_credentials_with_wildcard_origin() {
        let mut config = ServerConfig::default();
        config.cors.allow_credentials = true;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "cors");
    }

    #[test]
    fn rejects_bad_introspection_url() {
        let mut config = ServerConfig::default();
        config.identity.introspection_url = Some("not a url".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "identity.introspection_url");
    }
}
