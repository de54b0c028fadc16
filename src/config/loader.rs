//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServerConfig, ConfigError> {
    let config: ServerConfig = toml::from_str(content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.server.port, 3030);
        assert_eq!(config.server.body_limit_bytes, 5 * 1024 * 1024);
        assert_eq!(config.cors.allowed_origins, vec!["*".to_string()]);
    }

    #[test]
    fn parses_nested_sections() {
        let config = parse_config(
            r#"
            [server]
            port = 8080
            max_results_limit = 200

            [cors]
            allowed_origins = ["https://app.example.com"]
            allow_credentials = true

            [errors.status_codes]
            ConflictError = 409

            [identity.static_tokens]
            "dev-token" = "dev-user"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_results_limit, 200);
        assert_eq!(config.server.default_results_limit, 10);
        assert!(config.cors.allow_credentials);
        assert_eq!(config.errors.status_codes.get("ConflictError"), Some(&409));
        assert_eq!(
            config.identity.static_tokens.get("dev-token").map(String::as_str),
            Some("dev-user")
        );
    }

    #[test]
    fn reports_validation_failures() {
        let err = parse_config("[server]\nmax_results_limit = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("server.max_results_limit"));
    }

    #[test]
    fn reports_parse_failures() {
        let err = parse_config("[server\nport = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
