//! CORS policy from configuration.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

use crate::config::CorsConfig;

/// Reasons a CORS section cannot be turned into a layer.
#[derive(Debug, thiserror::Error)]
pub enum CorsConfigError {
    #[error("invalid origin `{0}`")]
    Origin(String),
    #[error("invalid method `{0}`")]
    Method(String),
    #[error("invalid header `{0}`")]
    Header(String),
    #[error("allow_credentials cannot be combined with a wildcard `{0}`")]
    CredentialsWithWildcard(&'static str),
}

fn is_wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v == "*")
}

/// Build the CORS layer described by `config`.
pub fn build_cors_layer(config: &CorsConfig) -> Result<CorsLayer, CorsConfigError> {
    if config.allow_credentials {
        for (name, values) in [
            ("origin", &config.allowed_origins),
            ("method", &config.allowed_methods),
            ("header", &config.allowed_headers),
        ] {
            if is_wildcard(values) {
                return Err(CorsConfigError::CredentialsWithWildcard(name));
            }
        }
    }

    let origins: AllowOrigin = if is_wildcard(&config.allowed_origins) {
        Any.into()
    } else {
        let parsed = config
            .allowed_origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o.trim()).map_err(|_| CorsConfigError::Origin(o.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(parsed)
    };

    let methods: AllowMethods = if is_wildcard(&config.allowed_methods) {
        Any.into()
    } else {
        let parsed = config
            .allowed_methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
                    .map_err(|_| CorsConfigError::Method(m.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowMethods::list(parsed)
    };

    let headers: AllowHeaders = if is_wildcard(&config.allowed_headers) {
        Any.into()
    } else {
        let parsed = config
            .allowed_headers
            .iter()
            .map(|h| {
                HeaderName::from_bytes(h.trim().as_bytes())
                    .map_err(|_| CorsConfigError::Header(h.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowHeaders::list(parsed)
    };

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(config.allow_credentials)
        .max_age(Duration::from_secs(config.max_age_secs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_builds() {
        assert!(build_cors_layer(&CorsConfig::default()).is_ok());
    }

    #[test]
    fn explicit_lists_build() {
        let config = CorsConfig {
            allowed_origins: vec!["https://app.example.com".into()],
            allowed_methods: vec!["get".into(), "POST".into()],
            allowed_headers: vec!["authorization".into(), "content-type".into()],
            allow_credentials: true,
            max_age_secs: 60,
        };
        assert!(build_cors_layer(&config).is_ok());
    }

    #[test]
    fn rejects_unparsable_header() {
        let config = CorsConfig {
            allowed_headers: vec!["bad header".into()],
            ..CorsConfig::default()
        };
        assert!(matches!(
            build_cors_layer(&config),
            Err(CorsConfigError::Header(_))
        ));
    }

    #[test]
    fn rejects_wildcard_with_credentials() {
        let config = CorsConfig {
            allowed_origins: vec!["https://app.example.com".into()],
            allow_credentials: true,
            ..CorsConfig::default()
        };
        // default headers are "*"
        assert!(matches!(
            build_cors_layer(&config),
            Err(CorsConfigError::CredentialsWithWildcard("header"))
        ));
    }
}
