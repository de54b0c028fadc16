//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the resource server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener and request-shaping settings.
    pub server: ListenerConfig,

    /// Cross-origin resource sharing policy.
    pub cors: CorsConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Error-kind to status-code overrides.
    pub errors: ErrorsConfig,

    /// Identity provider settings used by the authorization gate.
    pub identity: IdentityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Port to bind when none is given on the command line.
    pub port: u16,

    /// Upper bound on the number of records a list request may return.
    pub max_results_limit: usize,

    /// Page size used when a list request does not ask for one.
    pub default_results_limit: usize,

    /// Maximum accepted request body, raw or JSON.
    pub body_limit_bytes: usize,

    /// How long `close` waits for in-flight requests before forcing shutdown.
    pub shutdown_grace_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3030,
            max_results_limit: 50,
            default_results_limit: 10,
            body_limit_bytes: 5 * 1024 * 1024, // 5MB
            shutdown_grace_secs: 10,
        }
    }
}

impl ListenerConfig {
    /// `host:port` string for the given port.
    pub fn bind_address(&self, port: u16) -> String {
        format!("{}:{}", self.host, port)
    }
}

/// CORS policy applied to every request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. `"*"` allows any origin.
    pub allowed_origins: Vec<String>,

    /// Allowed methods. `"*"` allows any method.
    pub allowed_methods: Vec<String>,

    /// Allowed request headers. `"*"` allows any header.
    pub allowed_headers: Vec<String>,

    /// Whether credentials (cookies, authorization) may be sent.
    pub allow_credentials: bool,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_headers: vec!["*".to_string()],
            allow_credentials: false,
            max_age_secs: 600,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Generate an `x-request-id` for requests that arrive without one.
    pub generate_request_id: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            generate_request_id: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Error classification overrides.
///
/// Entries are merged over the built-in table (`ValidationError` and
/// `CastError` map to 400).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ErrorsConfig {
    /// Error kind name to HTTP status code.
    pub status_codes: BTreeMap<String, u16>,
}

/// Identity provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// RFC 7662 token introspection endpoint. When unset, only
    /// `static_tokens` are accepted.
    pub introspection_url: Option<String>,

    /// Client id sent to the introspection endpoint.
    pub client_id: Option<String>,

    /// Client secret sent to the introspection endpoint.
    pub client_secret: Option<String>,

    /// Introspection request timeout in seconds.
    pub timeout_secs: u64,

    /// Fixed bearer tokens mapped to their subject.
    pub static_tokens: BTreeMap<String, String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            introspection_url: None,
            client_id: None,
            client_secret: None,
            timeout_secs: 5,
            static_tokens: BTreeMap::new(),
        }
    }
}
