//! Result shaping conventions for list endpoints.
//!
//! Every request carries a [`ResultShaping`] extension (records are keyed by
//! `_id`, list sizes are capped). List handlers take a [`ListQuery`], which
//! reads `$limit` / `$skip` and clamps them, and answer with a [`Page`].

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Serialize;

use crate::config::ListenerConfig;
use crate::http::error::AppError;

/// Identifier field of every resource record.
pub const ID_FIELD: &str = "_id";

/// Paging limits applied to list requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultShaping {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl ResultShaping {
    pub fn from_config(config: &ListenerConfig) -> Self {
        Self {
            default_limit: config.default_results_limit,
            max_limit: config.max_results_limit,
        }
    }

    /// Page size for a requested limit.
    pub fn clamp(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_limit).min(self.max_limit)
    }
}

impl Default for ResultShaping {
    fn default() -> Self {
        Self::from_config(&ListenerConfig::default())
    }
}

/// Paging parameters of a list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: usize,
    pub skip: usize,
}

fn parse_count(name: &str, raw: &str) -> Result<usize, AppError> {
    raw.trim().parse().map_err(|_| {
        AppError::cast(format!(
            "Cast to number failed for value \"{raw}\" at path \"{name}\""
        ))
    })
}

impl ListQuery {
    /// Read `$limit` and `$skip` from a query string.
    pub fn parse(query: Option<&str>, shaping: &ResultShaping) -> Result<Self, AppError> {
        let mut limit = None;
        let mut skip = 0;

        let pairs = query
            .map(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q))
            .transpose()
            .map_err(|e| AppError::cast(format!("malformed query string: {e}")))?
            .unwrap_or_default();

        for (key, value) in pairs {
            match key.as_str() {
                "$limit" => limit = Some(parse_count("$limit", &value)?),
                "$skip" => skip = parse_count("$skip", &value)?,
                _ => {}
            }
        }

        Ok(Self {
            limit: shaping.clamp(limit),
            skip,
        })
    }
}

impl<S> FromRequestParts<S> for ListQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let shaping = parts
            .extensions
            .get::<ResultShaping>()
            .copied()
            .unwrap_or_default();
        ListQuery::parse(parts.uri.query(), &shaping)
    }
}

/// List response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub total: usize,
    pub limit: usize,
    pub skip: usize,
    pub data: Vec<T>,
}
