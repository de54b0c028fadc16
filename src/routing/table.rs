//! Route table: path prefix → (guarded?, handler group).
//!
//! # Responsibilities
//! - Hold the ordered, declarative list of mounted handler groups
//! - Reject duplicate or malformed prefixes at construction
//! - Compose the axum router once, inserting the authorization gate in
//!   front of guarded groups only
//!
//! # Design Decisions
//! - Gating is decided here, at startup, never per request
//! - Immutable after construction
//! - Prefixes are disjoint, so registration order never shadows a route

use std::sync::Arc;

use axum::{middleware, Router};

use crate::http::server::AppState;
use crate::security::authorization::{require_authorization, AuthorizationGate};

/// Resource-specific handlers mounted under one prefix.
pub type HandlerGroup = Router<AppState>;

/// One mounted handler group.
struct RouteEntry {
    prefix: String,
    guarded: bool,
    group: HandlerGroup,
}

impl std::fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteEntry")
            .field("prefix", &self.prefix)
            .field("guarded", &self.guarded)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteTableError {
    #[error("prefix `{0}` is registered more than once")]
    Duplicate(String),
    #[error("prefix `{0}` must start with '/' and must not end with one")]
    InvalidPrefix(String),
}

/// Ordered set of mounted handler groups.
#[derive(Debug, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `group` under `prefix`.
    pub fn register(
        mut self,
        prefix: impl Into<String>,
        guarded: bool,
        group: HandlerGroup,
    ) -> Result<Self, RouteTableError> {
        let prefix = prefix.into();
        let well_formed = prefix == "/" || (prefix.starts_with('/') && !prefix.ends_with('/'));
        if !well_formed {
            return Err(RouteTableError::InvalidPrefix(prefix));
        }
        if self.entries.iter().any(|e| e.prefix == prefix) {
            return Err(RouteTableError::Duplicate(prefix));
        }

        self.entries.push(RouteEntry {
            prefix,
            guarded,
            group,
        });
        Ok(self)
    }

    /// `(prefix, guarded)` for every entry, in registration order.
    pub fn policy(&self) -> Vec<(&str, bool)> {
        self.entries
            .iter()
            .map(|e| (e.prefix.as_str(), e.guarded))
            .collect()
    }

    /// Compose every entry into one router.
    pub fn into_router(self, gate: Arc<dyn AuthorizationGate>) -> Router<AppState> {
        self.entries
            .into_iter()
            .fold(Router::new(), |router, entry| {
                let group = if entry.guarded {
                    entry.group.layer(middleware::from_fn_with_state(
                        Arc::clone(&gate),
                        require_authorization,
                    ))
                } else {
                    entry.group
                };

                tracing::debug!(prefix = %entry.prefix, guarded = entry.guarded, "Mounting handler group");
                if entry.prefix == "/" {
                    router.merge(group)
                } else {
                    router.nest(&entry.prefix, group)
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicates() {
        let err = RouteTable::new()
            .register("/user", true, Router::new())
            .unwrap()
            .register("/user", false, Router::new())
            .unwrap_err();
        assert_eq!(err, RouteTableError::Duplicate("/user".into()));
    }

    #[test]
    fn rejects_malformed_prefixes() {
        for bad in ["user", "/user/", ""] {
            assert!(matches!(
                RouteTable::new().register(bad, false, Router::new()),
                Err(RouteTableError::InvalidPrefix(_))
            ));
        }
    }

    #[test]
    fn reports_policy_in_order() {
        let table = RouteTable::new()
            .register("/", false, Router::new())
            .unwrap()
            .register("/role", true, Router::new())
            .unwrap();

        assert_eq!(table.policy(), vec![("/", false), ("/role", true)]);
    }
}
