//! Resource handler groups and the deployed route policy.
//!
//! # Data Flow
//! ```text
//! ROUTE_POLICY (prefix, guarded)
//!     → group_for(prefix) → handler group
//!     → RouteTable::register
//! ```
//!
//! # Design Decisions
//! - The policy table is an external contract: prefix set and guard flags
//!   are reproduced exactly, in this order
//! - Every CRUD model shares one generic handler group

pub mod auth;
pub mod contributor;
pub mod crud;
pub mod root;
pub mod stats;

use crate::routing::{HandlerGroup, RouteTable, RouteTableError};

/// `(prefix, guarded)` for every mounted group.
pub const ROUTE_POLICY: &[(&str, bool)] = &[
    ("/", false),
    ("/auth", false),
    ("/stats", true),
    ("/person", false),
    ("/notification", false),
    ("/person-request", false),
    ("/contributor", false),
    ("/user", true),
    ("/role", true),
    ("/permission", true),
    ("/organization", true),
];

/// Models served by the generic CRUD group.
pub const RESOURCE_MODELS: &[&str] = &[
    "person",
    "notification",
    "person-request",
    "contributor",
    "user",
    "role",
    "permission",
    "organization",
];

fn group_for(prefix: &str) -> HandlerGroup {
    match prefix {
        "/" => root::group(),
        "/auth" => auth::group(),
        "/stats" => stats::group(),
        "/contributor" => contributor::group(),
        other => {
            let model = RESOURCE_MODELS
                .iter()
                .copied()
                .find(|m| other.strip_prefix('/') == Some(*m));
            match model {
                Some(model) => crud::group(model),
                None => HandlerGroup::new(),
            }
        }
    }
}

/// Route table with every resource mounted per [`ROUTE_POLICY`].
pub fn standard_route_table() -> Result<RouteTable, RouteTableError> {
    ROUTE_POLICY
        .iter()
        .try_fold(RouteTable::new(), |table, (prefix, guarded)| {
            table.register(*prefix, *guarded, group_for(prefix))
        })
}
