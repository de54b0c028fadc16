//! Session introspection for clients.
//!
//! Mounted unguarded: the answer to "is my token valid?" must be reachable
//! without a valid token.

use axum::{extract::State, http::HeaderMap, routing::get, Json, Router};
use serde::Serialize;

use crate::http::server::AppState;
use crate::security::bearer_token;
use crate::services::identity::Identity;

#[derive(Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub async fn get_session(State(state): State<AppState>, headers: HeaderMap) -> Json<SessionStatus> {
    let Some(token) = bearer_token(&headers) else {
        return Json(SessionStatus {
            authenticated: false,
            identity: None,
            reason: None,
        });
    };

    let status = match state.identity.verify(token).await {
        Ok(identity) => SessionStatus {
            authenticated: true,
            identity: Some(identity),
            reason: None,
        },
        Err(err) => SessionStatus {
            authenticated: false,
            identity: None,
            reason: Some(err.to_string()),
        },
    };
    Json(status)
}

pub fn group() -> Router<AppState> {
    Router::new().route("/session", get(get_session))
}
