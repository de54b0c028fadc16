//! Authorization gate.
//!
//! Placed in front of guarded handler groups only. The gate runs to
//! completion before any handler code; a rejection short-circuits dispatch
//! with an `UnauthorizedError`, which the classifier answers with 401.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use futures_util::future::{BoxFuture, FutureExt};

use crate::http::error::AppError;
use crate::services::identity::{Identity, IdentityClient, IdentityError};

/// Message returned when a guarded route is called without a token.
pub const MISSING_TOKEN: &str = "No authorization token was found";

/// Decides whether a request may reach a guarded handler group.
pub trait AuthorizationGate: Send + Sync {
    fn authorize<'a>(&'a self, headers: &'a HeaderMap) -> BoxFuture<'a, Result<Identity, AppError>>;
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Gate that checks bearer tokens with an identity provider.
#[derive(Clone)]
pub struct BearerTokenGate {
    identity: Arc<dyn IdentityClient>,
}

impl BearerTokenGate {
    pub fn new(identity: Arc<dyn IdentityClient>) -> Self {
        Self { identity }
    }

    async fn check(&self, headers: &HeaderMap) -> Result<Identity, AppError> {
        let token = bearer_token(headers).ok_or_else(|| AppError::unauthorized(MISSING_TOKEN))?;

        self.identity.verify(token).await.map_err(|err| match err {
            IdentityError::Rejected(message) => AppError::unauthorized(message),
            other => {
                let message = other.to_string();
                AppError::new("IdentityProviderError", message)
                    .with_status(axum::http::StatusCode::SERVICE_UNAVAILABLE)
                    .with_source(other)
            }
        })
    }
}

impl AuthorizationGate for BearerTokenGate {
    fn authorize<'a>(&'a self, headers: &'a HeaderMap) -> BoxFuture<'a, Result<Identity, AppError>> {
        self.check(headers).boxed()
    }
}

/// Middleware inserted in front of a guarded handler group.
///
/// On success the verified [`Identity`] is attached to the request.
pub async fn require_authorization(
    State(gate): State<Arc<dyn AuthorizationGate>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = request.into_parts();
    let identity = gate.authorize(&parts.headers).await?;

    tracing::debug!(subject = %identity.subject, "request authorized");
    parts.extensions.insert(identity);

    Ok(next.run(Request::from_parts(parts, body)).await)
}
