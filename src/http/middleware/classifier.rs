//! Error classification.
//!
//! The single point where an [`AppError`] escaping a handler group (or the
//! authorization gate in front of it) becomes the client-visible response.
//!
//! # Algorithm
//! 1. Authorization failures answer 401 with the raw message.
//! 2. Otherwise the status is the error's explicit status, else the
//!    table entry for its kind, else the table default (500).
//! 3. The error is logged at ERROR through the request span, the reply
//!    at DEBUG.
//! 4. The body is the error's string form, as plain text.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::Span;

use crate::config::ErrorsConfig;
use crate::http::error::{AppError, KindLabel, PendingError, CAST, UNAUTHORIZED, VALIDATION};
use crate::http::middleware::lifecycle::RequestContext;
use crate::observability::metrics;

/// Immutable error-kind to status-code table.
///
/// Built once at startup and shared by reference with the classifier.
#[derive(Debug, Clone)]
pub struct ErrorClassification {
    statuses: HashMap<String, StatusCode>,
    default_status: StatusCode,
    authorization_kind: &'static str,
}

/// What the classifier decided for one error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Authorization failure: 401 with the raw message.
    Unauthorized,
    /// Generic failure answered with this status.
    Status(StatusCode),
}

impl ErrorClassification {
    /// Built-in table: validation and cast failures are client errors.
    pub fn builtin() -> Self {
        let statuses = [
            (VALIDATION.to_string(), StatusCode::BAD_REQUEST),
            (CAST.to_string(), StatusCode::BAD_REQUEST),
        ]
        .into_iter()
        .collect();

        Self {
            statuses,
            default_status: StatusCode::INTERNAL_SERVER_ERROR,
            authorization_kind: UNAUTHORIZED,
        }
    }

    /// Built-in table with configured entries layered over it.
    ///
    /// Codes that are not valid statuses are skipped; config validation
    /// rejects them before this point.
    pub fn from_config(config: &ErrorsConfig) -> Self {
        let mut table = Self::builtin();
        for (kind, code) in &config.status_codes {
            if let Ok(status) = StatusCode::from_u16(*code) {
                table.statuses.insert(kind.clone(), status);
            }
        }
        table
    }

    /// Status mapped to a kind name, if any.
    pub fn lookup(&self, kind: &str) -> Option<StatusCode> {
        self.statuses.get(kind).copied()
    }

    /// Decide how `error` is answered.
    pub fn classify(&self, error: &AppError) -> Verdict {
        if error.kind() == self.authorization_kind {
            return Verdict::Unauthorized;
        }
        let status = error
            .status()
            .or_else(|| self.lookup(error.kind()))
            .unwrap_or(self.default_status);
        Verdict::Status(status)
    }

    /// Turn `error` into the final response, logging it on the way.
    ///
    /// `context` is optional: the authorization path never needs it, and the
    /// generic path falls back to the current span.
    pub fn respond(&self, error: &AppError, context: Option<&RequestContext>) -> Response {
        let kind = KindLabel(error);
        metrics::record_error(&kind.to_string());

        match self.classify(error) {
            Verdict::Unauthorized => {
                tracing::warn!(kind = %kind, reason = %error.message(), "request not authorized");
                (StatusCode::UNAUTHORIZED, error.message().to_string()).into_response()
            }
            Verdict::Status(status) => {
                let span = context
                    .map(|ctx| ctx.span().clone())
                    .unwrap_or_else(Span::current);
                tracing::error!(
                    parent: &span,
                    kind = %kind,
                    error = %error.message(),
                    detail = ?error,
                    "request failed"
                );
                tracing::debug!(parent: &span, status = status.as_u16(), "sending error response");
                (status, error.to_string()).into_response()
            }
        }
    }
}

impl Default for ErrorClassification {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Terminal middleware wrapping the route table.
///
/// Responses carrying a [`PendingError`] are replaced by the classified
/// response; everything else passes through untouched.
pub async fn classify_errors(
    State(classification): State<Arc<ErrorClassification>>,
    request: Request,
    next: Next,
) -> Response {
    let context = request.extensions().get::<RequestContext>().cloned();

    let mut response = next.run(request).await;

    match response.extensions_mut().remove::<PendingError>() {
        Some(PendingError(error)) => classification.respond(&error, context.as_ref()),
        None => response,
    }
}
