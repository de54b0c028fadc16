//! Errors raised by handlers and middleware.
//!
//! Every failure that should reach the client is an [`AppError`]: a named
//! kind, a message, and optionally an explicit status code. Converting one
//! into a response does not pick the final status; it parks the error in the
//! response extensions where the classifier
//! ([`crate::http::middleware::classifier`]) turns it into the real response.

use std::fmt;
use std::sync::Arc;

use axum::extract::rejection::{BytesRejection, JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::persistence::StoreError;
use crate::services::storage::StorageError;

/// Kind name for authorization failures.
pub const UNAUTHORIZED: &str = "UnauthorizedError";
/// Kind name for semantically invalid input.
pub const VALIDATION: &str = "ValidationError";
/// Kind name for input that cannot be coerced to the expected type.
pub const CAST: &str = "CastError";
/// Kind name for missing records.
pub const NOT_FOUND: &str = "NotFound";

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A failure that terminates a request.
#[derive(Debug, thiserror::Error)]
#[error("{}", render(.kind, .message))]
pub struct AppError {
    kind: String,
    message: String,
    status: Option<StatusCode>,
    #[source]
    source: Option<BoxError>,
}

fn render(kind: &str, message: &str) -> String {
    if kind.is_empty() {
        message.to_string()
    } else {
        format!("{kind}: {message}")
    }
}

impl AppError {
    /// A failure of the given kind.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// The caller lacks a valid credential.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(UNAUTHORIZED, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(VALIDATION, message)
    }

    pub fn cast(message: impl Into<String>) -> Self {
        Self::new(CAST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(NOT_FOUND, message).with_status(StatusCode::NOT_FOUND)
    }

    /// A failure with no recognised kind; classified as a server defect.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("Error", message)
    }

    /// Pin the response status, overriding kind-based classification.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach the underlying cause for logging.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Explicit status carried by the error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }
}

/// Response extension holding an error awaiting classification.
#[derive(Clone, Debug)]
pub struct PendingError(pub Arc<AppError>);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Provisional response, replaced by the classifier. It only reaches a
        // client when a handler group is served without the classifier.
        let status = if self.kind == UNAUTHORIZED {
            StatusCode::UNAUTHORIZED
        } else {
            self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        };
        let mut response = (status, self.to_string()).into_response();
        response
            .extensions_mut()
            .insert(PendingError(Arc::new(self)));
        response
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(_)
            | JsonRejection::JsonSyntaxError(_)
            | JsonRejection::MissingJsonContentType(_) => {
                let message = rejection.body_text();
                AppError::validation(message).with_source(rejection)
            }
            other => {
                let status = other.status();
                AppError::new("RequestBodyError", other.body_text())
                    .with_status(status)
                    .with_source(other)
            }
        }
    }
}

impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        let status = rejection.status();
        AppError::new("RequestBodyError", rejection.body_text())
            .with_status(status)
            .with_source(rejection)
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::cast(rejection.body_text()).with_source(rejection)
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::cast(rejection.body_text()).with_source(rejection)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::NotFound(_) => AppError::not_found(message),
            StoreError::InvalidId(_) => AppError::cast(message),
            StoreError::NotAnObject(_) => AppError::validation(message),
            StoreError::Unavailable(_) => AppError::new("StoreError", message).with_source(err),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::new("StorageError", err.to_string())
            .with_status(StatusCode::BAD_GATEWAY)
            .with_source(err)
    }
}

/// Short, log-friendly description used for the `kind` field.
pub struct KindLabel<'a>(pub &'a AppError);

impl fmt::Display for KindLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.kind.is_empty() {
            f.write_str("<unnamed>")
        } else {
            f.write_str(&self.0.kind)
        }
    }
}
