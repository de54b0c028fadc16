//! Request lifecycle: timing, correlation and ingress/egress logging.
//!
//! # Responsibilities
//! - Create one [`RequestContext`] per request (start time, correlation id,
//!   request span) and attach it to the request extensions
//! - Log exactly one ingress entry before anything else runs
//! - Log exactly one egress entry when the response finishes, whatever
//!   the outcome
//!
//! # Design Decisions
//! - Egress logging is an RAII finalizer ([`EgressGuard`]). It lives in the
//!   middleware future until a response exists, then moves into the response
//!   body. It fires when the body reaches its end, or when it is dropped:
//!   a client that disconnects mid-handler drops the future, a client that
//!   disconnects mid-body drops the body.
//! - Purely observational: nothing here can fail the request

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    middleware::Next,
    response::Response,
};
use http_body::{Body as _, Frame, SizeHint};
use tracing::{field, Instrument, Span};

use crate::http::request::correlation_id;
use crate::observability::metrics;

/// Header values never written to logs.
const REDACTED_HEADERS: [header::HeaderName; 4] = [
    header::AUTHORIZATION,
    header::PROXY_AUTHORIZATION,
    header::COOKIE,
    header::SET_COOKIE,
];

/// Per-request observability state.
///
/// Created at ingress, owned by one request, gone when its response
/// finishes. Handlers reach it through the request extensions.
#[derive(Debug, Clone)]
pub struct RequestContext {
    start: Instant,
    correlation_id: Option<String>,
    span: Span,
}

impl RequestContext {
    /// Build the context for an inbound request.
    pub fn from_request<B>(request: &axum::http::Request<B>) -> Self {
        let correlation_id = correlation_id(request.headers());
        let span = tracing::info_span!("request", request_id = field::Empty);
        if let Some(id) = &correlation_id {
            span.record("request_id", id.as_str());
        }

        Self {
            start: Instant::now(),
            correlation_id,
            span,
        }
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// The request-scoped logger.
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Headers as loggable pairs, with credentials masked.
fn loggable_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if REDACTED_HEADERS.contains(name) {
                "[redacted]".to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            (name.as_str().to_string(), shown)
        })
        .collect()
}

/// Trailer fields announced by the request.
///
/// Trailer values only exist after the body has been read, so ingress
/// records the names declared in the `Trailer` header.
fn declared_trailers(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::TRAILER)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect()
}

fn log_ingress(context: &RequestContext, request: &Request) {
    tracing::info!(
        parent: context.span(),
        version = ?request.version(),
        method = %request.method(),
        target = %request.uri(),
        headers = ?loggable_headers(request.headers()),
        trailers = ?declared_trailers(request.headers()),
        "request received"
    );
}

/// Finalizer that writes the egress entry exactly once.
#[derive(Debug)]
pub struct EgressGuard {
    context: RequestContext,
    method: Method,
    target: Uri,
    status: Option<StatusCode>,
    fired: bool,
}

impl EgressGuard {
    pub fn new(context: RequestContext, method: Method, target: Uri) -> Self {
        Self {
            context,
            method,
            target,
            status: None,
            fired: false,
        }
    }

    /// Record the status of the response being sent.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Whether the response carries no body on the wire, so hyper drops it
    /// unread once the head is written.
    pub fn bodyless(&self) -> bool {
        self.method == Method::HEAD
            || self.status.is_some_and(|status| {
                status.is_informational()
                    || status == StatusCode::NO_CONTENT
                    || status == StatusCode::NOT_MODIFIED
            })
    }

    /// Write the egress entry. Later calls are no-ops.
    pub fn finish(&mut self, aborted: bool) {
        if self.fired {
            return;
        }
        self.fired = true;

        let elapsed = self.context.elapsed();
        let span = self.context.span();
        match self.status {
            Some(status) => tracing::info!(
                parent: span,
                method = %self.method,
                target = %self.target,
                status = status.as_u16(),
                elapsed = ?elapsed,
                aborted,
                "request completed"
            ),
            None => tracing::warn!(
                parent: span,
                method = %self.method,
                target = %self.target,
                elapsed = ?elapsed,
                aborted = true,
                "request completed"
            ),
        }
        metrics::record_request(self.method.as_str(), self.status.map(|s| s.as_u16()), elapsed);
    }
}

impl Drop for EgressGuard {
    fn drop(&mut self) {
        self.finish(true);
    }
}

/// Response body that carries the egress finalizer.
pub struct GuardedBody {
    inner: Body,
    guard: Option<EgressGuard>,
}

impl GuardedBody {
    pub fn new(inner: Body, guard: EgressGuard) -> Self {
        Self {
            inner,
            guard: Some(guard),
        }
    }

    fn finish(&mut self, aborted: bool) {
        if let Some(mut guard) = self.guard.take() {
            guard.finish(aborted);
        }
    }
}

impl http_body::Body for GuardedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(None) => this.finish(false),
            Poll::Ready(Some(Err(_))) => this.finish(true),
            _ => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for GuardedBody {
    fn drop(&mut self) {
        // hyper may stop polling once the body reports end of stream, and
        // never polls it at all for HEAD, 1xx, 204 and 304 responses
        let bodyless = self.guard.as_ref().is_some_and(EgressGuard::bodyless);
        let aborted = !(bodyless || self.inner.is_end_stream());
        self.finish(aborted);
    }
}

/// Outermost middleware of the pipeline.
pub async fn request_lifecycle(mut request: Request, next: Next) -> Response {
    let context = RequestContext::from_request(&request);
    log_ingress(&context, &request);

    let mut guard = EgressGuard::new(
        context.clone(),
        request.method().clone(),
        request.uri().clone(),
    );
    let span = context.span().clone();
    request.extensions_mut().insert(context);

    let response = next.run(request).instrument(span).await;

    guard.set_status(response.status());
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(GuardedBody::new(body, guard)))
}
