//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;

use resource_server::config::ServerConfig;
use resource_server::http::{AppState, Server};
use resource_server::observability::capture::{CapturedEvent, LogCapture};
use resource_server::services::{MemoryStorage, MemoryStore, StaticTokenIdentity};

/// Token accepted by [`state`]'s identity provider.
pub const VALID_TOKEN: &str = "test-token";

/// In-process collaborators with one known token.
pub fn state() -> AppState {
    AppState {
        store: Arc::new(MemoryStore::new()),
        identity: Arc::new(StaticTokenIdentity::new([(
            VALID_TOKEN.to_string(),
            "tester".to_string(),
        )])),
        storage: Arc::new(MemoryStorage::new()),
    }
}

/// The full pipeline with every resource mounted.
pub fn standard_app() -> Router {
    Server::standard(ServerConfig::default(), state())
        .unwrap()
        .router()
}

pub fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn authorized(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {VALID_TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Status and body text; reading the body lets the egress entry fire.
pub async fn read(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Events logged with `message`, polling until `count` arrive or `within`
/// elapses. Egress entries on a live socket land after the client has its
/// response.
pub async fn wait_for_events(
    capture: &LogCapture,
    message: &str,
    count: usize,
    within: Duration,
) -> Vec<CapturedEvent> {
    let deadline = Instant::now() + within;
    loop {
        let events = capture.with_message(message);
        if events.len() >= count || Instant::now() >= deadline {
            return events;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
