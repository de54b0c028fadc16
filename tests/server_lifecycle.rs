//! Listening and closing a real server.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::Level;

use resource_server::config::ServerConfig;
use resource_server::http::{Server, ServerError};
use resource_server::observability::capture::LogCapture;
use resource_server::routing::RouteTable;
use resource_server::security::BearerTokenGate;

mod common;

fn loopback_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.shutdown_grace_secs = 2;
    config
}

#[tokio::test]
async fn serves_requests_until_closed() {
    let server = Server::standard(loopback_config(), common::state()).unwrap();
    let listening = server.listen(0).await.unwrap();
    let addr = listening.local_addr();

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{addr}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "operational");

    let response = client
        .get(format!("http://{addr}/role"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    tokio::time::timeout(Duration::from_secs(5), listening.close())
        .await
        .expect("close should finish within the grace period")
        .unwrap();

    let refused = reqwest::Client::new()
        .get(format!("http://{addr}/"))
        .timeout(Duration::from_secs(1))
        .send()
        .await;
    assert!(refused.is_err());
}

#[tokio::test]
async fn bind_failure_is_reported() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();

    let server = Server::standard(loopback_config(), common::state()).unwrap();
    match server.listen(port).await {
        Err(ServerError::Bind { addr, .. }) => assert_eq!(addr, format!("127.0.0.1:{port}")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("listening on a taken port"),
    }
}

#[tokio::test]
async fn run_until_closes_on_signal() {
    let server = Server::standard(loopback_config(), common::state()).unwrap();
    let listening = server.listen(0).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), listening.run_until(async {}))
        .await
        .expect("run_until should return once the signal fires")
        .unwrap();
}

#[tokio::test]
async fn head_request_completes_without_abort() {
    let capture = LogCapture::default();
    let _guard = capture.install();

    let server = Server::standard(loopback_config(), common::state()).unwrap();
    let listening = server.listen(0).await.unwrap();
    let addr = listening.local_addr();

    let response = reqwest::Client::new()
        .head(format!("http://{addr}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let egress =
        common::wait_for_events(&capture, "request completed", 1, Duration::from_secs(2)).await;
    assert_eq!(egress.len(), 1);
    assert_eq!(egress[0].field("method"), Some("HEAD"));
    assert_eq!(egress[0].field("status"), Some("200"));
    assert_eq!(egress[0].field("aborted"), Some("false"));
    assert_eq!(egress[0].level, Level::INFO);

    listening.close().await.unwrap();
}

#[tokio::test]
async fn client_disconnect_mid_handler_logs_one_aborted_egress() {
    let capture = LogCapture::default();
    let _guard = capture.install();

    let slow = Router::new().route(
        "/",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            "too late"
        }),
    );
    let table = RouteTable::new().register("/slow", false, slow).unwrap();
    let state = common::state();
    let gate = Arc::new(BearerTokenGate::new(Arc::clone(&state.identity)));
    let listening = Server::new(loopback_config(), state, table, gate)
        .unwrap()
        .listen(0)
        .await
        .unwrap();
    let addr = listening.local_addr();

    let result = reqwest::Client::new()
        .get(format!("http://{addr}/slow"))
        .timeout(Duration::from_millis(200))
        .send()
        .await;
    assert!(result.unwrap_err().is_timeout());

    // Well before the handler would have finished on its own.
    let egress =
        common::wait_for_events(&capture, "request completed", 1, Duration::from_millis(1500)).await;
    assert_eq!(egress.len(), 1);
    assert_eq!(egress[0].field("target"), Some("/slow"));
    assert_eq!(egress[0].field("status"), None);
    assert_eq!(egress[0].field("aborted"), Some("true"));
    assert_eq!(egress[0].level, Level::WARN);
    assert_eq!(capture.with_message("request received").len(), 1);

    listening.close().await.unwrap();
}
