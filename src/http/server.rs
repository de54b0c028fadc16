//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Wire collaborators into shared [`AppState`]
//! - Compose the pipeline once: lifecycle → cross-cutting → route table
//!   (with gating) → error classifier
//! - Bind a listener and serve until closed
//! - Drain in-flight requests for a bounded grace period on close
//!
//! # Design Decisions
//! - Lifecycle states are types: [`Server`] → [`ListeningServer`] → closed
//!   (consumed by [`ListeningServer::close`]), so double-listen and
//!   use-after-close do not compile
//! - Bind failures propagate to the caller, no retry
//! - After the grace period the serve task is aborted

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::DefaultBodyLimit, middleware, Extension, Router};
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinHandle};
use tower_http::limit::RequestBodyLimitLayer;

use crate::config::ServerConfig;
use crate::http::middleware::classifier::{classify_errors, ErrorClassification};
use crate::http::middleware::cors::{build_cors_layer, CorsConfigError};
use crate::http::middleware::lifecycle::request_lifecycle;
use crate::http::middleware::pagination::ResultShaping;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::shutdown::Shutdown;
use crate::resources::standard_route_table;
use crate::routing::{RouteTable, RouteTableError};
use crate::security::authorization::{AuthorizationGate, BearerTokenGate};
use crate::services::{IdentityClient, Persistence, StorageClient};

/// Application state injected into handlers.
///
/// Every field is a shared handle; cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Persistence>,
    pub identity: Arc<dyn IdentityClient>,
    pub storage: Arc<dyn StorageClient>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("server I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid CORS configuration: {0}")]
    Cors(#[from] CorsConfigError),
    #[error("invalid route table: {0}")]
    Routes(#[from] RouteTableError),
    #[error("server task failed: {0}")]
    Task(#[from] JoinError),
}

/// A constructed, not yet listening, server.
pub struct Server {
    config: ServerConfig,
    router: Router,
}

impl Server {
    /// Compose the request pipeline around `table`.
    pub fn new(
        config: ServerConfig,
        state: AppState,
        table: RouteTable,
        gate: Arc<dyn AuthorizationGate>,
    ) -> Result<Self, ServerError> {
        let router = Self::build_router(&config, state, table, gate)?;
        Ok(Self { config, router })
    }

    /// Server with every resource mounted and bearer-token gating.
    pub fn standard(config: ServerConfig, state: AppState) -> Result<Self, ServerError> {
        let gate: Arc<dyn AuthorizationGate> =
            Arc::new(BearerTokenGate::new(Arc::clone(&state.identity)));
        let table = standard_route_table()?;
        Self::new(config, state, table, gate)
    }

    fn build_router(
        config: &ServerConfig,
        state: AppState,
        table: RouteTable,
        gate: Arc<dyn AuthorizationGate>,
    ) -> Result<Router, ServerError> {
        let classification = Arc::new(ErrorClassification::from_config(&config.errors));
        let cors = build_cors_layer(&config.cors)?;
        let body_limit = config.server.body_limit_bytes;

        // Router::layer wraps everything added before it: the last layer
        // listed is the first to see a request.
        let router = table
            .into_router(gate)
            .layer(middleware::from_fn_with_state(classification, classify_errors))
            .with_state(state)
            .layer(Extension(ResultShaping::from_config(&config.server)))
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(RequestBodyLimitLayer::new(body_limit))
            .layer(cors)
            .layer(middleware::from_fn(request_lifecycle));

        let router = if config.observability.generate_request_id {
            router
                .layer(propagate_request_id_layer())
                .layer(set_request_id_layer())
        } else {
            router
        };

        Ok(router)
    }

    /// The composed router, for driving the pipeline without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind `port` and start serving in the background.
    pub async fn listen(self, port: u16) -> Result<ListeningServer, ServerError> {
        let addr = self.config.server.bind_address(port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        tracing::info!(address = %local_addr, "HTTP server listening");

        let shutdown = Shutdown::new();
        let signal = shutdown.signalled();
        let router = self.router;
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(signal)
                .await
        });

        Ok(ListeningServer {
            local_addr,
            shutdown,
            task,
            grace: Duration::from_secs(self.config.server.shutdown_grace_secs),
        })
    }
}

/// A server accepting connections.
pub struct ListeningServer {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    task: JoinHandle<io::Result<()>>,
    grace: Duration,
}

impl ListeningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting, drain in-flight requests, then stop.
    pub async fn close(self) -> Result<(), ServerError> {
        tracing::info!(address = %self.local_addr, "HTTP server closing");
        self.shutdown.trigger();
        drain(self.task, self.grace).await
    }

    /// Serve until `signal` resolves, then close.
    ///
    /// Returns early if the server stops on its own.
    pub async fn run_until<F>(self, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let Self {
            local_addr,
            shutdown,
            mut task,
            grace,
        } = self;

        tokio::select! {
            joined = &mut task => {
                tracing::warn!(address = %local_addr, "HTTP server stopped unexpectedly");
                return Ok(joined??);
            }
            () = signal => {}
        }

        tracing::info!(address = %local_addr, "HTTP server closing");
        shutdown.trigger();
        drain(task, grace).await
    }
}

async fn drain(mut task: JoinHandle<io::Result<()>>, grace: Duration) -> Result<(), ServerError> {
    match tokio::time::timeout(grace, &mut task).await {
        Ok(joined) => {
            joined??;
            tracing::info!("HTTP server stopped");
            Ok(())
        }
        Err(_) => {
            tracing::warn!(
                grace_secs = grace.as_secs_f64(),
                "In-flight requests did not drain in time, forcing shutdown"
            );
            task.abort();
            match task.await {
                Ok(result) => result.map_err(ServerError::from),
                Err(err) if err.is_cancelled() => Ok(()),
                Err(err) => Err(err.into()),
            }
        }
    }
}
