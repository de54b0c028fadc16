use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::http::error::AppError;
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct ServiceStatus {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

pub async fn get_status(State(state): State<AppState>) -> Result<Json<ServiceStatus>, AppError> {
    state.store.ping().await?;

    Ok(Json(ServiceStatus {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    }))
}

pub fn group() -> Router<AppState> {
    Router::new().route("/", get(get_status))
}
