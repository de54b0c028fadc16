use std::collections::BTreeMap;

use axum::{extract::State, routing::get, Json, Router};

use super::RESOURCE_MODELS;
use crate::http::error::AppError;
use crate::http::server::AppState;

/// Record count per resource model.
pub async fn get_counts(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<&'static str, usize>>, AppError> {
    let mut counts = BTreeMap::new();
    for model in RESOURCE_MODELS {
        let total = state.store.model(model).count().await?;
        counts.insert(*model, total);
    }
    Ok(Json(counts))
}

pub fn group() -> Router<AppState> {
    Router::new().route("/", get(get_counts))
}
