//! Contributor records plus their avatar blobs.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::put,
    Router,
};

use super::crud;
use crate::http::error::AppError;
use crate::http::server::AppState;
use crate::services::storage::StoredObject;

const MODEL: &str = "contributor";

fn avatar_key(id: &str) -> String {
    format!("{MODEL}/{id}/avatar")
}

pub async fn put_avatar(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<StatusCode, AppError> {
    let bytes = body?;
    // 404 / CastError for unknown or malformed ids before touching storage.
    state.store.model(MODEL).get(&id).await?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    tracing::debug!(contributor = %id, size = bytes.len(), "storing avatar");
    state
        .storage
        .put(&avatar_key(&id), StoredObject { content_type, bytes })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_avatar(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let object = state
        .storage
        .get(&avatar_key(&id))
        .await?
        .ok_or_else(|| AppError::not_found(format!("No avatar stored for contributor '{id}'")))?;

    let content_type = object
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));

    Ok(([(header::CONTENT_TYPE, content_type)], object.bytes).into_response())
}

pub fn group() -> Router<AppState> {
    crud::group(MODEL).route("/{id}/avatar", put(put_avatar).get(get_avatar))
}
