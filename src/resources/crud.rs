//! Generic record endpoints shared by every resource model.
//!
//! ```text
//! GET    /        → Page of records ($limit / $skip)
//! POST   /        → 201 + created record
//! GET    /{id}    → record
//! PATCH  /{id}    → merged record
//! DELETE /{id}    → removed record
//! ```

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde_json::{Map, Value};

use crate::http::error::AppError;
use crate::http::middleware::pagination::{ListQuery, Page};
use crate::http::server::AppState;

/// Model a CRUD group operates on.
#[derive(Debug, Clone, Copy)]
pub struct ModelName(pub &'static str);

fn into_object(model: &str, payload: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, AppError> {
    let Json(value) = payload?;
    match value {
        Value::Object(record) => Ok(record),
        other => Err(AppError::validation(format!(
            "{model} validation failed: expected a JSON object, got {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub async fn find(
    State(state): State<AppState>,
    Extension(ModelName(model)): Extension<ModelName>,
    query: ListQuery,
) -> Result<Json<Page<Value>>, AppError> {
    let found = state.store.model(model).find(query.skip, query.limit).await?;

    Ok(Json(Page {
        total: found.total,
        limit: query.limit,
        skip: query.skip,
        data: found.data,
    }))
}

pub async fn get_one(
    State(state): State<AppState>,
    Extension(ModelName(model)): Extension<ModelName>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.store.model(model).get(&id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(ModelName(model)): Extension<ModelName>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let record = into_object(model, payload)?;
    let created = state.store.model(model).create(record).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn patch(
    State(state): State<AppState>,
    Extension(ModelName(model)): Extension<ModelName>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let changes = into_object(model, payload)?;
    Ok(Json(state.store.model(model).patch(&id, changes).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(ModelName(model)): Extension<ModelName>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.store.model(model).remove(&id).await?))
}

/// CRUD handler group for `model`.
pub fn group(model: &'static str) -> Router<AppState> {
    Router::new()
        .route("/", get(find).post(create))
        .route("/{id}", get(get_one).patch(patch).delete(remove))
        .layer(Extension(ModelName(model)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::error::VALIDATION;
    use serde_json::json;

    #[test]
    fn non_objects_fail_validation() {
        let err = into_object("person", Ok(Json(json!([1, 2])))).unwrap_err();
        assert_eq!(err.kind(), VALIDATION);
        assert_eq!(
            err.message(),
            "person validation failed: expected a JSON object, got array"
        );
    }

    #[test]
    fn objects_pass_through() {
        let record = into_object("person", Ok(Json(json!({ "name": "Ada" })))).unwrap();
        assert_eq!(record.get("name"), Some(&json!("Ada")));
    }
}
