//! Subscriber management endpoints.

use std::sync::Arc;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use frbvoe_types::Subscriber;

use crate::{ApiError, AppState};

/// Handler for `POST /subscriber`.
pub async fn add_subscriber_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let subscriber: Subscriber =
        serde_json::from_value(body).map_err(|e| ApiError::BadBody(e.to_string()))?;
    subscriber
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    tracing::info!(name = %subscriber.name, "adding subscriber");

    let pool = state.pool.clone();
    let id = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| ApiError::Database(e.to_string()))?;
        frbvoe_db::insert_subscriber(&conn, &subscriber)
            .map_err(|e| ApiError::Database(e.to_string()))
    })
    .await
    .map_err(|e| ApiError::Task(e.to_string()))??;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// Query parameters for `DELETE /subscriber`.
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    /// Row id of the subscriber to remove.
    pub id: Option<String>,
}

/// Handler for `DELETE /subscriber?id=...`.
pub async fn delete_subscriber_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<DeleteQuery>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let id = query.id.ok_or(ApiError::MissingParam("id"))?;

    let pool = state.pool.clone();
    let deleted = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| ApiError::Database(e.to_string()))?;
        frbvoe_db::delete_subscriber(&conn, &id).map_err(|e| ApiError::Database(e.to_string()))
    })
    .await
    .map_err(|e| ApiError::Task(e.to_string()))??;

    Ok((StatusCode::ACCEPTED, Json(json!({ "deleted": deleted }))))
}
