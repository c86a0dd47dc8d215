//! VOEvent ingest endpoints.

use std::sync::Arc;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use frbvoe_notify::dispatch_emails;
use frbvoe_types::VOEvent;

use crate::{ApiError, AppState};

/// Handler for `POST /voe`.
///
/// Validates the notice, persists it, and fans it out to the broker and
/// the subscriber email list. Fan-out failures are logged but never fail
/// the ingest — the notice is already stored by then.
pub async fn create_voe_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let voe: VOEvent =
        serde_json::from_value(body).map_err(|e| ApiError::BadBody(e.to_string()))?;
    voe.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    tracing::info!(
        observatory = %voe.observatory_name,
        kind = voe.kind.as_str(),
        "processing VOEvent"
    );

    let pool = state.pool.clone();
    let stored = voe.clone();
    let (id, recipients) = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| ApiError::Database(e.to_string()))?;
        let id = frbvoe_db::insert_voevent(&conn, &stored)
            .map_err(|e| ApiError::Database(e.to_string()))?;
        let recipients = frbvoe_db::list_email_recipients(&conn)
            .map_err(|e| ApiError::Database(e.to_string()))?;
        Ok::<_, ApiError>((id, recipients))
    })
    .await
    .map_err(|e| ApiError::Task(e.to_string()))??;

    if let Some(broker) = &state.broker {
        if let Err(err) = broker.publish(&voe).await {
            tracing::warn!(error = %err, "broker push failed, continuing");
        }
    }
    let notified = dispatch_emails(&voe, &recipients);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "notified": notified })),
    ))
}

/// Query parameters for `DELETE /voe`.
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    /// Row id of the notice to delete.
    pub id: Option<String>,
}

/// Handler for `DELETE /voe?id=...`.
pub async fn delete_voe_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<DeleteQuery>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let id = query.id.ok_or(ApiError::MissingParam("id"))?;

    let pool = state.pool.clone();
    let deleted = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| ApiError::Database(e.to_string()))?;
        frbvoe_db::delete_voevent(&conn, &id).map_err(|e| ApiError::Database(e.to_string()))
    })
    .await
    .map_err(|e| ApiError::Task(e.to_string()))??;

    Ok((StatusCode::ACCEPTED, Json(json!({ "deleted": deleted }))))
}
