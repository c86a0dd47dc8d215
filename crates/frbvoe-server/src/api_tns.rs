//! Transient Name Server endpoints.
//!
//! Each submission builds a fresh [`frbvoe_tns::TnsAgent`] — agent state
//! is per-submission and instances are not shared across requests.

use std::sync::Arc;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use frbvoe_db::SubmissionRecord;
use frbvoe_types::TnsReport;

use crate::{ApiError, AppState};

/// Query parameters for `POST /tns`.
#[derive(Debug, Deserialize)]
pub struct SubmitQuery {
    /// Overrides the configured sandbox/live selection for this request.
    pub sandbox: Option<bool>,
}

/// Handler for `POST /tns`.
///
/// Validates the report, submits it through the agent, and records the
/// outcome — including the report identifier and diagnostics when the
/// submission failed partway, for operator reference. The response carries
/// a per-stage status like the rest of the ingest API.
pub async fn submit_tns_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<SubmitQuery>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let report: TnsReport =
        serde_json::from_value(body).map_err(|e| ApiError::BadBody(e.to_string()))?;
    report
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    tracing::info!(internal_name = %report.internal_name, "submitting FRB report to the TNS");

    let wire = report.to_report();
    let mut agent = state.tns_agent(query.sandbox);
    let accepted = agent.send_report(&wire).await;

    let record = SubmissionRecord {
        internal_name: report.internal_name.clone(),
        report_id: agent.report_id().map(str::to_string),
        tns_name: agent.tns_name().map(str::to_string),
        id_code: agent.id_code().map(str::to_string),
        id_message: agent.id_message().map(str::to_string),
        payload_json: serde_json::to_string(&wire).map_err(|e| ApiError::Task(e.to_string()))?,
    };

    let pool = state.pool.clone();
    let stored = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| ApiError::Database(e.to_string()))?;
        frbvoe_db::record_submission(&conn, &record).map_err(|e| ApiError::Database(e.to_string()))
    })
    .await
    .map_err(|e| ApiError::Task(e.to_string()))?;

    let (database_status, id) = match stored {
        Ok(id) => ("Success", Some(id)),
        Err(err) => {
            tracing::error!(error = %err, "failed to record the TNS submission");
            ("Failure", None)
        }
    };
    let tns_status = if accepted { "Success" } else { "Failure" };
    let status = if accepted && database_status == "Success" {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((
        status,
        Json(json!({
            "validation": "Success",
            "tns": tns_status,
            "database": database_status,
            "id": id,
            "report_id": agent.report_id(),
            "tns_name": agent.tns_name(),
        })),
    ))
}

/// Handler for `POST /tns/prop-period`.
///
/// Forwards a proprietary-period change payload to the TNS. The payload is
/// passed through as an opaque ordered mapping; success is whatever the
/// agent reports.
pub async fn change_prop_period_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let payload = match body {
        Value::Object(map) => map,
        _ => return Err(ApiError::BadBody("expected a JSON object".to_string())),
    };

    let mut agent = state.tns_agent(None);
    let changed = agent.change_prop_period(&payload).await;

    Ok(Json(json!({
        "tns": if changed { "Success" } else { "Failure" }
    })))
}

/// Query parameters for `GET /tns/search`.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// The submitting group's internal identifier to resolve.
    pub internal_name: Option<String>,
}

/// Handler for `GET /tns/search?internal_name=...`.
///
/// Resolves the public TNS name for an internal identifier; answers with
/// the `UNKNOWN` sentinel when nothing matches.
pub async fn search_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let internal_name = query
        .internal_name
        .ok_or(ApiError::MissingParam("internal_name"))?;

    let mut agent = state.tns_agent(None);
    let tns_name = agent.search_by_internal_name(&internal_name).await;

    Ok(Json(json!({
        "internal_name": internal_name,
        "tns_name": tns_name,
    })))
}
