//! End-to-end tests for the TNS submission protocol against an in-process
//! mock of the TNS bulk-submission endpoints.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use frbvoe_tns::{Report, TnsAgent, UNKNOWN_NAME};

/// Binds the mock TNS on an ephemeral port and returns its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// An agent pointed at the mock, with a fast polling policy.
fn agent_for(url: &str) -> TnsAgent {
    let mut agent = TnsAgent::new();
    agent.set_api_key("test-key");
    agent.set_bot("1234", "frbvoe_bot");
    agent.set_base_url(url);
    agent.set_poll_policy(Duration::from_millis(5), 2);
    agent
}

fn frb_report() -> Report {
    let mut report = Report::new();
    report.insert("author".to_string(), json!("John Smith"));
    report.insert("internal_name".to_string(), json!("38249195"));
    report.insert("dm".to_string(), json!(298.53));
    report
}

fn ok_submit_body() -> Json<Value> {
    Json(json!({
        "id_code": "200",
        "id_message": "OK",
        "data": {"report_id": "55"}
    }))
}

fn named_reply_body() -> Json<Value> {
    Json(json!({
        "id_code": "200",
        "id_message": "OK",
        "data": {
            "feedback": {
                "frb_report": [{"100": {"objname": "FRB20250113A"}}]
            }
        }
    }))
}

#[tokio::test]
async fn submission_resolves_a_public_name() {
    let submit_calls = Arc::new(AtomicUsize::new(0));
    let reply_calls = Arc::new(AtomicUsize::new(0));

    let router = Router::new()
        .route("/bulk-report", {
            let calls = submit_calls.clone();
            post(move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    ok_submit_body()
                }
            })
        })
        .route("/bulk-report-reply", {
            let calls = reply_calls.clone();
            post(move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    named_reply_body()
                }
            })
        });
    let url = serve(router).await;

    let mut agent = agent_for(&url);
    let accepted = agent.send_report(&frb_report()).await;

    assert!(accepted);
    assert_eq!(agent.report_id(), Some("55"));
    assert_eq!(agent.tns_name(), Some("FRB20250113A"));
    assert_eq!(agent.id_code(), Some("200"));
    assert_eq!(agent.id_message(), Some("OK"));
    assert_eq!(submit_calls.load(Ordering::SeqCst), 1);
    // Two polls from the policy plus the final result fetch.
    assert_eq!(reply_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn missing_credential_fails_fast_without_network() {
    let submit_calls = Arc::new(AtomicUsize::new(0));

    let router = Router::new().route("/bulk-report", {
        let calls = submit_calls.clone();
        post(move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                ok_submit_body()
            }
        })
    });
    let url = serve(router).await;

    // No API key: bot identity and URL alone must not be enough to
    // reach the network.
    let mut agent = TnsAgent::new();
    agent.set_bot("1234", "frbvoe_bot");
    agent.set_base_url(&url);

    let accepted = agent.send_report(&frb_report()).await;

    assert!(!accepted);
    assert_eq!(agent.report_id(), None);
    assert_eq!(submit_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn http_500_on_submit_reports_the_catalog_diagnostic() {
    let router = Router::new().route(
        "/bulk-report",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let url = serve(router).await;

    let mut agent = agent_for(&url);
    let accepted = agent.send_report(&frb_report()).await;

    assert!(!accepted);
    assert_eq!(agent.report_id(), None);
    assert_eq!(agent.id_code(), Some("500"));
    assert_eq!(
        agent.id_message(),
        Some("Error 500: Internal Server Error: Contact TNS developers.")
    );
}

#[tokio::test]
async fn embedded_rejection_stops_before_polling() {
    let reply_calls = Arc::new(AtomicUsize::new(0));

    let router = Router::new()
        .route(
            "/bulk-report",
            post(|| async {
                Json(json!({"id_code": "400", "id_message": "Bad request"}))
            }),
        )
        .route("/bulk-report-reply", {
            let calls = reply_calls.clone();
            post(move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    named_reply_body()
                }
            })
        });
    let url = serve(router).await;

    let mut agent = agent_for(&url);
    let accepted = agent.send_report(&frb_report()).await;

    assert!(!accepted);
    assert_eq!(agent.id_code(), Some("400"));
    assert_eq!(agent.id_message(), Some("Bad request"));
    assert_eq!(reply_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unclean_poll_ends_the_wait_but_submission_stands() {
    let reply_calls = Arc::new(AtomicUsize::new(0));

    let router = Router::new()
        .route("/bulk-report", post(|| async { ok_submit_body() }))
        .route("/bulk-report-reply", {
            let calls = reply_calls.clone();
            post(move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::NOT_FOUND, "no such report")
                }
            })
        });
    let url = serve(router).await;

    let mut agent = agent_for(&url);
    let accepted = agent.send_report(&frb_report()).await;

    // The submission itself was accepted; only the wait was cut short.
    assert!(accepted);
    assert_eq!(agent.report_id(), Some("55"));
    assert_eq!(agent.tns_name(), None);
    assert_eq!(agent.id_code(), Some("404"));
    // One unclean poll ends the loop; the final fetch still runs.
    assert_eq!(reply_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn name_missing_from_early_polls_is_picked_up_later() {
    let reply_calls = Arc::new(AtomicUsize::new(0));

    let router = Router::new()
        .route("/bulk-report", post(|| async { ok_submit_body() }))
        .route("/bulk-report-reply", {
            let calls = reply_calls.clone();
            post(move || {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n == 0 {
                        // Processed cleanly but no name assigned yet.
                        Json(json!({"id_code": "200", "id_message": "OK", "data": {}}))
                    } else {
                        named_reply_body()
                    }
                }
            })
        });
    let url = serve(router).await;

    let mut agent = agent_for(&url);
    let accepted = agent.send_report(&frb_report()).await;

    assert!(accepted);
    assert_eq!(agent.tns_name(), Some("FRB20250113A"));
}

#[tokio::test]
async fn reset_allows_reuse_for_an_unrelated_submission() {
    let router = Router::new()
        .route("/bulk-report", post(|| async { ok_submit_body() }))
        .route("/bulk-report-reply", post(|| async { named_reply_body() }));
    let url = serve(router).await;

    let mut agent = agent_for(&url);
    assert!(agent.send_report(&frb_report()).await);
    assert_eq!(agent.tns_name(), Some("FRB20250113A"));

    agent.reset();
    assert_eq!(agent.report_id(), None);
    assert_eq!(agent.tns_name(), None);
    assert_eq!(agent.base_url(), Some(url.as_str()));

    // The same instance can run a second submission after the reset.
    assert!(agent.send_report(&frb_report()).await);
    assert_eq!(agent.report_id(), Some("55"));
}

#[tokio::test]
async fn search_returns_first_match() {
    let router = Router::new().route(
        "/get/search",
        post(|| async {
            Json(json!({
                "id_code": "200",
                "id_message": "OK",
                "data": {"reply": [
                    {"objname": "FRB20250113A"},
                    {"objname": "FRB20250113B"}
                ]}
            }))
        }),
    );
    let url = serve(router).await;

    let mut agent = agent_for(&url);
    let name = agent.search_by_internal_name("38249195").await;
    assert_eq!(name, "FRB20250113A");
}

#[tokio::test]
async fn search_with_empty_reply_returns_the_sentinel() {
    let router = Router::new().route(
        "/get/search",
        post(|| async {
            Json(json!({"id_code": "200", "id_message": "OK", "data": {"reply": []}}))
        }),
    );
    let url = serve(router).await;

    let mut agent = agent_for(&url);
    let name = agent.search_by_internal_name("38249195").await;
    assert_eq!(name, UNKNOWN_NAME);
}

#[tokio::test]
async fn search_failure_degrades_to_the_sentinel() {
    let router = Router::new().route(
        "/get/search",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
    );
    let url = serve(router).await;

    let mut agent = agent_for(&url);
    let name = agent.search_by_internal_name("38249195").await;
    assert_eq!(name, UNKNOWN_NAME);

    // Unreachable endpoint degrades the same way.
    let mut lost = TnsAgent::new();
    lost.set_api_key("test-key");
    lost.set_bot("1234", "frbvoe_bot");
    lost.set_base_url("http://127.0.0.1:9");
    assert_eq!(lost.search_by_internal_name("38249195").await, UNKNOWN_NAME);
}

#[tokio::test]
async fn prop_period_change_is_http_level_only() {
    let router = Router::new().route(
        "/set/prop-period",
        post(|| async { Json(json!({"anything": "goes"})) }),
    );
    let url = serve(router).await;

    let mut agent = agent_for(&url);
    let mut payload = Report::new();
    payload.insert("internal_name".to_string(), json!("38249195"));
    payload.insert("proprietary_period".to_string(), json!(30));

    assert!(agent.change_prop_period(&payload).await);

    let refused = Router::new().route(
        "/set/prop-period",
        post(|| async { (StatusCode::FORBIDDEN, "no") }),
    );
    let url = serve(refused).await;
    let mut agent = agent_for(&url);
    assert!(!agent.change_prop_period(&payload).await);
}
