//! Push client for the VOEvent broker.

use serde_json::json;
use tracing::{debug, info};

use frbvoe_types::{EventKind, VOEvent};

use crate::NotifyError;

/// Maps an event kind to the broker's `role` attribute.
///
/// Detections and subsequent bursts circulate as observations; the other
/// kinds have roles of their own.
pub fn broker_role(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Detection | EventKind::Subsequent => "observation",
        EventKind::Retraction => "retraction",
        EventKind::Update => "update",
    }
}

/// A client for one VOEvent broker endpoint.
#[derive(Debug, Clone)]
pub struct BrokerClient {
    url: String,
    stream: String,
    client: reqwest::Client,
}

impl BrokerClient {
    /// Creates a client for the broker at `url`, tagging every event with
    /// the given stream name.
    pub fn new(url: impl Into<String>, stream: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            stream: stream.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Publishes a validated VOEvent to the broker.
    ///
    /// The notice is sent as JSON with `role` and `stream` attributes
    /// added for the broker's routing.
    pub async fn publish(&self, voe: &VOEvent) -> Result<(), NotifyError> {
        let mut body = serde_json::to_value(voe)?;
        body["role"] = json!(broker_role(voe.kind));
        body["stream"] = json!(self.stream);

        debug!(url = %self.url, role = broker_role(voe.kind), "publishing VOEvent to broker");
        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::BrokerRefused {
                status: status.as_u16(),
            });
        }

        info!(
            observatory = %voe.observatory_name,
            kind = voe.kind.as_str(),
            "VOEvent published to broker"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{http::StatusCode, Json, Router};
    use frbvoe_types::EventKind;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    fn detection() -> VOEvent {
        VOEvent {
            kind: EventKind::Detection,
            observatory_name: "CHIME".to_string(),
            date: "2020-01-13 16:55:08.844845".to_string(),
            email: "john.smith@email.com".to_string(),
            semi_major: None,
            semi_minor: None,
            sampling_time: None,
            bandwidth: None,
            central_frequency: None,
            npol: None,
            bits_per_sample: None,
            gain: None,
            tsys: None,
            internal_id: Some("38249195".to_string()),
            dm: Some(298.53),
            dm_error: None,
            width: None,
            snr: Some(13.8),
            flux: None,
            right_ascension: 55.2938,
            declination: 14.2049,
            pos_error_deg_95: None,
            importance: None,
            website: None,
            tns_name: None,
            update_message: None,
        }
    }

    #[test]
    fn role_mapping() {
        assert_eq!(broker_role(EventKind::Detection), "observation");
        assert_eq!(broker_role(EventKind::Subsequent), "observation");
        assert_eq!(broker_role(EventKind::Retraction), "retraction");
        assert_eq!(broker_role(EventKind::Update), "update");
    }

    #[tokio::test]
    async fn publish_adds_role_and_stream() {
        let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));

        let router = Router::new().route("/", {
            let seen = seen.clone();
            post(move |Json(body): Json<Value>| {
                let seen = seen.clone();
                async move {
                    *seen.lock().unwrap() = Some(body);
                    StatusCode::OK
                }
            })
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = BrokerClient::new(format!("http://{addr}/"), "chime-frb");
        client.publish(&detection()).await.unwrap();

        let body = seen.lock().unwrap().clone().unwrap();
        assert_eq!(body["role"], "observation");
        assert_eq!(body["stream"], "chime-frb");
        assert_eq!(body["observatory_name"], "CHIME");
    }

    #[tokio::test]
    async fn refusal_is_an_error() {
        let router =
            Router::new().route("/", post(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = BrokerClient::new(format!("http://{addr}/"), "chime-frb");
        let err = client.publish(&detection()).await.unwrap_err();
        assert!(matches!(err, NotifyError::BrokerRefused { status: 503 }));
    }
}
