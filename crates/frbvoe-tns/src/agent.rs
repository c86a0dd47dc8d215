//! The TNS submission agent.

use std::time::Duration;

use reqwest::header::USER_AGENT;
use reqwest::multipart::Form;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

use crate::catalog::{http_error_text, UNDOCUMENTED_ERROR};
use crate::error::TnsError;

/// Base URL of the TNS sandbox (testing submissions only).
pub const SANDBOX_URL: &str = "https://sandbox.wis-tns.org/api";

/// Base URL of the live TNS (real submissions only).
pub const LIVE_URL: &str = "https://www.wis-tns.org/api";

/// Sentinel returned by [`TnsAgent::search_by_internal_name`] when no
/// public name could be resolved.
pub const UNKNOWN_NAME: &str = "UNKNOWN";

/// Default wait between result polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default number of polls after a submission before giving up waiting.
const DEFAULT_POLL_ATTEMPTS: u32 = 2;

/// A report payload, as an ordered mapping of named fields.
///
/// The agent does not interpret individual fields; order is preserved
/// through serialisation because the TNS JSON encoding is order-sensitive
/// for human review (`serde_json` is built with `preserve_order`).
pub type Report = Map<String, Value>;

/// A client session against the TNS bulk-submission API.
///
/// Credential, bot identity, and environment are set once at configuration
/// time and persist across calls. The per-submission fields (report
/// identifier, resolved name, diagnostic code/message) are populated by
/// [`TnsAgent::send_report`] and must be cleared with [`TnsAgent::reset`]
/// before the same instance is reused for an unrelated FRB — the agent
/// never resets itself.
///
/// One agent serves one in-flight submission at a time; the mutating
/// operations take `&mut self`, so sharing an instance across concurrent
/// submissions does not compile. Callers needing parallel submissions
/// create one agent per report.
#[derive(Debug)]
pub struct TnsAgent {
    client: reqwest::Client,
    api_key: Option<String>,
    tns_id: Option<String>,
    bot_name: Option<String>,
    url: Option<String>,
    poll_interval: Duration,
    max_poll_attempts: u32,

    report_id: Option<String>,
    tns_name: Option<String>,
    id_code: Option<String>,
    id_message: Option<String>,
}

impl Default for TnsAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl TnsAgent {
    /// Creates an unconfigured agent with the default polling policy.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: None,
            tns_id: None,
            bot_name: None,
            url: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_POLL_ATTEMPTS,
            report_id: None,
            tns_name: None,
            id_code: None,
            id_message: None,
        }
    }

    // ── Configuration ────────────────────────────────────────────────

    /// Sets the TNS User Group API key. Keep it secret — the agent never
    /// writes it to the log above DEBUG.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        debug!("TNS API key configured");
        self.api_key = Some(api_key.into());
    }

    /// Sets the bot identity: the numeric bot id assigned by the TNS and
    /// the bot's display name.
    pub fn set_bot(&mut self, tns_id: impl Into<String>, bot_name: impl Into<String>) {
        let tns_id = tns_id.into();
        let bot_name = bot_name.into();
        debug!(tns_id = %tns_id, bot_name = %bot_name, "TNS bot identity configured");
        self.tns_id = Some(tns_id);
        self.bot_name = Some(bot_name);
    }

    /// Points the agent at the TNS sandbox. Overwrites any earlier
    /// environment selection — sandbox and live are mutually exclusive.
    pub fn set_sandbox(&mut self) {
        self.set_base_url(SANDBOX_URL);
    }

    /// Points the agent at the live TNS. Overwrites any earlier
    /// environment selection.
    pub fn set_live(&mut self) {
        self.set_base_url(LIVE_URL);
    }

    /// Sets the endpoint base URL directly.
    ///
    /// Normal configuration goes through [`TnsAgent::set_sandbox`] /
    /// [`TnsAgent::set_live`]; this primitive exists so tests can target a
    /// local endpoint.
    pub fn set_base_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        info!(url = %url, "TNS endpoint selected");
        self.url = Some(url.trim_end_matches('/').to_string());
    }

    /// Sets the polling policy: the wait between result polls and how many
    /// polls to attempt before giving up waiting for a name.
    pub fn set_poll_policy(&mut self, interval: Duration, max_attempts: u32) {
        self.poll_interval = interval;
        self.max_poll_attempts = max_attempts;
    }

    // ── Post-call state ──────────────────────────────────────────────

    /// Report identifier assigned by the last submission, if it got that
    /// far. Retain it when contacting the TNS about a stuck report.
    pub fn report_id(&self) -> Option<&str> {
        self.report_id.as_deref()
    }

    /// Public name resolved for the last submission, if available yet.
    pub fn tns_name(&self) -> Option<&str> {
        self.tns_name.as_deref()
    }

    /// Diagnostic code from the last TNS response envelope.
    pub fn id_code(&self) -> Option<&str> {
        self.id_code.as_deref()
    }

    /// Diagnostic message from the last TNS response envelope.
    pub fn id_message(&self) -> Option<&str> {
        self.id_message.as_deref()
    }

    /// The currently selected endpoint base URL.
    pub fn base_url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Clears the per-submission state so the instance can be reused for
    /// an unrelated FRB.
    ///
    /// The environment selection is sticky: only the report identifier,
    /// resolved name, and diagnostic code/message are cleared. Credential,
    /// bot identity, and polling policy persist as well.
    pub fn reset(&mut self) {
        self.report_id = None;
        self.tns_name = None;
        self.id_code = None;
        self.id_message = None;
    }

    // ── Formatting ───────────────────────────────────────────────────

    /// Serialises a report to the canonical string form the TNS endpoints
    /// accept.
    ///
    /// Key order follows the mapping's insertion order and survives a
    /// reparse: `format(parse(format(r))) == format(r)`.
    pub fn format_report(&self, report: &Report) -> Result<String, TnsError> {
        Ok(serde_json::to_string_pretty(report)?)
    }

    // ── Submit protocol ──────────────────────────────────────────────

    /// Submits an FRB report and polls for the processing result.
    ///
    /// Returns `true` when the TNS accepted the submission. The resolved
    /// public name, report identifier, and diagnostic code/message are
    /// readable from agent state afterwards; a missing name only means the
    /// TNS has not produced one yet. Configuration gaps, transport
    /// failures, and protocol rejections all come back as `false` with the
    /// cause logged — no error crosses this boundary.
    pub async fn send_report(&mut self, report: &Report) -> bool {
        match self.submit_and_poll(report).await {
            Ok(accepted) => accepted,
            Err(err) => {
                error!(error = %err, "FRB report submission failed");
                false
            }
        }
    }

    async fn submit_and_poll(&mut self, report: &Report) -> Result<bool, TnsError> {
        let (api_key, marker, base) = self.require_config()?;

        let formatted = self.format_report(report)?;
        debug!(report = %formatted, "submitting FRB report to the TNS");

        let form = Form::new()
            .text("api_key", api_key.clone())
            .text("data", formatted);
        let response = self
            .client
            .post(format!("{base}/bulk-report"))
            .header(USER_AGENT, &marker)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !self.check_response(status, &body)? {
            error!("the TNS rejected the FRB report");
            return Ok(false);
        }

        let envelope: Value = serde_json::from_str(&body)
            .map_err(|err| TnsError::UnexpectedResponse(format!("unparsable 200 body: {err}")))?;
        let report_id = envelope
            .pointer("/data/report_id")
            .map(field_to_string)
            .ok_or_else(|| {
                TnsError::UnexpectedResponse("accepted submission carried no report_id".into())
            })?;
        info!(report_id = %report_id, "TNS accepted the FRB report");
        self.report_id = Some(report_id.clone());

        // Wait for the report to show up at the TNS, then ask for feedback
        // by report identifier. A clean poll does not end the wait: a
        // 200/OK reply may still lack the resolved name, so the name is
        // extracted on every clean poll and the latest extraction kept.
        info!(
            polls = self.max_poll_attempts,
            interval_s = self.poll_interval.as_secs_f64(),
            "polling the TNS for the processing result"
        );
        let mut polls = 0;
        while polls < self.max_poll_attempts {
            tokio::time::sleep(self.poll_interval).await;
            let (status, body) = self.fetch_reply(&api_key, &marker, &base, &report_id).await?;
            let clean = self.check_response(status, &body)?;
            if clean {
                if let Ok(reply) = serde_json::from_str::<Value>(&body) {
                    if let Some(name) = extract_tns_name(&reply) {
                        info!(tns_name = %name, "TNS name found in poll reply");
                        self.tns_name = Some(name);
                    }
                }
            } else {
                // The TNS signalled a terminal state for this poll; stop
                // waiting and read whatever the final fetch can still learn.
                warn!(report_id = %report_id, "poll reply was not clean, ending the wait");
                break;
            }
            polls += 1;
        }

        self.read_final_reply(&api_key, &marker, &base, &report_id)
            .await?;
        Ok(true)
    }

    /// One last result fetch after the poll loop, to pick up the resolved
    /// name. The name being absent is not a failure — the TNS simply has
    /// not produced it yet.
    async fn read_final_reply(
        &mut self,
        api_key: &str,
        marker: &str,
        base: &str,
        report_id: &str,
    ) -> Result<(), TnsError> {
        let (status, body) = self.fetch_reply(api_key, marker, base, report_id).await?;
        if self.check_response(status, &body)? {
            let reply: Value = serde_json::from_str(&body)?;
            match extract_tns_name(&reply) {
                Some(name) => {
                    info!(report_id = %report_id, tns_name = %name, "report processed on the TNS");
                    self.tns_name = Some(name);
                }
                None => {
                    info!(report_id = %report_id, "TNS name not yet available");
                }
            }
        } else {
            error!(
                report_id = %report_id,
                "problem processing the report on the TNS; retain the report ID before reattempting"
            );
        }
        Ok(())
    }

    async fn fetch_reply(
        &self,
        api_key: &str,
        marker: &str,
        base: &str,
        report_id: &str,
    ) -> Result<(StatusCode, String), TnsError> {
        debug!(report_id = %report_id, "fetching bulk-report reply");
        let response = self
            .client
            .post(format!("{base}/bulk-report-reply"))
            .header(USER_AGENT, marker)
            .form(&[("api_key", api_key), ("report_id", report_id)])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    // ── Response interpretation ──────────────────────────────────────

    /// Interprets a raw endpoint response, recording the diagnostic
    /// code/message on the agent.
    ///
    /// An HTTP 200 is clean exactly when the embedded envelope reads
    /// `("200", "OK")`. Any non-200 status resolves its diagnostic through
    /// the static catalog and is never clean; unparsable 200 bodies are
    /// the one condition that raises, for the public operations to catch.
    fn check_response(&mut self, status: StatusCode, body: &str) -> Result<bool, TnsError> {
        if status == StatusCode::OK {
            let envelope: Value = serde_json::from_str(body).map_err(|err| {
                TnsError::UnexpectedResponse(format!("unparsable 200 body: {err}"))
            })?;
            let id_code = envelope.get("id_code").map(field_to_string).ok_or_else(|| {
                TnsError::UnexpectedResponse("response envelope has no id_code".into())
            })?;
            let id_message = envelope
                .get("id_message")
                .map(field_to_string)
                .ok_or_else(|| {
                    TnsError::UnexpectedResponse("response envelope has no id_message".into())
                })?;
            debug!(id_code = %id_code, id_message = %id_message, "TNS response envelope");
            self.id_code = Some(id_code.clone());
            self.id_message = Some(id_message.clone());

            if id_code == "200" && id_message == "OK" {
                Ok(true)
            } else if id_code == "400" && id_message == "Bad request" {
                // Distinct rejection branch: the TNS emits this pair inside
                // an HTTP 200 and its exact semantics are unclarified
                // upstream. Do not fold it into ordinary 400 handling.
                warn!("TNS answered 200 with embedded (400, Bad request)");
                Ok(false)
            } else {
                Ok(false)
            }
        } else {
            let text = http_error_text(status.as_u16()).unwrap_or(UNDOCUMENTED_ERROR);
            error!(status = status.as_u16(), "{text}");
            self.id_code = Some(status.as_u16().to_string());
            self.id_message = Some(text.to_string());
            Ok(false)
        }
    }

    // ── Search ───────────────────────────────────────────────────────

    /// Resolves the public name the TNS assigned to an FRB, searching by
    /// the submitting group's internal identifier.
    ///
    /// Returns the first match, or [`UNKNOWN_NAME`] when the search comes
    /// back empty or fails for any reason. Never raises past this
    /// boundary; failures are logged.
    pub async fn search_by_internal_name(&mut self, internal_name: &str) -> String {
        match self.search(internal_name).await {
            Ok(Some(name)) => {
                info!(internal_name = %internal_name, tns_name = %name, "TNS name resolved");
                name
            }
            Ok(None) => {
                warn!(internal_name = %internal_name, "no TNS name matches the internal name");
                UNKNOWN_NAME.to_string()
            }
            Err(err) => {
                error!(internal_name = %internal_name, error = %err, "TNS search failed");
                UNKNOWN_NAME.to_string()
            }
        }
    }

    async fn search(&mut self, internal_name: &str) -> Result<Option<String>, TnsError> {
        let (api_key, marker, base) = self.require_config()?;

        let mut query = Report::new();
        query.insert("internal_name".to_string(), json!(internal_name));
        let data = serde_json::to_string(&query)?;

        let response = self
            .client
            .post(format!("{base}/get/search"))
            .header(USER_AGENT, &marker)
            .form(&[("api_key", api_key.as_str()), ("data", data.as_str())])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            let text = http_error_text(status.as_u16()).unwrap_or(UNDOCUMENTED_ERROR);
            error!(status = status.as_u16(), "search request failed: {text}");
            return Ok(None);
        }

        let reply: Value = serde_json::from_str(&body)
            .map_err(|err| TnsError::UnexpectedResponse(format!("unparsable search body: {err}")))?;
        let names: Vec<String> = reply
            .pointer("/data/reply")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("objname"))
                    .map(field_to_string)
                    .collect()
            })
            .unwrap_or_default();
        debug!(count = names.len(), "TNS search matches");

        Ok(names.into_iter().next())
    }

    // ── Proprietary period ───────────────────────────────────────────

    /// Changes the proprietary (embargo) period of a previously submitted
    /// FRB — e.g. extending the embargo until data release, or moving it
    /// to the next UTC day to stage a public release.
    ///
    /// Success is HTTP-level only; this endpoint's contract carries no
    /// nested envelope to check. Failures are logged and reported as
    /// `false`.
    pub async fn change_prop_period(&mut self, payload: &Report) -> bool {
        match self.set_prop_period(payload).await {
            Ok(accepted) => accepted,
            Err(err) => {
                error!(error = %err, "proprietary period change failed");
                false
            }
        }
    }

    async fn set_prop_period(&mut self, payload: &Report) -> Result<bool, TnsError> {
        let (api_key, marker, base) = self.require_config()?;

        let data = serde_json::to_string(payload)?;
        debug!(payload = %data, "requesting proprietary period change");

        let response = self
            .client
            .post(format!("{base}/set/prop-period"))
            .header(USER_AGENT, &marker)
            .form(&[("api_key", api_key.as_str()), ("data", data.as_str())])
            .send()
            .await?;
        let status = response.status();

        if status.is_success() {
            info!("proprietary period change accepted");
            Ok(true)
        } else {
            let text = http_error_text(status.as_u16()).unwrap_or(UNDOCUMENTED_ERROR);
            error!(status = status.as_u16(), "period change refused: {text}");
            Ok(false)
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────

    /// Fails fast when credential, bot identity, or environment is unset;
    /// no network traffic happens on this path.
    fn require_config(&self) -> Result<(String, String, String), TnsError> {
        let api_key = self
            .api_key
            .clone()
            .ok_or(TnsError::MissingConfig("API key"))?;
        let marker = self.marker()?;
        let base = self.url.clone().ok_or(TnsError::MissingConfig("base URL"))?;
        Ok((api_key, marker, base))
    }

    /// Builds the client-identification header value from the bot identity.
    fn marker(&self) -> Result<String, TnsError> {
        let tns_id = self
            .tns_id
            .as_deref()
            .ok_or(TnsError::MissingConfig("bot id"))?;
        let bot_name = self
            .bot_name
            .as_deref()
            .ok_or(TnsError::MissingConfig("bot name"))?;
        Ok(format!(
            "tns_marker{{\"tns_id\": \"{tns_id}\", \"type\": \"bot\", \"name\": \"{bot_name}\"}}"
        ))
    }
}

/// Extracts the resolved public name from a bulk-report-reply body.
///
/// The name lives at `data.feedback.frb_report[0]["100"].objname` once the
/// TNS has processed the report. Any missing step of that path — including
/// the `"100"` key itself — means the name is not available yet, not that
/// the reply is malformed.
fn extract_tns_name(reply: &Value) -> Option<String> {
    reply
        .get("data")?
        .get("feedback")?
        .get("frb_report")?
        .get(0)?
        .get("100")?
        .get("objname")
        .map(field_to_string)
}

/// Normalises an envelope field to a string: the TNS emits `id_code` and
/// friends as either JSON numbers or strings depending on the endpoint.
fn field_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
