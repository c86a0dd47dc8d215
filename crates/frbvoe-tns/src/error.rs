//! Internal error type for the TNS client.
//!
//! None of these cross the agent boundary: every public operation on
//! [`crate::TnsAgent`] catches them and reports a plain result value,
//! leaving the diagnostics readable from agent state.

use thiserror::Error;

/// Errors raised by the agent's internal helpers.
#[derive(Debug, Error)]
pub enum TnsError {
    /// A required configuration field was never set.
    #[error("TNS agent is not configured: missing {0}")]
    MissingConfig(&'static str),

    /// A network-level failure while talking to the TNS.
    #[error("network error talking to the TNS: {0}")]
    Network(#[from] reqwest::Error),

    /// The TNS returned a body whose shape the client cannot interpret.
    #[error("unexpected TNS response shape: {0}")]
    UnexpectedResponse(String),

    /// The report payload could not be serialised.
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}
