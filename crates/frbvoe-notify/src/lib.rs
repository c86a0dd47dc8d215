//! Downstream notification channels for validated VOEvents.
//!
//! Both channels are fire-and-forget sinks from the ingest handler's point
//! of view: a failed broker push or email hand-off is logged and never
//! fails the ingest itself.

mod broker;
mod email;

use thiserror::Error;

pub use broker::{broker_role, BrokerClient};
pub use email::{dispatch_emails, render_email, EmailMessage};

/// Errors produced by the notification channels.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Network-level failure reaching the broker.
    #[error("network error talking to the broker: {0}")]
    Network(#[from] reqwest::Error),

    /// The broker answered with a non-success status.
    #[error("broker refused the event: HTTP {status}")]
    BrokerRefused {
        /// The HTTP status the broker returned.
        status: u16,
    },

    /// The event could not be serialised for the wire.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
