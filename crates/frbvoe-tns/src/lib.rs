//! Client for the Transient Name Server bulk-submission API.
//!
//! The TNS assigns public names (e.g. `FRB20250113A`) to transient events.
//! Submission is a two-phase protocol: `POST /bulk-report` returns a report
//! identifier, and the processing result is then polled from
//! `POST /bulk-report-reply` until the identifier resolves to a public name
//! or a terminal failure. [`TnsAgent`] owns one submission session's worth
//! of configuration and state and drives that protocol; see its docs for
//! the lifecycle rules.

mod agent;
mod catalog;
mod error;

pub use agent::{Report, TnsAgent, LIVE_URL, SANDBOX_URL, UNKNOWN_NAME};
pub use catalog::{http_error_text, UNDOCUMENTED_ERROR};
pub use error::TnsError;
