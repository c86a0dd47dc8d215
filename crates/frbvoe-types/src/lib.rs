//! Shared domain types for the frbvoe service.
//!
//! This crate defines the three records the service trades in — the
//! [`VOEvent`] notice ingested from a host observatory, the [`TnsReport`]
//! companion record for the Transient Name Server naming workflow, and the
//! [`Subscriber`] entry for the notification list — together with their
//! structural validation.
//!
//! No crate in the workspace depends on anything *except* `frbvoe-types`
//! for cross-cutting type definitions, which keeps the dependency graph
//! acyclic.

use serde::{Deserialize, Serialize};

mod subscriber;
mod tns_report;
mod validation;
mod voevent;

pub use subscriber::{RequestedService, Subscriber};
pub use tns_report::TnsReport;
pub use validation::ValidationError;
pub use voevent::VOEvent;

/// The kind of VOEvent being circulated.
///
/// `Detection` announces a new candidate FRB; `Subsequent` a repeat burst
/// from a known source; `Retraction` withdraws an earlier notice;
/// `Update` amends one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Detection,
    Subsequent,
    Retraction,
    Update,
}

impl EventKind {
    /// Returns the canonical lowercase label for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Detection => "detection",
            Self::Subsequent => "subsequent",
            Self::Retraction => "retraction",
            Self::Update => "update",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = ParseEventKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "detection" => Ok(Self::Detection),
            "subsequent" => Ok(Self::Subsequent),
            "retraction" => Ok(Self::Retraction),
            "update" => Ok(Self::Update),
            _ => Err(ParseEventKindError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown event kind string.
#[derive(Debug, Clone)]
pub struct ParseEventKindError(pub String);

impl std::fmt::Display for ParseEventKindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown event kind: {}", self.0)
    }
}

impl std::error::Error for ParseEventKindError {}

/// Coordinate system used for the sky position of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSystem {
    Celestial,
    Horizontal,
    Galactic,
}

impl CoordinateSystem {
    /// Returns the canonical lowercase label for this system.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Celestial => "celestial",
            Self::Horizontal => "horizontal",
            Self::Galactic => "galactic",
        }
    }
}

impl std::fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
