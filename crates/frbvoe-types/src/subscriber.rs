//! Subscriber records for the notification list.

use serde::{Deserialize, Serialize};

use crate::validation::{check_email, check_non_empty};
use crate::ValidationError;

/// Which delivery channel a subscriber signed up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestedService {
    /// Plain-text email notices.
    Emails,
    /// Machine-readable VOEvent XML via the broker.
    Xmls,
    /// Both channels.
    Both,
}

impl RequestedService {
    /// Returns the canonical lowercase label for this service.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Emails => "emails",
            Self::Xmls => "xmls",
            Self::Both => "both",
        }
    }

    /// True when this subscriber should receive email notices.
    pub fn wants_email(self) -> bool {
        matches!(self, Self::Emails | Self::Both)
    }
}

impl std::fmt::Display for RequestedService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestedService {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "emails" => Ok(Self::Emails),
            "xmls" => Ok(Self::Xmls),
            "both" => Ok(Self::Both),
            _ => Err(format!("unknown requested service: {s}")),
        }
    }
}

/// A member of the notification list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    /// Name of the subscriber.
    pub name: String,
    /// Contact email address for administrative correspondence.
    pub contact_email: String,
    /// Which delivery channel the subscriber requested.
    pub requested_service: RequestedService,
    /// Address notices are delivered to. Required for email service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscriber_email: Option<String>,
    /// IP address registered for XML delivery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

impl Subscriber {
    /// Validates the subscriber record.
    ///
    /// A subscriber asking for email delivery must carry a plausible
    /// delivery address distinct from mere registration contact details.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_non_empty("name", &self.name)?;
        check_email(&self.contact_email)?;

        if self.requested_service.wants_email() {
            match &self.subscriber_email {
                Some(address) => check_email(address)?,
                None => return Err(ValidationError::MissingField("subscriber_email")),
            }
        }

        Ok(())
    }
}
