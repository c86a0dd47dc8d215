//! The VOEvent notice ingested from a host observatory.

use serde::{Deserialize, Serialize};

use crate::validation::{check_email, check_non_empty, check_positive, check_range};
use crate::{EventKind, ValidationError};

/// A VOEvent notice describing a candidate Fast Radio Burst.
///
/// This is the record the ingest endpoint accepts, the store persists, and
/// the notification channels fan out. Optional fields carry `None` when the
/// observatory did not report them; serialisation skips them so downstream
/// consumers see only what was actually measured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VOEvent {
    /// Which kind of notice this is.
    pub kind: EventKind,
    /// Name of the host observatory, e.g. `CHIME`.
    pub observatory_name: String,
    /// Detection time of the FRB, ISO 8601.
    pub date: String,
    /// Email address of the notice author.
    pub email: String,

    /// Semi-major axis of the beam error ellipse, degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semi_major: Option<f64>,
    /// Semi-minor axis of the beam error ellipse, degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semi_minor: Option<f64>,
    /// Sampling time of the observation, seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_time: Option<f64>,
    /// Bandwidth of the observation, MHz.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<f64>,
    /// Central frequency of the observation, MHz.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub central_frequency: Option<f64>,
    /// Number of polarisations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npol: Option<u32>,
    /// Bits per sample.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bits_per_sample: Option<u32>,
    /// Gain of the observatory, dB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain: Option<f64>,
    /// System temperature, K.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsys: Option<f64>,

    /// Identifier assigned to the FRB by the submitting group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<String>,
    /// Dispersion measure, pc/cm^3.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dm: Option<f64>,
    /// Error of the dispersion measure, pc/cm^3.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dm_error: Option<f64>,
    /// Width in time of the burst, seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Signal-to-noise ratio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snr: Option<f64>,
    /// Flux, Jy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flux: Option<f64>,

    /// Right ascension, degrees, J2000.
    pub right_ascension: f64,
    /// Declination, degrees, J2000.
    pub declination: f64,
    /// 95% localisation error of the position, degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos_error_deg_95: Option<f64>,
    /// Importance of the event, in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,

    /// Link to the host observatory website.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Transient Name Server name, once assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tns_name: Option<String>,
    /// Free-text message carried by an `update` notice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_message: Option<String>,
}

impl VOEvent {
    /// Validates the notice structurally.
    ///
    /// Required string fields must be non-empty, the author email must be
    /// plausible, the position must lie on the sky, and physics values that
    /// are present must be finite and positive where a negative or zero
    /// value is meaningless.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_non_empty("observatory_name", &self.observatory_name)?;
        check_non_empty("date", &self.date)?;
        check_email(&self.email)?;

        check_range("right_ascension", self.right_ascension, 0.0, 360.0)?;
        check_range("declination", self.declination, -90.0, 90.0)?;
        if let Some(importance) = self.importance {
            check_range("importance", importance, 0.0, 1.0)?;
        }

        check_positive("semi_major", self.semi_major)?;
        check_positive("semi_minor", self.semi_minor)?;
        check_positive("sampling_time", self.sampling_time)?;
        check_positive("bandwidth", self.bandwidth)?;
        check_positive("central_frequency", self.central_frequency)?;
        check_positive("tsys", self.tsys)?;
        check_positive("dm", self.dm)?;
        check_positive("dm_error", self.dm_error)?;
        check_positive("pos_error_deg_95", self.pos_error_deg_95)?;

        if matches!(self.npol, Some(0)) {
            return Err(ValidationError::OutOfRange {
                field: "npol",
                detail: "must be at least 1".to_string(),
            });
        }
        if matches!(self.bits_per_sample, Some(0)) {
            return Err(ValidationError::OutOfRange {
                field: "bits_per_sample",
                detail: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}
