//! The companion record for the Transient Name Server naming workflow.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::validation::{check_email, check_non_empty, check_positive, check_range};
use crate::{CoordinateSystem, ValidationError};

/// A report prepared for submission to the Transient Name Server.
///
/// The submission agent treats the wire payload as an opaque ordered
/// mapping; [`TnsReport::to_report`] produces that mapping with a fixed
/// field order so the TNS's human-facing audit trail stays stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TnsReport {
    /// Author name of the report.
    pub author: String,
    /// Detection time of the FRB, ISO 8601.
    pub date: String,
    /// Email of the author.
    pub email: String,

    /// Semi-major axis of the beam error ellipse, degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semi_major: Option<f64>,
    /// Semi-minor axis of the beam error ellipse, degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semi_minor: Option<f64>,
    /// Position angle error of the beam ellipse, degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ellipse_error: Option<f64>,
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
    /// Beam in which the burst was detected, for multi-beam observatories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beam_number: Option<u32>,

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

    /// Coordinate system of the position.
    pub coordinate_system: CoordinateSystem,
    /// Right ascension, degrees, J2000.
    pub right_ascension: f64,
    /// Declination, degrees, J2000.
    pub declination: f64,
    /// Localisation error of the position, degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localization_error: Option<f64>,
    /// Importance of the event, in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,
    /// Link to the observatory website.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Identifier the submitting group uses for this FRB. The TNS search
    /// endpoint resolves public names from this value.
    pub internal_name: String,
    /// Embargo period requested for the submission, days.
    pub proprietary_period_days: u32,
}

impl TnsReport {
    /// Validates the report structurally.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_non_empty("author", &self.author)?;
        check_non_empty("date", &self.date)?;
        check_non_empty("internal_name", &self.internal_name)?;
        check_email(&self.email)?;

        check_range("right_ascension", self.right_ascension, 0.0, 360.0)?;
        check_range("declination", self.declination, -90.0, 90.0)?;
        if let Some(importance) = self.importance {
            check_range("importance", importance, 0.0, 1.0)?;
        }

        check_positive("semi_major", self.semi_major)?;
        check_positive("semi_minor", self.semi_minor)?;
        check_positive("ellipse_error", self.ellipse_error)?;
        check_positive("sampling_time", self.sampling_time)?;
        check_positive("bandwidth", self.bandwidth)?;
        check_positive("central_frequency", self.central_frequency)?;
        check_positive("tsys", self.tsys)?;
        check_positive("dm", self.dm)?;
        check_positive("dm_error", self.dm_error)?;
        check_positive("localization_error", self.localization_error)?;

        Ok(())
    }

    /// Produces the ordered wire mapping for the submission agent.
    ///
    /// Insertion order is the declared field order and is part of the
    /// contract: the TNS JSON encoding is order-sensitive for human
    /// review. Absent optionals are omitted entirely.
    pub fn to_report(&self) -> Map<String, Value> {
        let mut report = Map::new();
        report.insert("author".to_string(), json!(self.author));
        report.insert("date".to_string(), json!(self.date));
        report.insert("email".to_string(), json!(self.email));

        insert_opt(&mut report, "semi_major", self.semi_major.map(|v| json!(v)));
        insert_opt(&mut report, "semi_minor", self.semi_minor.map(|v| json!(v)));
        insert_opt(
            &mut report,
            "ellipse_error",
            self.ellipse_error.map(|v| json!(v)),
        );
        insert_opt(
            &mut report,
            "sampling_time",
            self.sampling_time.map(|v| json!(v)),
        );
        insert_opt(&mut report, "bandwidth", self.bandwidth.map(|v| json!(v)));
        insert_opt(
            &mut report,
            "central_frequency",
            self.central_frequency.map(|v| json!(v)),
        );
        insert_opt(&mut report, "npol", self.npol.map(|v| json!(v)));
        insert_opt(
            &mut report,
            "bits_per_sample",
            self.bits_per_sample.map(|v| json!(v)),
        );
        insert_opt(&mut report, "gain", self.gain.map(|v| json!(v)));
        insert_opt(&mut report, "tsys", self.tsys.map(|v| json!(v)));
        insert_opt(
            &mut report,
            "beam_number",
            self.beam_number.map(|v| json!(v)),
        );
        insert_opt(&mut report, "dm", self.dm.map(|v| json!(v)));
        insert_opt(&mut report, "dm_error", self.dm_error.map(|v| json!(v)));
        insert_opt(&mut report, "width", self.width.map(|v| json!(v)));
        insert_opt(&mut report, "snr", self.snr.map(|v| json!(v)));
        insert_opt(&mut report, "flux", self.flux.map(|v| json!(v)));

        report.insert(
            "coordinate_system".to_string(),
            json!(self.coordinate_system.as_str()),
        );
        report.insert("right_ascension".to_string(), json!(self.right_ascension));
        report.insert("declination".to_string(), json!(self.declination));
        insert_opt(
            &mut report,
            "localization_error",
            self.localization_error.map(|v| json!(v)),
        );
        insert_opt(&mut report, "importance", self.importance.map(|v| json!(v)));
        insert_opt(
            &mut report,
            "website",
            self.website.as_ref().map(|v| json!(v)),
        );

        report.insert("internal_name".to_string(), json!(self.internal_name));
        report.insert(
            "proprietary_period".to_string(),
            json!(self.proprietary_period_days),
        );
        report
    }
}

fn insert_opt(report: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        report.insert(key.to_string(), value);
    }
}
