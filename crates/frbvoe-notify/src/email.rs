//! Plain-text email rendering for subscriber notices.
//!
//! Only the message content is produced here. Relaying through an SMTP
//! server is a site deployment concern and stays outside this crate; the
//! dispatcher renders per recipient and logs the hand-off.

use tracing::info;

use frbvoe_types::{EventKind, VOEvent};

/// A rendered notice, ready for the site's mail relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

fn fmt_opt_f64(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

fn fmt_opt_u32(value: Option<u32>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

/// Renders the notice email for a VOEvent.
///
/// Detections and subsequent bursts carry the observatory parameter block;
/// retractions carry the localisation of the withdrawn event; updates
/// carry the author's free-text message.
pub fn render_email(voe: &VOEvent) -> EmailMessage {
    let subject = format!("{}_VOE_{}", voe.observatory_name, voe.kind);

    let details = match voe.kind {
        EventKind::Detection | EventKind::Subsequent => format!(
            "WHO\n\
             Produced: {date}\n\
             \n\
             WHAT\n\
             observatory parameters:\n\
             \tsampling_time: {sampling_time} s\n\
             \tbandwidth: {bandwidth} MHz\n\
             \tcentre_frequency: {central_frequency} MHz\n\
             \tnpol: {npol}\n\
             \tbits_per_sample: {bits_per_sample}\n\
             \ttsys: {tsys} K\n\
             event parameters:\n\
             \tdm: {dm} +/- {dm_error} pc/cm^3\n\
             \tsnr: {snr}\n\
             \n\
             WHERE and WHEN\n\
             Timestamp [UTC]: {date}\n\
             Localization: ({ra}, {dec}) +/- {pos_err} degrees (J2000)\n",
            date = voe.date,
            sampling_time = fmt_opt_f64(voe.sampling_time),
            bandwidth = fmt_opt_f64(voe.bandwidth),
            central_frequency = fmt_opt_f64(voe.central_frequency),
            npol = fmt_opt_u32(voe.npol),
            bits_per_sample = fmt_opt_u32(voe.bits_per_sample),
            tsys = fmt_opt_f64(voe.tsys),
            dm = fmt_opt_f64(voe.dm),
            dm_error = fmt_opt_f64(voe.dm_error),
            snr = fmt_opt_f64(voe.snr),
            ra = voe.right_ascension,
            dec = voe.declination,
            pos_err = fmt_opt_f64(voe.pos_error_deg_95),
        ),
        EventKind::Retraction => format!(
            "WHO\n\
             Produced: {date}\n\
             \n\
             WHERE and WHEN\n\
             Timestamp [UTC]: {date}\n\
             Localization: ({ra}, {dec}) +/- {pos_err} degrees (J2000)\n\
             \n\
             HOW\n\
             Description: Human-issued retraction. For more information, see: {website}\n\
             \n\
             CITATIONS\n\
             {internal_id}\n",
            date = voe.date,
            ra = voe.right_ascension,
            dec = voe.declination,
            pos_err = fmt_opt_f64(voe.pos_error_deg_95),
            website = voe.website.as_deref().unwrap_or("n/a"),
            internal_id = voe.internal_id.as_deref().unwrap_or("n/a"),
        ),
        EventKind::Update => voe
            .update_message
            .clone()
            .unwrap_or_else(|| "(no update message supplied)".to_string()),
    };

    let body = format!(
        "{kind}-type VOEvent\n\
         \n\
         {details}\n\
         **********\n\
         This email was generated automatically by the {observatory} frb-voe service.\n\
         Please direct comments, questions, and concerns to {contact}.\n\
         \n\
         --\n\
         You are receiving this email because you are currently a subscriber to\n\
         the public {observatory} frb-voe service.\n\
         To unsubscribe, please contact {contact}.\n",
        kind = voe.kind,
        details = details,
        observatory = voe.observatory_name,
        contact = voe.email,
    );

    EmailMessage { subject, body }
}

/// Renders the notice for each recipient and hands it off for delivery.
///
/// Returns the number of recipients handled.
pub fn dispatch_emails(voe: &VOEvent, recipients: &[String]) -> usize {
    if recipients.is_empty() {
        info!("no email subscribers to notify");
        return 0;
    }

    let message = render_email(voe);
    for recipient in recipients {
        info!(
            to = %recipient,
            subject = %message.subject,
            "notice email handed to the mail relay"
        );
    }
    recipients.len()
}
