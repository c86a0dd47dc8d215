//! Persistence operations for VOEvents, TNS submissions, and subscribers.
//!
//! All functions take a `&Connection` from the pool; callers decide the
//! threading model (request handlers run these inside `spawn_blocking`).

use rusqlite::{params, Connection};
use thiserror::Error;
use uuid::Uuid;

use frbvoe_types::{RequestedService, Subscriber, VOEvent};

/// Errors produced by the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A SQL statement failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A record could not be serialised for the payload column.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Inserts a validated VOEvent and returns its assigned row id.
///
/// The full notice is stored as JSON alongside the columns used for
/// lookups, so nothing the observatory reported is lost.
pub fn insert_voevent(conn: &Connection, voe: &VOEvent) -> Result<String, StoreError> {
    let id = Uuid::new_v4().to_string();
    let payload_json = serde_json::to_string(voe)?;

    conn.execute(
        "INSERT INTO voevents (id, kind, observatory_name, date, payload_json, tns_name)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            voe.kind.as_str(),
            voe.observatory_name,
            voe.date,
            payload_json,
            voe.tns_name,
        ],
    )?;

    tracing::debug!(id = %id, kind = voe.kind.as_str(), "stored voevent");
    Ok(id)
}

/// Deletes a VOEvent by id. Returns the number of rows removed.
pub fn delete_voevent(conn: &Connection, id: &str) -> Result<usize, StoreError> {
    Ok(conn.execute("DELETE FROM voevents WHERE id = ?1", params![id])?)
}

/// Outcome of a TNS submission, as recorded for operator reference.
///
/// The report identifier must be kept even when polling failed — it is
/// what the TNS developers ask for when a submission goes wrong.
#[derive(Debug, Clone)]
pub struct SubmissionRecord {
    /// The submitting group's internal identifier for the FRB.
    pub internal_name: String,
    /// Report identifier assigned by the TNS, when submission got that far.
    pub report_id: Option<String>,
    /// Public name resolved by the TNS, when available.
    pub tns_name: Option<String>,
    /// Last diagnostic code read from the TNS response envelope.
    pub id_code: Option<String>,
    /// Last diagnostic message read from the TNS response envelope.
    pub id_message: Option<String>,
    /// The submitted report payload, serialised.
    pub payload_json: String,
}

/// Records the outcome of a TNS submission and returns its row id.
pub fn record_submission(
    conn: &Connection,
    record: &SubmissionRecord,
) -> Result<String, StoreError> {
    let id = Uuid::new_v4().to_string();

    conn.execute(
        "INSERT INTO tns_submissions
            (id, internal_name, report_id, tns_name, id_code, id_message, payload_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            record.internal_name,
            record.report_id,
            record.tns_name,
            record.id_code,
            record.id_message,
            record.payload_json,
        ],
    )?;

    tracing::debug!(
        id = %id,
        internal_name = %record.internal_name,
        report_id = record.report_id.as_deref().unwrap_or("-"),
        "recorded TNS submission"
    );
    Ok(id)
}

/// A subscriber row as stored, with its assigned id.
#[derive(Debug, Clone)]
pub struct SubscriberRow {
    /// Assigned row id.
    pub id: String,
    /// The subscriber record.
    pub subscriber: Subscriber,
}

/// Inserts a validated subscriber and returns the assigned row id.
pub fn insert_subscriber(conn: &Connection, sub: &Subscriber) -> Result<String, StoreError> {
    let id = Uuid::new_v4().to_string();

    conn.execute(
        "INSERT INTO subscribers
            (id, name, contact_email, requested_service, subscriber_email, ip_address)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            sub.name,
            sub.contact_email,
            sub.requested_service.as_str(),
            sub.subscriber_email,
            sub.ip_address,
        ],
    )?;

    tracing::debug!(id = %id, name = %sub.name, "stored subscriber");
    Ok(id)
}

/// Deletes a subscriber by id. Returns the number of rows removed.
pub fn delete_subscriber(conn: &Connection, id: &str) -> Result<usize, StoreError> {
    Ok(conn.execute("DELETE FROM subscribers WHERE id = ?1", params![id])?)
}

/// Lists all subscribers.
pub fn list_subscribers(conn: &Connection) -> Result<Vec<SubscriberRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, contact_email, requested_service, subscriber_email, ip_address
         FROM subscribers ORDER BY added_at",
    )?;
    let rows = stmt.query_map([], |row| {
        let service: String = row.get(3)?;
        Ok(SubscriberRow {
            id: row.get(0)?,
            subscriber: Subscriber {
                name: row.get(1)?,
                contact_email: row.get(2)?,
                requested_service: service
                    .parse::<RequestedService>()
                    .unwrap_or(RequestedService::Emails),
                subscriber_email: row.get(4)?,
                ip_address: row.get(5)?,
            },
        })
    })?;

    let mut subscribers = Vec::new();
    for row in rows {
        subscribers.push(row?);
    }
    Ok(subscribers)
}

/// Returns the delivery addresses of subscribers who receive email notices.
pub fn list_email_recipients(conn: &Connection) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT subscriber_email FROM subscribers
         WHERE requested_service IN ('emails', 'both')
           AND subscriber_email IS NOT NULL
         ORDER BY added_at",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut recipients = Vec::new();
    for row in rows {
        recipients.push(row?);
    }
    Ok(recipients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_migrations;
    use frbvoe_types::EventKind;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn detection() -> VOEvent {
        VOEvent {
            kind: EventKind::Detection,
            observatory_name: "CHIME".to_string(),
            date: "2020-01-13 16:55:08.844845".to_string(),
            email: "john.smith@email.com".to_string(),
            semi_major: None,
            semi_minor: None,
            sampling_time: Some(0.001),
            bandwidth: Some(400.0),
            central_frequency: Some(600.0),
            npol: Some(2),
            bits_per_sample: Some(8),
            gain: None,
            tsys: Some(25.0),
            internal_id: Some("38249195".to_string()),
            dm: Some(298.53),
            dm_error: Some(0.01),
            width: None,
            snr: Some(13.8),
            flux: None,
            right_ascension: 55.2938,
            declination: 14.2049,
            pos_error_deg_95: Some(0.001),
            importance: Some(0.9979),
            website: None,
            tns_name: None,
            update_message: None,
        }
    }

    #[test]
    fn voevent_insert_and_delete() {
        let conn = test_conn();
        let id = insert_voevent(&conn, &detection()).unwrap();

        let stored: String = conn
            .query_row(
                "SELECT payload_json FROM voevents WHERE id = ?1",
                [&id],
                |row| row.get(0),
            )
            .unwrap();
        let back: VOEvent = serde_json::from_str(&stored).unwrap();
        assert_eq!(back.observatory_name, "CHIME");

        assert_eq!(delete_voevent(&conn, &id).unwrap(), 1);
        assert_eq!(delete_voevent(&conn, &id).unwrap(), 0);
    }

    #[test]
    fn submission_record_keeps_diagnostics() {
        let conn = test_conn();
        let record = SubmissionRecord {
            internal_name: "38249195".to_string(),
            report_id: Some("55".to_string()),
            tns_name: None,
            id_code: Some("200".to_string()),
            id_message: Some("OK".to_string()),
            payload_json: "{}".to_string(),
        };
        let id = record_submission(&conn, &record).unwrap();

        let (report_id, tns_name): (Option<String>, Option<String>) = conn
            .query_row(
                "SELECT report_id, tns_name FROM tns_submissions WHERE id = ?1",
                [&id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(report_id.as_deref(), Some("55"));
        assert_eq!(tns_name, None);
    }

    #[test]
    fn email_recipients_filter_by_service() {
        let conn = test_conn();

        let mut a = Subscriber {
            name: "A".to_string(),
            contact_email: "a@email.com".to_string(),
            requested_service: RequestedService::Emails,
            subscriber_email: Some("a-bot@email.com".to_string()),
            ip_address: None,
        };
        insert_subscriber(&conn, &a).unwrap();

        a.name = "B".to_string();
        a.requested_service = RequestedService::Xmls;
        a.subscriber_email = None;
        a.ip_address = Some("192.0.2.7".to_string());
        insert_subscriber(&conn, &a).unwrap();

        a.name = "C".to_string();
        a.requested_service = RequestedService::Both;
        a.subscriber_email = Some("c-bot@email.com".to_string());
        insert_subscriber(&conn, &a).unwrap();

        let recipients = list_email_recipients(&conn).unwrap();
        assert_eq!(recipients, vec!["a-bot@email.com", "c-bot@email.com"]);

        assert_eq!(list_subscribers(&conn).unwrap().len(), 3);
    }

    #[test]
    fn subscriber_delete_by_id() {
        let conn = test_conn();
        let sub = Subscriber {
            name: "A".to_string(),
            contact_email: "a@email.com".to_string(),
            requested_service: RequestedService::Xmls,
            subscriber_email: None,
            ip_address: Some("192.0.2.7".to_string()),
        };
        let id = insert_subscriber(&conn, &sub).unwrap();
        assert_eq!(delete_subscriber(&conn, &id).unwrap(), 1);
        assert!(list_subscribers(&conn).unwrap().is_empty());
    }
}
