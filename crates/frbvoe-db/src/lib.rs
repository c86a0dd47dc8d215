//! SQLite persistence for the frbvoe service.
//!
//! The document store is a collaborator from the submission agent's point
//! of view: handlers validate a record, hand it to this crate for storage,
//! and pass results onward. Three tables back the three record types —
//! `voevents`, `tns_submissions`, and `subscribers`.

mod migrations;
mod pool;
mod store;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, PoolError};
pub use store::{
    delete_subscriber, delete_voevent, insert_subscriber, insert_voevent, list_email_recipients,
    list_subscribers, record_submission, StoreError, SubmissionRecord, SubscriberRow,
};
