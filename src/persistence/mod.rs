//! Persistence layer: the SQLite war archive.
//!
//! [`SqliteArchive`] stores archived wars, their attacks, alert
//! subscribers and donation snapshots through an async `sqlx::SqlitePool`.
//! The schema lives in `migrations/` and is applied with
//! [`SqliteArchive::migrate`].

pub mod models;
pub mod sqlite;

pub use models::{AttackerCount, DonationEntry, WarSort};
pub use sqlite::SqliteArchive;
