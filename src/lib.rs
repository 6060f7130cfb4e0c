//! # clan-war-archiver
//!
//! Watches one clan's wars through the Clash of Clans API, archives every
//! finished war with per-attack rule analysis, sends a pre-war alert, and
//! serves the archive over a small REST API.
//!
//! ## Architecture
//!
//! ```text
//! Scheduler (service/) ── every tick ──> WarArchiver (service/)
//!     │                                     ├── SnapshotSource (source/)
//!     │                                     ├── detector, violation (domain/)
//!     │                                     ├── Notifier (notify/)
//!     │                                     └── SqliteArchive (persistence/)
//!     │
//! Clients (HTTP)
//!     ├── REST Handlers (api/)
//!     ├── WarQueryService, BonusAggregator (service/)
//!     └── SqliteArchive (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod persistence;
pub mod service;
pub mod source;

#[cfg(test)]
pub(crate) mod test_support;
