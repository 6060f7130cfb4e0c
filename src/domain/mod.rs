//! Domain layer: snapshots, archive records and the rules between them.
//!
//! Everything here is synchronous and free of I/O. The service layer feeds
//! snapshots in and writes the resulting records through the persistence
//! layer.

pub mod archived;
pub mod detector;
pub mod season;
pub mod snapshot;
pub mod violation;
pub mod war_time;

pub use archived::{ArchivedAttack, ArchivedWar, ViolationStatus, WarResult};
pub use detector::{AlertMarker, WarTransition};
pub use season::{DateWindow, YearMonth};
pub use snapshot::{ClanRoster, LeagueSnapshot, LeagueState, WarSnapshot, WarState};
pub use violation::ClassifiedWar;
