//! Service layer: the archival pipeline and the archive's read side.
//!
//! [`WarArchiver`] runs one polling tick, [`Scheduler`] drives it on a
//! fixed interval, and [`WarQueryService`] and [`BonusAggregator`] answer
//! the query API.

pub mod archiver;
pub mod bonus;
pub mod scheduler;
pub mod war_query;

pub use archiver::{ArchiverSettings, TickReport, WarArchiver};
pub use bonus::{BonusAggregator, BonusEntry, BonusRanking, Medal};
pub use scheduler::Scheduler;
pub use war_query::{WarDetail, WarQueryService};
