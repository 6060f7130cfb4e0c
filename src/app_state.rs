//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::persistence::SqliteArchive;
use crate::service::{BonusAggregator, WarQueryService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// War history queries.
    pub wars: Arc<WarQueryService>,
    /// Monthly bonus rankings.
    pub bonus: Arc<BonusAggregator>,
    /// Direct archive access for subscriber management.
    pub archive: SqliteArchive,
}

impl AppState {
    /// Builds the state over a single archive.
    #[must_use]
    pub fn new(archive: SqliteArchive) -> Self {
        Self {
            wars: Arc::new(WarQueryService::new(archive.clone())),
            bonus: Arc::new(BonusAggregator::new(archive.clone())),
            archive,
        }
    }
}
