//! Snapshot source: read-only access to the clan's live war state.
//!
//! [`SnapshotSource`] is the seam between the archival pipeline and the
//! external data provider. `Ok(None)` means "nothing there" (no war, not
//! in a league group); `Err` means the call itself failed. The pipeline
//! treats both as an absent snapshot for the current tick.

pub mod coc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::snapshot::{ClanRoster, LeagueSnapshot, WarSnapshot};

pub use coc::CocApiClient;

/// Errors raised by a snapshot source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport failure or timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the credentials, or the war log is private.
    #[error("access denied for {endpoint}")]
    AccessDenied {
        /// Endpoint that was refused.
        endpoint: String,
    },

    /// The provider throttled us.
    #[error("rate limited on {endpoint}")]
    RateLimited {
        /// Endpoint that was throttled.
        endpoint: String,
    },

    /// Any other unsuccessful status.
    #[error("HTTP {status} from {endpoint}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Endpoint that failed.
        endpoint: String,
    },

    /// The response body did not match the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The call did not finish in time.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Read-only provider of clan war snapshots.
///
/// Implementations own their timeout and retry policy; every call must be
/// free of side effects.
#[async_trait]
pub trait SnapshotSource: Send + Sync + std::fmt::Debug {
    /// The clan's current war, or `None` when it is not in a war.
    async fn current_war(&self, clan_tag: &str) -> Result<Option<WarSnapshot>, SourceError>;

    /// The league-group overlay, or `None` when the clan is not in one.
    async fn league_group(&self, clan_tag: &str) -> Result<Option<LeagueSnapshot>, SourceError>;

    /// The clan profile with its member list.
    async fn clan_roster(&self, clan_tag: &str) -> Result<Option<ClanRoster>, SourceError>;
}
