//! Query parameters and aggregate rows of the war archive.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Ordering (and filtering) of the war list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WarSort {
    /// Most recent end time first.
    #[default]
    NewestFirst,
    /// Oldest end time first.
    OldestFirst,
    /// Only wars ending inside the current season, newest first.
    ///
    /// This is a date filter; the stored league flag is not consulted.
    LeagueSeason,
}

/// Number of attacks one attacker made inside a date window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AttackerCount {
    /// Attacker display name, as archived.
    pub attacker_name: String,
    /// Attacks counted.
    pub attacks: u32,
}

/// One member's counters inside a donation snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DonationEntry {
    /// Snapshot time, truncated to the hour (`YYYY-MM-DD HH:00:00`, UTC).
    pub snapshot_time: String,
    /// Player tag.
    pub player_tag: String,
    /// Player name at snapshot time.
    pub player_name: String,
    /// Troops donated.
    pub donations: u32,
    /// Troops received.
    pub donations_received: u32,
}
