//! Ephemeral snapshots returned by the snapshot source.
//!
//! Field names follow the Clash of Clans API JSON (camelCase) so the
//! source client can deserialize responses straight into these types.
//! Every collection the API may omit is optional or defaulted; the
//! pipeline decides which omissions are data-shape errors.

use serde::{Deserialize, Serialize};

use crate::error::ArchiverError;

/// Declared state of the clan's current war.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WarState {
    /// Preparation day: rosters are fixed, attacks not yet allowed.
    Preparation,
    /// Battle day.
    InWar,
    /// The war is over; results are final.
    WarEnded,
    /// The clan is not in a war.
    NotInWar,
    /// A state this crate does not know about.
    #[serde(other)]
    Unknown,
}

/// State of the league-group overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeagueState {
    /// League group formed, first war in preparation.
    Preparation,
    /// League rounds are being fought.
    InWar,
    /// All league rounds are finished.
    #[serde(alias = "warEnded")]
    Ended,
    /// The clan is not in a league group.
    NotInWar,
    /// A state this crate does not know about.
    #[serde(other)]
    Unknown,
}

impl LeagueState {
    /// Returns `true` when wars observed under this overlay are league wars.
    #[must_use]
    pub const fn marks_league_war(self) -> bool {
        matches!(self, Self::InWar | Self::Ended)
    }
}

/// A single attack made by a war member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarAttack {
    /// Tag of the attacking member.
    #[serde(default)]
    pub attacker_tag: String,
    /// Tag of the attacked base.
    pub defender_tag: String,
    /// Stars earned, 0–3.
    pub stars: u8,
    /// Destruction percentage, 0–100.
    pub destruction_percentage: f64,
    /// Attack order within the member's allowance (1 or 2).
    pub order: u8,
}

/// A member of one side's war roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarMember {
    /// Stable player tag.
    pub tag: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Assigned map position.
    pub map_position: u32,
    /// Attacks made so far.
    #[serde(default)]
    pub attacks: Vec<WarAttack>,
}

/// One side of a war.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarSide {
    /// Clan tag.
    #[serde(default)]
    pub tag: String,
    /// Clan name.
    #[serde(default)]
    pub name: String,
    /// Aggregate stars.
    #[serde(default)]
    pub stars: u32,
    /// Aggregate destruction percentage.
    #[serde(default)]
    pub destruction_percentage: f64,
    /// War roster; absent when the source withholds it.
    #[serde(default)]
    pub members: Option<Vec<WarMember>>,
}

impl WarSide {
    /// Total number of attacks made by this side.
    #[must_use]
    pub fn attacks_used(&self) -> usize {
        self.members
            .as_deref()
            .map_or(0, |members| members.iter().map(|m| m.attacks.len()).sum())
    }
}

/// The clan's current war as reported by the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarSnapshot {
    /// Declared war state.
    pub state: WarState,
    /// Roster size per side, when reported.
    #[serde(default)]
    pub team_size: Option<u32>,
    /// Start of battle day (raw source timestamp).
    #[serde(default)]
    pub start_time: Option<String>,
    /// End of battle day (raw source timestamp); the war's identity.
    #[serde(default)]
    pub end_time: Option<String>,
    /// Our side.
    #[serde(default)]
    pub clan: Option<WarSide>,
    /// The opponent.
    #[serde(default)]
    pub opponent: Option<WarSide>,
}

impl WarSnapshot {
    /// Returns the raw start time.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::MalformedSnapshot`] when the field is missing.
    pub fn require_start_time(&self) -> Result<&str, ArchiverError> {
        self.start_time
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ArchiverError::MalformedSnapshot("missing startTime".to_string()))
    }

    /// Returns the raw end time.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::MalformedSnapshot`] when the field is missing.
    pub fn require_end_time(&self) -> Result<&str, ArchiverError> {
        self.end_time
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ArchiverError::MalformedSnapshot("missing endTime".to_string()))
    }

    /// Returns our side together with its roster.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::MalformedSnapshot`] when our side or its
    /// member list is missing.
    pub fn require_clan_roster(&self) -> Result<(&WarSide, &[WarMember]), ArchiverError> {
        let clan = self
            .clan
            .as_ref()
            .ok_or_else(|| ArchiverError::MalformedSnapshot("missing clan side".to_string()))?;
        let members = clan
            .members
            .as_deref()
            .ok_or_else(|| ArchiverError::MalformedSnapshot("no roster for our clan".to_string()))?;
        Ok((clan, members))
    }

    /// Returns the opponent side.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::MalformedSnapshot`] when it is missing.
    pub fn require_opponent(&self) -> Result<&WarSide, ArchiverError> {
        self.opponent
            .as_ref()
            .ok_or_else(|| ArchiverError::MalformedSnapshot("missing opponent side".to_string()))
    }
}

/// The league-group overlay for the clan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueSnapshot {
    /// Overlay state.
    pub state: LeagueState,
    /// League season (`YYYY-MM`), when reported.
    #[serde(default)]
    pub season: Option<String>,
}

/// A clan member as listed in the clan profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterMember {
    /// Player tag.
    pub tag: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Troops donated this season.
    #[serde(default)]
    pub donations: u32,
    /// Troops received this season.
    #[serde(default)]
    pub donations_received: u32,
}

/// The clan profile, used for donation snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClanRoster {
    /// Clan tag.
    #[serde(default)]
    pub tag: String,
    /// Clan name.
    #[serde(default)]
    pub name: String,
    /// Current members; absent when the source withholds it.
    #[serde(default)]
    pub member_list: Option<Vec<RosterMember>>,
}
