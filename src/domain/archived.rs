//! Durable war and attack records.
//!
//! An [`ArchivedWar`] is identified by the raw `end_time` the source
//! reported; its [`ArchivedAttack`]s are owned by it and always written
//! and replaced as one batch.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ArchiverError;

/// Outcome of a war for our clan, decided on stars alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WarResult {
    /// More stars than the opponent.
    Win,
    /// Fewer stars than the opponent.
    Lose,
    /// Equal stars.
    Tie,
}

impl WarResult {
    /// Decides the result from both sides' star totals.
    #[must_use]
    pub const fn from_stars(ours: u32, theirs: u32) -> Self {
        if ours > theirs {
            Self::Win
        } else if ours < theirs {
            Self::Lose
        } else {
            Self::Tie
        }
    }

    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Lose => "lose",
            Self::Tie => "tie",
        }
    }
}

impl fmt::Display for WarResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WarResult {
    type Err = ArchiverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "win" => Ok(Self::Win),
            "lose" => Ok(Self::Lose),
            "tie" => Ok(Self::Tie),
            other => Err(ArchiverError::Persistence(format!(
                "unknown war result {other:?}"
            ))),
        }
    }
}

/// Rule-compliance status of an archived attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ViolationStatus {
    /// The attack could not be evaluated (defender not in our roster).
    NotEvaluated,
    /// The attack follows the ordering rules.
    Compliant,
    /// The attack breaks the ordering rules.
    Violating,
}

impl ViolationStatus {
    /// Storage representation: `NULL`, `0` or `1`.
    #[must_use]
    pub const fn to_db(self) -> Option<i64> {
        match self {
            Self::NotEvaluated => None,
            Self::Compliant => Some(0),
            Self::Violating => Some(1),
        }
    }

    /// Inverse of [`ViolationStatus::to_db`]; any non-zero flag is a violation.
    #[must_use]
    pub const fn from_db(flag: Option<i64>) -> Self {
        match flag {
            None => Self::NotEvaluated,
            Some(0) => Self::Compliant,
            Some(_) => Self::Violating,
        }
    }

    /// Returns `true` for [`ViolationStatus::Violating`].
    #[must_use]
    pub const fn is_violation(self) -> bool {
        matches!(self, Self::Violating)
    }
}

/// A finished war as stored in the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivedWar {
    /// Raw source end time; primary key.
    pub end_time: String,
    /// UTC calendar date of `end_time`.
    pub end_date: NaiveDate,
    /// Opponent clan name.
    pub opponent_name: String,
    /// Number of members on our roster.
    pub team_size: u32,
    /// Our stars.
    pub clan_stars: u32,
    /// Opponent stars.
    pub opponent_stars: u32,
    /// Our destruction percentage.
    pub clan_destruction: f64,
    /// Opponent destruction percentage.
    pub opponent_destruction: f64,
    /// Attacks our roster used.
    pub clan_attacks_used: u32,
    /// War outcome.
    pub result: WarResult,
    /// Whether the war was fought inside a league group.
    pub is_league_war: bool,
    /// Number of attacks flagged as violations.
    pub total_violations: u32,
}

/// One attack of our roster, as stored in the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivedAttack {
    /// Attacker tag.
    pub attacker_tag: String,
    /// Attacker display name at archival time.
    pub attacker_name: String,
    /// Defender tag.
    pub defender_tag: String,
    /// Stars earned.
    pub stars: u8,
    /// Destruction percentage.
    pub destruction: f64,
    /// Attack order (1 or 2).
    pub attack_order: u8,
    /// Wall-clock archival time, Unix seconds.
    pub archived_at: i64,
    /// Compliance classification.
    pub violation: ViolationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_from_stars() {
        assert_eq!(WarResult::from_stars(30, 28), WarResult::Win);
        assert_eq!(WarResult::from_stars(10, 28), WarResult::Lose);
        assert_eq!(WarResult::from_stars(28, 28), WarResult::Tie);
    }

    #[test]
    fn result_parses_its_own_representation() {
        for result in [WarResult::Win, WarResult::Lose, WarResult::Tie] {
            assert_eq!(result.as_str().parse::<WarResult>().ok(), Some(result));
        }
        assert!("victory".parse::<WarResult>().is_err());
    }

    #[test]
    fn violation_status_storage_flags() {
        assert_eq!(ViolationStatus::NotEvaluated.to_db(), None);
        assert_eq!(ViolationStatus::Compliant.to_db(), Some(0));
        assert_eq!(ViolationStatus::Violating.to_db(), Some(1));
        assert_eq!(ViolationStatus::from_db(Some(1)), ViolationStatus::Violating);
        assert_eq!(ViolationStatus::from_db(None), ViolationStatus::NotEvaluated);
    }
}
