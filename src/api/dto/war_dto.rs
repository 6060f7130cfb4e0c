//! War history DTOs for list and detail operations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::{PaginationMeta, PaginationParams};
use crate::domain::archived::{ArchivedAttack, ArchivedWar, ViolationStatus, WarResult};
use crate::persistence::WarSort;
use crate::service::WarDetail;

/// Query string of `GET /wars`.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WarListQuery {
    /// Ordering; `league_season` keeps only the current season.
    #[serde(default)]
    pub sort: WarSort,
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default)]
    pub page: Option<u32>,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl WarListQuery {
    /// Pagination part of the query, with defaults filled in.
    #[must_use]
    pub fn pagination(&self) -> PaginationParams {
        let defaults = PaginationParams::default();
        PaginationParams {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

/// One archived war.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WarSummaryDto {
    /// Raw source end time; the war's identifier.
    pub end_time: String,
    /// UTC end date.
    pub end_date: NaiveDate,
    /// Opponent clan name.
    pub opponent_name: String,
    /// Members on our roster.
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
    /// Outcome.
    pub result: WarResult,
    /// Fought inside a league group.
    pub is_league_war: bool,
    /// Attacks flagged as rule violations.
    pub total_violations: u32,
}

impl From<ArchivedWar> for WarSummaryDto {
    fn from(war: ArchivedWar) -> Self {
        Self {
            end_time: war.end_time,
            end_date: war.end_date,
            opponent_name: war.opponent_name,
            team_size: war.team_size,
            clan_stars: war.clan_stars,
            opponent_stars: war.opponent_stars,
            clan_destruction: war.clan_destruction,
            opponent_destruction: war.opponent_destruction,
            clan_attacks_used: war.clan_attacks_used,
            result: war.result,
            is_league_war: war.is_league_war,
            total_violations: war.total_violations,
        }
    }
}

/// Paginated list response for `GET /wars`.
#[derive(Debug, Serialize, ToSchema)]
pub struct WarListResponse {
    /// Wars on this page.
    pub data: Vec<WarSummaryDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// One attack of an archived war.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttackDto {
    /// Attacker tag.
    pub attacker_tag: String,
    /// Attacker name at archival time.
    pub attacker_name: String,
    /// Defender tag.
    pub defender_tag: String,
    /// Stars earned.
    pub stars: u8,
    /// Destruction percentage.
    pub destruction: f64,
    /// Attack order (1 or 2).
    pub attack_order: u8,
    /// Archival time.
    pub archived_at: Option<DateTime<Utc>>,
    /// Rule-compliance status.
    pub violation: ViolationStatus,
}

impl From<ArchivedAttack> for AttackDto {
    fn from(attack: ArchivedAttack) -> Self {
        Self {
            attacker_tag: attack.attacker_tag,
            attacker_name: attack.attacker_name,
            defender_tag: attack.defender_tag,
            stars: attack.stars,
            destruction: attack.destruction,
            attack_order: attack.attack_order,
            archived_at: DateTime::from_timestamp(attack.archived_at, 0),
            violation: attack.violation,
        }
    }
}

/// Response body for `GET /wars/{end_time}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct WarDetailResponse {
    /// The war.
    pub war: WarSummaryDto,
    /// Its attacks in archival order.
    pub attacks: Vec<AttackDto>,
}

impl From<WarDetail> for WarDetailResponse {
    fn from(detail: WarDetail) -> Self {
        Self {
            war: detail.war.into(),
            attacks: detail.attacks.into_iter().map(AttackDto::from).collect(),
        }
    }
}
