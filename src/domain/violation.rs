//! Attack ordering rules for regular (non-league) wars.
//!
//! Each member should spend their first attack on their mirror: the base at
//! their own map position. A second attack on a different position is only
//! tolerated during the cleanup period, the last ten hours of the war.
//!
//! Positions are looked up in *our own* roster, keyed by tag. Attacks whose
//! defender is not found there are kept as [`ViolationStatus::NotEvaluated`].
//!
//! The cleanup check compares the classification time, not the moment of
//! the attack, against the cutoff: the source does not report attack times.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};

use super::archived::{ArchivedAttack, ArchivedWar, ViolationStatus, WarResult};
use super::snapshot::{WarAttack, WarSnapshot};
use super::war_time::parse_war_time;
use crate::error::ArchiverError;

/// Length of the cleanup period before the war ends.
pub const CLEANUP_WINDOW_HOURS: i64 = 10;

/// A war snapshot turned into archive records.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedWar {
    /// The war row.
    pub war: ArchivedWar,
    /// One row per attack of our roster, in roster order.
    pub attacks: Vec<ArchivedAttack>,
}

/// Classifies a single attack.
///
/// `positions` maps member tags of our roster to their map positions.
#[must_use]
pub fn evaluate_attack(
    attacker_position: u32,
    attack: &WarAttack,
    positions: &HashMap<&str, u32>,
    now: DateTime<Utc>,
    cleanup_starts: DateTime<Utc>,
) -> ViolationStatus {
    let Some(&defender_position) = positions.get(attack.defender_tag.as_str()) else {
        return ViolationStatus::NotEvaluated;
    };
    let off_mirror = attacker_position != defender_position;
    let violating = match attack.order {
        1 => off_mirror,
        2 => off_mirror && now < cleanup_starts,
        _ => false,
    };
    if violating {
        ViolationStatus::Violating
    } else {
        ViolationStatus::Compliant
    }
}

/// Builds the archive records for an ended war.
///
/// League wars skip evaluation: all their attacks are recorded compliant
/// and the war carries no violations.
///
/// # Errors
///
/// Returns [`ArchiverError::MalformedSnapshot`] when the end time, our
/// roster or the opponent side is missing or unusable.
pub fn classify_war(
    snapshot: &WarSnapshot,
    is_league_war: bool,
    now: DateTime<Utc>,
) -> Result<ClassifiedWar, ArchiverError> {
    let end_time = snapshot.require_end_time()?;
    let ends_at = parse_war_time(end_time)?;
    let cleanup_starts = ends_at - TimeDelta::hours(CLEANUP_WINDOW_HOURS);
    let (clan, members) = snapshot.require_clan_roster()?;
    let opponent = snapshot.require_opponent()?;

    let positions: HashMap<&str, u32> = members
        .iter()
        .map(|m| (m.tag.as_str(), m.map_position))
        .collect();

    let archived_at = now.timestamp();
    let mut attacks = Vec::with_capacity(clan.attacks_used());
    for member in members {
        for attack in &member.attacks {
            let violation = if is_league_war {
                ViolationStatus::Compliant
            } else {
                evaluate_attack(member.map_position, attack, &positions, now, cleanup_starts)
            };
            attacks.push(ArchivedAttack {
                attacker_tag: member.tag.clone(),
                attacker_name: member.name.clone(),
                defender_tag: attack.defender_tag.clone(),
                stars: attack.stars,
                destruction: attack.destruction_percentage,
                attack_order: attack.order,
                archived_at,
                violation,
            });
        }
    }

    let total_violations = attacks.iter().filter(|a| a.violation.is_violation()).count();

    let war = ArchivedWar {
        end_time: end_time.to_string(),
        end_date: ends_at.date_naive(),
        opponent_name: opponent.name.clone(),
        team_size: u32::try_from(members.len()).unwrap_or(u32::MAX),
        clan_stars: clan.stars,
        opponent_stars: opponent.stars,
        clan_destruction: clan.destruction_percentage,
        opponent_destruction: opponent.destruction_percentage,
        clan_attacks_used: u32::try_from(attacks.len()).unwrap_or(u32::MAX),
        result: WarResult::from_stars(clan.stars, opponent.stars),
        is_league_war,
        total_violations: u32::try_from(total_violations).unwrap_or(u32::MAX),
    };

    Ok(ClassifiedWar { war, attacks })
}
