//! Monthly bonus ranking.
//!
//! Members are ranked by the number of attacks they made in regular wars
//! whose end date lies in the month's bonus window. League wars are paid
//! out separately and never count here.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::season::{DateWindow, YearMonth, bonus_window};
use crate::error::ArchiverError;
use crate::persistence::{AttackerCount, SqliteArchive};

/// Medal awarded to the top three of a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Medal {
    /// First place.
    Gold,
    /// Second place.
    Silver,
    /// Third place.
    Bronze,
}

impl Medal {
    /// Medal for a 1-based rank, if any.
    #[must_use]
    pub const fn for_rank(rank: u32) -> Option<Self> {
        match rank {
            1 => Some(Self::Gold),
            2 => Some(Self::Silver),
            3 => Some(Self::Bronze),
            _ => None,
        }
    }
}

/// One line of a bonus ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BonusEntry {
    /// 1-based position; equal counts still get distinct ranks.
    pub rank: u32,
    /// Attacker display name.
    pub attacker_name: String,
    /// Attacks counted in the window.
    pub attacks: u32,
    /// Medal for the top three.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medal: Option<Medal>,
}

/// Result of a bonus query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BonusRanking {
    /// No qualifying attacks in the window.
    NoData {
        /// Window that was searched.
        window: DateWindow,
    },
    /// Ranked attackers, most attacks first.
    Ranked {
        /// Window that was searched.
        window: DateWindow,
        /// Ranking lines.
        entries: Vec<BonusEntry>,
    },
}

impl BonusRanking {
    /// The searched window.
    #[must_use]
    pub const fn window(&self) -> &DateWindow {
        match self {
            Self::NoData { window } | Self::Ranked { window, .. } => window,
        }
    }

    /// The ranking lines; empty for [`BonusRanking::NoData`].
    #[must_use]
    pub fn entries(&self) -> &[BonusEntry] {
        match self {
            Self::NoData { .. } => &[],
            Self::Ranked { entries, .. } => entries,
        }
    }
}

/// Computes bonus rankings from the archive.
#[derive(Debug, Clone)]
pub struct BonusAggregator {
    archive: SqliteArchive,
}

impl BonusAggregator {
    /// Creates an aggregator over `archive`.
    #[must_use]
    pub fn new(archive: SqliteArchive) -> Self {
        Self { archive }
    }

    /// Ranks attackers for the bonus month `month`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::InvalidRequest`] if the window cannot be
    /// computed, or [`ArchiverError::Persistence`] on database failure.
    pub async fn ranking(&self, month: YearMonth) -> Result<BonusRanking, ArchiverError> {
        let window = bonus_window(month)?;
        let counts = self.archive.count_attacks_by_attacker(window).await?;
        if counts.is_empty() {
            return Ok(BonusRanking::NoData { window });
        }
        Ok(BonusRanking::Ranked {
            window,
            entries: rank_entries(counts),
        })
    }
}

/// Turns ordered attack counts into ranking lines.
#[must_use]
pub fn rank_entries(counts: Vec<AttackerCount>) -> Vec<BonusEntry> {
    counts
        .into_iter()
        .zip(1u32..)
        .map(|(count, rank)| BonusEntry {
            rank,
            attacker_name: count.attacker_name,
            attacks: count.attacks,
            medal: Medal::for_rank(rank),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::archived::{ArchivedAttack, ViolationStatus};
    use crate::test_support::{archived_war, memory_archive};

    fn attacks_by(name: &str, n: usize) -> Vec<ArchivedAttack> {
        (0..n)
            .map(|i| ArchivedAttack {
                attacker_tag: format!("#{name}"),
                attacker_name: name.to_string(),
                defender_tag: format!("#D{i}"),
                stars: 3,
                destruction: 100.0,
                attack_order: 1,
                archived_at: 0,
                violation: ViolationStatus::Compliant,
            })
            .collect()
    }

    fn june() -> YearMonth {
        let Ok(month) = "2024-06".parse() else {
            panic!("valid month");
        };
        month
    }

    #[tokio::test]
    async fn league_attacks_do_not_count() {
        let archive = memory_archive().await;
        let regular = archived_war("20240510T090000.000Z", false);
        let league = archived_war("20240603T090000.000Z", true);
        assert!(archive.archive_war(&regular, &attacks_by("Alice", 8)).await.is_ok());
        assert!(archive.archive_war(&league, &attacks_by("Alice", 3)).await.is_ok());

        let Ok(ranking) = BonusAggregator::new(archive).ranking(june()).await else {
            panic!("ranking failed");
        };
        assert_eq!(
            ranking.entries(),
            [BonusEntry {
                rank: 1,
                attacker_name: "Alice".to_string(),
                attacks: 8,
                medal: Some(Medal::Gold),
            }]
        );
    }

    #[tokio::test]
    async fn empty_window_reports_no_data() {
        let archive = memory_archive().await;
        let outside = archived_war("20240606T090000.000Z", false);
        assert!(archive.archive_war(&outside, &attacks_by("Bob", 4)).await.is_ok());

        let Ok(ranking) = BonusAggregator::new(archive).ranking(june()).await else {
            panic!("ranking failed");
        };
        assert!(matches!(ranking, BonusRanking::NoData { .. }));
        assert_eq!(ranking.window().start.to_string(), "2024-05-05");
        assert_eq!(ranking.window().end.to_string(), "2024-06-05");
    }

    #[test]
    fn only_top_three_get_medals() {
        let counts = ["A", "B", "C", "D"]
            .iter()
            .zip([9, 7, 7, 2])
            .map(|(name, attacks)| AttackerCount {
                attacker_name: (*name).to_string(),
                attacks,
            })
            .collect();
        let entries = rank_entries(counts);
        let medals: Vec<_> = entries.iter().map(|e| e.medal).collect();
        assert_eq!(
            medals,
            vec![
                Some(Medal::Gold),
                Some(Medal::Silver),
                Some(Medal::Bronze),
                None
            ]
        );
        let ranks: Vec<_> = entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }
}
