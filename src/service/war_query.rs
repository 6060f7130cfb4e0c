//! Read side of the archive: war history and war detail.

use chrono::NaiveDate;

use crate::domain::archived::{ArchivedAttack, ArchivedWar};
use crate::error::ArchiverError;
use crate::persistence::{SqliteArchive, WarSort};

/// An archived war together with its attacks.
#[derive(Debug, Clone, PartialEq)]
pub struct WarDetail {
    /// The war row.
    pub war: ArchivedWar,
    /// Attacks in archival order.
    pub attacks: Vec<ArchivedAttack>,
}

/// Queries over archived wars.
#[derive(Debug, Clone)]
pub struct WarQueryService {
    archive: SqliteArchive,
}

impl WarQueryService {
    /// Creates the service over `archive`.
    #[must_use]
    pub fn new(archive: SqliteArchive) -> Self {
        Self { archive }
    }

    /// Lists wars in `sort` order; `today` anchors the league-season filter.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::Persistence`] on database failure.
    pub async fn list_wars(
        &self,
        sort: WarSort,
        today: NaiveDate,
    ) -> Result<Vec<ArchivedWar>, ArchiverError> {
        self.archive.list_wars(sort, today).await
    }

    /// Loads one war and its attacks.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::WarNotFound`] if no war ends at `end_time`,
    /// or [`ArchiverError::Persistence`] on database failure.
    pub async fn war_detail(&self, end_time: &str) -> Result<WarDetail, ArchiverError> {
        let war = self
            .archive
            .get_war(end_time)
            .await?
            .ok_or_else(|| ArchiverError::WarNotFound(end_time.to_string()))?;
        let attacks = self.archive.get_attacks(end_time).await?;
        Ok(WarDetail { war, attacks })
    }
}
