//! Bonus ranking DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::season::{DateWindow, YearMonth};
use crate::service::{BonusEntry, BonusRanking};

/// Response body for `GET /bonus/{year_month}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct BonusResponse {
    /// Requested month, `YYYY-MM`.
    pub month: String,
    /// Inclusive window of war end dates that were counted.
    pub window: DateWindow,
    /// `false` when no regular-war attack falls in the window.
    pub has_data: bool,
    /// Ranking, most attacks first.
    pub entries: Vec<BonusEntry>,
}

impl BonusResponse {
    /// Builds the response for `month` from a computed ranking.
    #[must_use]
    pub fn new(month: YearMonth, ranking: &BonusRanking) -> Self {
        Self {
            month: month.to_string(),
            window: *ranking.window(),
            has_data: matches!(ranking, BonusRanking::Ranked { .. }),
            entries: ranking.entries().to_vec(),
        }
    }
}
