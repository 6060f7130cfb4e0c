//! Monthly bonus ranking handler.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::BonusResponse;
use crate::app_state::AppState;
use crate::domain::season::YearMonth;
use crate::error::{ArchiverError, ErrorResponse};

/// `GET /bonus/{year_month}` — Attack ranking for a bonus month.
///
/// # Errors
///
/// Returns [`ArchiverError::InvalidRequest`] for a malformed month, or
/// [`ArchiverError::Persistence`] if the archive cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/bonus/{year_month}",
    tag = "Bonus",
    summary = "Bonus ranking for a month",
    description = "Ranks members by attacks made in regular (non-league) wars that ended between the 5th of the previous month and the 5th of the given month, both inclusive.",
    params(
        ("year_month" = String, Path, description = "Target month as YYYY-MM"),
    ),
    responses(
        (status = 200, description = "Ranking (possibly empty)", body = BonusResponse),
        (status = 400, description = "Malformed month", body = ErrorResponse),
        (status = 500, description = "Archive unavailable", body = ErrorResponse),
    )
)]
pub async fn get_bonus(
    State(state): State<AppState>,
    Path(year_month): Path<String>,
) -> Result<impl IntoResponse, ArchiverError> {
    let month: YearMonth = year_month.parse()?;
    let ranking = state.bonus.ranking(month).await?;
    Ok(Json(BonusResponse::new(month, &ranking)))
}

/// Bonus routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/bonus/{year_month}", get(get_bonus))
}
