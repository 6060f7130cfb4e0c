//! War history handlers: list and detail.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{WarDetailResponse, WarListQuery, WarListResponse, WarSummaryDto};
use crate::app_state::AppState;
use crate::error::{ArchiverError, ErrorResponse};

/// `GET /wars` — List archived wars.
///
/// # Errors
///
/// Returns [`ArchiverError::Persistence`] if the archive cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/wars",
    tag = "Wars",
    summary = "List archived wars",
    description = "Returns a paginated list of archived wars. `sort=league_season` keeps only wars that ended in the current season (5th to 5th).",
    params(WarListQuery),
    responses(
        (status = 200, description = "Paginated war list", body = WarListResponse),
        (status = 500, description = "Archive unavailable", body = ErrorResponse),
    )
)]
pub async fn list_wars(
    State(state): State<AppState>,
    Query(query): Query<WarListQuery>,
) -> Result<impl IntoResponse, ArchiverError> {
    let today = Utc::now().date_naive();
    let wars = state.wars.list_wars(query.sort, today).await?;
    let (page, pagination) = query.pagination().paginate(wars);

    Ok(Json(WarListResponse {
        data: page.into_iter().map(WarSummaryDto::from).collect(),
        pagination,
    }))
}

/// `GET /wars/{end_time}` — War detail with attacks.
///
/// # Errors
///
/// Returns [`ArchiverError::WarNotFound`] if no war ends at `end_time`.
#[utoipa::path(
    get,
    path = "/api/v1/wars/{end_time}",
    tag = "Wars",
    summary = "Get war details",
    description = "Returns one archived war and its attacks, each with its rule-compliance status.",
    params(
        ("end_time" = String, Path, description = "Raw war end time, e.g. 20240605T090000.000Z"),
    ),
    responses(
        (status = 200, description = "War details", body = WarDetailResponse),
        (status = 404, description = "War not found", body = ErrorResponse),
    )
)]
pub async fn get_war(
    State(state): State<AppState>,
    Path(end_time): Path<String>,
) -> Result<impl IntoResponse, ArchiverError> {
    let detail = state.wars.war_detail(&end_time).await?;
    Ok(Json(WarDetailResponse::from(detail)))
}

/// War history routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wars", get(list_wars))
        .route("/wars/{end_time}", get(get_war))
}
