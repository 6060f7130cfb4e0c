//! Donation snapshot handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::error::{ArchiverError, ErrorResponse};
use crate::persistence::DonationEntry;

/// `GET /donations/latest` — Most recent donation snapshot.
///
/// # Errors
///
/// Returns [`ArchiverError::Persistence`] if the archive cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/donations/latest",
    tag = "Donations",
    summary = "Latest donation snapshot",
    description = "Returns every member's donation counters from the most recent hourly snapshot; empty before the first snapshot.",
    responses(
        (status = 200, description = "Snapshot entries by player tag", body = Vec<DonationEntry>),
        (status = 500, description = "Archive unavailable", body = ErrorResponse),
    )
)]
pub async fn latest_donations(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ArchiverError> {
    Ok(Json(state.archive.latest_donation_snapshot().await?))
}

/// Donation routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/donations/latest", get(latest_donations))
}
