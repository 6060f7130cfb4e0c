//! REST endpoint handlers organized by resource.

pub mod bonus;
pub mod donations;
pub mod subscribers;
pub mod system;
pub mod wars;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(wars::routes())
        .merge(bonus::routes())
        .merge(subscribers::routes())
        .merge(donations::routes())
}
