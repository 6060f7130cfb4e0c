//! Alert subscriber handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{SubscriberListResponse, SubscriptionResponse};
use crate::app_state::AppState;
use crate::error::{ArchiverError, ErrorResponse};

/// `GET /subscribers` — List alert recipients.
///
/// # Errors
///
/// Returns [`ArchiverError::Persistence`] if the archive cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/subscribers",
    tag = "Subscribers",
    summary = "List alert subscribers",
    responses(
        (status = 200, description = "Subscriber ids", body = SubscriberListResponse),
        (status = 500, description = "Archive unavailable", body = ErrorResponse),
    )
)]
pub async fn list_subscribers(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ArchiverError> {
    let data = state.archive.subscribers().await?;
    Ok(Json(SubscriberListResponse {
        total: data.len(),
        data,
    }))
}

/// `GET /subscribers/{id}` — Subscription status of one recipient.
///
/// # Errors
///
/// Returns [`ArchiverError::Persistence`] if the archive cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/subscribers/{id}",
    tag = "Subscribers",
    summary = "Get subscription status",
    params(("id" = i64, Path, description = "Recipient (chat) id")),
    responses(
        (status = 200, description = "Subscription status", body = SubscriptionResponse),
    )
)]
pub async fn get_subscriber(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ArchiverError> {
    let subscribed = state.archive.is_subscribed(id).await?;
    Ok(Json(SubscriptionResponse {
        recipient_id: id,
        subscribed,
    }))
}

/// `PUT /subscribers/{id}` — Subscribe a recipient to pre-war alerts.
///
/// # Errors
///
/// Returns [`ArchiverError::Persistence`] if the archive cannot be written.
#[utoipa::path(
    put,
    path = "/api/v1/subscribers/{id}",
    tag = "Subscribers",
    summary = "Subscribe to alerts",
    description = "Idempotent: 201 when the recipient is new, 200 when already subscribed.",
    params(("id" = i64, Path, description = "Recipient (chat) id")),
    responses(
        (status = 201, description = "Subscribed", body = SubscriptionResponse),
        (status = 200, description = "Already subscribed", body = SubscriptionResponse),
    )
)]
pub async fn put_subscriber(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ArchiverError> {
    let created = state.archive.subscribe(id).await?;
    let status = if created {
        tracing::info!(recipient_id = id, "subscriber added");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(SubscriptionResponse {
            recipient_id: id,
            subscribed: true,
        }),
    ))
}

/// `DELETE /subscribers/{id}` — Stop alerts for a recipient.
///
/// # Errors
///
/// Returns [`ArchiverError::SubscriberNotFound`] if the recipient was not
/// subscribed.
#[utoipa::path(
    delete,
    path = "/api/v1/subscribers/{id}",
    tag = "Subscribers",
    summary = "Unsubscribe from alerts",
    params(("id" = i64, Path, description = "Recipient (chat) id")),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 404, description = "Not subscribed", body = ErrorResponse),
    )
)]
pub async fn delete_subscriber(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ArchiverError> {
    if !state.archive.unsubscribe(id).await? {
        return Err(ArchiverError::SubscriberNotFound(id));
    }
    tracing::info!(recipient_id = id, "subscriber removed");
    Ok(StatusCode::NO_CONTENT)
}

/// Subscriber management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/subscribers", get(list_subscribers))
        .route(
            "/subscribers/{id}",
            get(get_subscriber)
                .put(put_subscriber)
                .delete(delete_subscriber),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{memory_archive, request_json};

    #[tokio::test]
    async fn subscribe_list_unsubscribe() {
        let app = crate::api::build_router().with_state(AppState::new(memory_archive().await));

        let (status, _) = request_json(app.clone(), "PUT", "/api/v1/subscribers/42").await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = request_json(app.clone(), "PUT", "/api/v1/subscribers/42").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["subscribed"], true);

        let (_, body) = request_json(app.clone(), "GET", "/api/v1/subscribers").await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["data"][0], 42);

        let (status, _) = request_json(app.clone(), "DELETE", "/api/v1/subscribers/42").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = request_json(app.clone(), "DELETE", "/api/v1/subscribers/42").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], 2002);

        let (_, body) = request_json(app, "GET", "/api/v1/subscribers/42").await;
        assert_eq!(body["subscribed"], false);
    }
}
