//! Alert subscriber DTOs.

use serde::Serialize;
use utoipa::ToSchema;

/// Response body for `GET /subscribers`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriberListResponse {
    /// Recipient ids, ascending.
    pub data: Vec<i64>,
    /// Number of subscribers.
    pub total: usize,
}

/// Response body for `GET`/`PUT /subscribers/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionResponse {
    /// Recipient id.
    pub recipient_id: i64,
    /// Whether the recipient now receives alerts.
    pub subscribed: bool,
}
