//! OpenAPI description of the query API.

use utoipa::OpenApi;

use super::dto::{
    AttackDto, BonusResponse, PaginationMeta, SubscriberListResponse, SubscriptionResponse,
    WarDetailResponse, WarListResponse, WarSummaryDto,
};
use super::handlers::{bonus, donations, subscribers, system, wars};
use crate::domain::archived::{ViolationStatus, WarResult};
use crate::domain::season::DateWindow;
use crate::error::{ErrorBody, ErrorResponse};
use crate::persistence::{DonationEntry, WarSort};
use crate::service::{BonusEntry, Medal};

/// Generated OpenAPI document.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "clan-war-archiver",
        description = "Archived clan wars, rule violations and monthly bonus rankings."
    ),
    paths(
        wars::list_wars,
        wars::get_war,
        bonus::get_bonus,
        subscribers::list_subscribers,
        subscribers::get_subscriber,
        subscribers::put_subscriber,
        subscribers::delete_subscriber,
        donations::latest_donations,
        system::health_handler,
    ),
    components(schemas(
        WarSummaryDto,
        WarListResponse,
        WarDetailResponse,
        AttackDto,
        PaginationMeta,
        WarSort,
        WarResult,
        ViolationStatus,
        BonusResponse,
        BonusEntry,
        Medal,
        DateWindow,
        SubscriberListResponse,
        SubscriptionResponse,
        DonationEntry,
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
    )),
    tags(
        (name = "Wars", description = "Archived war history"),
        (name = "Bonus", description = "Monthly attack rankings"),
        (name = "Subscribers", description = "Pre-war alert recipients"),
        (name = "Donations", description = "Donation snapshots"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/api/v1/wars",
            "/api/v1/wars/{end_time}",
            "/api/v1/bonus/{year_month}",
            "/api/v1/subscribers",
            "/api/v1/subscribers/{id}",
            "/api/v1/donations/latest",
            "/health",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }
}
