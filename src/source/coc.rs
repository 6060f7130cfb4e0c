//! Clash of Clans REST API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{SnapshotSource, SourceError};
use crate::domain::snapshot::{ClanRoster, LeagueSnapshot, WarSnapshot, WarState};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.clashofclans.com/v1";

/// [`SnapshotSource`] backed by the official Clash of Clans API.
///
/// Every request carries the bearer token and is bounded by the client
/// timeout. A 404 is an ordinary "nothing there" answer.
#[derive(Debug, Clone)]
pub struct CocApiClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl CocApiClient {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidUrl`] if `base_url` cannot carry path
    /// segments, or [`SourceError::Http`] if the HTTP client fails to build.
    pub fn new(
        base_url: &str,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let base_url = Url::parse(base_url).map_err(|e| SourceError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(SourceError::InvalidUrl(format!(
                "{base_url} cannot be used as an API root"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("clan-war-archiver/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: token.into(),
        })
    }

    /// Builds `{base}/clans/{tag}/{tail...}` with the tag percent-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidUrl`] if the base URL rejects segments.
    pub fn clan_url(&self, clan_tag: &str, tail: &[&str]) -> Result<Url, SourceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| SourceError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("clans")
            .push(clan_tag)
            .extend(tail);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        endpoint: &str,
    ) -> Result<Option<T>, SourceError> {
        let response = self.client.get(url).bearer_auth(&self.token).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(endpoint, "resource not found");
                Ok(None)
            }
            StatusCode::FORBIDDEN => Err(SourceError::AccessDenied {
                endpoint: endpoint.to_string(),
            }),
            StatusCode::TOO_MANY_REQUESTS => Err(SourceError::RateLimited {
                endpoint: endpoint.to_string(),
            }),
            status if !status.is_success() => Err(SourceError::Status {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            }),
            _ => {
                let body = response.bytes().await?;
                Ok(Some(serde_json::from_slice(&body)?))
            }
        }
    }
}

#[async_trait]
impl SnapshotSource for CocApiClient {
    async fn current_war(&self, clan_tag: &str) -> Result<Option<WarSnapshot>, SourceError> {
        let url = self.clan_url(clan_tag, &["currentwar"])?;
        let war: Option<WarSnapshot> = self.get_json(url, "currentwar").await?;
        Ok(war.filter(|w| w.state != WarState::NotInWar))
    }

    async fn league_group(&self, clan_tag: &str) -> Result<Option<LeagueSnapshot>, SourceError> {
        let url = self.clan_url(clan_tag, &["currentwar", "leaguegroup"])?;
        self.get_json(url, "leaguegroup").await
    }

    async fn clan_roster(&self, clan_tag: &str) -> Result<Option<ClanRoster>, SourceError> {
        let url = self.clan_url(clan_tag, &[])?;
        self.get_json(url, "clan").await
    }
}
