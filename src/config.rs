//! Archiver configuration loaded from environment variables.
//!
//! All settings come from environment variables (or a `.env` file via
//! `dotenvy`). Only the clan tag and the API token are mandatory.

use std::net::SocketAddr;
use std::time::Duration;

use crate::source::coc::DEFAULT_BASE_URL;

/// Top-level archiver configuration.
///
/// Loaded once at startup via [`ArchiverConfig::from_env`].
#[derive(Clone)]
pub struct ArchiverConfig {
    /// Socket address of the query API (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// SQLite connection string.
    pub database_url: String,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// Tag of the clan to watch (e.g. `#2PP`).
    pub clan_tag: String,

    /// Bearer token for the Clash of Clans API.
    pub coc_api_token: String,

    /// Root URL of the Clash of Clans API.
    pub coc_api_base_url: String,

    /// Per-request timeout for snapshot source calls, in seconds.
    pub coc_api_timeout_secs: u64,

    /// Seconds between two polling ticks.
    pub poll_interval_secs: u64,

    /// Seconds to wait before the first tick.
    pub poll_initial_delay_secs: u64,

    /// How long before battle day a pre-war alert goes out, in seconds.
    pub pre_war_alert_lead_secs: u64,

    /// Donation snapshots are taken when the UTC hour is a multiple of
    /// this value (0 disables them).
    pub donation_snapshot_every_hours: u32,

    /// Telegram bot token; alerts are only logged when absent.
    pub telegram_bot_token: Option<String>,
}

impl std::fmt::Debug for ArchiverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiverConfig")
            .field("listen_addr", &self.listen_addr)
            .field("database_url", &self.database_url)
            .field("clan_tag", &self.clan_tag)
            .field("coc_api_base_url", &self.coc_api_base_url)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("telegram", &self.telegram_bot_token.is_some())
            .finish_non_exhaustive()
    }
}

/// Error raised when the environment lacks a mandatory setting or holds
/// an unparseable one.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A mandatory variable is unset or empty.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("invalid value for {key}: {value:?}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Raw value found.
        value: String,
    },
}

impl ArchiverConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when an optional variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `CLAN_TAG` or `COC_API_TOKEN` is missing,
    /// or if `LISTEN_ADDR` cannot be parsed as a [`SocketAddr`].
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let raw_addr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let listen_addr: SocketAddr = raw_addr.parse().map_err(|_| ConfigError::Invalid {
            key: "LISTEN_ADDR",
            value: raw_addr.clone(),
        })?;

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://clan_wars.db".to_string());
        let database_max_connections = parse_env("DATABASE_MAX_CONNECTIONS", 5);
        let database_connect_timeout_secs = parse_env("DATABASE_CONNECT_TIMEOUT_SECS", 5);

        let clan_tag = require_env("CLAN_TAG")?;
        let coc_api_token = require_env("COC_API_TOKEN")?;
        let coc_api_base_url =
            std::env::var("COC_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let coc_api_timeout_secs = parse_env("COC_API_TIMEOUT_SECS", 30);

        let poll_interval_secs = parse_env("POLL_INTERVAL_SECS", 15 * 60);
        let poll_initial_delay_secs = parse_env("POLL_INITIAL_DELAY_SECS", 60);
        let pre_war_alert_lead_secs = parse_env("PRE_WAR_ALERT_LEAD_SECS", 60 * 60);
        let donation_snapshot_every_hours = parse_env("DONATION_SNAPSHOT_EVERY_HOURS", 6);

        let telegram_bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        Ok(Self {
            listen_addr,
            database_url,
            database_max_connections,
            database_connect_timeout_secs,
            clan_tag,
            coc_api_token,
            coc_api_base_url,
            coc_api_timeout_secs,
            poll_interval_secs,
            poll_initial_delay_secs,
            pre_war_alert_lead_secs,
            donation_snapshot_every_hours,
            telegram_bot_token,
        })
    }

    /// Interval between polling ticks.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Delay before the first tick.
    #[must_use]
    pub const fn poll_initial_delay(&self) -> Duration {
        Duration::from_secs(self.poll_initial_delay_secs)
    }

    /// Timeout for each snapshot source call.
    #[must_use]
    pub const fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.coc_api_timeout_secs)
    }
}

/// Reads a mandatory, non-empty environment variable.
fn require_env(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_falls_back_on_missing_key() {
        let value: u64 = parse_env("CLAN_WAR_ARCHIVER_TEST_SURELY_UNSET", 900);
        assert_eq!(value, 900);
    }

    #[test]
    fn require_env_reports_the_key() {
        let result = require_env("CLAN_WAR_ARCHIVER_TEST_SURELY_UNSET");
        assert!(matches!(
            result,
            Err(ConfigError::Missing("CLAN_WAR_ARCHIVER_TEST_SURELY_UNSET"))
        ));
    }
}
