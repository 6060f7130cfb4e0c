//! Fixtures shared by the unit tests.

#![allow(clippy::panic)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::ServiceExt;

use crate::domain::archived::{ArchivedWar, WarResult};
use crate::domain::snapshot::{
    ClanRoster, LeagueSnapshot, WarAttack, WarMember, WarSide, WarSnapshot, WarState,
};
use crate::domain::war_time::parse_war_time;
use crate::notify::Notifier;
use crate::persistence::SqliteArchive;
use crate::source::{SnapshotSource, SourceError};

/// End time of the fixture war.
pub const WAR_END_RAW: &str = "20240605T090000.000Z";

pub fn war_end() -> DateTime<Utc> {
    let Ok(at) = parse_war_time(WAR_END_RAW) else {
        panic!("fixture end time parses");
    };
    at
}

pub fn attack(defender_tag: &str, order: u8) -> WarAttack {
    WarAttack {
        attacker_tag: String::new(),
        defender_tag: defender_tag.to_string(),
        stars: 2,
        destruction_percentage: 80.0,
        order,
    }
}

pub fn member(tag: &str, name: &str, map_position: u32, attacks: Vec<WarAttack>) -> WarMember {
    WarMember {
        tag: tag.to_string(),
        name: name.to_string(),
        map_position,
        attacks,
    }
}

fn war_with(state: WarState, members: Vec<WarMember>) -> WarSnapshot {
    let team_size = u32::try_from(members.len()).ok();
    WarSnapshot {
        state,
        team_size,
        start_time: Some("20240604T090000.000Z".to_string()),
        end_time: Some(WAR_END_RAW.to_string()),
        clan: Some(WarSide {
            tag: "#CLAN".to_string(),
            name: "Home".to_string(),
            stars: 5,
            destruction_percentage: 87.5,
            members: Some(members),
        }),
        opponent: Some(WarSide {
            tag: "#RIVAL".to_string(),
            name: "Rivals".to_string(),
            stars: 2,
            destruction_percentage: 41.25,
            members: None,
        }),
    }
}

/// A finished war against "Rivals" that we won 5 to 2.
pub fn ended_war(members: Vec<WarMember>) -> WarSnapshot {
    war_with(WarState::WarEnded, members)
}

/// A war in preparation whose battle day starts at `start_raw`.
pub fn preparing_war(start_raw: &str) -> WarSnapshot {
    let mut war = war_with(
        WarState::Preparation,
        vec![member("#A", "Alice", 1, vec![])],
    );
    war.start_time = Some(start_raw.to_string());
    war
}

/// An archived war row ending at `end_raw`.
pub fn archived_war(end_raw: &str, is_league_war: bool) -> ArchivedWar {
    let Ok(ends_at) = parse_war_time(end_raw) else {
        panic!("fixture end time {end_raw} parses");
    };
    ArchivedWar {
        end_time: end_raw.to_string(),
        end_date: ends_at.date_naive(),
        opponent_name: "Rivals".to_string(),
        team_size: 15,
        clan_stars: 38,
        opponent_stars: 33,
        clan_destruction: 91.5,
        opponent_destruction: 78.25,
        clan_attacks_used: 28,
        result: WarResult::Win,
        is_league_war,
        total_violations: 1,
    }
}

pub async fn memory_archive() -> SqliteArchive {
    let Ok(archive) = SqliteArchive::in_memory().await else {
        panic!("in-memory archive should open");
    };
    archive
}

/// Scriptable [`SnapshotSource`].
#[derive(Debug, Default)]
pub struct FakeSource {
    war: Mutex<Option<WarSnapshot>>,
    league: Mutex<Option<LeagueSnapshot>>,
    roster: Mutex<Option<ClanRoster>>,
    fail_war: AtomicBool,
    fail_league: AtomicBool,
    fail_roster: AtomicBool,
    hang: AtomicBool,
    war_calls: AtomicUsize,
}

fn unavailable(endpoint: &str) -> SourceError {
    SourceError::Status {
        status: 503,
        endpoint: endpoint.to_string(),
    }
}

impl FakeSource {
    pub fn set_war(&self, war: Option<WarSnapshot>) {
        if let Ok(mut slot) = self.war.lock() {
            *slot = war;
        }
    }

    pub fn set_league(&self, league: Option<LeagueSnapshot>) {
        if let Ok(mut slot) = self.league.lock() {
            *slot = league;
        }
    }

    pub fn set_roster(&self, roster: Option<ClanRoster>) {
        if let Ok(mut slot) = self.roster.lock() {
            *slot = roster;
        }
    }

    pub fn fail_war(&self, fail: bool) {
        self.fail_war.store(fail, Ordering::SeqCst);
    }

    pub fn fail_league(&self, fail: bool) {
        self.fail_league.store(fail, Ordering::SeqCst);
    }

    pub fn fail_roster(&self, fail: bool) {
        self.fail_roster.store(fail, Ordering::SeqCst);
    }

    /// Makes every call wait forever.
    pub fn hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    async fn maybe_hang(&self) {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }

    pub fn war_calls(&self) -> usize {
        self.war_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSource for FakeSource {
    async fn current_war(&self, _clan_tag: &str) -> Result<Option<WarSnapshot>, SourceError> {
        self.war_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_hang().await;
        if self.fail_war.load(Ordering::SeqCst) {
            return Err(unavailable("currentwar"));
        }
        Ok(self.war.lock().ok().and_then(|w| w.clone()))
    }

    async fn league_group(&self, _clan_tag: &str) -> Result<Option<LeagueSnapshot>, SourceError> {
        self.maybe_hang().await;
        if self.fail_league.load(Ordering::SeqCst) {
            return Err(unavailable("leaguegroup"));
        }
        Ok(self.league.lock().ok().and_then(|l| l.clone()))
    }

    async fn clan_roster(&self, _clan_tag: &str) -> Result<Option<ClanRoster>, SourceError> {
        self.maybe_hang().await;
        if self.fail_roster.load(Ordering::SeqCst) {
            return Err(unavailable("clan"));
        }
        Ok(self.roster.lock().ok().and_then(|r| r.clone()))
    }
}

/// [`Notifier`] that records every call.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(Vec<i64>, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(Vec<i64>, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, recipients: &[i64], text: &str) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((recipients.to_vec(), text.to_string()));
        }
    }
}

/// Sends a body-less request through `app` and decodes the JSON reply
/// (`Value::Null` for an empty body).
pub async fn request_json(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let Ok(request) = Request::builder().method(method).uri(uri).body(Body::empty()) else {
        panic!("valid request for {uri}");
    };
    let Ok(response) = app.oneshot(request).await else {
        panic!("router is infallible");
    };
    let status = response.status();
    let Ok(body) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
        panic!("body should be readable");
    };
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}
