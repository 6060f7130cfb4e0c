//! The archival pipeline run on every polling tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use tracing::{debug, error, info, warn};

use crate::domain::ArchivedWar;
use crate::domain::detector::{AlertMarker, WarTransition, inspect};
use crate::domain::snapshot::WarSnapshot;
use crate::domain::violation::classify_war;
use crate::error::ArchiverError;
use crate::notify::Notifier;
use crate::persistence::SqliteArchive;
use crate::source::{SnapshotSource, SourceError};

/// Tunables of the pipeline.
#[derive(Debug, Clone)]
pub struct ArchiverSettings {
    /// Clan whose wars are archived.
    pub clan_tag: String,
    /// How long before battle day the pre-war alert goes out.
    pub alert_lead: TimeDelta,
    /// Upper bound for a single snapshot source call.
    pub source_timeout: Duration,
    /// Donation snapshots are taken on UTC hours divisible by this value;
    /// `0` disables them.
    pub donation_every_hours: u32,
}

/// What a single tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Start time of the war a pre-war alert was sent for.
    pub alert_sent: Option<String>,
    /// End time of the war archived during this tick.
    pub archived: Option<String>,
    /// Number of members written to a donation snapshot.
    pub donations_saved: Option<usize>,
}

/// Runs one polling cycle: fetch, detect, alert, archive.
///
/// A tick never fails. Source failures count as an absent snapshot and
/// everything else is logged; the next tick starts from scratch apart from
/// the [`AlertMarker`] the caller carries over.
#[derive(Debug)]
pub struct WarArchiver {
    source: Arc<dyn SnapshotSource>,
    notifier: Arc<dyn Notifier>,
    archive: SqliteArchive,
    settings: ArchiverSettings,
}

impl WarArchiver {
    /// Creates the pipeline.
    #[must_use]
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        notifier: Arc<dyn Notifier>,
        archive: SqliteArchive,
        settings: ArchiverSettings,
    ) -> Self {
        Self {
            source,
            notifier,
            archive,
            settings,
        }
    }

    /// Returns a reference to the underlying archive.
    #[must_use]
    pub fn archive(&self) -> &SqliteArchive {
        &self.archive
    }

    /// Runs one tick at `now`, updating `marker` when an alert goes out.
    pub async fn run_tick(&self, marker: &mut AlertMarker, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();

        let current = self
            .fetch("currentwar", self.source.current_war(&self.settings.clan_tag))
            .await;
        if let Some(war) = current {
            if let Err(e) = self.handle_war(&war, marker, now, &mut report).await {
                log_tick_error("war", &e);
            }
        } else {
            debug!("no current war");
        }

        if self.is_donation_hour(now) {
            match self.snapshot_donations(now).await {
                Ok(Some(saved)) => report.donations_saved = Some(saved),
                Ok(None) => debug!("clan roster unavailable; donation snapshot skipped"),
                Err(e) => log_tick_error("donations", &e),
            }
        }

        report
    }

    async fn handle_war(
        &self,
        war: &WarSnapshot,
        marker: &mut AlertMarker,
        now: DateTime<Utc>,
        report: &mut TickReport,
    ) -> Result<(), ArchiverError> {
        match inspect(war, marker, now, self.settings.alert_lead)? {
            WarTransition::Idle => {}
            WarTransition::PreWarAlert { start_time } => {
                self.send_pre_war_alert(war).await?;
                marker.record(start_time.as_str());
                report.alert_sent = Some(start_time);
            }
            WarTransition::Ended { end_time } => {
                if self.archive.exists(&end_time).await? {
                    debug!(end_time = %end_time, "war already archived");
                } else {
                    self.archive_ended_war(war, now).await?;
                    report.archived = Some(end_time);
                }
            }
        }
        Ok(())
    }

    async fn send_pre_war_alert(&self, war: &WarSnapshot) -> Result<(), ArchiverError> {
        let recipients = self.archive.subscribers().await?;
        let text = pre_war_alert_text(war);
        self.notifier.notify(&recipients, &text).await;
        info!(recipients = recipients.len(), "pre-war alert sent");
        Ok(())
    }

    async fn archive_ended_war(
        &self,
        war: &WarSnapshot,
        now: DateTime<Utc>,
    ) -> Result<ArchivedWar, ArchiverError> {
        let league = self
            .fetch("leaguegroup", self.source.league_group(&self.settings.clan_tag))
            .await;
        let is_league_war = league.is_some_and(|group| group.state.marks_league_war());

        let classified = classify_war(war, is_league_war, now)?;
        self.archive
            .archive_war(&classified.war, &classified.attacks)
            .await?;

        info!(
            end_time = %classified.war.end_time,
            opponent = %classified.war.opponent_name,
            result = %classified.war.result,
            is_league_war,
            attacks = classified.attacks.len(),
            violations = classified.war.total_violations,
            "war archived"
        );
        Ok(classified.war)
    }

    fn is_donation_hour(&self, now: DateTime<Utc>) -> bool {
        let every = self.settings.donation_every_hours;
        every > 0 && now.hour() % every == 0
    }

    async fn snapshot_donations(&self, now: DateTime<Utc>) -> Result<Option<usize>, ArchiverError> {
        let Some(roster) = self
            .fetch("clan", self.source.clan_roster(&self.settings.clan_tag))
            .await
        else {
            return Ok(None);
        };
        let members = roster.member_list.ok_or_else(|| {
            ArchiverError::MalformedSnapshot("clan profile without member list".to_string())
        })?;
        let saved = self.archive.save_donation_snapshot(now, &members).await?;
        info!(members = saved, "donation snapshot saved");
        Ok(Some(saved))
    }

    /// Awaits a source call under the configured timeout.
    async fn call<T>(
        &self,
        request: impl Future<Output = Result<Option<T>, SourceError>>,
    ) -> Result<Option<T>, SourceError> {
        let timeout = self.settings.source_timeout;
        tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| SourceError::Timeout(timeout))?
    }

    /// Like [`Self::call`], but a failure reads as "nothing there".
    async fn fetch<T>(
        &self,
        endpoint: &'static str,
        request: impl Future<Output = Result<Option<T>, SourceError>>,
    ) -> Option<T> {
        match self.call(request).await {
            Ok(value) => value,
            Err(e) => {
                warn!(endpoint, error = %e, "snapshot source unavailable");
                None
            }
        }
    }
}

fn log_tick_error(stage: &'static str, err: &ArchiverError) {
    match err {
        ArchiverError::MalformedSnapshot(_) | ArchiverError::Source(_) => {
            warn!(stage, error = %err, "tick step skipped");
        }
        _ => error!(stage, error = %err, "tick step failed"),
    }
}

/// Markdown text of the pre-war alert.
#[must_use]
pub fn pre_war_alert_text(war: &WarSnapshot) -> String {
    let opponent = war.opponent.as_ref().map_or_else(
        || "unknown opponent".to_string(),
        |side| escape_markdown(&side.name),
    );
    let size = war.team_size.map_or_else(
        || "?".to_string(),
        |n| format!("{n} vs {n}"),
    );
    format!(
        "⚔️ *War starts soon!*\n\n*Opponent:* {opponent}\n*Size:* {size}\n\
         Battle day begins in less than an hour. Plan your mirror attacks."
    )
}

/// Escapes the characters Telegram's legacy Markdown treats as markup.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::archived::ViolationStatus;
    use crate::domain::snapshot::{ClanRoster, LeagueSnapshot, LeagueState, RosterMember};
    use crate::domain::war_time::format_war_time;
    use crate::persistence::WarSort;
    use crate::test_support::{
        FakeSource, RecordingNotifier, WAR_END_RAW, attack, ended_war, member, memory_archive,
        preparing_war, war_end,
    };

    struct Harness {
        source: Arc<FakeSource>,
        notifier: Arc<RecordingNotifier>,
        archiver: WarArchiver,
    }

    async fn harness() -> Harness {
        harness_with_timeout(Duration::from_secs(5)).await
    }

    async fn harness_with_timeout(source_timeout: Duration) -> Harness {
        let source = Arc::new(FakeSource::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let archiver = WarArchiver::new(
            Arc::clone(&source) as Arc<dyn SnapshotSource>,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            memory_archive().await,
            ArchiverSettings {
                clan_tag: "#CLAN".to_string(),
                alert_lead: TimeDelta::hours(1),
                source_timeout,
                donation_every_hours: 6,
            },
        );
        Harness {
            source,
            notifier,
            archiver,
        }
    }

    fn finished_war() -> WarSnapshot {
        ended_war(vec![
            member("#A", "Alice", 1, vec![attack("#B", 1), attack("#A", 2)]),
            member("#B", "Bob", 2, vec![attack("#B", 1)]),
        ])
    }

    /// An hour that is not a donation hour.
    fn quiet_now() -> DateTime<Utc> {
        war_end() + TimeDelta::hours(1)
    }

    #[tokio::test]
    async fn ended_war_is_archived_once() {
        let h = harness().await;
        h.source.set_war(Some(finished_war()));
        let mut marker = AlertMarker::new();

        let first = h.archiver.run_tick(&mut marker, quiet_now()).await;
        assert_eq!(first.archived.as_deref(), Some(WAR_END_RAW));

        let second = h.archiver.run_tick(&mut marker, quiet_now()).await;
        assert_eq!(second, TickReport::default());

        let archive = h.archiver.archive();
        let Ok(wars) = archive.list_wars(WarSort::NewestFirst, war_end().date_naive()).await
        else {
            panic!("list failed");
        };
        assert_eq!(wars.len(), 1);
        let Ok(attacks) = archive.get_attacks(WAR_END_RAW).await else {
            panic!("attacks failed");
        };
        assert_eq!(attacks.len(), 3);
        let Some(war) = wars.first() else {
            panic!("one war");
        };
        // Alice hit #B (position 2) from position 1 with her first attack.
        assert_eq!(war.total_violations, 1);
        assert!(!war.is_league_war);
    }

    #[tokio::test]
    async fn league_overlay_marks_war_and_skips_evaluation() {
        let h = harness().await;
        h.source.set_war(Some(finished_war()));
        h.source.set_league(Some(LeagueSnapshot {
            state: LeagueState::InWar,
            season: Some("2024-06".to_string()),
        }));

        let report = h.archiver.run_tick(&mut AlertMarker::new(), quiet_now()).await;
        assert!(report.archived.is_some());

        let archive = h.archiver.archive();
        let Ok(Some(war)) = archive.get_war(WAR_END_RAW).await else {
            panic!("war should be archived");
        };
        assert!(war.is_league_war);
        assert_eq!(war.total_violations, 0);
        let Ok(attacks) = archive.get_attacks(WAR_END_RAW).await else {
            panic!("attacks failed");
        };
        assert!(
            attacks
                .iter()
                .all(|a| a.violation == ViolationStatus::Compliant)
        );
    }

    #[tokio::test]
    async fn failed_league_lookup_archives_as_regular_war() {
        let h = harness().await;
        h.source.set_war(Some(finished_war()));
        h.source.fail_league(true);

        let report = h.archiver.run_tick(&mut AlertMarker::new(), quiet_now()).await;
        assert_eq!(report.archived.as_deref(), Some(WAR_END_RAW));

        let Ok(Some(war)) = h.archiver.archive().get_war(WAR_END_RAW).await else {
            panic!("war should be archived");
        };
        assert!(!war.is_league_war);
        assert_eq!(war.total_violations, 1);
    }

    #[tokio::test]
    async fn hanging_source_times_out_into_a_quiet_tick() {
        let h = harness_with_timeout(Duration::from_millis(50)).await;
        h.source.set_war(Some(finished_war()));
        h.source.hang(true);

        let mut marker = AlertMarker::new();
        let tick = h.archiver.run_tick(&mut marker, quiet_now());
        let Ok(report) = tokio::time::timeout(Duration::from_secs(5), tick).await else {
            panic!("tick should not hang");
        };
        assert_eq!(report, TickReport::default());
        assert_eq!(h.source.war_calls(), 1);
        assert_eq!(h.archiver.archive().exists(WAR_END_RAW).await.ok(), Some(false));
    }

    #[tokio::test]
    async fn malformed_war_is_skipped_until_complete() {
        let h = harness().await;
        let mut broken = finished_war();
        if let Some(clan) = broken.clan.as_mut() {
            clan.members = None;
        }
        h.source.set_war(Some(broken));
        let mut marker = AlertMarker::new();

        let report = h.archiver.run_tick(&mut marker, quiet_now()).await;
        assert!(report.archived.is_none());

        h.source.set_war(Some(finished_war()));
        let report = h.archiver.run_tick(&mut marker, quiet_now()).await;
        assert!(report.archived.is_some());
    }

    #[tokio::test]
    async fn source_failure_is_a_quiet_tick() {
        let h = harness().await;
        h.source.fail_war(true);
        let report = h.archiver.run_tick(&mut AlertMarker::new(), quiet_now()).await;
        assert_eq!(report, TickReport::default());
        assert_eq!(h.source.war_calls(), 1);
    }

    #[tokio::test]
    async fn pre_war_alert_goes_to_subscribers_once() {
        let h = harness().await;
        assert!(h.archiver.archive().subscribe(11).await.is_ok());
        assert!(h.archiver.archive().subscribe(22).await.is_ok());

        let now = quiet_now();
        let start = format_war_time(now + TimeDelta::minutes(40));
        h.source.set_war(Some(preparing_war(&start)));
        let mut marker = AlertMarker::new();

        let first = h.archiver.run_tick(&mut marker, now).await;
        assert_eq!(first.alert_sent.as_deref(), Some(start.as_str()));
        assert!(marker.is_notified(&start));

        let second = h
            .archiver
            .run_tick(&mut marker, now + TimeDelta::minutes(15))
            .await;
        assert!(second.alert_sent.is_none());

        let sent = h.notifier.sent();
        assert_eq!(sent.len(), 1);
        let Some((recipients, text)) = sent.first() else {
            panic!("one alert");
        };
        assert_eq!(recipients, &vec![11, 22]);
        assert!(text.contains("Rivals"));
    }

    #[tokio::test]
    async fn donation_snapshot_only_on_donation_hours() {
        let h = harness().await;
        h.source.set_roster(Some(ClanRoster {
            tag: "#CLAN".to_string(),
            name: "Home".to_string(),
            member_list: Some(vec![RosterMember {
                tag: "#A".to_string(),
                name: "Alice".to_string(),
                donations: 120,
                donations_received: 40,
            }]),
        }));
        let mut marker = AlertMarker::new();

        // war_end() is 09:00 UTC; 12:00 is a donation hour, 10:00 is not.
        let off_hour = war_end() + TimeDelta::hours(1);
        let on_hour = war_end() + TimeDelta::hours(3);
        assert!(h.archiver.run_tick(&mut marker, off_hour).await.donations_saved.is_none());
        assert_eq!(
            h.archiver.run_tick(&mut marker, on_hour).await.donations_saved,
            Some(1)
        );

        let Ok(latest) = h.archiver.archive().latest_donation_snapshot().await else {
            panic!("snapshot failed");
        };
        assert_eq!(latest.len(), 1);
    }

    #[tokio::test]
    async fn roster_failure_skips_donation_snapshot() {
        let h = harness().await;
        h.source.fail_roster(true);
        let on_hour = war_end() + TimeDelta::hours(3);
        let report = h.archiver.run_tick(&mut AlertMarker::new(), on_hour).await;
        assert!(report.donations_saved.is_none());
        assert_eq!(
            h.archiver.archive().latest_donation_snapshot().await.ok(),
            Some(vec![])
        );
    }

    #[test]
    fn alert_text_names_opponent_and_size() {
        let text = pre_war_alert_text(&preparing_war("20240604T090000.000Z"));
        assert!(text.contains("*Opponent:* Rivals"));
        assert!(text.contains("1 vs 1"));
    }

    #[test]
    fn alert_text_escapes_markup_in_opponent_name() {
        let mut war = preparing_war("20240604T090000.000Z");
        if let Some(opponent) = war.opponent.as_mut() {
            opponent.name = "x_Clan*[1]`".to_string();
        }
        let text = pre_war_alert_text(&war);
        assert!(text.contains(r"*Opponent:* x\_Clan\*\[1]\`"));
    }
}
