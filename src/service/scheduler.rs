//! Fixed-interval driver for [`WarArchiver`] ticks.
//!
//! Ticks never overlap: the next one is awaited only after the previous
//! one has finished. Each tick runs in its own task so that a panic is
//! contained and logged instead of stopping the loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{Instrument, debug, error, info, info_span};

use super::archiver::WarArchiver;
use crate::domain::detector::AlertMarker;

/// Periodic scheduler owning the cross-tick [`AlertMarker`].
#[derive(Debug)]
pub struct Scheduler {
    archiver: Arc<WarArchiver>,
    interval: Duration,
    initial_delay: Duration,
}

impl Scheduler {
    /// Creates a scheduler firing every `interval` after `initial_delay`.
    #[must_use]
    pub fn new(archiver: Arc<WarArchiver>, interval: Duration, initial_delay: Duration) -> Self {
        Self {
            archiver,
            interval,
            initial_delay,
        }
    }

    /// Runs ticks until `shutdown` turns `true` or its sender is dropped.
    ///
    /// Returns the final marker. A tick in progress when shutdown is
    /// requested is allowed to finish.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> AlertMarker {
        let period = self.interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(Instant::now() + self.initial_delay, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut marker = AlertMarker::new();

        info!(
            interval_secs = self.interval.as_secs(),
            initial_delay_secs = self.initial_delay.as_secs(),
            "scheduler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    marker = self.tick(marker).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("scheduler stopped");
        marker
    }

    async fn tick(&self, marker: AlertMarker) -> AlertMarker {
        let archiver = Arc::clone(&self.archiver);
        let before = marker.clone();
        let handle = tokio::spawn(
            async move {
                let mut marker = marker;
                let report = archiver.run_tick(&mut marker, Utc::now()).await;
                debug!(?report, "tick finished");
                marker
            }
            .instrument(info_span!("tick")),
        );

        match handle.await {
            Ok(marker) => marker,
            Err(e) => {
                error!(error = %e, "tick aborted; keeping previous alert marker");
                before
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use async_trait::async_trait;
    use chrono::TimeDelta;

    use super::*;
    use crate::domain::snapshot::{ClanRoster, LeagueSnapshot, WarSnapshot};
    use crate::notify::{LogNotifier, Notifier};
    use crate::service::archiver::ArchiverSettings;
    use crate::source::{SnapshotSource, SourceError};
    use crate::test_support::{FakeSource, WAR_END_RAW, attack, ended_war, member, memory_archive};

    fn settings() -> ArchiverSettings {
        ArchiverSettings {
            clan_tag: "#CLAN".to_string(),
            alert_lead: TimeDelta::hours(1),
            source_timeout: Duration::from_secs(5),
            donation_every_hours: 0,
        }
    }

    #[derive(Debug, Default)]
    struct PanickingSource {
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl SnapshotSource for PanickingSource {
        async fn current_war(&self, _: &str) -> Result<Option<WarSnapshot>, SourceError> {
            self.calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            panic!("source blew up");
        }

        async fn league_group(&self, _: &str) -> Result<Option<LeagueSnapshot>, SourceError> {
            Ok(None)
        }

        async fn clan_roster(&self, _: &str) -> Result<Option<ClanRoster>, SourceError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn ticks_archive_and_stop_on_shutdown() {
        let source = Arc::new(FakeSource::default());
        source.set_war(Some(ended_war(vec![member(
            "#A",
            "Alice",
            1,
            vec![attack("#A", 1)],
        )])));
        let dyn_source = Arc::clone(&source) as Arc<dyn SnapshotSource>;
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
        let archiver = Arc::new(WarArchiver::new(
            dyn_source,
            notifier,
            memory_archive().await,
            settings(),
        ));

        let (tx, rx) = watch::channel(false);
        let scheduler = Scheduler::new(
            Arc::clone(&archiver),
            Duration::from_millis(20),
            Duration::ZERO,
        );
        let task = tokio::spawn(scheduler.run(rx));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(tx.send(true).is_ok());
        let Ok(Ok(_marker)) = tokio::time::timeout(Duration::from_secs(5), task).await else {
            panic!("scheduler should stop");
        };

        assert!(source.war_calls() >= 2);
        assert_eq!(archiver.archive().exists(WAR_END_RAW).await.ok(), Some(true));
    }

    #[tokio::test]
    async fn panicking_tick_does_not_stop_the_loop() {
        let source = Arc::new(PanickingSource::default());
        let dyn_source = Arc::clone(&source) as Arc<dyn SnapshotSource>;
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
        let archiver = Arc::new(WarArchiver::new(
            dyn_source,
            notifier,
            memory_archive().await,
            settings(),
        ));

        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(
            Scheduler::new(archiver, Duration::from_millis(20), Duration::ZERO).run(rx),
        );

        tokio::time::sleep(Duration::from_millis(200)).await;
        drop(tx);
        let Ok(Ok(marker)) = tokio::time::timeout(Duration::from_secs(5), task).await else {
            panic!("scheduler should stop when the sender is dropped");
        };

        assert!(source.calls.load(std::sync::atomic::Ordering::SeqCst) >= 2);
        assert_eq!(marker, AlertMarker::new());
    }
}
