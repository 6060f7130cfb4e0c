//! War state detection.
//!
//! [`inspect`] looks at one snapshot and the [`AlertMarker`] carried
//! between ticks and says what the tick should do next. It does not touch
//! the archive: an [`WarTransition::Ended`] war still has to pass the
//! archival gate before anything is written.

use chrono::{DateTime, TimeDelta, Utc};

use super::snapshot::{WarSnapshot, WarState};
use super::war_time::parse_war_time;
use crate::error::ArchiverError;

/// Remembers the start time of the last war a pre-war alert was sent for.
///
/// Owned by the scheduler and passed into every tick. Lives only as long
/// as the process, so a restart during preparation may alert once more.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertMarker {
    notified_start_time: Option<String>,
}

impl AlertMarker {
    /// Creates an empty marker.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            notified_start_time: None,
        }
    }

    /// Whether an alert was already sent for the war starting at `start_time`.
    #[must_use]
    pub fn is_notified(&self, start_time: &str) -> bool {
        self.notified_start_time.as_deref() == Some(start_time)
    }

    /// Records that the war starting at `start_time` has been alerted.
    pub fn record(&mut self, start_time: impl Into<String>) {
        self.notified_start_time = Some(start_time.into());
    }
}

/// What a tick should do about the current war.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarTransition {
    /// Nothing to do.
    Idle,
    /// The war starts soon and nobody has been told yet.
    PreWarAlert {
        /// Raw start time, to be recorded in the marker once sent.
        start_time: String,
    },
    /// The war is over; archive it unless already archived.
    Ended {
        /// Raw end time, the war's archive identity.
        end_time: String,
    },
}

/// Decides the transition for `snapshot` at `now`.
///
/// A war in preparation triggers an alert when it starts within
/// `alert_lead` and differs from the one in `marker`.
///
/// # Errors
///
/// Returns [`ArchiverError::MalformedSnapshot`] when the timestamp the
/// decision depends on is missing or unparseable.
pub fn inspect(
    snapshot: &WarSnapshot,
    marker: &AlertMarker,
    now: DateTime<Utc>,
    alert_lead: TimeDelta,
) -> Result<WarTransition, ArchiverError> {
    match snapshot.state {
        WarState::Preparation => {
            let raw = snapshot.require_start_time()?;
            let starts_at = parse_war_time(raw)?;
            if starts_at - now <= alert_lead && !marker.is_notified(raw) {
                Ok(WarTransition::PreWarAlert {
                    start_time: raw.to_string(),
                })
            } else {
                Ok(WarTransition::Idle)
            }
        }
        WarState::WarEnded => Ok(WarTransition::Ended {
            end_time: snapshot.require_end_time()?.to_string(),
        }),
        WarState::InWar | WarState::NotInWar | WarState::Unknown => Ok(WarTransition::Idle),
    }
}
