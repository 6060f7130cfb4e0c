//! Parsing of war timestamps reported by the snapshot source.
//!
//! The Clash of Clans API reports times as compact ISO-8601 basic strings
//! (`20240605T101010.000Z`). The raw string stays the identity of a war;
//! parsing is only needed for time arithmetic and calendar dates.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::ArchiverError;

/// `strftime` pattern of the source's compact timestamps.
pub const SOURCE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S%.fZ";

/// Parses a source timestamp into a UTC instant.
///
/// Accepts the compact source format as well as RFC 3339.
///
/// # Errors
///
/// Returns [`ArchiverError::MalformedSnapshot`] when neither format matches.
pub fn parse_war_time(raw: &str) -> Result<DateTime<Utc>, ArchiverError> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, SOURCE_TIME_FORMAT) {
        return Ok(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ArchiverError::MalformedSnapshot(format!("unparseable war time {raw:?}")))
}

/// Formats an instant in the compact source format, millisecond precision.
#[cfg(test)]
#[must_use]
pub fn format_war_time(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%S%.3fZ").to_string()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::{Datelike, TimeZone, Timelike};

    use super::*;

    #[test]
    fn parses_compact_source_format() {
        let Ok(at) = parse_war_time("20240605T101112.000Z") else {
            panic!("compact format should parse");
        };
        assert_eq!((at.year(), at.month(), at.day()), (2024, 6, 5));
        assert_eq!((at.hour(), at.minute(), at.second()), (10, 11, 12));
    }

    #[test]
    fn parses_rfc3339() {
        let Ok(at) = parse_war_time("2024-06-05T10:11:12+02:00") else {
            panic!("rfc3339 should parse");
        };
        assert_eq!(at.hour(), 8);
    }

    #[test]
    fn rejects_garbage() {
        let result = parse_war_time("next tuesday");
        assert!(matches!(result, Err(ArchiverError::MalformedSnapshot(_))));
    }

    #[test]
    fn format_matches_source_layout() {
        let at = Utc.with_ymd_and_hms(2024, 6, 5, 10, 11, 12).single();
        let Some(at) = at else {
            panic!("valid instant");
        };
        let raw = format_war_time(at);
        assert_eq!(raw, "20240605T101112.000Z");
        let Ok(back) = parse_war_time(&raw) else {
            panic!("formatted time should parse");
        };
        assert_eq!(back, at);
    }
}
