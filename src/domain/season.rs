//! Season calendar: the 5th of each month delimits seasons.
//!
//! Two kinds of window are derived from the boundary day:
//!
//! - the *current season* around a given day, end-exclusive, used to list
//!   league wars; consecutive seasons never share a date;
//! - the *bonus window* of a month, `[5th of previous month, 5th of month]`
//!   with both ends inclusive, used for bonus rankings.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ArchiverError;

/// Day of month on which a season starts.
pub const SEASON_BOUNDARY_DAY: u32 = 5;

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Creates a month, validating `month` in `1..=12`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::InvalidRequest`] for an out-of-range month.
    pub fn new(year: i32, month: u32) -> Result<Self, ArchiverError> {
        if !(1..=12).contains(&month) {
            return Err(ArchiverError::InvalidRequest(format!(
                "month out of range: {month}"
            )));
        }
        Ok(Self { year, month })
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Calendar month, `1..=12`.
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// The season boundary date inside this month.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::InvalidRequest`] if the year is outside the
    /// supported calendar range.
    pub fn boundary(&self) -> Result<NaiveDate, ArchiverError> {
        NaiveDate::from_ymd_opt(self.year, self.month, SEASON_BOUNDARY_DAY).ok_or_else(|| {
            ArchiverError::InvalidRequest(format!("no boundary date in {self}"))
        })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ArchiverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ArchiverError::InvalidRequest(format!("expected YYYY-MM, got {s:?}"));
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

/// A span of calendar dates.
///
/// Whether `end` is included depends on the producer: see
/// [`season_window`] and [`bonus_window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DateWindow {
    /// First date of the window.
    pub start: NaiveDate,
    /// Last date (inclusive windows) or first date after (exclusive windows).
    pub end: NaiveDate,
}

impl DateWindow {
    /// End-exclusive membership test, as used by season windows.
    #[must_use]
    pub fn contains_exclusive(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

fn shift_months(date: NaiveDate, forward: bool) -> Result<NaiveDate, ArchiverError> {
    let shifted = if forward {
        date.checked_add_months(Months::new(1))
    } else {
        date.checked_sub_months(Months::new(1))
    };
    shifted.ok_or_else(|| ArchiverError::Internal(format!("date out of range near {date}")))
}

/// The current season containing `today`, end-exclusive.
///
/// Before the boundary day the season started on the previous month's
/// boundary; on or after it, the season starts this month.
///
/// # Errors
///
/// Returns [`ArchiverError::Internal`] only at the edges of the calendar.
pub fn season_window(today: NaiveDate) -> Result<DateWindow, ArchiverError> {
    let this_boundary = YearMonth::new(today.year(), today.month())?.boundary()?;
    if today.day() < SEASON_BOUNDARY_DAY {
        Ok(DateWindow {
            start: shift_months(this_boundary, false)?,
            end: this_boundary,
        })
    } else {
        Ok(DateWindow {
            start: this_boundary,
            end: shift_months(this_boundary, true)?,
        })
    }
}

/// The bonus window for `month`, both ends inclusive.
///
/// # Errors
///
/// Returns [`ArchiverError::InvalidRequest`] at the edges of the calendar.
pub fn bonus_window(month: YearMonth) -> Result<DateWindow, ArchiverError> {
    let end = month.boundary()?;
    let start = end
        .checked_sub_months(Months::new(1))
        .ok_or_else(|| ArchiverError::InvalidRequest(format!("no previous month for {month}")))?;
    Ok(DateWindow { start, end })
}
