//! Calendar date model and filename codec.
//!
//! # Responsibility
//! - Map calendar dates to canonical `YYYY-MM-DD` keys and note filenames.
//! - Validate arbitrary strings/filenames as real calendar dates.
//! - Provide pure calendar arithmetic used by pagination cursors.
//!
//! # Invariants
//! - A `CalendarDate` always holds a real date with year in `[1900, 2100]`.
//! - Canonical keys are fixed-width and zero-padded, so string order equals
//!   date order.
//! - Equality and ordering ignore any time-of-day component.

use chrono::{Datelike, Days, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Lowest supported calendar year.
pub const MIN_YEAR: i32 = 1900;
/// Highest supported calendar year.
pub const MAX_YEAR: i32 = 2100;
/// Extension used for persisted note files.
pub const NOTE_FILE_EXTENSION: &str = "md";

static DATE_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})(?:\.[A-Za-z0-9]+)?$").expect("valid date key regex")
});

/// Validation failure for date strings and filenames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateParseError {
    /// Input does not match `YYYY-MM-DD[.ext]`.
    Malformed(String),
    /// A component is outside its allowed range.
    OutOfRange {
        field: &'static str,
        value: u32,
    },
    /// Components are in range but do not name a real day (e.g. `02-30`).
    NotACalendarDate(String),
}

impl Display for DateParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(value) => write!(f, "not a YYYY-MM-DD date: `{value}`"),
            Self::OutOfRange { field, value } => write!(f, "{field} out of range: {value}"),
            Self::NotACalendarDate(value) => write!(f, "not a calendar date: `{value}`"),
        }
    }
}

impl Error for DateParseError {}

/// Display styles for human-facing date labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateDisplay {
    /// `January 15th, 2026`
    #[default]
    Long,
    /// `Thursday, January 15th, 2026`
    LongWithWeekday,
    /// `2026-01-15`
    Canonical,
}

/// Immutable year/month/day triple.
///
/// Field order matters: derived ordering compares year, then month, then day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarDate {
    year: i32,
    month: u32,
    day: u32,
}

impl CalendarDate {
    /// Builds a date from components, rejecting anything that is not a real
    /// day inside the supported year span.
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, DateParseError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(DateParseError::OutOfRange {
                field: "year",
                value: year.unsigned_abs(),
            });
        }
        if !(1..=12).contains(&month) {
            return Err(DateParseError::OutOfRange {
                field: "month",
                value: month,
            });
        }
        if !(1..=31).contains(&day) {
            return Err(DateParseError::OutOfRange {
                field: "day",
                value: day,
            });
        }
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self::from_naive_unchecked)
            .ok_or_else(|| {
                DateParseError::NotACalendarDate(format!("{year:04}-{month:02}-{day:02}"))
            })
    }

    /// Parses `YYYY-MM-DD`, optionally followed by a single file extension.
    ///
    /// The parsed triple is normalized and re-rendered; the result must match
    /// the input stem exactly.
    pub fn parse(text: &str) -> Result<Self, DateParseError> {
        let caps = DATE_KEY_RE
            .captures(text)
            .ok_or_else(|| DateParseError::Malformed(text.to_string()))?;
        let component = |idx: usize| -> Result<u32, DateParseError> {
            caps.get(idx)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .ok_or_else(|| DateParseError::Malformed(text.to_string()))
        };
        let year = component(1)?;
        let month = component(2)?;
        let day = component(3)?;

        let date = Self::new(year as i32, month, day)?;
        let stem = &text[..10];
        if date.to_key() != stem {
            return Err(DateParseError::NotACalendarDate(stem.to_string()));
        }
        Ok(date)
    }

    /// Converts a chrono date, applying the supported year span.
    pub fn from_naive(date: NaiveDate) -> Result<Self, DateParseError> {
        Self::new(date.year(), date.month(), date.day())
    }

    fn from_naive_unchecked(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }

    /// Today's date in the local time zone.
    ///
    /// Falls back to the nearest supported bound if the system clock is wildly
    /// outside `[1900, 2100]`.
    pub fn today() -> Self {
        Self::clamped(Local::now().date_naive())
    }

    fn clamped(now: NaiveDate) -> Self {
        Self::from_naive(now).unwrap_or_else(|_| {
            let bound = if now.year() < MIN_YEAR {
                NaiveDate::from_ymd_opt(MIN_YEAR, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(MAX_YEAR, 12, 31)
            };
            bound
                .map(Self::from_naive_unchecked)
                .unwrap_or(Self {
                    year: MIN_YEAR,
                    month: 1,
                    day: 1,
                })
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    fn to_naive(self) -> NaiveDate {
        // Constructors only admit valid triples.
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).unwrap_or(NaiveDate::MIN)
    }

    /// Canonical zero-padded key, e.g. `2026-01-15`.
    pub fn to_key(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }

    /// Canonical note filename, e.g. `2026-01-15.md`.
    pub fn to_filename(&self) -> String {
        format!("{}.{NOTE_FILE_EXTENSION}", self.to_key())
    }

    /// Human-facing label.
    pub fn to_display(&self, style: DateDisplay) -> String {
        let naive = self.to_naive();
        let long = format!(
            "{} {}{}, {:04}",
            naive.format("%B"),
            self.day,
            ordinal_suffix(self.day),
            self.year
        );
        match style {
            DateDisplay::Long => long,
            DateDisplay::LongWithWeekday => format!("{}, {long}", naive.format("%A")),
            DateDisplay::Canonical => self.to_key(),
        }
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    pub fn is_same_day(&self, other: &Self) -> bool {
        self == other
    }

    pub fn is_today(&self) -> bool {
        self.is_today_at(Local::now().date_naive())
    }

    fn is_today_at(&self, now: NaiveDate) -> bool {
        *self == Self::clamped(now)
    }

    /// Moves forward `days`; `None` when the result leaves the supported span.
    pub fn add_days(&self, days: u32) -> Option<Self> {
        self.to_naive()
            .checked_add_days(Days::new(u64::from(days)))
            .and_then(|date| Self::from_naive(date).ok())
    }

    /// Moves backward `days`; `None` when the result leaves the supported span.
    pub fn subtract_days(&self, days: u32) -> Option<Self> {
        self.to_naive()
            .checked_sub_days(Days::new(u64::from(days)))
            .and_then(|date| Self::from_naive(date).ok())
    }

    /// Generates `count` consecutive days, descending, starting at `start`.
    ///
    /// Pure calendar arithmetic: it knows nothing about which dates have
    /// notes. Stops early only at the lower supported bound (1900-01-01).
    pub fn range(start: &Self, count: usize) -> Vec<Self> {
        let mut dates = Vec::with_capacity(count);
        let mut current = Some(*start);
        while dates.len() < count {
            let Some(date) = current else {
                break;
            };
            dates.push(date);
            current = date.subtract_days(1);
        }
        dates
    }
}

impl Display for CalendarDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for CalendarDate {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CalendarDate {
    type Error = DateParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value.as_str())
    }
}

impl From<CalendarDate> for String {
    fn from(value: CalendarDate) -> Self {
        value.to_key()
    }
}

/// Returns whether `text` is a canonical date key (extension allowed).
pub fn is_valid_date_key(text: &str) -> bool {
    CalendarDate::parse(text).is_ok()
}

/// Parses a directory entry name as a note file (`YYYY-MM-DD.md`).
///
/// Returns `None` for anything else, including valid dates with a different
/// extension.
pub fn parse_note_file_name(name: &str) -> Option<CalendarDate> {
    let stem = name.strip_suffix(NOTE_FILE_EXTENSION)?.strip_suffix('.')?;
    CalendarDate::parse(stem).ok()
}

/// English ordinal suffix for a day number.
pub fn ordinal_suffix(value: u32) -> &'static str {
    if (11..=13).contains(&(value % 100)) {
        return "th";
    }
    match value % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}
