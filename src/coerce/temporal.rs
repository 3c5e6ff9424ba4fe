//! Permissive calendar parsing.
//!
//! Accepts the date and date-time spellings commonly found in loosely typed
//! documents: ISO 8601 / RFC 3339, RFC 2822, slashed and dotted numeric
//! dates (month first), compact digit runs, and textual month names with
//! optional weekdays, ordinal suffixes, and 12-hour clocks. Offsets are
//! normalized to UTC; inputs without one are read as UTC.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use thiserror::Error;

use crate::decl::TypeDecl;
use crate::error::CoercionError;
use crate::value::Value;

/// Errors from the calendar parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemporalError {
    #[error("empty date string")]
    Empty,

    #[error("unrecognized date format: '{0}'")]
    Unrecognized(String),
}

const AWARE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
    "%Y-%m-%d %H:%M %z",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %I:%M %p",
    "%Y-%m-%d %I:%M:%S %p",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%d %B %Y %I:%M %p",
    "%B %d %Y %H:%M:%S",
    "%B %d %Y %H:%M",
    "%B %d %Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%B %d %Y",
    "%d-%b-%Y",
    "%Y %B %d",
];

static WEEKDAY: OnceLock<Option<Regex>> = OnceLock::new();
static ORDINAL: OnceLock<Option<Regex>> = OnceLock::new();
static ZULU: OnceLock<Option<Regex>> = OnceLock::new();
static COMPACT: OnceLock<Option<Regex>> = OnceLock::new();

fn pattern(cell: &'static OnceLock<Option<Regex>>, source: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(source).ok()).as_ref()
}

/// Collapses the decorations `chrono` formats cannot express.
fn normalize(text: &str) -> String {
    let mut out = text.replace(',', " ");
    if let Some(re) = pattern(&WEEKDAY, r"(?i)^(mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?\s+") {
        out = re.replace(&out, "").into_owned();
    }
    if let Some(re) = pattern(&ORDINAL, r"(?i)\b(\d{1,2})(st|nd|rd|th)\b") {
        out = re.replace_all(&out, "$1").into_owned();
    }
    if let Some(re) = pattern(&ZULU, r"(?i)(\d)\s*(utc|gmt|z)$") {
        out = re.replace(&out, "$1").into_owned();
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `YYYYMMDD` with an optional `[T]HHMM[SS]` tail.
fn parse_compact(text: &str) -> Option<NaiveDateTime> {
    let re = pattern(
        &COMPACT,
        r"^(\d{4})(\d{2})(\d{2})(?:T?(\d{2})(\d{2})(\d{2})?)?$",
    )?;
    let caps = re.captures(text)?;
    let num = |i: usize| -> Option<u32> {
        caps.get(i).map_or(Some(0), |m| m.as_str().parse().ok())
    };
    let year = caps.get(1)?.as_str().parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, num(2)?, num(3)?)?;
    let time = NaiveTime::from_hms_opt(num(4)?, num(5)?, num(6)?)?;
    Some(date.and_time(time))
}

/// Parses a date or date-time string, keeping the time of day.
///
/// Date-only inputs resolve to midnight UTC.
///
/// # Examples
///
/// ```
/// use strictrecord::coerce::parse_datetime;
///
/// let a = parse_datetime("2024-01-15T10:30:00+02:00").unwrap();
/// let b = parse_datetime("January 15th, 2024 8:30 AM").unwrap();
/// assert_eq!(a, b);
/// ```
pub fn parse_datetime(text: &str) -> Result<DateTime<Utc>, TemporalError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TemporalError::Empty);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    let normalized = normalize(trimmed);
    for fmt in AWARE_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Ok(dt.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(&normalized, fmt) {
            return Ok(d.and_time(NaiveTime::MIN).and_utc());
        }
    }
    parse_compact(&normalized)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| TemporalError::Unrecognized(trimmed.to_string()))
}

/// Parses a date or date-time string and keeps the calendar date.
pub fn parse_date(text: &str) -> Result<NaiveDate, TemporalError> {
    parse_datetime(text).map(|dt| dt.date_naive())
}

pub(crate) fn coerce_date(value: Value, target: &TypeDecl) -> Result<Value, CoercionError> {
    match &value {
        Value::String(s) => match parse_date(s) {
            Ok(d) => Ok(Value::Date(d)),
            Err(e) => Err(CoercionError::new(value, target).with_reason(e.to_string())),
        },
        Value::DateTime(dt) => Ok(Value::Date(dt.date_naive())),
        _ => Err(CoercionError::new(value, target).with_reason("expected a date string")),
    }
}

pub(crate) fn coerce_datetime(value: Value, target: &TypeDecl) -> Result<Value, CoercionError> {
    match &value {
        Value::String(s) => match parse_datetime(s) {
            Ok(dt) => Ok(Value::DateTime(dt)),
            Err(e) => Err(CoercionError::new(value, target).with_reason(e.to_string())),
        },
        _ => Err(CoercionError::new(value, target).with_reason("expected a date-time string")),
    }
}
