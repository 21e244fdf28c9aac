//! Loose date parsing and due-date range checks.
//!
//! Bare `YYYY-MM-DD` strings are calendar dates at local midnight, not UTC instants, to
//! match the "due by end of day" reading teachers give them. Every operation has an
//! `_in` twin that takes the time zone explicitly; the plain form uses the process's
//! local zone.

use std::sync::LazyLock;

use chrono::{
    DateTime, Days, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeDelta,
    TimeZone, Utc,
};
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

static CALENDAR_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$").expect("valid regex"));

/// `YYYY` or `YYYY-MM`: ISO date-only forms, read as UTC midnight of the first day.
static YEAR_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})(?:-([0-9]{2}))?$").expect("valid regex"));

/// Layouts with an explicit offset. A trailing `Z` is rewritten to `+00:00` first.
const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%z",
];

/// Date-time layouts without an offset; interpreted in the local zone.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%B %d %Y %H:%M:%S",
    "%B %d %Y %H:%M",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%a %B %d %Y %H:%M:%S",
];

/// Date-only layouts other than `YYYY-MM-DD`; interpreted as local midnight. `%B`
/// also accepts abbreviated month names.
const NAIVE_DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%a %B %d %Y",
    "%a, %B %d, %Y",
];

pub fn parse_date(s: Option<&str>) -> Option<DateTime<Local>> {
    parse_date_in(s, &Local)
}

/// Parse a loosely formatted date string. Returns `None` for absent, empty or
/// unparseable input.
pub fn parse_date_in<Tz: TimeZone>(s: Option<&str>, tz: &Tz) -> Option<DateTime<Tz>> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(caps) = CALENDAR_DATE_RE.captures(s) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        let date = calendar_date(year, month, day)?;
        return local_instant(tz, date.and_time(NaiveTime::MIN));
    }

    if let Some(caps) = YEAR_MONTH_RE.captures(s) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = match caps.get(2) {
            Some(m) => m.as_str().parse().ok()?,
            None => 1,
        };
        let date = NaiveDate::from_ymd_opt(year, month, 1)?;
        return Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)).with_timezone(tz));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(tz));
    }
    let with_offset = match s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        Some(prefix) => format!("{prefix}+00:00"),
        None => s.to_string(),
    };
    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&with_offset, format) {
            return Some(dt.with_timezone(tz));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(tz));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return local_instant(tz, naive);
        }
    }
    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return local_instant(tz, date.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Build a date the way a calendar constructor does: month and day values outside their
/// range roll over into neighbouring months, so `2024-02-30` is March 1. Years 0 to 99
/// are read as 1900 to 1999.
fn calendar_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let year = if (0..=99).contains(&year) { year + 1900 } else { year };
    let first_of_year = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let first_of_month = match month {
        0 => first_of_year.checked_sub_months(Months::new(1))?,
        m => first_of_year.checked_add_months(Months::new(m - 1))?,
    };
    match day {
        0 => first_of_month.checked_sub_days(Days::new(1)),
        d => first_of_month.checked_add_days(Days::new(u64::from(d - 1))),
    }
}

/// Resolve a wall-clock time in `tz`. Ambiguous times take the earlier instant; times
/// inside a DST gap move forward by an hour.
fn local_instant<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + TimeDelta::hours(1))).earliest())
}

/// Midnight of the instant's calendar day in its own zone.
pub fn start_of_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let naive = instant.date_naive().and_hms_milli_opt(0, 0, 0, 0)?;
    local_instant(&instant.timezone(), naive)
}

/// 23:59:59.999 of the instant's calendar day.
pub fn end_of_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let naive = instant.date_naive().and_hms_milli_opt(23, 59, 59, 999)?;
    local_instant(&instant.timezone(), naive)
}

pub fn is_in_range(due: Option<&str>, before: Option<&str>, after: Option<&str>) -> bool {
    is_in_range_in(due, before, after, &Local)
}

/// Whether a due date falls inside the calendar-day bounds.
///
/// Missing or unparseable due dates are always in range. `before` covers its whole day
/// (through 23:59:59.999) and `after` starts at 00:00:00.000 of its day; unparseable
/// bounds do not constrain.
pub fn is_in_range_in<Tz: TimeZone>(
    due: Option<&str>,
    before: Option<&str>,
    after: Option<&str>,
    tz: &Tz,
) -> bool {
    let Some(due) = parse_date_in(due, tz) else {
        return true;
    };

    if let Some(end) = parse_date_in(before, tz).and_then(|d| end_of_day(&d)) {
        if due > end {
            return false;
        }
    }
    if let Some(start) = parse_date_in(after, tz).and_then(|d| start_of_day(&d)) {
        if due < start {
            return false;
        }
    }
    true
}

/// Coarse upstream date filter understood by the LMS assignments endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Future,
    Past,
}

impl Bucket {
    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Future => "future",
            Bucket::Past => "past",
        }
    }
}

/// Due-date bounds for a search, with per-bound flags recording that the upstream fetch
/// already applied that bound and the local check must skip it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DateWindow {
    pub before: Option<String>,
    pub after: Option<String>,
    #[serde(default)]
    pub before_filtered_upstream: bool,
    #[serde(default)]
    pub after_filtered_upstream: bool,
}

impl DateWindow {
    /// Empty strings count as absent bounds.
    pub fn new(before: Option<String>, after: Option<String>) -> Self {
        Self {
            before: before.filter(|s| !s.trim().is_empty()),
            after: after.filter(|s| !s.trim().is_empty()),
            before_filtered_upstream: false,
            after_filtered_upstream: false,
        }
    }

    /// The bucket a caller can hand to the LMS: `future` when only `after` is set,
    /// `past` when only `before` is set, nothing otherwise.
    pub fn bucket(&self) -> Option<Bucket> {
        match (&self.before, &self.after) {
            (None, Some(_)) => Some(Bucket::Future),
            (Some(_), None) => Some(Bucket::Past),
            _ => None,
        }
    }

    /// Mark the bound covered by [`DateWindow::bucket`] as filtered upstream.
    pub fn delegating_bucket(mut self) -> Self {
        match self.bucket() {
            Some(Bucket::Future) => self.after_filtered_upstream = true,
            Some(Bucket::Past) => self.before_filtered_upstream = true,
            None => {}
        }
        self
    }

    /// Bounds still to be checked locally.
    fn local_bounds(&self) -> (Option<&str>, Option<&str>) {
        let before = self
            .before
            .as_deref()
            .filter(|_| !self.before_filtered_upstream);
        let after = self
            .after
            .as_deref()
            .filter(|_| !self.after_filtered_upstream);
        (before, after)
    }

    pub fn contains(&self, due: Option<&str>) -> bool {
        self.contains_in(due, &Local)
    }

    pub fn contains_in<Tz: TimeZone>(&self, due: Option<&str>, tz: &Tz) -> bool {
        let (before, after) = self.local_bounds();
        is_in_range_in(due, before, after, tz)
    }

    /// Human-readable "due after X and before Y" suffix, empty without bounds.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(after) = &self.after {
            parts.push(format!("after {after}"));
        }
        if let Some(before) = &self.before {
            parts.push(format!("before {before}"));
        }
        if parts.is_empty() {
            String::new()
        } else {
            format!(" due {}", parts.join(" and "))
        }
    }
}

/// Query parameters a caller should send when fetching assignments for a window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UpstreamQuery {
    pub bucket: Option<Bucket>,
    /// Start of the `after` day as an RFC 3339 UTC instant
    pub due_after: Option<String>,
    /// End of the `before` day as an RFC 3339 UTC instant
    pub due_before: Option<String>,
}

impl UpstreamQuery {
    pub fn plan(window: &DateWindow) -> Self {
        Self::plan_in(window, &Local)
    }

    pub fn plan_in<Tz: TimeZone>(window: &DateWindow, tz: &Tz) -> Self {
        let due_after = parse_date_in(window.after.as_deref(), tz)
            .and_then(|d| start_of_day(&d))
            .map(|d| to_utc_string(&d));
        let due_before = parse_date_in(window.before.as_deref(), tz)
            .and_then(|d| end_of_day(&d))
            .map(|d| to_utc_string(&d));
        Self {
            bucket: window.bucket(),
            due_after,
            due_before,
        }
    }

    /// Rendered as `key=value` pairs in a stable order, ready for a query string.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(bucket) = self.bucket {
            params.push(("bucket", bucket.as_str().to_string()));
        }
        if let Some(after) = &self.due_after {
            params.push(("due_after", after.clone()));
        }
        if let Some(before) = &self.due_before {
            params.push(("due_before", before.clone()));
        }
        params
    }
}

fn to_utc_string<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    instant
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn format_date(s: Option<&str>) -> String {
    format_date_in(s, &Local)
}

/// Display form of a date string: "No date set" when absent, "Invalid date" when it
/// does not parse.
pub fn format_date_in<Tz: TimeZone>(s: Option<&str>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let Some(raw) = s.filter(|s| !s.is_empty()) else {
        return "No date set".to_string();
    };
    let Some(instant) = parse_date_in(Some(raw), tz) else {
        return "Invalid date".to_string();
    };
    instant.format("%m/%d/%Y, %I:%M %p %:z").to_string()
}
