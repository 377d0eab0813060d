//! Display ranges and grid buckets for each calendar view.
//!
//! Everything here is a pure function of a reference date, a view mode and the
//! display time zone. Ranges are half-open `[start, end)` intervals in UTC
//! whose boundaries are local midnights in the display zone.

use std::fmt;
use std::str::FromStr;

use chrono::offset::LocalResult;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::CampcalError;

pub const HOURS_PER_DAY: u32 = 24;
pub const DAYS_PER_WEEK: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Month,
    Week,
    Day,
    Year,
}

impl ViewMode {
    pub const ALL: [ViewMode; 4] = [ViewMode::Month, ViewMode::Week, ViewMode::Day, ViewMode::Year];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Month => "month",
            ViewMode::Week => "week",
            ViewMode::Day => "day",
            ViewMode::Year => "year",
        }
    }

    /// Whether drops in this view target hour slots rather than day cells.
    pub fn is_slot_granular(&self) -> bool {
        matches!(self, ViewMode::Week | ViewMode::Day)
    }
}

impl FromStr for ViewMode {
    type Err = CampcalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ViewMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| CampcalError::Validation(format!("unknown view '{}'", s)))
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// A single grid cell or time slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// A calendar day cell.
    Day(NaiveDate),
    /// A one-hour slot `[hour:00, hour+1:00)` on `date`.
    Slot { date: NaiveDate, hour: u32 },
    /// A month of the year view (aggregate counts only).
    Month { year: i32, month: u32 },
}

impl Bucket {
    /// Start instant of this bucket in the display zone.
    pub fn start(&self, tz: Tz) -> DateTime<Utc> {
        match *self {
            Bucket::Day(date) => local_midnight(date, tz),
            Bucket::Slot { date, hour } => slot_start(date, hour, tz),
            Bucket::Month { year, month } => match NaiveDate::from_ymd_opt(year, month, 1) {
                Some(first) => local_midnight(first, tz),
                None => DateTime::<Utc>::MIN_UTC,
            },
        }
    }

    /// Exclusive end instant of this bucket in the display zone.
    pub fn end(&self, tz: Tz) -> DateTime<Utc> {
        match *self {
            Bucket::Day(date) => local_midnight(next_day(date), tz),
            Bucket::Slot { date, hour } => {
                if hour + 1 >= HOURS_PER_DAY {
                    local_midnight(next_day(date), tz)
                } else {
                    slot_start(date, hour + 1, tz)
                }
            }
            Bucket::Month { year, month } => match NaiveDate::from_ymd_opt(year, month, 1) {
                Some(first) => local_midnight(add_months(first, 1), tz),
                None => DateTime::<Utc>::MAX_UTC,
            },
        }
    }

    /// Calendar date of this bucket (first of the month for month buckets).
    pub fn date(&self) -> NaiveDate {
        match *self {
            Bucket::Day(date) | Bucket::Slot { date, .. } => date,
            Bucket::Month { year, month } => {
                NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
            }
        }
    }
}

/// The concrete display range and grid buckets of one view.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub mode: ViewMode,
    pub reference_date: NaiveDate,
    pub tz: Tz,
    pub range: DateRange,
    /// Month: one day per cell. Week: seven days. Day: 24 slots. Year: 12 months.
    pub buckets: Vec<Bucket>,
}

impl Layout {
    pub fn new(reference_date: NaiveDate, mode: ViewMode, tz: Tz) -> Self {
        let (first, last) = match mode {
            ViewMode::Month => {
                let first_of_month = first_of_month(reference_date);
                let last_of_month = add_months(first_of_month, 1) - Duration::days(1);
                (
                    start_of_week(first_of_month),
                    start_of_week(last_of_month) + Duration::days(6),
                )
            }
            ViewMode::Week => {
                let monday = start_of_week(reference_date);
                (monday, monday + Duration::days(6))
            }
            ViewMode::Day => (reference_date, reference_date),
            ViewMode::Year => {
                let jan_first = first_of_year(reference_date);
                (jan_first, add_months(jan_first, 12) - Duration::days(1))
            }
        };

        let range = DateRange {
            start: local_midnight(first, tz),
            end: local_midnight(next_day(last), tz),
        };

        let buckets = match mode {
            ViewMode::Month | ViewMode::Week => days_between(first, last)
                .into_iter()
                .map(Bucket::Day)
                .collect(),
            ViewMode::Day => hour_slots(reference_date),
            ViewMode::Year => (1..=12)
                .map(|month| Bucket::Month {
                    year: first.year(),
                    month,
                })
                .collect(),
        };

        Layout {
            mode,
            reference_date,
            tz,
            range,
            buckets,
        }
    }

    /// Hour slots for one day column (week and day views).
    pub fn slots_for(&self, date: NaiveDate) -> Vec<Bucket> {
        hour_slots(date)
    }

    /// Days rendered as columns or cells; empty for the year view.
    pub fn days(&self) -> Vec<NaiveDate> {
        match self.mode {
            ViewMode::Month | ViewMode::Week => self.buckets.iter().map(Bucket::date).collect(),
            ViewMode::Day => vec![self.reference_date],
            ViewMode::Year => Vec::new(),
        }
    }

    /// Month-view cells outside the reference month are rendered dimmed.
    pub fn is_in_reference_month(&self, date: NaiveDate) -> bool {
        date.year() == self.reference_date.year() && date.month() == self.reference_date.month()
    }
}

/// Advance a reference date by one unit of the view's granularity.
pub fn navigate(reference_date: NaiveDate, mode: ViewMode, direction: Direction) -> NaiveDate {
    let step: i64 = match direction {
        Direction::Previous => -1,
        Direction::Next => 1,
    };

    match mode {
        ViewMode::Month => shift_months(reference_date, step),
        ViewMode::Week => reference_date + Duration::weeks(step),
        ViewMode::Day => reference_date + Duration::days(step),
        ViewMode::Year => shift_months(reference_date, 12 * step),
    }
}

/// Header title for a view, e.g. "March 2024" or "March 15, 2024".
pub fn title(reference_date: NaiveDate, mode: ViewMode) -> String {
    match mode {
        ViewMode::Day => reference_date.format("%B %-d, %Y").to_string(),
        _ => reference_date.format("%B %Y").to_string(),
    }
}

/// Monday on or before `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Calendar date of an instant in the display zone.
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Midnight at the start of `date` in the display zone.
pub fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    local_instant(date.and_time(chrono::NaiveTime::MIN), tz)
}

/// Resolve a wall-clock time in the display zone to an instant.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant; times inside
/// a DST gap move forward by the gap.
pub fn local_instant(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => match tz.from_local_datetime(&(naive + Duration::hours(1))) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
            LocalResult::None => Utc.from_utc_datetime(&naive),
        },
    }
}

fn slot_start(date: NaiveDate, hour: u32, tz: Tz) -> DateTime<Utc> {
    match date.and_hms_opt(hour, 0, 0) {
        Some(naive) => local_instant(naive, tz),
        None => local_midnight(next_day(date), tz),
    }
}

fn hour_slots(date: NaiveDate) -> Vec<Bucket> {
    (0..HOURS_PER_DAY)
        .map(|hour| Bucket::Slot { date, hour })
        .collect()
}

fn days_between(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    first.iter_days().take_while(|d| *d <= last).collect()
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

fn first_of_year(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.ordinal0() as i64)
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(date)
}

/// Shift by whole months, clamping the day to the target month's length.
fn shift_months(date: NaiveDate, months: i64) -> NaiveDate {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months as u32))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs() as u32))
    };
    shifted.unwrap_or(date)
}
