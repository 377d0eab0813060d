//! Parsing of the date/time arguments accepted on the command line.

use anyhow::{Context, Result};
use campcal_core::range::{local_instant, local_midnight};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// A parsed moment, remembering whether the input carried a time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moment {
    pub at: DateTime<Utc>,
    pub has_time: bool,
}

/// Parse a date (YYYY-MM-DD), a local date-time, or an RFC 3339 timestamp.
/// Local values are interpreted in `tz`.
pub fn parse_datetime(input: &str, tz: Tz) -> Result<Moment> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(Moment {
            at: dt.with_timezone(&Utc),
            has_time: true,
        });
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(Moment {
                at: local_instant(naive, tz),
                has_time: true,
            });
        }
    }

    let date = parse_date(input)?;
    Ok(Moment {
        at: local_midnight(date, tz),
        has_time: false,
    })
}

pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .with_context(|| format!("Could not parse date: \"{}\" (expected YYYY-MM-DD)", input))
}

/// Parse an end input: a duration first (humantime), then a date/time.
pub fn parse_end(input: &str, start: DateTime<Utc>, tz: Tz) -> Result<DateTime<Utc>> {
    if let Ok(end) = try_apply_duration(start, input) {
        return Ok(end);
    }

    parse_datetime(input, tz).map(|m| m.at)
}

fn try_apply_duration(start: DateTime<Utc>, input: &str) -> Result<DateTime<Utc>> {
    let std_dur = humantime::parse_duration(input).map_err(|e| anyhow::anyhow!("{}", e))?;
    let chrono_dur = Duration::from_std(std_dur).context("Duration too large")?;
    Ok(start + chrono_dur)
}

/// Default end: +1 day for all-day events, +1 hour otherwise.
pub fn default_end(start: DateTime<Utc>, all_day: bool) -> DateTime<Utc> {
    if all_day {
        start + Duration::days(1)
    } else {
        start + Duration::hours(1)
    }
}

/// Budget flag value: empty clears, anything else must be a number.
pub fn parse_budget(input: &str) -> Result<Option<f64>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    input
        .parse::<f64>()
        .map(Some)
        .with_context(|| format!("Could not parse budget: \"{}\"", input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn parse_date_only_is_local_midnight() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let moment = parse_datetime("2024-03-15", tz).unwrap();
        assert_eq!(moment.at, utc(2024, 3, 15, 4, 0));
        assert!(!moment.has_time);
    }

    #[test]
    fn parse_local_datetime_uses_zone() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let moment = parse_datetime("2024-03-15T15:00", tz).unwrap();
        assert_eq!(moment.at, utc(2024, 3, 15, 14, 0));
        assert!(moment.has_time);

        let spaced = parse_datetime("2024-03-15 15:00", tz).unwrap();
        assert_eq!(spaced, moment);
    }

    #[test]
    fn parse_rfc3339_ignores_zone() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let moment = parse_datetime("2024-03-15T15:00:00Z", tz).unwrap();
        assert_eq!(moment.at, utc(2024, 3, 15, 15, 0));
    }

    #[test]
    fn parse_invalid_input() {
        assert!(parse_datetime("next friday", Tz::UTC).is_err());
        assert!(parse_date("2024-13-01").is_err());
    }

    #[test]
    fn end_accepts_duration_or_datetime() {
        let start = utc(2024, 3, 15, 15, 0);
        assert_eq!(parse_end("45m", start, Tz::UTC).unwrap(), utc(2024, 3, 15, 15, 45));
        assert_eq!(parse_end("2days", start, Tz::UTC).unwrap(), utc(2024, 3, 17, 15, 0));
        assert_eq!(
            parse_end("2024-03-15T18:30", start, Tz::UTC).unwrap(),
            utc(2024, 3, 15, 18, 30)
        );
    }

    #[test]
    fn default_end_by_kind() {
        let start = utc(2024, 3, 15, 0, 0);
        assert_eq!(default_end(start, true), utc(2024, 3, 16, 0, 0));
        assert_eq!(default_end(start, false), utc(2024, 3, 15, 1, 0));
    }

    #[test]
    fn budget_parsing() {
        assert_eq!(parse_budget("").unwrap(), None);
        assert_eq!(parse_budget(" 1250.5 ").unwrap(), Some(1250.5));
        assert!(parse_budget("lots").is_err());
    }
}
