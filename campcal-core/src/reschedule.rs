//! Moving an event to a new bucket.
//!
//! Duration is always preserved. Day-cell drops keep the event's local
//! time-of-day; slot drops snap the start to the slot. All-day events stay
//! all-day and are anchored at local midnight of the target date.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::error::{CampcalError, CampcalResult};
use crate::event::{Event, EventPatch};
use crate::range::{Bucket, HOURS_PER_DAY, local_instant, local_midnight};

/// Where an event was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// A day cell (month view): only the date changes.
    Day(NaiveDate),
    /// An hour slot (week/day view): the start moves to `hour:00`.
    Slot { date: NaiveDate, hour: u32 },
}

impl DropTarget {
    /// Drop targets for grid buckets; month buckets of the year view are not droppable.
    pub fn from_bucket(bucket: Bucket) -> Option<Self> {
        match bucket {
            Bucket::Day(date) => Some(DropTarget::Day(date)),
            Bucket::Slot { date, hour } => Some(DropTarget::Slot { date, hour }),
            Bucket::Month { .. } => None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match *self {
            DropTarget::Day(date) | DropTarget::Slot { date, .. } => date,
        }
    }
}

/// New start/end for a moved event. Always written together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rescheduled {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl Rescheduled {
    pub fn patch(&self) -> EventPatch {
        EventPatch::times(self.start_at, self.end_at)
    }
}

/// Compute the new timestamps for `event` dropped on `target`.
pub fn reschedule(event: &Event, target: DropTarget, tz: Tz) -> CampcalResult<Rescheduled> {
    let duration = event.duration();

    let start_at = if event.is_all_day {
        local_midnight(target.date(), tz)
    } else {
        match target {
            DropTarget::Day(date) => {
                let time_of_day = event.start_at.with_timezone(&tz).time();
                local_instant(date.and_time(time_of_day), tz)
            }
            DropTarget::Slot { date, hour } => {
                if hour >= HOURS_PER_DAY {
                    return Err(CampcalError::Validation(format!(
                        "slot hour must be below {}, got {}",
                        HOURS_PER_DAY, hour
                    )));
                }
                let slot = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
                local_instant(date.and_time(slot), tz)
            }
        }
    };

    Ok(Rescheduled {
        start_at,
        end_at: start_at + duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventFields, EventId, NewEvent, UserId};
    use chrono::{Duration, TimeZone};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(start: DateTime<Utc>, end: DateTime<Utc>) -> Event {
        Event::from_new(
            EventId::from("evt"),
            NewEvent {
                owner_id: UserId::new("alice"),
                fields: EventFields::new("Launch", start, end),
            },
        )
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_day_drop_keeps_time_of_day_and_duration() {
        let e = event(utc(2024, 3, 1, 14, 30), utc(2024, 3, 1, 15, 30));
        let moved = reschedule(&e, DropTarget::Day(date(2024, 3, 10)), Tz::UTC).unwrap();
        assert_eq!(moved.start_at, utc(2024, 3, 10, 14, 30));
        assert_eq!(moved.end_at, utc(2024, 3, 10, 15, 30));
    }

    #[test]
    fn test_slot_drop_snaps_to_slot_start() {
        let e = event(utc(2024, 3, 1, 14, 30), utc(2024, 3, 1, 15, 30));
        let moved = reschedule(
            &e,
            DropTarget::Slot {
                date: date(2024, 3, 10),
                hour: 9,
            },
            Tz::UTC,
        )
        .unwrap();
        assert_eq!(moved.start_at, utc(2024, 3, 10, 9, 0));
        assert_eq!(moved.end_at, utc(2024, 3, 10, 10, 0));
    }

    #[test]
    fn test_multi_day_duration_preserved_backwards() {
        let e = event(utc(2024, 3, 20, 8, 15), utc(2024, 3, 23, 17, 45));
        let moved = reschedule(&e, DropTarget::Day(date(2024, 3, 2)), Tz::UTC).unwrap();
        assert_eq!(moved.start_at, utc(2024, 3, 2, 8, 15));
        assert_eq!(moved.end_at - moved.start_at, e.duration());
    }

    #[test]
    fn test_local_time_of_day_survives_dst_change() {
        // 09:00 in Berlin is 08:00 UTC in winter and 07:00 UTC in summer.
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let e = event(utc(2024, 3, 25, 8, 0), utc(2024, 3, 25, 9, 0));
        let moved = reschedule(&e, DropTarget::Day(date(2024, 4, 2)), tz).unwrap();
        assert_eq!(moved.start_at, utc(2024, 4, 2, 7, 0));
        assert_eq!(moved.end_at - moved.start_at, Duration::hours(1));
    }

    #[test]
    fn test_all_day_event_anchors_at_midnight() {
        let mut e = event(utc(2024, 3, 1, 0, 0), utc(2024, 3, 2, 0, 0));
        e.is_all_day = true;

        let on_day = reschedule(&e, DropTarget::Day(date(2024, 3, 10)), Tz::UTC).unwrap();
        assert_eq!(on_day.start_at, utc(2024, 3, 10, 0, 0));
        assert_eq!(on_day.end_at, utc(2024, 3, 11, 0, 0));

        let on_slot = reschedule(
            &e,
            DropTarget::Slot {
                date: date(2024, 3, 10),
                hour: 15,
            },
            Tz::UTC,
        )
        .unwrap();
        assert_eq!(on_slot, on_day);
    }

    #[test]
    fn test_out_of_range_slot_is_rejected() {
        let e = event(utc(2024, 3, 1, 14, 30), utc(2024, 3, 1, 15, 30));
        let result = reschedule(
            &e,
            DropTarget::Slot {
                date: date(2024, 3, 10),
                hour: 24,
            },
            Tz::UTC,
        );
        assert!(matches!(result, Err(CampcalError::Validation(_))));
    }

    #[test]
    fn test_patch_writes_both_times_only() {
        let moved = Rescheduled {
            start_at: utc(2024, 3, 10, 9, 0),
            end_at: utc(2024, 3, 10, 10, 0),
        };
        let patch = moved.patch();
        assert_eq!(patch.start_at, Some(moved.start_at));
        assert_eq!(patch.end_at, Some(moved.end_at));
        assert!(patch.title.is_none());
        assert!(patch.is_all_day.is_none());
    }
}
