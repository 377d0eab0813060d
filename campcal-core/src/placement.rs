//! Event placement into grid buckets.
//!
//! Day cells use interval overlap (an event spanning several days shows up in
//! every day it touches). Hour slots use point-in-range on the start instant.
//! All-day events ignore time-of-day: they sit in a separate all-day row of
//! each day column, and an end at local midnight does not spill into the next
//! day.
//! The year view only aggregates counts.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::event::Event;
use crate::range::{Bucket, Layout, ViewMode, local_date, local_midnight};

/// Default number of events rendered per month cell before "+N more".
pub const DEFAULT_CELL_LIMIT: usize = 3;

/// One month-view day cell.
#[derive(Debug, Clone, PartialEq)]
pub struct DayCell {
    pub date: NaiveDate,
    /// Visible events in ascending start order, at most the cell limit.
    pub events: Vec<Event>,
    /// Events that matched this day but were cut by the cell limit.
    pub overflow: usize,
}

impl DayCell {
    pub fn total(&self) -> usize {
        self.events.len() + self.overflow
    }

    pub fn more_label(&self) -> Option<String> {
        (self.overflow > 0).then(|| format!("+{} more", self.overflow))
    }
}

/// One hour slot of a day column.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotCell {
    pub date: NaiveDate,
    pub hour: u32,
    pub events: Vec<Event>,
}

/// A day column of the week or day view.
#[derive(Debug, Clone, PartialEq)]
pub struct DayColumn {
    pub date: NaiveDate,
    /// All-day events touching this date, above the hour slots.
    pub all_day: Vec<Event>,
    pub slots: Vec<SlotCell>,
}

impl DayColumn {
    pub fn event_count(&self) -> usize {
        self.all_day.len() + self.slots.iter().map(|s| s.events.len()).sum::<usize>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCount {
    pub year: i32,
    pub month: u32,
    pub count: usize,
}

/// Events bucketed for one view.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    Month(Vec<DayCell>),
    Slots(Vec<DayColumn>),
    Year(Vec<MonthCount>),
}

impl Placement {
    pub fn empty(mode: ViewMode) -> Self {
        match mode {
            ViewMode::Month => Placement::Month(Vec::new()),
            ViewMode::Week | ViewMode::Day => Placement::Slots(Vec::new()),
            ViewMode::Year => Placement::Year(Vec::new()),
        }
    }
}

/// Bucket `events` into the layout's grid.
pub fn place(layout: &Layout, events: &[Event], cell_limit: usize) -> Placement {
    let tz = layout.tz;
    let mut ordered: Vec<&Event> = events.iter().collect();
    ordered.sort_by(|a, b| a.start_at.cmp(&b.start_at).then_with(|| a.id.cmp(&b.id)));

    match layout.mode {
        ViewMode::Month => Placement::Month(
            layout
                .days()
                .into_iter()
                .map(|date| day_cell(date, &ordered, tz, cell_limit))
                .collect(),
        ),
        ViewMode::Week | ViewMode::Day => Placement::Slots(
            layout
                .days()
                .into_iter()
                .map(|date| DayColumn {
                    date,
                    all_day: ordered
                        .iter()
                        .filter(|e| e.is_all_day && occupies_day(e, date, tz))
                        .map(|e| (*e).clone())
                        .collect(),
                    slots: layout
                        .slots_for(date)
                        .into_iter()
                        .filter_map(|bucket| slot_cell(bucket, &ordered, tz))
                        .collect(),
                })
                .collect(),
        ),
        ViewMode::Year => Placement::Year(
            layout
                .buckets
                .iter()
                .filter_map(|bucket| match *bucket {
                    Bucket::Month { year, month } => Some(MonthCount {
                        year,
                        month,
                        count: ordered
                            .iter()
                            .filter(|e| starts_in_month(e, year, month, tz))
                            .count(),
                    }),
                    _ => None,
                })
                .collect(),
        ),
    }
}

/// Whether an event touches `date`: starts on it, ends on it, or spans across it.
pub fn occupies_day(event: &Event, date: NaiveDate, tz: Tz) -> bool {
    let start = local_date(event.start_at, tz);
    let end = last_day(event, tz);
    date == start || date == end || (start < date && date < end)
}

/// Last local date an event touches. An all-day event ending exactly at a
/// local midnight stops on the day before.
fn last_day(event: &Event, tz: Tz) -> NaiveDate {
    let end = local_date(event.end_at, tz);
    if event.is_all_day && event.end_at > event.start_at && event.end_at == local_midnight(end, tz)
    {
        end.pred_opt().unwrap_or(end)
    } else {
        end
    }
}

/// Whether a timed event starts inside the `[hour:00, hour+1:00)` slot of `date`.
/// All-day events never occupy a slot.
pub fn starts_in_slot(event: &Event, date: NaiveDate, hour: u32, tz: Tz) -> bool {
    if event.is_all_day {
        return false;
    }
    let bucket = Bucket::Slot { date, hour };
    local_date(event.start_at, tz) == date && in_half_open(event.start_at, &bucket, tz)
}

fn starts_in_month(event: &Event, year: i32, month: u32, tz: Tz) -> bool {
    let start = local_date(event.start_at, tz);
    start.year() == year && start.month() == month
}

fn in_half_open(instant: DateTime<Utc>, bucket: &Bucket, tz: Tz) -> bool {
    instant >= bucket.start(tz) && instant < bucket.end(tz)
}

fn day_cell(date: NaiveDate, ordered: &[&Event], tz: Tz, cell_limit: usize) -> DayCell {
    let matching: Vec<&Event> = ordered
        .iter()
        .copied()
        .filter(|e| occupies_day(e, date, tz))
        .collect();
    let overflow = matching.len().saturating_sub(cell_limit);

    DayCell {
        date,
        events: matching.into_iter().take(cell_limit).cloned().collect(),
        overflow,
    }
}

fn slot_cell(bucket: Bucket, ordered: &[&Event], tz: Tz) -> Option<SlotCell> {
    let Bucket::Slot { date, hour } = bucket else {
        return None;
    };

    Some(SlotCell {
        date,
        hour,
        events: ordered
            .iter()
            .filter(|e| starts_in_slot(e, date, hour, tz))
            .map(|e| (*e).clone())
            .collect(),
    })
}
