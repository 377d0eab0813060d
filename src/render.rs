//! Terminal rendering for campcal-core types.
//!
//! This module provides extension traits that add colored terminal rendering
//! to campcal-core types using owo_colors.

use campcal_core::event::{Category, Event, Status};
use campcal_core::placement::{DayCell, DayColumn, MonthCount, Placement};
use campcal_core::range::{DAYS_PER_WEEK, Layout};
use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Category {
    fn render(&self) -> String {
        let (r, g, b) = hex_rgb(self.color());
        format!("[{}]", self.label()).truecolor(r, g, b).to_string()
    }
}

impl Render for Status {
    fn render(&self) -> String {
        let label = self.label();
        match self {
            Status::Planned => label.dimmed().to_string(),
            Status::InProgress => label.yellow().to_string(),
            Status::Completed => label.green().to_string(),
            Status::Cancelled => label.strikethrough().to_string(),
        }
    }
}

/// Parse "#RRGGBB"; anything else renders white.
fn hex_rgb(hex: &str) -> (u8, u8, u8) {
    let digits = hex.trim_start_matches('#');
    let channel = |i: usize| {
        digits
            .get(i..i + 2)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .unwrap_or(255)
    };
    (channel(0), channel(2), channel(4))
}

/// "09:30" in the display zone, or "all-day".
pub fn format_time(event: &Event, tz: Tz) -> String {
    if event.is_all_day {
        "all-day".to_string()
    } else {
        event.start_at.with_timezone(&tz).format("%H:%M").to_string()
    }
}

/// One event on one line: time, title, category and status.
pub fn render_event(event: &Event, tz: Tz) -> String {
    let (r, g, b) = hex_rgb(event.category.color());
    format!(
        "{:>7} {} {} {} {}",
        format_time(event, tz),
        event.title.truecolor(r, g, b).bold(),
        event.category.render(),
        event.status.render(),
        event.id.to_string().dimmed()
    )
}

/// Full multi-line view of a single event.
pub fn render_event_details(event: &Event, tz: Tz) -> String {
    let mut lines = vec![render_event(event, tz)];
    let start = event.start_at.with_timezone(&tz);
    let end = event.end_at.with_timezone(&tz);
    lines.push(format!(
        "        {} → {}",
        start.format("%a %b %-d %Y %H:%M"),
        end.format("%a %b %-d %Y %H:%M")
    ));
    if let Some(description) = &event.description {
        lines.push(format!("        {}", description.dimmed()));
    }
    if let Some(budget) = event.budget {
        lines.push(format!("        budget {:.2}", budget));
    }
    lines.join("\n")
}

fn day_label(date: NaiveDate) -> String {
    date.format("%a %b %-d").to_string()
}

pub fn render_placement(layout: &Layout, placement: &Placement) -> String {
    match placement {
        Placement::Month(cells) => render_month(layout, cells),
        Placement::Slots(columns) => render_columns(columns, layout.tz),
        Placement::Year(counts) => render_year(counts),
    }
}

fn render_month(layout: &Layout, cells: &[DayCell]) -> String {
    let mut lines = vec![" Mo  Tu  We  Th  Fr  Sa  Su".dimmed().to_string()];

    for week in cells.chunks(DAYS_PER_WEEK) {
        let row: Vec<String> = week
            .iter()
            .map(|cell| {
                let marker = if cell.total() > 0 { "•" } else { " " };
                let text = format!("{:>3}{}", cell.date.day(), marker);
                if !layout.is_in_reference_month(cell.date) {
                    text.dimmed().to_string()
                } else if cell.total() > 0 {
                    text.bold().to_string()
                } else {
                    text
                }
            })
            .collect();
        lines.push(row.join(""));
    }

    for cell in cells.iter().filter(|c| c.total() > 0) {
        lines.push(String::new());
        lines.push(day_label(cell.date).bold().to_string());
        for event in &cell.events {
            lines.push(render_event(event, layout.tz));
        }
        if let Some(more) = cell.more_label() {
            lines.push(format!("        {}", more.dimmed()));
        }
    }

    lines.join("\n")
}

fn render_columns(columns: &[DayColumn], tz: Tz) -> String {
    let mut lines = Vec::new();

    for column in columns {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        let label = format!("{} ({})", day_label(column.date), column.event_count());
        lines.push(label.bold().to_string());

        if column.event_count() == 0 {
            lines.push(format!("        {}", "No events".dimmed()));
            continue;
        }
        for event in &column.all_day {
            lines.push(render_event(event, tz));
        }
        for slot in column.slots.iter().filter(|s| !s.events.is_empty()) {
            for event in &slot.events {
                lines.push(render_event(event, tz));
            }
        }
    }

    lines.join("\n")
}

fn render_year(counts: &[MonthCount]) -> String {
    counts
        .iter()
        .map(|month| {
            let name = NaiveDate::from_ymd_opt(month.year, month.month, 1)
                .map(|d| d.format("%B").to_string())
                .unwrap_or_default();
            let count = match month.count {
                0 => "-".dimmed().to_string(),
                1 => "1 event".to_string(),
                n => format!("{} events", n),
            };
            format!("{:<10} {}", name, count)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
