use anyhow::{Context, Result};
use campcal_core::event::EventFields;
use owo_colors::OwoColorize;

use crate::FieldArgs;
use crate::commands::{AppContext, sign_in_hint};
use crate::render::render_event_details;
use crate::utils::time::{default_end, parse_budget, parse_datetime, parse_end};

pub async fn run(ctx: &AppContext, title: String, start: String, args: FieldArgs) -> Result<()> {
    let start = parse_datetime(&start, ctx.tz)?;
    let all_day = args.all_day.unwrap_or(!start.has_time);

    let end_at = match args.end.as_deref() {
        Some(end) => parse_end(end, start.at, ctx.tz)
            .with_context(|| format!("Could not parse end: \"{}\"", end))?,
        None => default_end(start.at, all_day),
    };

    let mut fields = EventFields::new(&title, start.at, end_at);
    fields.is_all_day = all_day;
    if let Some(category) = args.category {
        fields.category = category;
    }
    if let Some(status) = args.status {
        fields.status = status;
    }
    if let Some(priority) = args.priority {
        fields.priority = priority;
    }
    if let Some(budget) = args.budget.as_deref() {
        fields.budget = parse_budget(budget)?;
    }
    if let Some(shared) = args.shared {
        fields.is_shared = shared;
    }
    if let Some(recurrence) = args.recurrence {
        fields.recurrence = recurrence;
    }
    fields.description = args.description.filter(|d| !d.trim().is_empty());

    let mut controller = ctx.controller()?;
    let event = controller.create_event(fields).await.map_err(sign_in_hint)?;

    println!("{}", format!("  Created: {}", event.title).green());
    println!("{}", render_event_details(&event, ctx.tz));

    Ok(())
}
