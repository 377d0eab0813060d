use anyhow::{Context, Result};
use campcal_core::event::{EventId, EventPatch};
use campcal_core::store::EventStore;
use owo_colors::OwoColorize;

use crate::FieldArgs;
use crate::commands::{AppContext, sign_in_hint};
use crate::render::render_event_details;
use crate::utils::time::{parse_budget, parse_datetime, parse_end};

pub async fn run(
    ctx: &AppContext,
    id: String,
    title: Option<String>,
    start: Option<String>,
    args: FieldArgs,
) -> Result<()> {
    let id = EventId::from(id);
    let current = ctx.store.get_by_id(&id).await?;

    let mut patch = EventPatch {
        title,
        category: args.category,
        status: args.status,
        priority: args.priority,
        is_all_day: args.all_day,
        is_shared: args.shared,
        recurrence: args.recurrence,
        ..Default::default()
    };

    // A new start keeps the duration unless an end is given too.
    let start_at = match start.as_deref() {
        Some(start) => {
            let start_at = parse_datetime(start, ctx.tz)?.at;
            patch.start_at = Some(start_at);
            start_at
        }
        None => current.start_at,
    };
    patch.end_at = match args.end.as_deref() {
        Some(end) => Some(
            parse_end(end, start_at, ctx.tz)
                .with_context(|| format!("Could not parse end: \"{}\"", end))?,
        ),
        None => patch.start_at.map(|s| s + current.duration()),
    };

    if let Some(budget) = args.budget.as_deref() {
        patch.budget = Some(parse_budget(budget)?);
    }
    if let Some(description) = args.description {
        let trimmed = description.trim();
        patch.description = Some((!trimmed.is_empty()).then(|| trimmed.to_string()));
    }

    if patch.is_empty() {
        println!("{}", "Nothing to change".dimmed());
        return Ok(());
    }

    let mut controller = ctx.controller()?;
    let event = controller
        .update_event(&id, patch)
        .await
        .map_err(sign_in_hint)?;

    println!("{}", format!("  Updated: {}", event.title).yellow());
    println!("{}", render_event_details(&event, ctx.tz));

    Ok(())
}
