use anyhow::Result;
use campcal_core::event::EventId;
use campcal_core::reschedule::DropTarget;
use owo_colors::OwoColorize;

use crate::commands::{AppContext, sign_in_hint};
use crate::render::render_event_details;
use crate::utils::time::parse_date;

pub async fn run(ctx: &AppContext, id: String, date: String, hour: Option<u32>) -> Result<()> {
    let date = parse_date(&date)?;
    let target = match hour {
        Some(hour) => DropTarget::Slot { date, hour },
        None => DropTarget::Day(date),
    };

    let mut controller = ctx.controller()?;
    let event = controller
        .reschedule_event(&EventId::from(id), target)
        .await
        .map_err(sign_in_hint)?;

    println!("{}", format!("  Moved: {}", event.title).yellow());
    println!("{}", render_event_details(&event, ctx.tz));

    Ok(())
}
