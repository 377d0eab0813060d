use anyhow::Result;
use campcal_core::event::EventId;
use owo_colors::OwoColorize;

use crate::commands::{AppContext, sign_in_hint};

pub async fn run(ctx: &AppContext, id: String) -> Result<()> {
    let id = EventId::from(id);
    let mut controller = ctx.controller()?;
    controller.delete_event(&id).await.map_err(sign_in_hint)?;

    println!("{}", format!("  Deleted: {}", id).red());
    Ok(())
}
