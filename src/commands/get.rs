use anyhow::Result;
use campcal_core::event::EventId;
use campcal_core::store::EventStore;

use crate::commands::AppContext;

pub async fn run(ctx: &AppContext, id: String) -> Result<()> {
    let event = ctx.store.get_by_id(&EventId::from(id)).await?;
    println!("{}", serde_json::to_string_pretty(&event)?);
    Ok(())
}
