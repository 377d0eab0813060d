use anyhow::Result;
use campcal_core::controller::{Phase, ViewChange};
use campcal_core::event::{Category, Status};
use campcal_core::filter::EventFilter;
use campcal_core::range::{Direction, ViewMode};
use owo_colors::OwoColorize;

use crate::commands::AppContext;
use crate::render::render_placement;
use crate::utils::time::parse_date;

pub struct ShowOptions {
    pub view: Option<ViewMode>,
    pub date: Option<String>,
    pub offset: i32,
    pub search: Option<String>,
    pub categories: Vec<Category>,
    pub statuses: Vec<Status>,
}

pub async fn run(ctx: &AppContext, options: ShowOptions) -> Result<()> {
    let mut controller = ctx.controller()?;

    // Only the final view state is fetched; earlier requests are superseded.
    if let Some(mode) = options.view {
        controller.change_view(ViewChange::SetViewMode(mode));
    }
    if let Some(date) = options.date.as_deref() {
        controller.change_view(ViewChange::GoTo(parse_date(date)?));
    }
    let direction = if options.offset < 0 {
        Direction::Previous
    } else {
        Direction::Next
    };
    for _ in 0..options.offset.unsigned_abs() {
        controller.change_view(ViewChange::Navigate(direction));
    }

    controller.set_filters(EventFilter::new(
        options.search.as_deref().unwrap_or_default(),
        options.categories,
        options.statuses,
    ));

    match controller.refresh().await {
        Phase::Unauthenticated => anyhow::bail!("The event store rejected the configured user"),
        Phase::Error(message) => {
            eprintln!("{}", format!("  Showing stale results: {}", message).red());
        }
        _ => {}
    }

    println!("{}", controller.title().bold());
    println!();
    println!("{}", render_placement(controller.layout(), controller.placement()));
    println!();

    let mut status = controller.status_line();
    if controller.filter().is_active() {
        status.push_str(&format!(" ({} before filters)", controller.snapshot().len()));
    }
    println!("{}", status.dimmed());

    if let Some(notice) = controller.take_notice() {
        println!("{}", notice.yellow());
    }

    Ok(())
}
