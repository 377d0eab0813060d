mod commands;
mod render;
mod utils;

use std::env;

use anyhow::Result;
use campcal_core::event::{Category, Priority, Recurrence, Status};
use campcal_core::range::ViewMode;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use commands::AppContext;

#[derive(Parser)]
#[command(name = "campcal")]
#[command(about = "Plan, filter and reschedule marketing campaign events")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the calendar for a month, week, day or year
    Show {
        /// View to render (month, week, day, year). Defaults to default_view from config
        #[arg(short, long)]
        view: Option<ViewMode>,

        /// Reference date (YYYY-MM-DD). Defaults to today
        #[arg(short, long)]
        date: Option<String>,

        /// Move this many views forward (negative for back)
        #[arg(short, long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i32,

        /// Only show events whose title or description contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Only show these categories (repeatable)
        #[arg(short, long)]
        category: Vec<Category>,

        /// Only show these statuses (repeatable)
        #[arg(long)]
        status: Vec<Status>,
    },
    /// Create a new event
    New {
        /// Event title
        title: String,

        /// Start date/time (e.g., "2025-03-20" or "2025-03-20T15:00")
        #[arg(short, long)]
        start: String,

        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Edit an event; fields not given keep their current values
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        /// New start date/time; the end moves with it unless --end is given
        #[arg(short, long)]
        start: Option<String>,

        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Move an event to another day, or to an hour slot with --hour
    Move {
        id: String,

        /// Target date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Target hour (0-23); the event starts on the hour
        #[arg(long)]
        hour: Option<u32>,
    },
    /// Delete an event
    Delete { id: String },
    /// Print an event as JSON
    Get { id: String },
}

/// Optional event fields shared by `new` and `edit`.
#[derive(Args, Debug, Default)]
pub struct FieldArgs {
    /// End date/time, or a duration such as "90m" or "2 days"
    #[arg(short, long)]
    pub end: Option<String>,

    #[arg(short, long)]
    pub category: Option<Category>,

    #[arg(long)]
    pub status: Option<Status>,

    #[arg(short, long)]
    pub priority: Option<Priority>,

    /// Budget amount; pass an empty string to clear it
    #[arg(short, long)]
    pub budget: Option<String>,

    /// `--all-day` or `--all-day=false`
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub all_day: Option<bool>,

    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub shared: Option<bool>,

    /// none, daily, weekly or monthly
    #[arg(short, long)]
    pub recurrence: Option<Recurrence>,

    /// Pass an empty string to clear it
    #[arg(long)]
    pub description: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let ctx = AppContext::load()?;

    match cli.command {
        Commands::Show {
            view,
            date,
            offset,
            search,
            category,
            status,
        } => {
            let options = commands::show::ShowOptions {
                view,
                date,
                offset,
                search,
                categories: category,
                statuses: status,
            };
            commands::show::run(&ctx, options).await
        }
        Commands::New {
            title,
            start,
            fields,
        } => commands::new::run(&ctx, title, start, fields).await,
        Commands::Edit {
            id,
            title,
            start,
            fields,
        } => commands::edit::run(&ctx, id, title, start, fields).await,
        Commands::Move { id, date, hour } => commands::move_event::run(&ctx, id, date, hour).await,
        Commands::Delete { id } => commands::delete::run(&ctx, id).await,
        Commands::Get { id } => commands::get::run(&ctx, id).await,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CAMPCAL_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "campcal=debug,campcal_core=debug,info"
        } else {
            "campcal=info,campcal_core=info,warn"
        })
    });

    let format = env::var("CAMPCAL_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}
