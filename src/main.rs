mod app;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vocab_review::ReviewService;

#[derive(Parser)]
#[command(name = "vocab-review", version, about = "Adaptive vocabulary review scheduler")]
pub struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "VOCAB_REVIEW_DB", default_value = "db.sqlite3")]
    db: PathBuf,

    /// Reference date (YYYY-MM-DD); defaults to the simulated date, then today
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the database schema
    Init,
    /// Score a review of one item
    Review {
        #[arg(long)]
        learner: i64,
        #[arg(long)]
        item: i64,
        /// easy, normal or hard
        #[arg(long)]
        difficulty: String,
    },
    /// List items due for review, highest priority first
    Due {
        #[arg(long)]
        learner: i64,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Restart learning an item from scratch
    Restart {
        #[arg(long)]
        learner: i64,
        #[arg(long)]
        item: i64,
    },
    /// Show the interval each difficulty would give an item
    Preview {
        #[arg(long)]
        learner: i64,
        #[arg(long)]
        item: i64,
    },
    /// Progress summary for a learner
    Stats {
        #[arg(long)]
        learner: i64,
        #[arg(long)]
        json: bool,
    },
    /// Simulated date management
    Date {
        #[command(subcommand)]
        action: DateAction,
    },
    /// Export a learner's review states to JSON
    Export {
        #[arg(long)]
        learner: i64,
        path: PathBuf,
    },
    /// Import review states from JSON, replacing existing ones
    Import { path: PathBuf },
}

#[derive(Subcommand)]
pub enum DateAction {
    /// Print the date reviews are scored against
    Show,
    /// Pin the simulated date
    Set { date: NaiveDate },
    /// Move the simulated date forward one day
    Advance,
    /// Go back to the system date
    Clear,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut service = ReviewService::open(&cli.db)?;
    log::debug!("using database '{}'", cli.db.display());

    app::run(&mut service, cli.today, cli.command)
}
