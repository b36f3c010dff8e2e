//! Command handlers for the review CLI.
//! Resolves the reference date once per invocation and prints results.

use crate::{Command, DateAction};
use chrono::{Local, NaiveDate};
use vocab_review::ReviewService;
use vocab_review::ReviewState;
use vocab_review::database::db;
use vocab_review::export::json::{export_json_to_path, import_json};

pub fn run(service: &mut ReviewService, today: Option<NaiveDate>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Init => {
            println!("Database ready.");
        }
        Command::Review {
            learner,
            item,
            difficulty,
        } => {
            let today = service.resolve_today(today)?;
            let state = service.record_review(learner, item, &difficulty, today)?;
            println!(
                "Item {} is {}; next review on {} (in {} days, ease {:.2}).",
                state.item_id,
                state.status,
                format_date(state.next_review_date),
                state.interval_days.days(),
                state.ease_factor.value()
            );
        }
        Command::Due { learner, limit, json } => {
            let today = service.resolve_today(today)?;
            let queue = service.due_queue(learner, today, limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&queue)?);
            } else if queue.is_empty() {
                println!("Nothing due on {today}.");
            } else {
                println!("{} items due on {today}:", queue.len());
                print_states(&queue);
            }
        }
        Command::Restart { learner, item } => {
            let today = service.resolve_today(today)?;
            service.restart_item(learner, item, today)?;
            println!("Item {item} restarted; due {today}.");
        }
        Command::Preview { learner, item } => {
            let today = service.resolve_today(today)?;
            for (difficulty, interval) in service.preview(learner, item, today)? {
                println!("  {:<6} -> {} days", difficulty.as_str(), interval.days());
            }
        }
        Command::Stats { learner, json } => {
            let today = service.resolve_today(today)?;
            let stats = service.stats(learner, today)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Learner {learner} on {today}:");
                println!("  total:          {}", stats.total);
                println!("  not memorized:  {}", stats.not_memorized);
                println!("  learning:       {}", stats.learning);
                println!("  memorized:      {}", stats.memorized);
                println!("  never reviewed: {}", stats.never_reviewed);
                println!("  due:            {}", stats.due);
            }
        }
        Command::Date { action } => run_date(service, action)?,
        Command::Export { learner, path } => {
            let states = service.states_for_learner(learner)?;
            export_json_to_path(&states, &path)?;
            println!("Exported {} review states to '{}'.", states.len(), path.display());
        }
        Command::Import { path } => {
            let states = import_json(&path)?;
            let count = service.import_states(&states)?;
            println!("Imported {count} review states from '{}'.", path.display());
        }
    }
    Ok(())
}

fn run_date(service: &ReviewService, action: DateAction) -> anyhow::Result<()> {
    let conn = service.connection();
    match action {
        DateAction::Show => match db::get_current_date(conn)? {
            Some(date) => println!("{date} (simulated)"),
            None => println!("{} (system)", Local::now().date_naive()),
        },
        DateAction::Set { date } => {
            db::set_current_date(conn, date)?;
            println!("Simulated date set to {date}.");
        }
        DateAction::Advance => {
            let next = db::advance_day(conn, Local::now().date_naive())?;
            println!("Simulated date advanced to {next}.");
        }
        DateAction::Clear => {
            db::clear_current_date(conn)?;
            println!("Using the system date again.");
        }
    }
    Ok(())
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn print_states(states: &[ReviewState]) {
    println!(
        "  {:>8}  {:<13}  {:<10}  {:>8}  {:>4}  {:>7}  {:>6}",
        "item", "status", "due", "interval", "ease", "reviews", "misses"
    );
    for state in states {
        println!(
            "  {:>8}  {:<13}  {:<10}  {:>8}  {:>4.2}  {:>7}  {:>6}",
            state.item_id,
            state.status.as_str(),
            format_date(state.next_review_date),
            state.interval_days.days(),
            state.ease_factor.value(),
            state.review_count,
            state.consecutive_incorrect
        );
    }
}
