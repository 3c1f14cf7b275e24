//! `sprinty backlog {list,add}` (spec §6). Grounded in the teacher's
//! `add::run`/`sprints::list_sprints`, merged into one module and re-pointed
//! at the work-item backlog instead of a flat sprint list.

use std::path::Path;

use colored::*;
use sprinty_core::BacklogEngine;
use sprinty_data::{ItemStatus, ItemType};

fn parse_item_type(s: &str) -> anyhow::Result<ItemType> {
    match s.to_lowercase().as_str() {
        "feature" => Ok(ItemType::Feature),
        "bug" => Ok(ItemType::Bug),
        "spike" => Ok(ItemType::Spike),
        "infra" => Ok(ItemType::Infra),
        "chore" => Ok(ItemType::Chore),
        other => anyhow::bail!("unknown item type '{other}' (expected feature, bug, spike, infra, chore)"),
    }
}

fn parse_item_status(s: &str) -> anyhow::Result<ItemStatus> {
    match s.to_lowercase().as_str() {
        "backlog" => Ok(ItemStatus::Backlog),
        "ready" => Ok(ItemStatus::Ready),
        "in_progress" => Ok(ItemStatus::InProgress),
        "implemented" => Ok(ItemStatus::Implemented),
        "qa_in_progress" => Ok(ItemStatus::QaInProgress),
        "qa_passed" => Ok(ItemStatus::QaPassed),
        "qa_failed" => Ok(ItemStatus::QaFailed),
        "done" => Ok(ItemStatus::Done),
        "cancelled" => Ok(ItemStatus::Cancelled),
        other => anyhow::bail!("unknown status '{other}'"),
    }
}

fn status_color(status: ItemStatus, text: String) -> colored::ColoredString {
    match status {
        ItemStatus::Done => text.green(),
        ItemStatus::QaFailed => text.red(),
        ItemStatus::Backlog => text.yellow(),
        _ => text.bright_blue(),
    }
}

pub async fn list(root: &Path, status: Option<&str>) -> anyhow::Result<i32> {
    if !sprinty_utils::is_initialized(root) {
        anyhow::bail!("Project not initialized. Run 'sprinty init <project>' first.");
    }

    let backlog = BacklogEngine::new(sprinty_utils::backlog_path(root));
    let items = match status {
        Some(s) => backlog.by_status(parse_item_status(s)?)?,
        None => backlog.all()?,
    };

    println!("{}", "Backlog".bright_cyan().bold());
    println!();

    if items.is_empty() {
        println!("{}", "No items.".yellow());
        return Ok(0);
    }

    for item in &items {
        let status_str = format!("{:?}", item.status);
        println!(
            "{} {} {} {} {}",
            item.id.bright_white().bold(),
            status_color(item.status, status_str),
            "-".bright_black(),
            item.title,
            format!("({} pts, prio {})", item.story_points, item.priority).bright_black()
        );
    }

    let total: i64 = items.iter().map(|i| i.story_points as i64).sum();
    println!();
    println!("{}: {} items, {} points", "Total".bright_white().bold(), items.len(), total);

    Ok(0)
}

#[allow(clippy::too_many_arguments)]
pub async fn add(
    root: &Path,
    title: &str,
    item_type: &str,
    priority: i32,
    points: i32,
    acceptance_criteria: Vec<String>,
) -> anyhow::Result<i32> {
    if !sprinty_utils::is_initialized(root) {
        anyhow::bail!("Project not initialized. Run 'sprinty init <project>' first.");
    }

    let backlog = BacklogEngine::new(sprinty_utils::backlog_path(root));
    let item_type = parse_item_type(item_type)?;
    let item = backlog.add(title, item_type, priority, points, acceptance_criteria)?;

    println!("{} {}", "Added".green().bold(), item.id.bright_blue());
    println!("  {}: {}", "Title".bright_black(), item.title);
    println!("  {}: {:?}", "Type".bright_black(), item.item_type);
    println!("  {}: {} pts, prio {}", "Size".bright_black(), item.story_points, item.priority);

    Ok(0)
}
