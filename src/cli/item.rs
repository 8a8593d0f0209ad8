//! Item CLI commands
//!
//! Every command loads the project's store, runs one store operation and
//! writes the store back when the operation changed something.

use anyhow::Result;
use chrono::{Duration, NaiveDateTime};
use log::debug;

use super::output::Output;
use super::time::{format_minutes, format_time};
use crate::domain::{Item, ItemId, ItemKind, ItemStatus};
use crate::engine::{ItemUpdate, NewItem};
use crate::storage::Project;

/// Fields for `worklog add`
pub struct AddArgs {
    pub kind: ItemKind,
    pub name: String,
    pub description: Option<String>,
    pub epic: Option<ItemId>,
    pub start: Option<NaiveDateTime>,
    pub duration: Option<i64>,
}

/// Fields for `worklog update`
pub struct UpdateArgs {
    pub id: ItemId,
    pub kind: Option<ItemKind>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ItemStatus>,
    pub start: Option<NaiveDateTime>,
    pub duration: Option<i64>,
    pub unschedule: bool,
}

fn minutes(value: Option<i64>) -> Result<Option<Duration>> {
    value
        .map(|minutes| {
            Duration::try_minutes(minutes)
                .ok_or_else(|| anyhow::anyhow!("Duration out of range: {} minutes", minutes))
        })
        .transpose()
}

pub fn add(project: &Project, output: &Output, args: AddArgs) -> Result<()> {
    let mut store = project.load_store()?;

    let request = NewItem {
        kind: args.kind,
        name: args.name,
        description: args.description.unwrap_or_default(),
        epic: args.epic,
        start_time: args.start,
        duration: minutes(args.duration)?,
    };
    let item = store.create(request)?;
    project.save_store(&store)?;

    if output.is_json() {
        output.data(&item);
    } else {
        output.success(&format!("Created {} {}: {}", item.kind(), item.id, item.name));
    }
    Ok(())
}

pub fn update(project: &Project, output: &Output, args: UpdateArgs) -> Result<()> {
    let mut store = project.load_store()?;

    let current = store
        .get(args.id)
        .ok_or_else(|| anyhow::anyhow!("Item not found: {}", args.id))?;

    let mut update = ItemUpdate::from_item(current);
    if let Some(kind) = args.kind {
        update.kind = kind;
    }
    if let Some(name) = args.name {
        update.name = name;
    }
    if let Some(description) = args.description {
        update.description = description;
    }
    update.status = args.status;
    if args.unschedule {
        update.start_time = None;
        update.duration = None;
    }
    if let Some(start) = args.start {
        update.start_time = Some(start);
    }
    if let Some(duration) = minutes(args.duration)? {
        update.duration = Some(duration);
    }

    debug!("Applying update to item {}", args.id);
    let item = store.update(update)?;
    project.save_store(&store)?;

    if output.is_json() {
        output.data(&item);
    } else {
        output.success(&format!("Updated {} {}: {}", item.kind(), item.id, item.name));
    }
    Ok(())
}

pub fn delete(project: &Project, output: &Output, id: ItemId) -> Result<()> {
    let mut store = project.load_store()?;

    let before = store.len();
    let deleted = store.delete(id);
    if deleted {
        project.save_store(&store)?;
    }
    let removed = before - store.len();

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": id,
            "deleted": deleted,
            "removed": removed,
        }));
    } else if deleted {
        output.success(&format!("Deleted item {} ({} item(s) removed)", id, removed));
    } else {
        output.success(&format!("No item with ID {}", id));
    }
    Ok(())
}

pub fn show(project: &Project, output: &Output, id: ItemId) -> Result<()> {
    let mut store = project.load_store()?;
    store.record_view(id)?;
    project.save_store(&store)?;

    let item = store
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("Item not found: {}", id))?;

    if output.is_json() {
        output.data(item);
        return Ok(());
    }

    let time_format = output.time_format();
    println!("Item: {}", item.id);
    println!("Kind: {}", item.kind());
    println!("Name: {}", item.name);
    println!("Status: {}", item.status);
    if let Some(epic) = item.epic_id() {
        println!("Epic: {}", epic);
    }
    if item.is_epic() {
        let subtasks: Vec<String> = item.subtask_ids().map(|id| id.to_string()).collect();
        if subtasks.is_empty() {
            println!("Subtasks: none");
        } else {
            println!("Subtasks: {}", subtasks.join(", "));
        }
    }
    println!("Start: {}", format_time(item.start_time, time_format));
    println!("End: {}", format_time(item.end_time(), time_format));
    println!("Duration: {}", format_minutes(item.duration));
    if !item.description.is_empty() {
        println!("\nDescription:");
        println!("{}", item.description);
    }
    Ok(())
}

pub fn list(project: &Project, output: &Output, kind: Option<ItemKind>) -> Result<()> {
    let store = project.load_store()?;
    let items = match kind {
        Some(kind) => store.list_by_kind(kind),
        None => store.list_all(),
    };

    let empty = match kind {
        Some(kind) => format!("No {}s", kind),
        None => "No items".to_string(),
    };
    print_items(output, &items, &empty);
    Ok(())
}

pub fn subtasks(project: &Project, output: &Output, epic_id: ItemId) -> Result<()> {
    let store = project.load_store()?;
    let items = store.subtasks_of(epic_id)?;
    print_items(output, &items, &format!("Epic {} has no subtasks", epic_id));
    Ok(())
}

pub fn history(project: &Project, output: &Output) -> Result<()> {
    let store = project.load_store()?;
    let entries = store.list_history();
    let items: Vec<&Item> = entries.iter().collect();
    print_items(output, &items, "No items viewed yet");
    Ok(())
}

pub fn schedule(project: &Project, output: &Output) -> Result<()> {
    let store = project.load_store()?;
    let items = store.list_schedule();
    print_items(output, &items, "Nothing scheduled");
    Ok(())
}

pub fn clear(project: &Project, output: &Output, kind: Option<ItemKind>) -> Result<()> {
    let mut store = project.load_store()?;

    let removed = match kind {
        Some(kind) => store.clear_kind(kind),
        None => {
            let removed = store.len();
            store.clear_all();
            removed
        }
    };
    project.save_store(&store)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "kind": kind,
            "removed": removed,
        }));
    } else {
        output.success(&format!("Removed {} item(s)", removed));
    }
    Ok(())
}

fn print_items(output: &Output, items: &[&Item], empty: &str) {
    if output.is_json() {
        output.data(&items);
        return;
    }
    if items.is_empty() {
        println!("{}", empty);
        return;
    }

    let time_format = output.time_format();
    println!(
        "{:<6} {:<8} {:<12} {:<17} {:<17} {:<8} NAME",
        "ID", "KIND", "STATUS", "START", "END", "DURATION"
    );
    println!("{}", "-".repeat(80));
    for item in items {
        println!(
            "{:<6} {:<8} {:<12} {:<17} {:<17} {:<8} {}",
            item.id,
            item.kind(),
            item.status,
            format_time(item.start_time, time_format),
            format_time(item.end_time(), time_format),
            format_minutes(item.duration),
            item.name
        );
    }
}
