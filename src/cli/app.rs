//! Main CLI application structure

use anyhow::Result;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use log::debug;

use super::item::{self, AddArgs, UpdateArgs};
use super::output::{Output, OutputFormat};
use super::time::parse_time;
use crate::domain::{ItemId, ItemKind, ItemStatus};
use crate::logging;
use crate::storage::{Config, Project, DEFAULT_TIME_FORMAT};

#[derive(Parser)]
#[command(name = "worklog")]
#[command(author, version, about = "Tasks, epics and subtasks with a view history and a non-overlapping schedule")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new worklog project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Create a task, epic or subtask
    ///
    /// Examples:
    ///   worklog add task "Make tea" --start "2025-05-14 11:00" --duration 10
    ///   worklog add epic "Move house"
    ///   worklog add subtask "Pack boxes" --epic 2
    Add {
        /// Item kind: task, epic or subtask
        kind: ItemKind,

        /// Item name
        name: String,

        /// Longer description
        #[arg(long, short)]
        description: Option<String>,

        /// Epic the subtask belongs to
        #[arg(long)]
        epic: Option<ItemId>,

        /// Start time (YYYY-MM-DD HH:MM, YYYY-MM-DDTHH:MM[:SS] or DD.MM.YYYY HH:MM)
        #[arg(long, value_parser = parse_time)]
        start: Option<NaiveDateTime>,

        /// Duration in minutes
        #[arg(long, allow_negative_numbers = true)]
        duration: Option<i64>,
    },

    /// Change an existing item
    Update {
        /// Item ID
        id: ItemId,

        /// Kind the item is expected to have
        #[arg(long)]
        kind: Option<ItemKind>,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(long, short)]
        description: Option<String>,

        /// New status: new, in_progress or done (not allowed for epics)
        #[arg(long)]
        status: Option<ItemStatus>,

        /// New start time
        #[arg(long, value_parser = parse_time)]
        start: Option<NaiveDateTime>,

        /// New duration in minutes
        #[arg(long, allow_negative_numbers = true)]
        duration: Option<i64>,

        /// Remove the item from the schedule
        #[arg(long, conflicts_with_all = ["start", "duration"])]
        unschedule: bool,
    },

    /// Delete an item (an epic takes its subtasks with it)
    Delete {
        /// Item ID
        id: ItemId,
    },

    /// Show item details and record the view in the history
    Show {
        /// Item ID
        id: ItemId,
    },

    /// List items
    List {
        /// Only list items of this kind
        #[arg(long)]
        kind: Option<ItemKind>,
    },

    /// List the subtasks of an epic
    Subtasks {
        /// Epic ID
        epic: ItemId,
    },

    /// Show recently viewed items, oldest first
    History,

    /// Show scheduled items in start order
    Schedule,

    /// Delete all items, or all items of one kind
    Clear {
        /// Only delete items of this kind
        #[arg(long)]
        kind: Option<ItemKind>,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose)?;

    if let Commands::Init { path } = &cli.command {
        let format = match cli.format {
            Some(format) => format,
            None => Config::load_global()?.default_format.into(),
        };
        let output = Output::new(format, DEFAULT_TIME_FORMAT);
        let project = Project::init(path)?;
        debug!("Created data directory at {}", project.data_dir().display());
        output.success(&format!(
            "Initialized worklog project at {}",
            project.root().display()
        ));
        return Ok(());
    }

    let project = Project::open_current()?;
    let config = project.config();
    let format = cli
        .format
        .unwrap_or_else(|| config.global.default_format.into());
    debug!("worklog starting with {:?} output", format);
    let output = Output::new(format, config.project.time_format.clone());

    match cli.command {
        Commands::Init { .. } => {}

        Commands::Add {
            kind,
            name,
            description,
            epic,
            start,
            duration,
        } => item::add(
            &project,
            &output,
            AddArgs {
                kind,
                name,
                description,
                epic,
                start,
                duration,
            },
        )?,

        Commands::Update {
            id,
            kind,
            name,
            description,
            status,
            start,
            duration,
            unschedule,
        } => item::update(
            &project,
            &output,
            UpdateArgs {
                id,
                kind,
                name,
                description,
                status,
                start,
                duration,
                unschedule,
            },
        )?,

        Commands::Delete { id } => item::delete(&project, &output, id)?,
        Commands::Show { id } => item::show(&project, &output, id)?,
        Commands::List { kind } => item::list(&project, &output, kind)?,
        Commands::Subtasks { epic } => item::subtasks(&project, &output, epic)?,
        Commands::History => item::history(&project, &output)?,
        Commands::Schedule => item::schedule(&project, &output)?,
        Commands::Clear { kind } => item::clear(&project, &output, kind)?,
    }

    debug!("Command completed successfully");
    Ok(())
}
