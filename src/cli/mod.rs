//! # Command-Line Interface
//!
//! User-facing commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `init` | Create `.worklog/` in a directory |
//! | `add`, `update`, `delete` | Change items |
//! | `show` | Item details; records a view |
//! | `list`, `subtasks` | Browse items |
//! | `history`, `schedule` | The two derived indexes |
//! | `clear` | Bulk delete, optionally by kind |
//!
//! ## Output Formats
//!
//! All commands support the `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug logging on stderr:
//! ```bash
//! worklog --verbose schedule
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod item;
mod output;
mod time;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
pub use time::{parse_time, TimeParseError};
