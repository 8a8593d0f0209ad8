//! worklog - tasks, epics and subtasks from the command line

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = worklog::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
