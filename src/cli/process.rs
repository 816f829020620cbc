//! Process commands: put, list, show, delete.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Subcommand;

use verdict::model::ProcessDefinition;
use verdict::storage::{ProcessStore, Storage};

use super::print_json;

#[derive(Debug, Subcommand)]
pub enum ProcessCommand {
    /// Validate a process definition and store it. Prints the process ID.
    ///
    /// Replaces any existing process with the same id. Generated definitions
    /// get no special treatment: they are validated like any other.
    Put {
        /// Process definition JSON file.
        file: PathBuf,
    },

    /// List processes.
    List,

    /// Print a process definition as JSON.
    Show {
        /// Process ID.
        id: String,
    },

    /// Delete a process. Requests already submitted against it are kept.
    Delete {
        /// Process ID.
        id: String,
    },
}

pub(super) fn run(storage: &Storage, command: ProcessCommand) -> Result<(), String> {
    match command {
        ProcessCommand::Put { file } => cmd_put(storage, &file),
        ProcessCommand::List => cmd_list(storage),
        ProcessCommand::Show { id } => {
            let process = storage
                .get_process(&id)
                .map_err(|e| format!("failed to load process: {e}"))?;
            print_json(&process)
        }
        ProcessCommand::Delete { id } => {
            storage
                .delete_process(&id)
                .map_err(|e| format!("failed to delete process: {e}"))?;
            eprintln!("Process {id} deleted");
            Ok(())
        }
    }
}

fn cmd_put(storage: &Storage, file: &Path) -> Result<(), String> {
    let json = fs::read_to_string(file)
        .map_err(|e| format!("failed to read {}: {e}", file.display()))?;
    let process: ProcessDefinition = serde_json::from_str(&json)
        .map_err(|e| format!("invalid process definition in {}: {e}", file.display()))?;

    storage
        .put_process(&process)
        .map_err(|e| format!("failed to store process: {e}"))?;

    println!("{}", process.id);
    Ok(())
}

fn cmd_list(storage: &Storage) -> Result<(), String> {
    let processes = storage
        .list_processes()
        .map_err(|e| format!("failed to list processes: {e}"))?;

    if processes.is_empty() {
        println!("No processes");
        return Ok(());
    }

    for p in &processes {
        println!(
            "{}  {}  ({} fields, {} policies)",
            p.id,
            p.name,
            p.fields.len(),
            p.policies.len()
        );
    }

    Ok(())
}
