//! Collaborator executable: read-only views over a hunt's treasure records.
//!
//! Invoked by the monitor worker for `list_treasures` and `view_treasure`;
//! everything it prints to stdout becomes the hub response verbatim.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use huntmon::listing;
use huntmon::registry::{self, TREASURE_FILE};

#[derive(Debug, Parser)]
#[command(name = "treasure-manager", version)]
struct Cli {
    #[command(subcommand)]
    action: Action,

    /// Directory holding the hunt registry.
    #[arg(long, default_value = "Hunts", global = true)]
    hunts_root: PathBuf,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// List every treasure recorded in a hunt.
    List { hunt_id: String },
    /// Show a single treasure by id.
    View { hunt_id: String, treasure_id: i32 },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.action {
        Action::List { hunt_id } => list(&cli.hunts_root, &hunt_id),
        Action::View {
            hunt_id,
            treasure_id,
        } => view(&cli.hunts_root, &hunt_id, treasure_id),
    }
}

fn list(root: &Path, hunt_id: &str) -> ExitCode {
    let hunt_dir = root.join(hunt_id);
    if !hunt_dir.is_dir() {
        println!("Hunt directory does not exist.");
        return ExitCode::FAILURE;
    }

    let treasure_path = hunt_dir.join(TREASURE_FILE);
    let (Ok(meta), Ok(records)) = (
        std::fs::metadata(&treasure_path),
        registry::read_records(&treasure_path),
    ) else {
        println!("Error: Could not open treasures file for hunt {hunt_id}.");
        return ExitCode::FAILURE;
    };

    let modified = meta
        .modified()
        .map(|time| {
            chrono::DateTime::<chrono::Local>::from(time)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|_| String::from("unknown"));

    print!(
        "{}",
        listing::render_list(hunt_id, meta.len(), &modified, &records)
    );
    log_action(root, hunt_id, "Listed treasures.");
    ExitCode::SUCCESS
}

fn view(root: &Path, hunt_id: &str, treasure_id: i32) -> ExitCode {
    let hunt_dir = root.join(hunt_id);
    if !hunt_dir.is_dir() {
        println!("Hunt directory does not exist or cannot be accessed.");
        return ExitCode::FAILURE;
    }

    let records = match registry::read_records(&hunt_dir.join(TREASURE_FILE)) {
        Ok(records) => records,
        Err(_) => {
            println!("Error: Could not open treasures file for hunt {hunt_id}.");
            return ExitCode::FAILURE;
        }
    };

    print!("{}", listing::render_view(hunt_id, treasure_id, &records));
    log_action(root, hunt_id, &format!("Viewed treasure {treasure_id}."));
    ExitCode::SUCCESS
}

fn log_action(root: &Path, hunt_id: &str, message: &str) {
    if let Err(err) = registry::append_hunt_log(root, hunt_id, message) {
        eprintln!("Warning: could not update hunt log: {err}");
    }
}
