//! Collaborator executable: ranked per-user score report for one hunt.
//!
//! Invoked by the monitor worker for `calculate_score`; the ranking (stable,
//! descending by total value) lives in `huntmon::score`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use huntmon::registry::{self, TREASURE_FILE};
use huntmon::score::{ScoreBoard, render_report};

#[derive(Debug, Parser)]
#[command(name = "treasure-score", version)]
struct Cli {
    /// Hunt to score.
    hunt_id: String,

    /// Directory holding the hunt registry.
    #[arg(long, default_value = "Hunts")]
    hunts_root: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    run(&cli.hunts_root, &cli.hunt_id)
}

fn run(root: &Path, hunt_id: &str) -> ExitCode {
    if !hunt_id.starts_with("Hunt") {
        println!("Invalid hunt ID format. Hunt ID should start with 'Hunt'.");
        return ExitCode::FAILURE;
    }

    let hunt_dir = root.join(hunt_id);
    if !hunt_dir.is_dir() {
        println!("Hunt {hunt_id} does not exist.");
        return ExitCode::FAILURE;
    }

    let records = match registry::read_records(&hunt_dir.join(TREASURE_FILE)) {
        Ok(records) => records,
        Err(_) => {
            println!("Error: Could not open treasures file for hunt {hunt_id}.");
            return ExitCode::FAILURE;
        }
    };

    let mut board = ScoreBoard::new();
    for record in &records {
        board.record(&record.username, record.value);
    }
    print!("{}", render_report(hunt_id, &board.into_ranked()));

    if let Err(err) = registry::append_hunt_log(
        root,
        hunt_id,
        &format!("Calculated scores for hunt {hunt_id}."),
    ) {
        eprintln!("Warning: could not update hunt log: {err}");
    }
    ExitCode::SUCCESS
}
