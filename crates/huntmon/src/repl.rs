//! Interactive hub shell.
//!
//! Reads commands from stdin, routes them through the [`Monitor`], and
//! surfaces worker termination as soon as it happens, even while idle at the
//! prompt.

use std::io::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use crate::controller::{Monitor, WorkerExit, wait_exit};
use crate::error::MonitorError;

const BANNER: &str = "\
Treasure Hunt Hub
=================
Available commands:
  start_monitor - Start the monitor process
  list_hunts - List all available hunts
  list_treasures <HuntID> - List treasures in a hunt
  view_treasure <HuntID> <TreasureID> - View a specific treasure
  calculate_score <HuntID> - Calculate scores for a hunt
  stop_monitor - Stop the monitor process
  exit - Exit the treasure hub
";

pub async fn run(mut monitor: Monitor) -> std::io::Result<()> {
    println!("{BANNER}");
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut exit_watch = monitor.exit_watch();
        let watching = exit_watch.is_some();
        tokio::select! {
            maybe_line = lines.next_line() => {
                let Some(line) = maybe_line? else { break };
                if !handle_line(&mut monitor, line.trim()).await {
                    break;
                }
            }
            _ = watch_termination(&mut exit_watch), if watching => {
                monitor.reap();
                println!("Monitor process has terminated.");
            }
        }
    }

    if monitor.is_running() {
        println!("Stopping monitor process before exit...");
        if let Err(err) = monitor.stop().await {
            tracing::warn!(error = %err, "failed to stop worker on exit");
        }
    }
    println!("Exiting Treasure Hub.");
    Ok(())
}

/// Handle one input line. Returns `false` when the shell should exit.
async fn handle_line(monitor: &mut Monitor, line: &str) -> bool {
    if line.is_empty() {
        return true;
    }
    let verb = line.split_whitespace().next().unwrap_or("");
    match verb {
        "start_monitor" => match monitor.start() {
            Ok(pid) => println!("Monitor started with PID: {pid}"),
            Err(MonitorError::AlreadyRunning) => println!("Monitor is already running."),
            Err(err) => println!("Error: {err}"),
        },
        "list_hunts" | "list_treasures" | "view_treasure" | "calculate_score" => {
            match monitor.send_command(line).await {
                Ok(text) => print!("{text}"),
                Err(MonitorError::NotRunning) => {
                    println!("Error: Monitor is not running. Use 'start_monitor' first.");
                }
                Err(MonitorError::Timeout) => println!("Timeout waiting for monitor response."),
                Err(err) => println!("Error: {err}"),
            }
        }
        "stop_monitor" => match monitor.stop().await {
            Ok(text) => print!("{text}"),
            Err(MonitorError::NotRunning) => println!("Monitor is not running."),
            Err(err) => println!("Error: {err}"),
        },
        "exit" => return false,
        _ => println!("Unknown command: {line}"),
    }
    true
}

async fn watch_termination(
    rx: &mut Option<watch::Receiver<Option<WorkerExit>>>,
) -> WorkerExit {
    match rx {
        Some(rx) => wait_exit(rx).await,
        None => std::future::pending().await,
    }
}
