use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use huntmon::controller::{Monitor, MonitorConfig};
use huntmon::repl;
use huntmon::worker::{self, WorkerOptions};

/// Interactive hub supervising the treasure hunt monitor process.
#[derive(Debug, Parser)]
#[command(name = "huntmon", version)]
struct Cli {
    /// Directory holding the hunt registry.
    #[arg(long, default_value = "Hunts")]
    hunts_root: PathBuf,

    /// Seconds to wait for a monitor response before giving up.
    #[arg(long, default_value_t = 10)]
    reply_timeout_secs: u64,

    /// Treasure manager executable (defaults to a sibling of this binary).
    #[arg(long)]
    manager_bin: Option<PathBuf>,

    /// Score calculator executable (defaults to a sibling of this binary).
    #[arg(long)]
    score_bin: Option<PathBuf>,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Run the monitor worker loop. Spawned internally by the hub.
    #[command(hide = true)]
    Monitor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.mode {
        Some(Mode::Monitor) => worker::run_monitor(WorkerOptions {
            hunts_root: cli.hunts_root,
            manager_bin: cli.manager_bin,
            score_bin: cli.score_bin,
        })
        .await
        .context("monitor loop failed")?,
        None => {
            let mut config = MonitorConfig::new(cli.hunts_root)
                .with_reply_timeout(Duration::from_secs(cli.reply_timeout_secs));
            if let Some(manager) = cli.manager_bin {
                config = config.with_manager_bin(manager);
            }
            if let Some(score) = cli.score_bin {
                config = config.with_score_bin(score);
            }
            repl::run(Monitor::new(config))
                .await
                .context("hub shell failed")?;
        }
    }

    Ok(())
}
