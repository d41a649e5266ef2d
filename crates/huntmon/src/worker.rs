//! The monitor worker: a single-threaded command loop over the control
//! channel.
//!
//! One command in, one response out; no queueing, no internal concurrency.
//! While a collaborator subprocess runs the loop is blocked, which is the
//! at-most-one-in-flight contract the hub enforces on its side. The loop
//! ends on `stop_monitor`, on a channel error, or when the hub closes its
//! end of the channel.

use std::io;
use std::path::PathBuf;

use futures::{SinkExt, StreamExt};

use crate::bridge::protocol::MonitorReply;
use crate::bridge::transport::worker_channel;
use crate::dispatch::CommandDispatcher;

/// Worker-side configuration, decoded from the monitor subcommand's argv.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub hunts_root: PathBuf,
    pub manager_bin: Option<PathBuf>,
    pub score_bin: Option<PathBuf>,
}

/// Run the monitor loop until `stop_monitor` or the hub goes away.
pub async fn run_monitor(opts: WorkerOptions) -> io::Result<()> {
    let (mut commands, mut replies) = worker_channel();
    let dispatcher = CommandDispatcher::new(opts.hunts_root, opts.manager_bin, opts.score_bin);

    tracing::info!(pid = std::process::id(), "monitor started");

    loop {
        match commands.next().await {
            Some(Ok(line)) => {
                if line.trim().is_empty() {
                    // A wakeup with no command yet; keep waiting.
                    tracing::trace!("empty command line ignored");
                    continue;
                }
                tracing::debug!(command = %line, "dispatching");
                let outcome = dispatcher.dispatch(&line).await;
                replies
                    .send(MonitorReply::Output { text: outcome.text })
                    .await?;
                if outcome.shutdown {
                    replies.send(MonitorReply::ShuttingDown).await?;
                    break;
                }
            }
            Some(Err(err)) => {
                tracing::error!(error = %err, "control channel read failed");
                return Err(err);
            }
            None => {
                tracing::info!("control channel closed, exiting");
                break;
            }
        }
    }

    tracing::info!("monitor exiting");
    Ok(())
}
