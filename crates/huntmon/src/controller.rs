//! Hub-side supervision of the monitor worker.
//!
//! The hub owns at most one worker at a time. Two independent signals feed
//! back from it: framed replies forwarded by a reader task, and process exit
//! reported by a wait task on a watch channel. `send_command` serializes
//! submissions (at most one in flight), bounds its wait with a deadline, and
//! reconciles responses abandoned by earlier timeouts before letting a new
//! command through.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::process::ChildStdin;
use tokio::sync::{mpsc, watch};
use tokio_util::codec::FramedWrite;

use crate::bridge::codec::LineCodec;
use crate::bridge::protocol::{self, MonitorReply};
use crate::bridge::transport::{
    ControlChannel, MonitorSpawner, SpawnError, WorkerLaunchSpec, WorkerSpawner,
};
use crate::error::MonitorError;

/// Lifecycle of the worker as the hub sees it.
///
/// Spawn and teardown are atomic here, so there are no observable
/// `Starting`/`Stopping` states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Stopped,
    Running,
    /// The worker terminated without being asked to.
    Crashed,
}

/// How a worker ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerExit {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl WorkerExit {
    fn from_status(status: std::process::ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;
        Self {
            code: status.code(),
            signal: status.signal(),
        }
    }

    fn unknown() -> Self {
        Self {
            code: None,
            signal: None,
        }
    }
}

impl std::fmt::Display for WorkerExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {code}"),
            (None, Some(sig)) => write!(f, "signal {sig}"),
            (None, None) => write!(f, "unknown cause"),
        }
    }
}

/// Configuration for [`Monitor`].
pub struct MonitorConfig {
    hunts_root: PathBuf,
    manager_bin: Option<PathBuf>,
    score_bin: Option<PathBuf>,
    reply_timeout: Duration,
    stop_grace: Duration,
    spawner: Arc<dyn WorkerSpawner>,
}

impl MonitorConfig {
    pub fn new(hunts_root: impl Into<PathBuf>) -> Self {
        Self {
            hunts_root: hunts_root.into(),
            manager_bin: None,
            score_bin: None,
            reply_timeout: Duration::from_secs(10),
            stop_grace: Duration::from_secs(5),
            spawner: Arc::new(MonitorSpawner::new()),
        }
    }

    pub fn with_manager_bin(mut self, path: impl Into<PathBuf>) -> Self {
        self.manager_bin = Some(path.into());
        self
    }

    pub fn with_score_bin(mut self, path: impl Into<PathBuf>) -> Self {
        self.score_bin = Some(path.into());
        self
    }

    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub fn with_spawner(mut self, spawner: Arc<dyn WorkerSpawner>) -> Self {
        self.spawner = spawner;
        self
    }
}

struct WorkerLink {
    pid: u32,
    commands: FramedWrite<ChildStdin, LineCodec>,
    replies: mpsc::Receiver<MonitorReply>,
    exit: watch::Receiver<Option<WorkerExit>>,
    /// Responses still owed for commands whose wait timed out.
    stale: usize,
    /// The worker announced a graceful shutdown.
    shutting_down: bool,
}

/// Supervises the single monitor worker process.
pub struct Monitor {
    config: MonitorConfig,
    state: WorkerState,
    link: Option<WorkerLink>,
}

impl Monitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            state: WorkerState::Stopped,
            link: None,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.link.is_some()
    }

    pub fn pid(&self) -> Option<u32> {
        self.link.as_ref().map(|link| link.pid)
    }

    /// A watch on the worker's exit, for waiting outside the command path.
    pub fn exit_watch(&self) -> Option<watch::Receiver<Option<WorkerExit>>> {
        self.link.as_ref().map(|link| link.exit.clone())
    }

    /// Start the worker. Fails if one is already running.
    pub fn start(&mut self) -> Result<u32, MonitorError> {
        self.reap();
        if self.link.is_some() {
            return Err(MonitorError::AlreadyRunning);
        }

        let spec = WorkerLaunchSpec {
            hunts_root: self.config.hunts_root.clone(),
            manager_bin: self.config.manager_bin.clone(),
            score_bin: self.config.score_bin.clone(),
        };
        let mut child = self.config.spawner.spawn(&spec)?;
        let channel = ControlChannel::attach(&mut child)?;
        let pid = child
            .id()
            .ok_or(MonitorError::Spawn(SpawnError::MissingStream("pid")))?;

        // Reader task: forward framed replies until EOF or error. The framed
        // reply arriving on this channel IS the "response ready" signal.
        let (reply_tx, reply_rx) = mpsc::channel(8);
        let mut replies = channel.replies;
        tokio::spawn(async move {
            while let Some(frame) = replies.next().await {
                match frame {
                    Ok(reply) => {
                        if reply_tx.send(reply).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "reply channel error");
                        break;
                    }
                }
            }
            tracing::debug!("reply reader exiting");
        });

        // Wait task: report process exit out of band, whether graceful or a
        // crash. Kept separate from the reply path so a wakeup here always
        // means termination, never a response.
        let (exit_tx, exit_rx) = watch::channel(None);
        tokio::spawn(async move {
            let exit = match child.wait().await {
                Ok(status) => WorkerExit::from_status(status),
                Err(err) => {
                    tracing::error!(error = %err, "failed to wait for worker");
                    WorkerExit::unknown()
                }
            };
            let _ = exit_tx.send(Some(exit));
        });

        self.link = Some(WorkerLink {
            pid,
            commands: channel.commands,
            replies: reply_rx,
            exit: exit_rx,
            stale: 0,
            shutting_down: false,
        });
        self.state = WorkerState::Running;
        tracing::info!(pid, "monitor worker started");
        Ok(pid)
    }

    /// Submit one command and wait (bounded) for its response.
    pub async fn send_command(&mut self, line: &str) -> Result<String, MonitorError> {
        self.reap();
        let Some(link) = self.link.as_mut() else {
            return Err(MonitorError::NotRunning);
        };

        // Reconcile responses abandoned by earlier timeouts: drain whatever
        // has arrived, refuse to interleave with what is still owed.
        while link.stale > 0 {
            match link.replies.try_recv() {
                Ok(reply) => {
                    tracing::warn!(?reply, "discarding response from a timed-out command");
                    link.stale -= 1;
                }
                Err(mpsc::error::TryRecvError::Empty) => {
                    return Err(MonitorError::CommandPending);
                }
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    return Err(self.teardown_crashed());
                }
            }
        }

        link.commands
            .send(line.to_string())
            .await
            .map_err(MonitorError::Channel)?;

        let mut exit = link.exit.clone();
        let replies = &mut link.replies;
        let shutting_down = &mut link.shutting_down;
        let wait = async {
            loop {
                tokio::select! {
                    reply = replies.recv() => match reply {
                        Some(MonitorReply::Output { text }) => break Ok(text),
                        Some(MonitorReply::ShuttingDown) => *shutting_down = true,
                        None => break Err(()),
                    },
                    _ = wait_exit(&mut exit) => break Err(()),
                }
            }
        };

        match tokio::time::timeout(self.config.reply_timeout, wait).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(())) => Err(self.teardown_crashed()),
            Err(_elapsed) => {
                if let Some(link) = self.link.as_mut() {
                    link.stale += 1;
                }
                tracing::warn!(command = %line, "timed out waiting for monitor response");
                Err(MonitorError::Timeout)
            }
        }
    }

    /// Graceful stop: ask the worker to shut down, wait for its final
    /// response and its exit, and escalate to SIGKILL if it lingers.
    pub async fn stop(&mut self) -> Result<String, MonitorError> {
        self.reap();
        let Some(link) = self.link.as_mut() else {
            return Err(MonitorError::NotRunning);
        };

        let mut stale = link.stale;
        link.stale = 0;

        let mut ack = None;
        match link.commands.send(protocol::STOP_MONITOR.to_string()).await {
            Ok(()) => {
                let replies = &mut link.replies;
                let shutting_down = &mut link.shutting_down;
                let wait_ack = async {
                    loop {
                        match replies.recv().await {
                            Some(MonitorReply::Output { text }) => {
                                if stale > 0 {
                                    tracing::warn!(
                                        "discarding response from a timed-out command during stop"
                                    );
                                    stale -= 1;
                                } else {
                                    break Some(text);
                                }
                            }
                            Some(MonitorReply::ShuttingDown) => *shutting_down = true,
                            None => break None,
                        }
                    }
                };
                ack = tokio::time::timeout(self.config.reply_timeout, wait_ack)
                    .await
                    .ok()
                    .flatten();
                if ack.is_none() {
                    tracing::warn!("worker did not acknowledge stop");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to send stop command, escalating");
            }
        }

        // Operator-initiated: however the process ends now, it is a stop.
        link.shutting_down = true;
        let pid = link.pid;
        let mut exit = link.exit.clone();
        let grace = self.config.stop_grace;
        if tokio::time::timeout(grace, wait_exit(&mut exit)).await.is_err() {
            tracing::warn!(pid, "worker did not exit in time, sending SIGKILL");
            let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
            let _ = tokio::time::timeout(grace, wait_exit(&mut exit)).await;
        }

        self.reap();
        // The wait task may have died without reporting; never keep a link to
        // a worker we just killed.
        self.link = None;
        self.state = WorkerState::Stopped;
        Ok(ack.unwrap_or_else(|| String::from("Monitor did not acknowledge stop; terminated.\n")))
    }

    /// Absorb an exit notice if one is pending. Returns the exit when the
    /// worker is gone and the link was torn down.
    pub fn reap(&mut self) -> Option<WorkerExit> {
        let link = self.link.as_mut()?;
        let exit = (*link.exit.borrow())?;

        let mut graceful = link.shutting_down;
        while let Ok(reply) = link.replies.try_recv() {
            match reply {
                MonitorReply::ShuttingDown => graceful = true,
                other => {
                    tracing::warn!(?other, "discarding response from terminated worker");
                }
            }
        }

        self.link = None;
        if graceful {
            tracing::info!(%exit, "monitor worker stopped");
            self.state = WorkerState::Stopped;
        } else {
            tracing::warn!(%exit, "monitor worker terminated unexpectedly");
            self.state = WorkerState::Crashed;
        }
        Some(exit)
    }

    /// Tear down after the channel died underneath a command.
    fn teardown_crashed(&mut self) -> MonitorError {
        let exit = self
            .link
            .as_ref()
            .and_then(|link| *link.exit.borrow())
            .unwrap_or_else(WorkerExit::unknown);
        let graceful = self
            .link
            .as_ref()
            .map(|link| link.shutting_down)
            .unwrap_or(false);

        self.link = None;
        if graceful {
            tracing::info!(%exit, "monitor worker stopped");
            self.state = WorkerState::Stopped;
            MonitorError::NotRunning
        } else {
            tracing::warn!(%exit, "monitor worker terminated unexpectedly");
            self.state = WorkerState::Crashed;
            MonitorError::Crashed(exit)
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        if let Some(link) = &self.link {
            tracing::debug!(pid = link.pid, "killing worker on drop");
            let _ = signal::kill(Pid::from_raw(link.pid as i32), Signal::SIGKILL);
        }
    }
}

/// Wait until the worker's exit has been reported.
pub async fn wait_exit(rx: &mut watch::Receiver<Option<WorkerExit>>) -> WorkerExit {
    loop {
        if let Some(exit) = *rx.borrow() {
            return exit;
        }
        if rx.changed().await.is_err() {
            // The wait task is gone without reporting; treat as terminated.
            return WorkerExit::unknown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_command_while_stopped_is_rejected() {
        let mut monitor = Monitor::new(MonitorConfig::new("Hunts"));
        let err = monitor.send_command("list_hunts").await.unwrap_err();
        assert!(matches!(err, MonitorError::NotRunning));
        assert_eq!(monitor.state(), WorkerState::Stopped);
    }

    #[tokio::test]
    async fn stop_while_stopped_is_rejected() {
        let mut monitor = Monitor::new(MonitorConfig::new("Hunts"));
        let err = monitor.stop().await.unwrap_err();
        assert!(matches!(err, MonitorError::NotRunning));
    }

    #[test]
    fn config_defaults() {
        let config = MonitorConfig::new("Hunts");
        assert_eq!(config.reply_timeout, Duration::from_secs(10));
        assert_eq!(config.stop_grace, Duration::from_secs(5));
        assert!(config.manager_bin.is_none());
        assert!(config.score_bin.is_none());
    }

    #[test]
    fn worker_exit_display() {
        let exit = WorkerExit {
            code: Some(0),
            signal: None,
        };
        assert_eq!(exit.to_string(), "exit code 0");

        let killed = WorkerExit {
            code: None,
            signal: Some(9),
        };
        assert_eq!(killed.to_string(), "signal 9");

        assert_eq!(WorkerExit::unknown().to_string(), "unknown cause");
    }
}
