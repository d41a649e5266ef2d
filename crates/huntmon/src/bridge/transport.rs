//! Worker spawning and control channel construction.
//!
//! The control channel is the worker's stdin/stdout pair, created by the
//! spawn itself: the hub keeps the typed `ChildStdin`/`ChildStdout` handles
//! and the worker frames its own ends. Ownership of each direction is
//! explicit in the types, so there is no descriptor bookkeeping on either
//! side of the split.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio_util::codec::{FramedRead, FramedWrite};

use super::codec::{LineCodec, ReplyCodec};

/// What a spawned worker needs to know, passed on its command line.
#[derive(Debug, Clone)]
pub struct WorkerLaunchSpec {
    pub hunts_root: PathBuf,
    pub manager_bin: Option<PathBuf>,
    pub score_bin: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("failed to spawn worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("worker {0} was not captured")]
    MissingStream(&'static str),
}

/// Extension point for how the worker process is launched.
pub trait WorkerSpawner: Send + Sync {
    fn spawn(&self, spec: &WorkerLaunchSpec) -> Result<Child, SpawnError>;
}

/// Default spawner: re-exec the hub binary in monitor mode.
///
/// stdin/stdout become the control channel; stderr is inherited so worker
/// logs land next to the hub's own.
pub struct MonitorSpawner {
    program: Option<PathBuf>,
}

impl MonitorSpawner {
    pub fn new() -> Self {
        Self { program: None }
    }

    /// Use an explicit hub binary instead of the current executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: Some(program.into()),
        }
    }
}

impl Default for MonitorSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerSpawner for MonitorSpawner {
    fn spawn(&self, spec: &WorkerLaunchSpec) -> Result<Child, SpawnError> {
        let program = match &self.program {
            Some(program) => program.clone(),
            None => std::env::current_exe()?,
        };
        tracing::debug!(program = %program.display(), "spawning monitor worker");

        let mut cmd = Command::new(program);
        cmd.arg("--hunts-root").arg(&spec.hunts_root);
        if let Some(manager) = &spec.manager_bin {
            cmd.arg("--manager-bin").arg(manager);
        }
        if let Some(score) = &spec.score_bin {
            cmd.arg("--score-bin").arg(score);
        }
        cmd.arg("monitor")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        Ok(cmd.spawn()?)
    }
}

/// Hub-side ends of the control channel.
pub struct ControlChannel {
    pub commands: FramedWrite<ChildStdin, LineCodec>,
    pub replies: FramedRead<ChildStdout, ReplyCodec>,
}

impl ControlChannel {
    /// Take ownership of the channel ends from a freshly spawned worker.
    pub fn attach(child: &mut Child) -> Result<Self, SpawnError> {
        let stdin = child
            .stdin
            .take()
            .ok_or(SpawnError::MissingStream("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(SpawnError::MissingStream("stdout"))?;
        Ok(Self {
            commands: FramedWrite::new(stdin, LineCodec::new()),
            replies: FramedRead::new(stdout, ReplyCodec::new()),
        })
    }
}

/// Worker-side ends, framed over the process's own stdin/stdout.
pub fn worker_channel() -> (
    FramedRead<tokio::io::Stdin, LineCodec>,
    FramedWrite<tokio::io::Stdout, ReplyCodec>,
) {
    (
        FramedRead::new(tokio::io::stdin(), LineCodec::new()),
        FramedWrite::new(tokio::io::stdout(), ReplyCodec::new()),
    )
}
