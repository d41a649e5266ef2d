//! Error taxonomy for the hub.

use crate::bridge::transport::SpawnError;
use crate::controller::WorkerExit;

/// Failures surfaced by [`crate::Monitor`].
///
/// Worker-side dispatch problems (bad verbs, collaborator failures) are
/// never errors here; they come back to the caller as response text.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("monitor is already running")]
    AlreadyRunning,
    #[error("monitor is not running")]
    NotRunning,
    #[error("a command is still pending; its response has not arrived yet")]
    CommandPending,
    #[error("timed out waiting for monitor response")]
    Timeout,
    #[error("monitor terminated unexpectedly ({0})")]
    Crashed(WorkerExit),
    #[error("control channel error: {0}")]
    Channel(#[from] std::io::Error),
    #[error(transparent)]
    Spawn(#[from] SpawnError),
}
