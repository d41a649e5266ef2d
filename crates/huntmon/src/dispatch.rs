//! Command dispatch inside the monitor worker.
//!
//! `list_hunts` is answered in-process from the registry; the per-hunt
//! reports delegate to the collaborator executables. Collaborator failures
//! never fail the worker: they are folded into response text.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tokio::process::Command as ProcessCommand;

use crate::bridge::protocol::Command;
use crate::registry;

/// What one dispatched command produced.
#[derive(Debug)]
pub struct Dispatched {
    pub text: String,
    /// Set for `stop_monitor`: the worker sends the response and exits.
    pub shutdown: bool,
}

impl Dispatched {
    fn reply(text: String) -> Self {
        Self {
            text,
            shutdown: false,
        }
    }
}

/// Maps command verbs to handlers.
pub struct CommandDispatcher {
    hunts_root: PathBuf,
    manager_bin: PathBuf,
    score_bin: PathBuf,
}

impl CommandDispatcher {
    pub fn new(
        hunts_root: PathBuf,
        manager_bin: Option<PathBuf>,
        score_bin: Option<PathBuf>,
    ) -> Self {
        Self {
            hunts_root,
            manager_bin: manager_bin.unwrap_or_else(|| sibling_tool("treasure-manager")),
            score_bin: score_bin.unwrap_or_else(|| sibling_tool("treasure-score")),
        }
    }

    pub async fn dispatch(&self, line: &str) -> Dispatched {
        match Command::parse(line) {
            Ok(Command::ListHunts) => {
                Dispatched::reply(registry::render_hunt_list(&self.hunts_root))
            }
            Ok(Command::ListTreasures { hunt }) => {
                Dispatched::reply(self.delegate(&self.manager_bin, &["list", &hunt]).await)
            }
            Ok(Command::ViewTreasure { hunt, treasure }) => Dispatched::reply(
                self.delegate(&self.manager_bin, &["view", &hunt, &treasure.to_string()])
                    .await,
            ),
            Ok(Command::CalculateScore { hunt }) => {
                Dispatched::reply(self.delegate(&self.score_bin, &[hunt.as_str()]).await)
            }
            Ok(Command::StopMonitor) => Dispatched {
                text: "Monitor process stopping...\n".to_string(),
                shutdown: true,
            },
            Err(err) => Dispatched::reply(err.to_response()),
        }
    }

    /// Run a collaborator executable to completion and fold its output and
    /// exit status into response text.
    async fn delegate(&self, program: &Path, args: &[&str]) -> String {
        tracing::debug!(program = %program.display(), ?args, "delegating to collaborator");
        let result = ProcessCommand::new(program)
            .args(args)
            .arg("--hunts-root")
            .arg(&self.hunts_root)
            .output()
            .await;
        match result {
            Ok(output) => {
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                if !output.status.success() {
                    tracing::warn!(
                        program = %program.display(),
                        status = %output.status,
                        "collaborator failed"
                    );
                    let _ = writeln!(
                        text,
                        "Command failed: {} ({})",
                        program.display(),
                        output.status
                    );
                }
                text
            }
            Err(err) => format!("Error executing command: {err}\n"),
        }
    }
}

/// Resolve a collaborator next to the running binary, falling back to PATH.
fn sibling_tool(name: &str) -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(name)))
        .filter(|path| path.is_file())
        .unwrap_or_else(|| PathBuf::from(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher_with_tools(tool: &str) -> CommandDispatcher {
        CommandDispatcher::new(
            PathBuf::from("/nonexistent-registry"),
            Some(PathBuf::from(tool)),
            Some(PathBuf::from(tool)),
        )
    }

    #[tokio::test]
    async fn unknown_verb_is_echoed() {
        let dispatcher = dispatcher_with_tools("/bin/echo");
        let out = dispatcher.dispatch("frobnicate").await;
        assert_eq!(out.text, "Unknown command: frobnicate\n");
        assert!(!out.shutdown);
    }

    #[tokio::test]
    async fn malformed_arguments_report_usage() {
        let dispatcher = dispatcher_with_tools("/bin/echo");
        let out = dispatcher.dispatch("view_treasure Hunt001").await;
        assert_eq!(
            out.text,
            "Invalid command format. Use: view_treasure <HuntID> <TreasureID>\n"
        );
    }

    #[tokio::test]
    async fn stop_monitor_requests_shutdown() {
        let dispatcher = dispatcher_with_tools("/bin/echo");
        let out = dispatcher.dispatch("stop_monitor").await;
        assert_eq!(out.text, "Monitor process stopping...\n");
        assert!(out.shutdown);
    }

    #[tokio::test]
    async fn delegate_output_is_captured_verbatim() {
        let dispatcher = dispatcher_with_tools("/bin/echo");
        let out = dispatcher.dispatch("list_treasures Hunt001").await;
        assert!(out.text.starts_with("list Hunt001"), "got: {}", out.text);
    }

    #[tokio::test]
    async fn failed_delegate_appends_a_failure_line() {
        let dispatcher = dispatcher_with_tools("/bin/false");
        let out = dispatcher.dispatch("calculate_score Hunt001").await;
        assert!(out.text.contains("Command failed:"), "got: {}", out.text);
    }

    #[tokio::test]
    async fn missing_delegate_is_reported_as_text() {
        let dispatcher = dispatcher_with_tools("/nonexistent/tool");
        let out = dispatcher.dispatch("calculate_score Hunt001").await;
        assert!(
            out.text.starts_with("Error executing command:"),
            "got: {}",
            out.text
        );
    }
}
