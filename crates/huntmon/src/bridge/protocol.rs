//! Wire protocol between the hub and the monitor worker.
//!
//! The command direction is plain text: one line per command, a verb followed
//! by whitespace-separated arguments. The response direction is framed JSON
//! ([`MonitorReply`]).

use serde::{Deserialize, Serialize};

/// Command lines longer than this are truncated before they reach the wire.
pub const MAX_COMMAND_LINE: usize = 2048;

/// Upper bound on a single reply frame. Responses grow with collaborator
/// output, so the bound is generous; anything larger is a protocol error.
pub const MAX_REPLY_FRAME: usize = 1024 * 1024;

/// Verb that asks the worker to shut down.
pub const STOP_MONITOR: &str = "stop_monitor";

/// A parsed hub command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ListHunts,
    ListTreasures { hunt: String },
    ViewTreasure { hunt: String, treasure: i32 },
    CalculateScore { hunt: String },
    StopMonitor,
}

/// Command lines the worker rejects.
///
/// The `Display` text is the exact response body the hub user sees;
/// [`CommandError::to_response`] appends the trailing newline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownVerb(String),
    #[error("Invalid command format. Use: {0}")]
    BadArguments(&'static str),
}

impl CommandError {
    pub fn to_response(&self) -> String {
        format!("{self}\n")
    }
}

impl Command {
    /// Parse one command line. Extra trailing tokens are ignored.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or("");
        match verb {
            "list_hunts" => Ok(Command::ListHunts),
            "list_treasures" => {
                let hunt = parts
                    .next()
                    .ok_or(CommandError::BadArguments("list_treasures <HuntID>"))?;
                Ok(Command::ListTreasures {
                    hunt: hunt.to_string(),
                })
            }
            "view_treasure" => {
                let usage = "view_treasure <HuntID> <TreasureID>";
                let hunt = parts.next().ok_or(CommandError::BadArguments(usage))?;
                let treasure = parts
                    .next()
                    .and_then(|t| t.parse::<i32>().ok())
                    .ok_or(CommandError::BadArguments(usage))?;
                Ok(Command::ViewTreasure {
                    hunt: hunt.to_string(),
                    treasure,
                })
            }
            "calculate_score" => {
                let hunt = parts
                    .next()
                    .ok_or(CommandError::BadArguments("calculate_score <HuntID>"))?;
                Ok(Command::CalculateScore {
                    hunt: hunt.to_string(),
                })
            }
            "stop_monitor" => Ok(Command::StopMonitor),
            _ => Err(CommandError::UnknownVerb(line.trim().to_string())),
        }
    }
}

/// Messages from the worker to the hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorReply {
    /// The response body for exactly one command.
    Output { text: String },
    /// Sent after the final response when the worker is about to exit.
    ShuttingDown,
}
