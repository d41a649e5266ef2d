//! huntmon: supervisor and interactive hub for the treasure hunt monitor.
//!
//! The hub process owns one long-lived worker (the "monitor") subprocess and
//! exchanges textual commands and framed responses with it over the worker's
//! stdin/stdout. Crash detection, deadline-bounded waits and the
//! single-command-in-flight discipline live in [`controller`]; the worker
//! side of the loop lives in [`worker`] and [`dispatch`].
//!
//! The hunt registry itself ([`registry`]) is shared with two thin
//! collaborator executables (`treasure-manager`, `treasure-score`) that the
//! worker delegates to for per-hunt reports.

pub mod bridge;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod listing;
pub mod registry;
pub mod repl;
pub mod score;
pub mod worker;

pub use controller::{Monitor, MonitorConfig, WorkerExit, WorkerState};
pub use error::MonitorError;
