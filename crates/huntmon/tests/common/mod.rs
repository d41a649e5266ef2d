//! Shared fixtures for the end-to-end tests: tempdir hunt registries, fake
//! collaborator scripts, and a monitor configured to spawn the real hub
//! binary in worker mode.

// Not every test binary uses every fixture.
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use huntmon::bridge::transport::MonitorSpawner;
use huntmon::controller::MonitorConfig;
use huntmon::registry::{TREASURE_FILE, TreasureRecord};

pub fn hub_binary() -> &'static str {
    env!("CARGO_BIN_EXE_huntmon")
}

pub fn score_binary() -> &'static str {
    env!("CARGO_BIN_EXE_treasure-score")
}

pub fn manager_binary() -> &'static str {
    env!("CARGO_BIN_EXE_treasure-manager")
}

/// A monitor wired to spawn the real hub binary in worker mode.
pub fn monitor_config(root: &Path) -> MonitorConfig {
    MonitorConfig::new(root)
        .with_spawner(Arc::new(MonitorSpawner::with_program(hub_binary())))
        .with_reply_timeout(Duration::from_secs(10))
        .with_stop_grace(Duration::from_secs(5))
}

pub fn record(id: i32, username: &str, value: i32) -> TreasureRecord {
    TreasureRecord {
        id,
        username: username.to_string(),
        x: 45.75,
        y: 21.22,
        clue: format!("clue {id}"),
        value,
    }
}

pub fn write_hunt(root: &Path, hunt: &str, records: &[TreasureRecord]) {
    let dir = root.join(hunt);
    fs::create_dir_all(&dir).unwrap();
    let mut bytes = Vec::new();
    for record in records {
        bytes.extend_from_slice(&record.encode());
    }
    fs::write(dir.join(TREASURE_FILE), bytes).unwrap();
}

/// Drop an executable shell script into `dir` to stand in for a collaborator.
pub fn fake_tool(dir: &Path, name: &str, script: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}
