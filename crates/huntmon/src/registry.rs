//! The hunt registry: a directory of hunt identifiers, each holding a
//! fixed-size-record treasure file and an append-only text log.
//!
//! The record layout is the on-disk contract shared with the collaborator
//! executables: little-endian numeric fields, NUL-padded strings, 1060 bytes
//! per record. Record counts are derived from file size alone, so a hunt
//! with a torn trailing write still reports only its complete records.

use std::fs;
use std::io;
use std::path::Path;

pub const USERNAME_LEN: usize = 20;
pub const CLUE_LEN: usize = 1024;
/// id + username + coordinate (2 x f32) + clue + value.
pub const RECORD_SIZE: usize = 4 + USERNAME_LEN + 8 + CLUE_LEN + 4;

pub const TREASURE_FILE: &str = "treasures.dat";
pub const LOG_FILE: &str = "log.txt";

/// One treasure entry in a hunt's record file.
#[derive(Debug, Clone, PartialEq)]
pub struct TreasureRecord {
    pub id: i32,
    pub username: String,
    pub x: f32,
    pub y: f32,
    pub clue: String,
    pub value: i32,
}

impl TreasureRecord {
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[0..4].copy_from_slice(&self.id.to_le_bytes());
        write_padded(&mut buf[4..4 + USERNAME_LEN], &self.username);
        buf[24..28].copy_from_slice(&self.x.to_le_bytes());
        buf[28..32].copy_from_slice(&self.y.to_le_bytes());
        write_padded(&mut buf[32..32 + CLUE_LEN], &self.clue);
        buf[1056..1060].copy_from_slice(&self.value.to_le_bytes());
        buf
    }

    /// Decode one record from the start of `buf`. Returns `None` when fewer
    /// than [`RECORD_SIZE`] bytes are available.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < RECORD_SIZE {
            return None;
        }
        Some(Self {
            id: i32::from_le_bytes(buf[0..4].try_into().ok()?),
            username: read_padded(&buf[4..4 + USERNAME_LEN]),
            x: f32::from_le_bytes(buf[24..28].try_into().ok()?),
            y: f32::from_le_bytes(buf[28..32].try_into().ok()?),
            clue: read_padded(&buf[32..32 + CLUE_LEN]),
            value: i32::from_le_bytes(buf[1056..1060].try_into().ok()?),
        })
    }
}

// Copies `s` into `dst`, always leaving at least the final byte as NUL.
fn write_padded(dst: &mut [u8], s: &str) {
    let mut take = s.len().min(dst.len() - 1);
    while !s.is_char_boundary(take) {
        take -= 1;
    }
    dst[..take].copy_from_slice(&s.as_bytes()[..take]);
}

fn read_padded(src: &[u8]) -> String {
    let end = src.iter().position(|b| *b == 0).unwrap_or(src.len());
    String::from_utf8_lossy(&src[..end]).into_owned()
}

/// Read every complete record in a treasure file; a trailing partial record
/// is ignored.
pub fn read_records(path: &Path) -> io::Result<Vec<TreasureRecord>> {
    let bytes = fs::read(path)?;
    Ok(bytes
        .chunks_exact(RECORD_SIZE)
        .filter_map(TreasureRecord::decode)
        .collect())
}

/// A hunt and its record count, derived from the treasure file size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuntSummary {
    pub id: String,
    pub treasures: u64,
}

/// Enumerate hunts under the registry root, sorted by identifier.
///
/// Directory entries without a readable treasure file are not hunts and are
/// skipped.
pub fn hunt_summaries(root: &Path) -> io::Result<Vec<HuntSummary>> {
    let mut hunts = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let Ok(meta) = fs::metadata(entry.path().join(TREASURE_FILE)) else {
            continue;
        };
        hunts.push(HuntSummary {
            id: entry.file_name().to_string_lossy().into_owned(),
            treasures: meta.len() / RECORD_SIZE as u64,
        });
    }
    hunts.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(hunts)
}

/// Render the `list_hunts` response body.
pub fn render_hunt_list(root: &Path) -> String {
    let mut out = String::from("=== Available Hunts ===\n");
    match hunt_summaries(root) {
        Ok(hunts) => {
            for hunt in &hunts {
                out.push_str(&format!("Hunt: {}, Treasures: {}\n", hunt.id, hunt.treasures));
            }
            out.push_str(&format!("\nTotal Hunts: {}\n", hunts.len()));
        }
        Err(err) => {
            tracing::debug!(error = %err, root = %root.display(), "hunt registry unreadable");
            out.push_str("No hunts found or error accessing directory.\n");
        }
    }
    out
}

/// Append a timestamped line to a hunt's log file.
pub fn append_hunt_log(root: &Path, hunt: &str, message: &str) -> io::Result<()> {
    use std::io::Write as _;

    let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(root.join(hunt).join(LOG_FILE))?;
    writeln!(file, "{stamp} - {message}")
}
