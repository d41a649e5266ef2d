//! Text rendering for the treasure manager's `list` and `view` reports.

use std::fmt::Write as _;

use crate::registry::TreasureRecord;

pub fn render_treasure_line(record: &TreasureRecord) -> String {
    format!(
        "ID: {}, User: {}, Coordinate: ({:.2}, {:.2}), Clue: {}, Value: {}\n",
        record.id, record.username, record.x, record.y, record.clue, record.value
    )
}

/// The `list <HuntID>` report.
pub fn render_list(
    hunt: &str,
    file_size: u64,
    modified: &str,
    records: &[TreasureRecord],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Hunt: {hunt}");
    let _ = writeln!(out, "Total treasure file size: {file_size} bytes");
    let _ = writeln!(out, "Last modified: {modified}");
    out.push_str("\nTreasures:\n");
    out.push_str("ID\tUser\tCoordinate (x, y)\tClue\tValue\n");
    out.push_str("--------------------------------------------------------\n");
    for record in records {
        out.push_str(&render_treasure_line(record));
    }
    out
}

/// The `view <HuntID> <TreasureID>` report.
pub fn render_view(hunt: &str, treasure_id: i32, records: &[TreasureRecord]) -> String {
    match records.iter().find(|r| r.id == treasure_id) {
        Some(record) => render_treasure_line(record),
        None => format!("Treasure with ID {treasure_id} not found in Hunt {hunt}.\n"),
    }
}
