//! Per-user score aggregation for a hunt.
//!
//! Used by the `treasure-score` collaborator: accumulate every record's
//! value per user, then rank descending by total.

use std::fmt::Write as _;

/// Accumulated standing for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserScore {
    pub username: String,
    pub total_value: i64,
    pub treasure_count: u64,
}

/// Accumulates treasure values per user.
///
/// First-seen order is preserved so the final ranking is stable for equal
/// totals.
#[derive(Debug, Default)]
pub struct ScoreBoard {
    scores: Vec<UserScore>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, username: &str, value: i32) {
        if let Some(entry) = self.scores.iter_mut().find(|s| s.username == username) {
            entry.total_value += i64::from(value);
            entry.treasure_count += 1;
        } else {
            self.scores.push(UserScore {
                username: username.to_string(),
                total_value: i64::from(value),
                treasure_count: 1,
            });
        }
    }

    /// Users ranked by total value, descending; ties keep first-seen order.
    pub fn into_ranked(mut self) -> Vec<UserScore> {
        self.scores
            .sort_by(|a, b| b.total_value.cmp(&a.total_value));
        self.scores
    }
}

/// Render the score report exactly as the score tool prints it.
pub fn render_report(hunt: &str, ranked: &[UserScore]) -> String {
    let mut out = format!("=== Score Report for Hunt {hunt} ===\n\n");
    if ranked.is_empty() {
        out.push_str("No treasures found in this hunt.\n");
        return out;
    }
    out.push_str("User Rankings:\n");
    let _ = writeln!(
        out,
        "{:<20} {:<15} {:<15}",
        "Username", "Total Value", "# of Treasures"
    );
    out.push_str("------------------------------------------------\n");
    for score in ranked {
        let _ = writeln!(
            out,
            "{:<20} {:<15} {:<15}",
            score.username, score.total_value, score.treasure_count
        );
    }
    let _ = writeln!(out, "\nTotal Users: {}", ranked.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_accumulate_per_user() {
        let mut board = ScoreBoard::new();
        board.record("alice", 10);
        board.record("bob", 30);
        board.record("alice", 10);

        let ranked = board.into_ranked();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].username, "bob");
        assert_eq!(ranked[0].total_value, 30);
        assert_eq!(ranked[0].treasure_count, 1);
        assert_eq!(ranked[1].username, "alice");
        assert_eq!(ranked[1].total_value, 20);
        assert_eq!(ranked[1].treasure_count, 2);
    }

    #[test]
    fn equal_totals_keep_first_seen_order() {
        let mut board = ScoreBoard::new();
        board.record("carol", 15);
        board.record("dave", 15);

        let ranked = board.into_ranked();
        assert_eq!(ranked[0].username, "carol");
        assert_eq!(ranked[1].username, "dave");
    }

    #[test]
    fn report_for_empty_hunt() {
        assert_eq!(
            render_report("Hunt002", &[]),
            "=== Score Report for Hunt Hunt002 ===\n\nNo treasures found in this hunt.\n"
        );
    }

    #[test]
    fn report_lists_rankings_in_order() {
        let ranked = vec![
            UserScore {
                username: "bob".to_string(),
                total_value: 30,
                treasure_count: 1,
            },
            UserScore {
                username: "alice".to_string(),
                total_value: 20,
                treasure_count: 2,
            },
        ];
        let report = render_report("Hunt001", &ranked);

        assert!(report.starts_with("=== Score Report for Hunt Hunt001 ===\n\n"));
        assert!(report.contains("User Rankings:\n"));
        let bob = report.find("bob").unwrap();
        let alice = report.find("alice").unwrap();
        assert!(bob < alice);
        assert!(report.ends_with("\nTotal Users: 2\n"));
    }
}
