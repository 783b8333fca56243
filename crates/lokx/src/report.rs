// ai
//! 📊 report.rs: "So... did it work?" answered in a table.
//!
//! 🍽️ Renders [`EngineStats`] with comfy-table, no borders, numbers right-aligned.

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};

use crate::supervisors::EngineStats;

/// 🎨 One row per outcome, batches and entries side by side, attempts at the bottom.
pub fn render_stats(stats: &EngineStats) -> String {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let right = |value: String| Cell::new(value).set_alignment(CellAlignment::Right);

    table.set_header(vec![Cell::new(""), right("batches".into()), right("entries".into())]);
    table.add_row(vec![
        Cell::new("✅ delivered"),
        right(stats.batches_delivered.to_string()),
        right(stats.entries_delivered.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("🗑️ dropped"),
        right(stats.batches_dropped.to_string()),
        right(stats.entries_dropped.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("📡 attempts"),
        right(stats.attempts.to_string()),
        Cell::new(""),
    ]);

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_the_numbers_make_it_into_the_table() {
        let stats = EngineStats {
            batches_delivered: 7,
            batches_dropped: 1,
            entries_delivered: 700,
            entries_dropped: 13,
            attempts: 9,
        };
        let rendered = render_stats(&stats);

        for needle in ["delivered", "dropped", "attempts", "700", "13", "9"] {
            assert!(rendered.contains(needle), "missing {needle} in:\n{rendered}");
        }
        assert_eq!(rendered.lines().filter(|line| !line.trim().is_empty()).count(), 4);
    }
}
