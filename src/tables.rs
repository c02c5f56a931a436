use std::collections::BTreeMap;

use comfy_table::{Cell, CellAlignment, Table, modifiers, presets};

use crate::{core::statistic::StatisticRecord, quantity::energy::KilowattHours};

/// Final cumulative totals, one row per rule.
pub fn build_summary_table(summary: &BTreeMap<String, KilowattHours>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec!["Rule", "Total"]);
    for (name, total) in summary {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(total).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Everything a dry run would have written, one row per record.
pub fn build_records_table(series: &BTreeMap<String, Vec<StatisticRecord>>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec!["Statistic", "Start", "State", "Sum"]);
    for (statistic_id, records) in series {
        for record in records {
            table.add_row(vec![
                Cell::new(statistic_id),
                Cell::new(record.start.format("%Y-%m-%d")),
                Cell::new(format!("{:.3}", record.state)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.3}", record.sum)).set_alignment(CellAlignment::Right),
            ]);
        }
    }
    table
}
