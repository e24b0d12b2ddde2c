use super::row::ReportRow;
use prettytable::{row, Table};

/// Columns shown in the terminal preview, followed by the status hours.
const PREVIEW_COLUMNS: [&str; 6] = ["key", "issue_type", "current_status", "developer", "kpi_type", "status_changed_cnt"];

pub struct View {}

impl View {
    /// Prints a compact table of `rows`: identifying columns plus one column
    /// per status.
    pub fn report(rows: &[ReportRow]) {
        let statuses: Vec<String> = rows
            .first()
            .map(|first| first.status_columns().map(str::to_string).collect())
            .unwrap_or_default();
        let statuses = statuses.as_slice();

        let mut table = Table::new();
        table.set_titles(Self::titles(statuses).into_iter().collect());

        for report_row in rows {
            let cells = PREVIEW_COLUMNS
                .iter()
                .copied()
                .chain(statuses.iter().map(String::as_str))
                .map(|column| report_row.get(column).unwrap_or_default());
            table.add_row(cells.collect());
        }
        if rows.is_empty() {
            table.add_row(row!["(no rows)"]);
        }

        table.printstd();
    }

    fn titles(statuses: &[String]) -> Vec<String> {
        PREVIEW_COLUMNS
            .iter()
            .map(|column| column.to_uppercase())
            .chain(statuses.iter().cloned())
            .collect()
    }
}
