//! Tabular sink for report rows.
//!
//! Writes a batch of [`ReportRow`]s to a single self-describing file. The
//! header is taken from the first row and every other row must carry the
//! same columns in the same order; a mismatch is rejected before anything is
//! written.
//!
//! ## Formats
//!
//! - **CSV**: header row first, one record per issue.
//! - **JSON**: pretty-printed array of objects, keys in column order.
//! - **Excel**: one worksheet, bold header, auto-fitted columns.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use jira_kpi::libs::export::{Exporter, ExportFormat};
//! use jira_kpi::libs::row::ReportRow;
//!
//! let rows: Vec<ReportRow> = Vec::new();
//! let exporter = Exporter::new(ExportFormat::Csv, None);
//! exporter.write(&rows)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::row::ReportRow;
use anyhow::{bail, Context, Result};
use chrono::Local;
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated values with a header row.
    #[default]
    Csv,
    /// Array of objects, keys in column order.
    Json,
    /// Single-sheet `.xlsx` workbook.
    Excel,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Excel => "xlsx",
        }
    }
}

pub struct Exporter {
    format: ExportFormat,
    output_path: PathBuf,
}

impl Exporter {
    /// Without an explicit path the file is named
    /// `jira_kpi_report_<YYYYMMDD_HHMMSS>.<ext>` in the working directory.
    pub fn new(format: ExportFormat, output_path: Option<PathBuf>) -> Self {
        let output_path = output_path.unwrap_or_else(|| {
            PathBuf::from(format!(
                "jira_kpi_report_{}.{}",
                Local::now().format("%Y%m%d_%H%M%S"),
                format.extension()
            ))
        });

        Self { format, output_path }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// Writes all rows. An empty batch is rejected: there is no header to
    /// derive and the caller decides how to report it.
    pub fn write(&self, rows: &[ReportRow]) -> Result<()> {
        let Some(first) = rows.first() else {
            bail!("no rows to write");
        };
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| !row.same_columns(first)) {
            bail!("row {} ({}) does not share the header columns", index, row.get("key").unwrap_or("?"));
        }

        if let Some(parent) = self.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }

        match self.format {
            ExportFormat::Csv => self.write_csv(first, rows),
            ExportFormat::Json => self.write_json(rows),
            ExportFormat::Excel => self.write_excel(first, rows),
        }
        .with_context(|| format!("writing {}", self.output_path.display()))?;

        tracing::debug!(path = %self.output_path.display(), rows = rows.len(), "report written");
        Ok(())
    }

    fn write_csv(&self, header: &ReportRow, rows: &[ReportRow]) -> Result<()> {
        let mut wtr = csv::Writer::from_path(&self.output_path)?;
        wtr.write_record(header.columns())?;
        for row in rows {
            wtr.write_record(row.values())?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_json(&self, rows: &[ReportRow]) -> Result<()> {
        let json = serde_json::to_string_pretty(rows)?;
        File::create(&self.output_path)?.write_all(json.as_bytes())?;
        Ok(())
    }

    fn write_excel(&self, header: &ReportRow, rows: &[ReportRow]) -> Result<()> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("KPI")?;

        let header_format = Format::new().set_bold();
        for (col, name) in header.columns().enumerate() {
            worksheet.write_string_with_format(0, col as u16, name, &header_format)?;
        }

        for (index, row) in rows.iter().enumerate() {
            let line = index as u32 + 1;
            for (col, value) in row.values().enumerate() {
                worksheet.write_string(line, col as u16, value)?;
            }
        }

        worksheet.autofit();
        workbook.save(&self.output_path)?;
        Ok(())
    }
}
