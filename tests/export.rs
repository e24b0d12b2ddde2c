#[cfg(test)]
mod tests {
    use jira_kpi::libs::export::{ExportFormat, Exporter};
    use jira_kpi::libs::row::ReportRow;
    use std::fs;
    use tempfile::tempdir;

    fn row(key: &str, description: &str, hours: &str) -> ReportRow {
        let mut row = ReportRow::default();
        row.push("key", key);
        row.push("description", description);
        row.push("To-Do", hours);
        row
    }

    fn sample_rows() -> Vec<ReportRow> {
        vec![row("KPI-1", "First", "10.00"), row("KPI-2", "Second one", "0.00")]
    }

    #[test]
    fn test_default_file_name() {
        let exporter = Exporter::new(ExportFormat::Excel, None);
        let name = exporter.output_path().to_string_lossy().to_string();

        assert!(name.starts_with("jira_kpi_report_"));
        assert!(name.ends_with(".xlsx"));
        assert_eq!(exporter.format(), ExportFormat::Excel);
    }

    #[test]
    fn test_csv_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let exporter = Exporter::new(ExportFormat::Csv, Some(path.clone()));

        exporter.write(&sample_rows()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["key,description,To-Do", "KPI-1,First,10.00", "KPI-2,Second one,0.00"]);
    }

    #[test]
    fn test_json_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        let exporter = Exporter::new(ExportFormat::Json, Some(path.clone()));

        exporter.write(&sample_rows()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["key"], "KPI-1");
        assert_eq!(records[1]["To-Do"], "0.00");
    }

    #[test]
    fn test_excel_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let exporter = Exporter::new(ExportFormat::Excel, Some(path.clone()));

        exporter.write(&sample_rows()).unwrap();

        let metadata = fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reports").join("2024").join("kpi.csv");
        let exporter = Exporter::new(ExportFormat::Csv, Some(path.clone()));

        exporter.write(&sample_rows()).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let exporter = Exporter::new(ExportFormat::Csv, Some(path.clone()));

        assert!(exporter.write(&[]).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_mismatched_columns_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mixed.csv");
        let exporter = Exporter::new(ExportFormat::Csv, Some(path.clone()));
        let mut odd = ReportRow::default();
        odd.push("key", "KPI-3");
        odd.push("In-Review", "1.00");

        let mut rows = sample_rows();
        rows.push(odd);
        let err = exporter.write(&rows).unwrap_err();

        assert!(err.to_string().contains("KPI-3"));
        assert!(!path.exists());
    }

    #[test]
    fn test_format_serialization() {
        assert_eq!(serde_json::to_string(&ExportFormat::Excel).unwrap(), "\"excel\"");
        assert_eq!(serde_json::from_str::<ExportFormat>("\"json\"").unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::default(), ExportFormat::Csv);
    }
}
