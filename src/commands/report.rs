//! `report` command: builds the KPI table for a JQL query.

use crate::{
    api::{GitHubClient, IssueQuery, JiraClient},
    libs::{
        config::Config,
        driver::{ReportDriver, ReportOutcome, ReportSettings},
        export::{ExportFormat, Exporter},
        messages::Message,
        view::View,
    },
    msg_bail_anyhow, msg_error_anyhow, msg_info, msg_success,
};
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// JQL query, overrides the configured one
    #[arg(long)]
    jql: Option<String>,

    /// Maximum number of issues to fetch
    #[arg(long)]
    max_results: Option<u32>,

    /// Offset of the first issue
    #[arg(long, default_value_t = 0)]
    start_at: u32,

    /// Output file; defaults to a timestamped name in the current directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, value_enum)]
    format: Option<ExportFormat>,

    /// Skip the GitHub commit lookup
    #[arg(long)]
    no_commits: bool,

    /// Print a summary table before writing
    #[arg(long)]
    preview: bool,
}

pub async fn cmd(args: ReportArgs) -> Result<()> {
    let config = Config::read()?;
    let Some(jira) = config.jira else {
        msg_bail_anyhow!(Message::ModuleNotConfigured("Jira".to_string()));
    };
    let report = config.report.unwrap_or_default();
    let calendar = config
        .calendar
        .unwrap_or_default()
        .build()
        .map_err(|e| msg_error_anyhow!(Message::InvalidCalendar(e.to_string())))?;

    let jql = args.jql.unwrap_or(report.jql.clone());
    if jql.trim().is_empty() {
        msg_bail_anyhow!(Message::ModuleNotConfigured("Report query".to_string()));
    }

    let tracker = JiraClient::new(&jira, &jira.api_token()?)
        .map_err(|e| msg_error_anyhow!(Message::JiraClientFailed(e.to_string())))?;

    let github = config.github.unwrap_or_default();
    let contributions = if report.enrich_commits && !args.no_commits {
        Some(GitHubClient::new(&github).map_err(|e| msg_error_anyhow!(Message::GitHubClientFailed(e.to_string())))?)
    } else {
        msg_info!(Message::CommitLookupDisabled);
        None
    };

    let settings = ReportSettings {
        query: IssueQuery {
            jql,
            max_results: args.max_results.unwrap_or(report.max_results),
            start_at: args.start_at,
        },
        identities: report.identities(),
        base_url: tracker.base_url().to_string(),
        retry_policy: github.retry_policy(),
    };
    let exporter = Exporter::new(
        args.format.unwrap_or(report.format),
        args.output.or(report.output_path),
    );

    let driver = ReportDriver::new(tracker, contributions, calendar, settings);
    let rows = driver.build_rows(Utc::now().fixed_offset()).await?;
    if args.preview && !rows.is_empty() {
        msg_info!(Message::ReportPreviewHeader(rows.len()));
        View::report(&rows);
    }

    if let ReportOutcome::Written { path, rows } = driver.write(&exporter, &rows)? {
        msg_success!(Message::ReportWritten(path.display().to_string(), rows));
    }
    Ok(())
}
