//! Report orchestration.
//!
//! One run goes through these phases in order:
//!
//! 1. resolve custom field ids and fetch the issue batch from the tracker;
//! 2. discover the status vocabulary of the whole batch (read-only pass);
//! 3. reconstruct every issue's status history against that vocabulary;
//! 4. look up source-control contributions, if enabled;
//! 5. decode sprints and assemble one row per issue;
//! 6. hand the rows to the exporter.
//!
//! Phase 3 is side-effect free per issue, so a failure there aborts the run
//! before any network-bound enrichment or file output happens.

use super::business_time::WorkCalendar;
use super::export::Exporter;
use super::history::{Identities, Reconstructor, StatusHistory};
use super::row::{ContributionStats, ReportRow, RowAssembler};
use super::sprint::parse_sprint;
use super::vocabulary::StatusVocabulary;
use crate::api::{lookup_contributions, ContributionSource, IssueQuery, IssueTracker, RetryPolicy};
use crate::libs::messages::Message;
use crate::{msg_debug, msg_info, msg_warning};
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use std::path::PathBuf;

/// Per-run options that do not belong to a collaborator.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub query: IssueQuery,
    pub identities: Identities,
    /// Tracker base URL used for issue links.
    pub base_url: String,
    pub retry_policy: RetryPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    Written { path: PathBuf, rows: usize },
    /// The query matched nothing; no file was written.
    Empty,
}

pub struct ReportDriver<T, C> {
    tracker: T,
    contributions: Option<C>,
    calendar: WorkCalendar,
    settings: ReportSettings,
}

impl<T: IssueTracker, C: ContributionSource> ReportDriver<T, C> {
    pub fn new(tracker: T, contributions: Option<C>, calendar: WorkCalendar, settings: ReportSettings) -> Self {
        Self {
            tracker,
            contributions,
            calendar,
            settings,
        }
    }

    /// Fetches the batch and builds its rows, measured up to `now`.
    pub async fn build_rows(&self, now: DateTime<FixedOffset>) -> Result<Vec<ReportRow>> {
        let query = &self.settings.query;
        msg_info!(Message::FetchingIssues(query.jql.clone()));

        let fields = self.tracker.fields().await.context("resolving tracker fields")?;
        let issues = self.tracker.search(query, &fields).await.context("searching issues")?;
        msg_info!(Message::IssuesFetched(issues.len()));
        if issues.is_empty() {
            return Ok(Vec::new());
        }

        let vocabulary = StatusVocabulary::discover(&issues);
        msg_debug!(Message::StatusesDiscovered(vocabulary.len()));

        let reconstructor = Reconstructor::new(&vocabulary, &self.calendar, &self.settings.identities, now);
        let histories = issues
            .iter()
            .map(|issue| reconstructor.reconstruct(issue))
            .collect::<Result<Vec<StatusHistory>, _>>()?;

        let contributions = match &self.contributions {
            Some(source) => {
                msg_info!(Message::CommitLookupStarted(issues.len()));
                let mut stats = Vec::with_capacity(issues.len());
                for issue in &issues {
                    let commits = lookup_contributions(source, &issue.key, &self.settings.retry_policy).await;
                    stats.push(ContributionStats::from_commits(&commits));
                }
                stats
            }
            None => vec![ContributionStats::default(); issues.len()],
        };

        let assembler = RowAssembler::new(&self.settings.base_url, &self.calendar);
        let rows = issues
            .iter()
            .zip(&histories)
            .zip(&contributions)
            .map(|((issue, history), stats)| {
                let sprint = issue.sprint.as_ref().and_then(|raw| {
                    let _span = tracing::info_span!("sprint", issue = %issue.key).entered();
                    parse_sprint(raw)
                });
                assembler.assemble(issue, history, sprint.as_ref(), stats)
            })
            .collect();

        Ok(rows)
    }

    /// Builds the report and writes it. An empty batch writes nothing.
    pub async fn run(&self, exporter: &Exporter, now: DateTime<FixedOffset>) -> Result<ReportOutcome> {
        let rows = self.build_rows(now).await?;
        self.write(exporter, &rows)
    }

    pub fn write(&self, exporter: &Exporter, rows: &[ReportRow]) -> Result<ReportOutcome> {
        if rows.is_empty() {
            msg_warning!(Message::NoIssuesFound(self.settings.query.jql.clone()));
            return Ok(ReportOutcome::Empty);
        }

        exporter.write(rows)?;
        Ok(ReportOutcome::Written {
            path: exporter.output_path().to_path_buf(),
            rows: rows.len(),
        })
    }
}
