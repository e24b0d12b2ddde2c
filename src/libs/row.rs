//! Row assembly and KPI classification.
//!
//! A [`RowAssembler`] flattens one issue, its reconstructed
//! [`StatusHistory`], its sprint and its source-control contributions into a
//! [`ReportRow`]. Column order is fixed: the static report columns first,
//! then one hours column per status, then one `<status>_WOY` column per
//! status (see [`status_column_names`] for names that clash). Since every
//! history is seeded from the same batch vocabulary, rows assembled for one
//! batch share the exact same columns.

use super::formatter::{flatten_text, format_hours, format_story_points, format_timestamp};
use super::business_time::WorkCalendar;
use super::history::StatusHistory;
use super::issue::Issue;
use super::sprint::SprintDescriptor;
use crate::api::CommitRecord;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashSet;
use std::fmt;

/// Static columns, in output order.
pub const FIXED_COLUMNS: [&str; 30] = [
    "id",
    "key",
    "description",
    "issue_type",
    "url",
    "created_on",
    "created_week_of_year",
    "created_by",
    "current_status",
    "status_changed_on",
    "status_changed_week_of_year",
    "status_changed_cnt",
    "assigned_to",
    "story_points",
    "bsa",
    "developer",
    "developer_assigned_date",
    "sprint_state",
    "sprint_name",
    "sprint_start_date",
    "sprint_end_date",
    "epic_link",
    "kpi_type",
    "project_name",
    "project_key",
    "git_url",
    "git_lines_added",
    "git_lines_deleted",
    "git_lines_total",
    "git_author",
];

pub const WEEK_SUFFIX: &str = "_WOY";
/// Prepended to a status column whose name is already taken.
pub const STATUS_PREFIX: &str = "status_";

/// Header names for the status columns: one hours column per status, then
/// one week column per status. A name that clashes with a fixed column or an
/// earlier generated column gets [`STATUS_PREFIX`] until unique. The result
/// depends only on the status names, so one batch always gets one header.
pub fn status_column_names<'s>(statuses: impl IntoIterator<Item = &'s str>) -> (Vec<String>, Vec<String>) {
    let mut taken: HashSet<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
    let hours: Vec<String> = statuses
        .into_iter()
        .map(|status| claim(status.to_string(), &mut taken))
        .collect();
    let weeks = hours
        .iter()
        .map(|column| claim(format!("{}{}", column, WEEK_SUFFIX), &mut taken))
        .collect();
    (hours, weeks)
}

fn claim(mut name: String, taken: &mut HashSet<String>) -> String {
    if taken.contains(&name) {
        tracing::debug!(column = %name, "status column name taken, prefixing");
    }
    while taken.contains(&name) {
        name = format!("{}{}", STATUS_PREFIX, name);
    }
    taken.insert(name.clone());
    name
}

/// Coarse purpose of an issue for reporting rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KpiType {
    Maintenance,
    Enhancement,
    Implementation,
}

impl KpiType {
    /// Bugs are maintenance. Feature-like work is an enhancement on its own
    /// and an implementation when it belongs to an epic. Everything else is
    /// left unclassified.
    pub fn classify(issue_type: &str, epic_link: Option<&str>) -> Option<Self> {
        let has_epic = epic_link.is_some_and(|epic| !epic.trim().is_empty());
        match issue_type {
            "Bug" => Some(KpiType::Maintenance),
            "Enhancement" | "Story" | "Task" | "New Feature" if has_epic => Some(KpiType::Implementation),
            "Enhancement" | "Story" | "Task" | "New Feature" => Some(KpiType::Enhancement),
            _ => None,
        }
    }
}

impl fmt::Display for KpiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KpiType::Maintenance => "Maintenance",
            KpiType::Enhancement => "Enhancement",
            KpiType::Implementation => "Implementation",
        };
        write!(f, "{}", s)
    }
}

/// Source-control activity merged across all commits of one issue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContributionStats {
    pub urls: Vec<String>,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub lines_total: u64,
    /// Distinct authors in first-seen order.
    pub authors: Vec<String>,
}

impl ContributionStats {
    pub fn from_commits(commits: &[CommitRecord]) -> Self {
        let mut stats = Self::default();
        for commit in commits {
            if !commit.url.is_empty() {
                stats.urls.push(commit.url.clone());
            }
            stats.lines_added += commit.lines_added;
            stats.lines_deleted += commit.lines_deleted;
            stats.lines_total += commit.lines_total;
            if !commit.author.is_empty() && !stats.authors.contains(&commit.author) {
                stats.authors.push(commit.author.clone());
            }
        }
        stats
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty() && self.lines_total == 0 && self.authors.is_empty()
    }

    fn count(&self, value: u64) -> String {
        if self.is_empty() {
            String::new()
        } else {
            value.to_string()
        }
    }
}

/// One flat output record: ordered `(column, value)` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportRow {
    cells: Vec<(String, String)>,
}

impl ReportRow {
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.cells.push((column.into(), value.into()));
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.iter().find(|(name, _)| name == column).map(|(_, value)| value.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Status hours columns: the first half of the columns after the fixed
    /// ones, the second half being their `_WOY` counterparts.
    pub fn status_columns(&self) -> impl Iterator<Item = &str> {
        let dynamic = self.cells.len().saturating_sub(FIXED_COLUMNS.len());
        self.columns().skip(FIXED_COLUMNS.len()).take(dynamic / 2)
    }

    pub fn same_columns(&self, other: &ReportRow) -> bool {
        self.columns().eq(other.columns())
    }
}

impl Serialize for ReportRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, value) in &self.cells {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

pub struct RowAssembler<'a> {
    /// Tracker base URL; issue links are `<base>/browse/<key>`.
    base_url: String,
    calendar: &'a WorkCalendar,
}

impl<'a> RowAssembler<'a> {
    pub fn new(base_url: &str, calendar: &'a WorkCalendar) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            calendar,
        }
    }

    pub fn assemble(
        &self,
        issue: &Issue,
        history: &StatusHistory,
        sprint: Option<&SprintDescriptor>,
        contributions: &ContributionStats,
    ) -> ReportRow {
        let mut row = ReportRow::default();
        let created = format_timestamp(self.calendar, &issue.created);
        let changed_at = history.last_transition.unwrap_or(issue.created);
        let sprint = sprint.cloned().unwrap_or_default();

        row.push("id", issue.id.as_str());
        row.push("key", issue.key.as_str());
        row.push("description", issue.description.as_deref().map(flatten_text).unwrap_or_default());
        row.push("issue_type", issue.issue_type.as_str());
        row.push("url", format!("{}/browse/{}", self.base_url, issue.key));
        row.push("created_on", created);
        row.push("created_week_of_year", self.calendar.week_of(&issue.created).to_string());
        row.push("created_by", issue.creator.as_ref().map(|p| p.display_name.clone()).unwrap_or_default());
        row.push("current_status", issue.status.as_str());
        row.push("status_changed_on", format_timestamp(self.calendar, &changed_at));
        row.push("status_changed_week_of_year", self.calendar.week_of(&changed_at).to_string());
        row.push("status_changed_cnt", history.transition_count.to_string());
        row.push("assigned_to", issue.assignee.as_ref().map(|p| p.display_name.clone()).unwrap_or_default());
        row.push("story_points", format_story_points(issue.story_points));
        row.push("bsa", history.bsa.as_ref().map(|a| a.name.clone()).unwrap_or_default());
        row.push("developer", history.developer.as_ref().map(|a| a.name.clone()).unwrap_or_default());
        row.push(
            "developer_assigned_date",
            history
                .developer
                .as_ref()
                .map(|a| format_timestamp(self.calendar, &a.assigned_at))
                .unwrap_or_default(),
        );
        row.push("sprint_state", sprint.state_label());
        row.push("sprint_name", sprint.name);
        row.push("sprint_start_date", sprint.start);
        row.push("sprint_end_date", sprint.end);
        row.push("epic_link", issue.epic_link.clone().unwrap_or_default());
        row.push(
            "kpi_type",
            KpiType::classify(&issue.issue_type, issue.epic_link.as_deref())
                .map(|kpi| kpi.to_string())
                .unwrap_or_default(),
        );
        row.push("project_name", issue.project_name.as_str());
        row.push("project_key", issue.project_key.as_str());
        row.push("git_url", contributions.urls.join(" "));
        row.push("git_lines_added", contributions.count(contributions.lines_added));
        row.push("git_lines_deleted", contributions.count(contributions.lines_deleted));
        row.push("git_lines_total", contributions.count(contributions.lines_total));
        row.push("git_author", contributions.authors.join("; "));

        let (hours_columns, week_columns) = status_column_names(history.durations.keys().map(String::as_str));
        for (column, spent) in hours_columns.into_iter().zip(history.durations.values()) {
            row.push(column, format_hours(spent));
        }
        for (column, status) in week_columns.into_iter().zip(history.durations.keys()) {
            let week = history.exit_weeks.get(status).copied().unwrap_or_default();
            row.push(column, week.to_string());
        }

        row
    }
}
