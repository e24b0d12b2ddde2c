use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let s = match self {
            // === CONFIG MESSAGES ===
            Message::ConfigModuleJira => "Jira settings".to_string(),
            Message::ConfigModuleGitHub => "GitHub settings".to_string(),
            Message::ConfigModuleReport => "Report settings".to_string(),
            Message::ConfigModuleCalendar => "Work calendar settings".to_string(),
            Message::SelectConfigModules => "Select modules to configure".to_string(),
            Message::ConfigSaved(path) => format!("Configuration saved to {}", path),
            Message::ConfigParseError(e) => format!("Failed to parse configuration: {}", e),
            Message::ModuleNotConfigured(module) => {
                format!("{} is not configured. Run `jira-kpi init` first", module)
            }
            Message::InvalidCalendar(e) => format!("Invalid work calendar: {}", e),

            // === REPORT MESSAGES ===
            Message::FetchingIssues(jql) => format!("Fetching issues: {}", jql),
            Message::IssuesFetched(count) => format!("Fetched {} issues", count),
            Message::NoIssuesFound(jql) => format!("No issues matched '{}'. Nothing was written", jql),
            Message::StatusesDiscovered(count) => format!("Found {} distinct statuses", count),
            Message::CommitLookupStarted(count) => format!("Looking up commits for {} issues", count),
            Message::CommitLookupDisabled => "Commit lookup disabled".to_string(),
            Message::ReportWritten(path, rows) => format!("Report with {} rows written to {}", rows, path),
            Message::ReportPreviewHeader(rows) => format!("Report preview ({} rows)", rows),

            // === CLIENT MESSAGES ===
            Message::CommandFailed(e) => format!("{}", e),
            Message::JiraClientFailed(e) => format!("Failed to create Jira client: {}", e),
            Message::GitHubClientFailed(e) => format!("Failed to create GitHub client: {}", e),
        };
        write!(f, "{}", s)
    }
}
