//! Structured catalogue of user-facing messages.
//!
//! Every text shown to the user is a variant here; its wording lives in the
//! `Display` impl in `display.rs`.

#[derive(Debug, Clone)]
pub enum Message {
    // === CONFIG MESSAGES ===
    ConfigModuleJira,
    ConfigModuleGitHub,
    ConfigModuleReport,
    ConfigModuleCalendar,
    SelectConfigModules,
    ConfigSaved(String),
    ConfigParseError(String),
    ModuleNotConfigured(String),
    InvalidCalendar(String),

    // === REPORT MESSAGES ===
    FetchingIssues(String),
    IssuesFetched(usize),
    NoIssuesFound(String),
    StatusesDiscovered(usize),
    CommitLookupStarted(usize),
    CommitLookupDisabled,
    ReportWritten(String, usize),
    ReportPreviewHeader(usize),

    // === CLIENT MESSAGES ===
    CommandFailed(String),
    JiraClientFailed(String),
    GitHubClientFailed(String),
}
