//! External collaborators of the report pipeline.
//!
//! The pipeline talks to two outside systems, each behind a trait so that
//! runs can be driven by real HTTP clients or by in-memory test doubles:
//!
//! - [`IssueTracker`]: executes an issue query and returns issues with their
//!   full change history. Implemented for Jira by [`jira::JiraClient`].
//! - [`ContributionSource`]: looks up commits that mention an issue key and
//!   reports remaining API quota. Implemented for GitHub by
//!   [`github::GitHubClient`].
//!
//! Both are constructed once per run, owned by the report driver and dropped
//! when the run ends.
//!
//! ## Rate limits
//!
//! Contribution lookups share a small hourly quota. [`lookup_contributions`]
//! checks the quota before each lookup and cools down for a fixed interval
//! when it is exhausted or when the source reports a rate limit. The number
//! of cool-downs per lookup is bounded by [`RetryPolicy::max_attempts`]; when
//! the budget is spent the lookup yields no commits instead of failing.

use crate::libs::business_time::BusinessTimeError;
use crate::libs::issue::Issue;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

pub mod github;
pub mod jira;

pub use github::{GitHubClient, GitHubConfig};
pub use jira::{JiraClient, JiraConfig};

/// Display names of the custom fields the report reads.
pub const FIELD_STORY_POINTS: &str = "Story Points";
pub const FIELD_SPRINT: &str = "Sprint";
pub const FIELD_EPIC_LINK: &str = "Epic Link";

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },

    #[error("issue {key}: {source}")]
    InvalidTimestamp {
        key: String,
        #[source]
        source: BusinessTimeError,
    },
}

#[derive(Debug, Error)]
pub enum ContributionError {
    #[error("rate limit exhausted")]
    RateLimited { reset_at: Option<i64> },

    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),
}

/// Tracker-specific mapping from custom field display name to field id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    by_name: HashMap<String, String>,
}

impl FieldMap {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            by_name: entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn id(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// A tracker search.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueQuery {
    pub jql: String,
    pub max_results: u32,
    pub start_at: u32,
}

#[allow(async_fn_in_trait)]
pub trait IssueTracker {
    /// Resolves custom field display names to tracker field ids.
    async fn fields(&self) -> Result<FieldMap, TrackerError>;

    /// Runs `query` and returns the matching issues with full history.
    async fn search(&self, query: &IssueQuery, fields: &FieldMap) -> Result<Vec<Issue>, TrackerError>;
}

/// One commit that references an issue key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommitRecord {
    pub url: String,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub lines_total: u64,
    pub author: String,
}

/// Remaining request budget of a rate-limited API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub remaining: u64,
    /// Unix timestamp when the budget refills.
    pub reset_at: Option<i64>,
}

impl Quota {
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

#[allow(async_fn_in_trait)]
pub trait ContributionSource {
    async fn commits_for(&self, issue_key: &str) -> Result<Vec<CommitRecord>, ContributionError>;

    async fn remaining_quota(&self) -> Result<Quota, ContributionError>;
}

/// Bounded cool-down policy for rate-limited lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub cool_down: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            cool_down: Duration::from_secs(60),
        }
    }
}

/// Looks up commits for `issue_key`, cooling down on rate limits. Never
/// fails: exhausted budgets and lookup errors yield no commits.
pub async fn lookup_contributions<C: ContributionSource>(source: &C, issue_key: &str, policy: &RetryPolicy) -> Vec<CommitRecord> {
    let mut cool_downs = 0;

    loop {
        match source.remaining_quota().await {
            Ok(quota) if quota.is_exhausted() => {
                if !cool_down(issue_key, policy, &mut cool_downs).await {
                    return Vec::new();
                }
                continue;
            }
            Ok(quota) => tracing::debug!(issue = issue_key, remaining = quota.remaining, "contribution quota"),
            Err(e) => tracing::debug!(issue = issue_key, error = %e, "quota unavailable, trying lookup anyway"),
        }

        match source.commits_for(issue_key).await {
            Ok(commits) => return commits,
            Err(ContributionError::RateLimited { .. }) => {
                if !cool_down(issue_key, policy, &mut cool_downs).await {
                    return Vec::new();
                }
            }
            Err(e) => {
                tracing::warn!(issue = issue_key, error = %e, "commit lookup failed");
                return Vec::new();
            }
        }
    }
}

/// Sleeps for one cool-down interval unless the budget is spent.
async fn cool_down(issue_key: &str, policy: &RetryPolicy, cool_downs: &mut u32) -> bool {
    if *cool_downs >= policy.max_attempts {
        tracing::warn!(issue = issue_key, attempts = *cool_downs, "rate limit still exhausted, skipping commit lookup");
        return false;
    }
    *cool_downs += 1;
    tracing::warn!(
        issue = issue_key,
        attempt = *cool_downs,
        cool_down_secs = policy.cool_down.as_secs(),
        "rate limit exhausted, cooling down"
    );
    tokio::time::sleep(policy.cool_down).await;
    true
}
