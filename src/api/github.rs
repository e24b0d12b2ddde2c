//! GitHub commit lookup.
//!
//! Finds commits whose message mentions an issue key through the commit
//! search API, page by page, then fetches each commit for its line
//! statistics. Both the
//! search and core APIs are rate limited; [`GitHubClient::remaining_quota`]
//! reports the tighter of the two so callers can pause before a lookup.

use super::{CommitRecord, ContributionError, ContributionSource, Quota, RetryPolicy};
use crate::libs::config::ConfigModule;
use crate::libs::messages::Message;
use crate::msg_print;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input};
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Results per search page; GitHub's maximum.
const SEARCH_PAGE_SIZE: u32 = 100;
/// Commit search never returns more than this many results in total.
const SEARCH_RESULT_CAP: usize = 1000;

#[derive(Deserialize, Debug)]
struct SearchResults {
    #[serde(default)]
    total_count: usize,
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize, Debug)]
struct SearchItem {
    sha: String,
    repository: Repository,
}

#[derive(Deserialize, Debug)]
struct Repository {
    full_name: String,
}

#[derive(Deserialize, Debug)]
struct CommitDetail {
    html_url: String,
    commit: CommitBody,
    #[serde(default)]
    stats: Option<CommitStats>,
}

#[derive(Deserialize, Debug)]
struct CommitBody {
    author: Option<CommitAuthor>,
}

#[derive(Deserialize, Debug)]
struct CommitAuthor {
    name: String,
}

#[derive(Deserialize, Debug, Default)]
struct CommitStats {
    additions: u64,
    deletions: u64,
    total: u64,
}

#[derive(Deserialize, Debug)]
struct RateLimits {
    resources: RateResources,
}

#[derive(Deserialize, Debug)]
struct RateResources {
    core: RateLimit,
    search: RateLimit,
}

#[derive(Deserialize, Debug, Clone, Copy)]
struct RateLimit {
    remaining: u64,
    reset: i64,
}

impl From<CommitDetail> for CommitRecord {
    fn from(detail: CommitDetail) -> Self {
        let stats = detail.stats.unwrap_or_default();
        CommitRecord {
            url: detail.html_url,
            lines_added: stats.additions,
            lines_deleted: stats.deletions,
            lines_total: stats.total,
            author: detail.commit.author.map(|a| a.name).unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GitHubClient {
    client: Client,
    api_url: String,
    token: String,
    org: Option<String>,
    page_size: u32,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token(),
            org: config.org.clone().filter(|org| !org.trim().is_empty()),
            page_size: SEARCH_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, SEARCH_PAGE_SIZE);
        self
    }

    /// Search expression for commits mentioning `issue_key`.
    pub fn search_query(&self, issue_key: &str) -> String {
        match &self.org {
            Some(org) => format!("{} org:{}", issue_key, org),
            None => issue_key.to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ContributionError> {
        let url = format!("{}/{}", self.api_url, path);
        let mut request = self
            .client
            .get(&url)
            .query(query)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, "jira-kpi");
        if !self.token.is_empty() {
            request = request.header(AUTHORIZATION, format!("Bearer {}", self.token));
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        if is_rate_limited(status, response.headers()) {
            return Err(ContributionError::RateLimited {
                reset_at: header_i64(response.headers(), "x-ratelimit-reset"),
            });
        }

        Err(http_error(status, response).await)
    }
}

fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && header_i64(headers, "x-ratelimit-remaining") == Some(0))
}

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers.get(name).and_then(|v| v.to_str().ok()).and_then(|v| v.parse().ok())
}

async fn http_error(status: StatusCode, response: Response) -> ContributionError {
    let body = response.text().await.unwrap_or_default();
    ContributionError::HttpError { status, body }
}

impl ContributionSource for GitHubClient {
    async fn commits_for(&self, issue_key: &str) -> Result<Vec<CommitRecord>, ContributionError> {
        let query = self.search_query(issue_key);
        let mut commits = Vec::new();
        let mut seen = 0;
        let mut page = 1u32;

        loop {
            let params = [
                ("q", query.clone()),
                ("per_page", self.page_size.to_string()),
                ("page", page.to_string()),
            ];
            let results: SearchResults = self.get_json("search/commits", &params).await?;
            let received = results.items.len();
            tracing::debug!(issue = issue_key, page, received, total = results.total_count, "commit search page");

            for item in results.items {
                let path = format!("repos/{}/commits/{}", item.repository.full_name, item.sha);
                let detail: CommitDetail = self.get_json(&path, &[]).await?;
                commits.push(CommitRecord::from(detail));
            }

            seen += received;
            if received < self.page_size as usize || seen >= results.total_count || seen >= SEARCH_RESULT_CAP {
                break;
            }
            page += 1;
        }

        Ok(commits)
    }

    async fn remaining_quota(&self) -> Result<Quota, ContributionError> {
        let limits: RateLimits = self.get_json("rate_limit", &[]).await?;
        let RateResources { core, search } = limits.resources;
        let tightest = if search.remaining <= core.remaining { search } else { core };
        Ok(Quota {
            remaining: tightest.remaining,
            reset_at: Some(tightest.reset),
        })
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_max_retries() -> u32 {
    RetryPolicy::default().max_attempts
}

fn default_cool_down_secs() -> u64 {
    RetryPolicy::default().cool_down.as_secs()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GitHubConfig {
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Restricts commit search to one organization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_cool_down_secs")]
    pub cool_down_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            api_url: default_api_url(),
            org: None,
            max_retries: default_max_retries(),
            cool_down_secs: default_cool_down_secs(),
        }
    }
}

impl GitHubConfig {
    pub fn module() -> ConfigModule {
        ConfigModule {
            key: "github".to_string(),
            name: "GitHub".to_string(),
        }
    }

    pub fn init(config: &Option<Self>) -> Result<Self> {
        let config = config.clone().unwrap_or_default();

        msg_print!(Message::ConfigModuleGitHub);

        let org: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Limit commit search to organization (empty for none)")
            .default(config.org.unwrap_or_default())
            .allow_empty(true)
            .interact_text()?;

        Ok(Self {
            access_token: Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Enter your GitHub access token")
                .default(config.access_token)
                .allow_empty(true)
                .interact_text()?,
            api_url: Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Enter the GitHub API URL")
                .default(config.api_url)
                .interact_text()?,
            org: Some(org).filter(|org| !org.trim().is_empty()),
            max_retries: Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Cool-downs per lookup before giving up")
                .default(config.max_retries)
                .interact_text()?,
            cool_down_secs: Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Cool-down interval in seconds")
                .default(config.cool_down_secs)
                .interact_text()?,
        })
    }

    /// `GITHUB_TOKEN` overrides the stored token.
    pub fn token(&self) -> String {
        match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => token,
            _ => self.access_token.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries,
            cool_down: Duration::from_secs(self.cool_down_secs),
        }
    }
}
