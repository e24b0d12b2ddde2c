//! Jira REST client.
//!
//! Authenticates with HTTP basic auth (login + API token) and talks to the
//! v2 REST API:
//!
//! - `GET rest/api/2/field` resolves custom field display names to ids.
//! - `GET rest/api/2/search?jql=..&expand=changelog` returns issues with
//!   their full change history.
//!
//! Transient failures (timeouts, connection errors, 5xx, 429) are retried
//! with exponential backoff; other 4xx responses fail immediately.

use super::{FieldMap, IssueQuery, IssueTracker, TrackerError, FIELD_EPIC_LINK, FIELD_SPRINT, FIELD_STORY_POINTS};
use crate::libs::business_time::parse_timestamp;
use crate::libs::config::ConfigModule;
use crate::libs::issue::{ChangeEvent, ChangeField, Issue, Person};
use crate::libs::messages::Message;
use crate::libs::secret::Secret;
use crate::msg_print;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

const FIELD_URL: &str = "rest/api/2/field";
const SEARCH_URL: &str = "rest/api/2/search";
pub const SECRET_FILE: &str = ".jira_secret";
pub const TOKEN_ENV: &str = "JIRA_API_TOKEN";

#[derive(Deserialize, Debug)]
struct JiraField {
    id: String,
    name: String,
}

#[derive(Deserialize, Debug)]
struct JiraSearchResults {
    #[serde(default)]
    issues: Vec<JiraIssue>,
}

#[derive(Deserialize, Debug)]
struct JiraIssue {
    id: String,
    key: String,
    fields: JiraIssueFields,
    #[serde(default)]
    changelog: Option<JiraChangelog>,
}

#[derive(Deserialize, Debug)]
struct JiraIssueFields {
    created: String,
    status: JiraNamed,
    #[serde(default)]
    issuetype: Option<JiraNamed>,
    #[serde(default)]
    creator: Option<JiraUser>,
    #[serde(default)]
    assignee: Option<JiraUser>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    project: Option<JiraProject>,
    /// Custom fields, looked up by id through the field map.
    #[serde(flatten)]
    custom: HashMap<String, Value>,
}

#[derive(Deserialize, Debug)]
struct JiraNamed {
    name: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct JiraUser {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    account_id: Option<String>,
    #[serde(default)]
    display_name: String,
}

impl From<JiraUser> for Person {
    fn from(user: JiraUser) -> Self {
        Person {
            name: user.name.or(user.account_id).unwrap_or_default(),
            display_name: user.display_name,
        }
    }
}

#[derive(Deserialize, Debug)]
struct JiraProject {
    key: String,
    name: String,
}

#[derive(Deserialize, Debug, Default)]
struct JiraChangelog {
    #[serde(default)]
    histories: Vec<JiraHistory>,
}

#[derive(Deserialize, Debug)]
struct JiraHistory {
    created: String,
    #[serde(default)]
    items: Vec<JiraHistoryItem>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct JiraHistoryItem {
    field: String,
    #[serde(default)]
    from_string: Option<String>,
    #[serde(default)]
    to_string: Option<String>,
}

impl JiraIssue {
    fn into_issue(self, fields: &FieldMap) -> Result<Issue, TrackerError> {
        let key = self.key;
        let timestamp = |raw: &str| {
            parse_timestamp(raw).map_err(|source| TrackerError::InvalidTimestamp {
                key: key.clone(),
                source,
            })
        };

        let created = timestamp(&self.fields.created)?;
        let mut history = Vec::new();
        for entry in self.changelog.unwrap_or_default().histories {
            let at = timestamp(&entry.created)?;
            history.extend(entry.items.into_iter().map(|item| ChangeEvent {
                field: ChangeField::from(item.field.as_str()),
                from: item.from_string.filter(|v| !v.trim().is_empty()),
                to: item.to_string.filter(|v| !v.trim().is_empty()),
                at,
            }));
        }

        let mut custom = self.fields.custom;
        let mut custom_field = |name: &str| {
            fields
                .id(name)
                .and_then(|id| custom.remove(id))
                .filter(|value| !value.is_null())
        };
        let story_points = custom_field(FIELD_STORY_POINTS).and_then(|v| v.as_f64());
        let epic_link = custom_field(FIELD_EPIC_LINK).and_then(|v| v.as_str().map(str::to_string));
        let sprint = custom_field(FIELD_SPRINT);

        let mut issue = Issue::new(&self.id, &key, created, &self.fields.status.name).with_history(history);
        issue.issue_type = self.fields.issuetype.map(|t| t.name).unwrap_or_default();
        issue.creator = self.fields.creator.map(Person::from);
        issue.assignee = self.fields.assignee.map(Person::from);
        issue.description = self.fields.description;
        issue.story_points = story_points;
        issue.epic_link = epic_link;
        issue.sprint = sprint;
        if let Some(project) = self.fields.project {
            issue.project_key = project.key;
            issue.project_name = project.name;
        }
        Ok(issue)
    }
}

#[derive(Clone, Debug)]
pub struct JiraClient {
    client: Client,
    base_url: String,
    login: String,
    api_token: String,
    max_retries: u32,
}

impl JiraClient {
    pub fn new(config: &JiraConfig, api_token: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            login: config.login.clone(),
            api_token: api_token.to_string(),
            max_retries: 3,
        })
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, TrackerError> {
        let url = format!("{}/{}", self.base_url, path);
        let mut last_error = String::new();

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff_secs = std::cmp::min(1u64 << attempt, 30);
                tracing::warn!(attempt, backoff_secs, url = %url, "retrying after backoff");
                tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
            }

            let response = match self
                .client
                .get(&url)
                .query(query)
                .basic_auth(&self.login, Some(&self.api_token))
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() || e.is_connect() {
                        continue;
                    }
                    return Err(TrackerError::RequestError(e));
                }
            };

            let status = response.status();
            if status.is_success() {
                return response.json::<T>().await.map_err(TrackerError::RequestError);
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                if let Some(retry_after) = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                {
                    let wait = std::cmp::min(retry_after, 60);
                    tracing::warn!(wait, "rate-limited, waiting Retry-After");
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                }
                last_error = "429 Too Many Requests".to_string();
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                last_error = format!("{status}: {body}");
                continue;
            }

            return Err(TrackerError::HttpError { status, body });
        }

        Err(TrackerError::MaxRetriesExceeded {
            attempts: self.max_retries + 1,
            last_error,
        })
    }
}

impl IssueTracker for JiraClient {
    async fn fields(&self) -> Result<FieldMap, TrackerError> {
        let fields: Vec<JiraField> = self.get_json(FIELD_URL, &[]).await?;
        tracing::debug!(count = fields.len(), "jira fields resolved");
        Ok(FieldMap::new(fields.into_iter().map(|f| (f.name, f.id))))
    }

    async fn search(&self, query: &IssueQuery, fields: &FieldMap) -> Result<Vec<Issue>, TrackerError> {
        let params = [
            ("jql", query.jql.clone()),
            ("startAt", query.start_at.to_string()),
            ("maxResults", query.max_results.to_string()),
            ("expand", "changelog".to_string()),
        ];
        let results: JiraSearchResults = self.get_json(SEARCH_URL, &params).await?;
        tracing::debug!(count = results.issues.len(), jql = %query.jql, "jira search finished");

        results.issues.into_iter().map(|issue| issue.into_issue(fields)).collect()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct JiraConfig {
    pub login: String,
    pub api_url: String,
}

impl JiraConfig {
    pub fn module() -> ConfigModule {
        ConfigModule {
            key: "jira".to_string(),
            name: "Jira".to_string(),
        }
    }

    pub fn init(config: &Option<Self>) -> Result<Self> {
        let config = config.clone().unwrap_or(Self {
            login: "".to_string(),
            api_url: "".to_string(),
        });

        msg_print!(Message::ConfigModuleJira);

        Ok(Self {
            login: Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Enter your Jira login")
                .default(config.login)
                .interact_text()?,
            api_url: Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Enter the Jira server URL")
                .default(config.api_url)
                .interact_text()?,
        })
    }

    /// API token from `JIRA_API_TOKEN`, else the encrypted cache, else a
    /// prompt whose answer is cached.
    pub fn api_token(&self) -> Result<String> {
        match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            _ => Secret::new(SECRET_FILE, "Enter your Jira API token").get_or_prompt(),
        }
    }
}
