//! Tracker-independent issue snapshot consumed by the report pipeline.
//!
//! An [`Issue`] is fetched once per report run and never mutated afterwards.
//! Its `history` holds the change events exactly in the order the tracker
//! returned them (oldest first); nothing downstream re-sorts them.

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

/// Field touched by a change event. Only status and assignee changes drive
/// the report; everything else is carried through and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeField {
    Status,
    Assignee,
    Other(String),
}

impl From<&str> for ChangeField {
    fn from(field: &str) -> Self {
        match field.to_ascii_lowercase().as_str() {
            "status" => ChangeField::Status,
            "assignee" => ChangeField::Assignee,
            _ => ChangeField::Other(field.to_string()),
        }
    }
}

/// A single recorded field mutation from an issue's audit history.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub field: ChangeField,
    pub from: Option<String>,
    pub to: Option<String>,
    pub at: DateTime<FixedOffset>,
}

impl ChangeEvent {
    pub fn status(from: &str, to: &str, at: DateTime<FixedOffset>) -> Self {
        Self {
            field: ChangeField::Status,
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            at,
        }
    }

    pub fn assignee(from: Option<&str>, to: Option<&str>, at: DateTime<FixedOffset>) -> Self {
        Self {
            field: ChangeField::Assignee,
            from: from.map(str::to_string),
            to: to.map(str::to_string),
            at,
        }
    }
}

/// A tracker user as it appears on an issue.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Person {
    /// Login or account name.
    pub name: String,
    pub display_name: String,
}

impl Person {
    pub fn new(name: &str, display_name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub id: String,
    pub key: String,
    pub created: DateTime<FixedOffset>,
    /// Current workflow status name.
    pub status: String,
    pub issue_type: String,
    pub creator: Option<Person>,
    pub assignee: Option<Person>,
    pub story_points: Option<f64>,
    pub epic_link: Option<String>,
    /// Raw sprint field value, decoded later by the sprint parser.
    pub sprint: Option<Value>,
    pub description: Option<String>,
    pub project_key: String,
    pub project_name: String,
    pub history: Vec<ChangeEvent>,
}

impl Issue {
    /// Minimal issue with every optional field empty.
    pub fn new(id: &str, key: &str, created: DateTime<FixedOffset>, status: &str) -> Self {
        Self {
            id: id.to_string(),
            key: key.to_string(),
            created,
            status: status.to_string(),
            issue_type: String::new(),
            creator: None,
            assignee: None,
            story_points: None,
            epic_link: None,
            sprint: None,
            description: None,
            project_key: key.split('-').next().unwrap_or_default().to_string(),
            project_name: String::new(),
            history: Vec::new(),
        }
    }

    pub fn with_type(mut self, issue_type: &str) -> Self {
        self.issue_type = issue_type.to_string();
        self
    }

    pub fn with_history(mut self, history: Vec<ChangeEvent>) -> Self {
        self.history = history;
        self
    }

    pub fn with_assignee(mut self, assignee: Person) -> Self {
        self.assignee = Some(assignee);
        self
    }

    /// Every status name this issue mentions: both sides of each status
    /// change plus the current status.
    pub fn status_names(&self) -> impl Iterator<Item = &str> {
        self.history
            .iter()
            .filter(|event| event.field == ChangeField::Status)
            .flat_map(|event| [event.from.as_deref(), event.to.as_deref()])
            .flatten()
            .chain(std::iter::once(self.status.as_str()))
    }
}
