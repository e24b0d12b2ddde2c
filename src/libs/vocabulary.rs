//! Batch-wide status vocabulary.
//!
//! The report is built in two phases. This module is the first: a read-only
//! pass over every issue in the batch that collects each status name seen
//! anywhere. The second phase seeds every issue's duration map from this set
//! so that all rows share one column schema.

use super::issue::Issue;
use chrono::Duration;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusVocabulary {
    names: BTreeSet<String>,
}

impl StatusVocabulary {
    pub fn discover(issues: &[Issue]) -> Self {
        let names = issues
            .iter()
            .flat_map(|issue| issue.status_names())
            .filter(|name| Self::is_status_name(name))
            .map(str::to_string)
            .collect();
        Self { names }
    }

    /// Blank names are tracker noise and never become columns.
    pub fn is_status_name(name: &str) -> bool {
        !name.trim().is_empty()
    }

    pub fn contains(&self, status: &str) -> bool {
        self.names.contains(status)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Status names in column order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Fresh map with a zero entry for every known status.
    pub fn seed<V: Clone>(&self, zero: V) -> BTreeMap<String, V> {
        self.names.iter().map(|name| (name.clone(), zero.clone())).collect()
    }

    pub fn zero_durations(&self) -> BTreeMap<String, Duration> {
        self.seed(Duration::zero())
    }
}
