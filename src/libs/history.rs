//! Status-history reconstruction.
//!
//! Replays an issue's change history in order and accounts, in business
//! time, for every segment the issue spent in each workflow status.
//!
//! ## Segments
//!
//! ```text
//! created        status A->B         status B->A              now
//!    |----- A -------|------- B ---------|---------- A ----------|
//!                    ^ closes A           ^ closes B             ^ open segment,
//!                                                                  credited to the
//!                                                                  current status
//! ```
//!
//! Every status change closes the segment spent in its `from` status and
//! opens one in its `to` status. The first segment implicitly starts at
//! creation. The last segment never closes in history; it is measured up to
//! the report instant and credited to the issue's current status. Segments of
//! the same status add up, so re-entered statuses accumulate.
//!
//! Because every segment boundary is shared with the next segment, the
//! durations of one issue always sum to the business time between creation
//! and the report instant. The one exception is a segment in a blank status
//! name: the vocabulary has no column for it, so it is logged and dropped.
//!
//! ## Attribution
//!
//! Assignee changes pointing at a recognized developer or business analyst
//! record who was first assigned in that role; later changes never overwrite
//! it. Issues without such history fall back to the assignee of record.

use super::business_time::{BusinessTimeError, WorkCalendar};
use super::issue::{ChangeField, Issue};
use super::vocabulary::StatusVocabulary;
use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HistoryError {
    /// A history segment ends before it starts. The tracker returned events
    /// out of chronological order, or an event lies after the report instant.
    #[error("data integrity violation in {key}: segment in status '{status}' runs backwards ({source})")]
    DataIntegrity {
        key: String,
        status: String,
        #[source]
        source: BusinessTimeError,
    },
}

/// Recognized people, matched against assignee display names.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Identities {
    #[serde(default)]
    pub developers: BTreeSet<String>,
    #[serde(default)]
    pub bsas: BTreeSet<String>,
}

impl Identities {
    pub fn new<I, S>(developers: I, bsas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            developers: developers.into_iter().map(Into::into).collect(),
            bsas: bsas.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_developer(&self, name: &str) -> bool {
        self.developers.contains(name)
    }

    pub fn is_bsa(&self, name: &str) -> bool {
        self.bsas.contains(name)
    }
}

/// Who was first assigned in a role, and when.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribution {
    pub name: String,
    pub assigned_at: DateTime<FixedOffset>,
}

/// Result of replaying one issue's history.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusHistory {
    /// Business time per status, with an entry for every status in the batch.
    pub durations: BTreeMap<String, Duration>,
    /// ISO week in which each status was last left; for the current status,
    /// the week its open segment began. Zero for statuses never occupied.
    pub exit_weeks: BTreeMap<String, u32>,
    pub transition_count: u32,
    pub last_transition: Option<DateTime<FixedOffset>>,
    pub developer: Option<Attribution>,
    pub bsa: Option<Attribution>,
}

impl StatusHistory {
    pub fn total(&self) -> Duration {
        self.durations.values().fold(Duration::zero(), |acc, d| acc + *d)
    }

    pub fn duration_of(&self, status: &str) -> Duration {
        self.durations.get(status).copied().unwrap_or_else(Duration::zero)
    }
}

/// Per-run reconstruction context. Holds only shared read-only state, so one
/// instance can process any number of issues independently.
pub struct Reconstructor<'a> {
    vocabulary: &'a StatusVocabulary,
    calendar: &'a WorkCalendar,
    identities: &'a Identities,
    now: DateTime<FixedOffset>,
}

impl<'a> Reconstructor<'a> {
    pub fn new(
        vocabulary: &'a StatusVocabulary,
        calendar: &'a WorkCalendar,
        identities: &'a Identities,
        now: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            vocabulary,
            calendar,
            identities,
            now,
        }
    }

    pub fn reconstruct(&self, issue: &Issue) -> Result<StatusHistory, HistoryError> {
        let mut durations = self.vocabulary.zero_durations();
        let mut exit_weeks = self.vocabulary.seed(0u32);
        let mut segment_start: Option<DateTime<FixedOffset>> = None;
        let mut transition_count = 0;
        let mut last_transition = None;
        let mut developer: Option<Attribution> = None;
        let mut bsa: Option<Attribution> = None;

        for event in &issue.history {
            match &event.field {
                ChangeField::Status => {
                    let start = segment_start.unwrap_or(issue.created);
                    match event.from.as_deref() {
                        Some(from) => {
                            let spent = self.segment(issue, from, &start, &event.at)?;
                            let week = self.calendar.week_of(&event.at);
                            self.credit(issue, &mut durations, &mut exit_weeks, from, spent, week);
                        }
                        None => {
                            tracing::warn!(issue = %issue.key, at = %event.at, "status change without a source status, segment not credited");
                        }
                    }

                    segment_start = Some(event.at);
                    transition_count += 1;
                    last_transition = Some(event.at);
                }
                ChangeField::Assignee => {
                    let Some(to) = event.to.as_deref() else {
                        continue;
                    };
                    if developer.is_none() && self.identities.is_developer(to) {
                        developer = Some(Attribution {
                            name: to.to_string(),
                            assigned_at: event.at,
                        });
                    }
                    if bsa.is_none() && self.identities.is_bsa(to) {
                        bsa = Some(Attribution {
                            name: to.to_string(),
                            assigned_at: event.at,
                        });
                    }
                }
                ChangeField::Other(_) => {}
            }
        }

        // The segment in the current status is still open.
        let open_start = segment_start.unwrap_or(issue.created);
        let open = self.segment(issue, &issue.status, &open_start, &self.now)?;
        let week = self.calendar.week_of(&open_start);
        self.credit(issue, &mut durations, &mut exit_weeks, &issue.status, open, week);

        if let Some(assignee) = &issue.assignee {
            let name = &assignee.display_name;
            if developer.is_none() && self.identities.is_developer(name) {
                developer = Some(Attribution {
                    name: name.clone(),
                    assigned_at: issue.created,
                });
            }
            if bsa.is_none() && self.identities.is_bsa(name) {
                bsa = Some(Attribution {
                    name: name.clone(),
                    assigned_at: issue.created,
                });
            }
        }

        Ok(StatusHistory {
            durations,
            exit_weeks,
            transition_count,
            last_transition,
            developer,
            bsa,
        })
    }

    /// Adds a closed segment to an existing status column. Names the batch
    /// vocabulary skipped (blank ones) never get a column of their own.
    fn credit(
        &self,
        issue: &Issue,
        durations: &mut BTreeMap<String, Duration>,
        exit_weeks: &mut BTreeMap<String, u32>,
        status: &str,
        spent: Duration,
        week: u32,
    ) {
        match (durations.get_mut(status), exit_weeks.get_mut(status)) {
            (Some(total), Some(exit_week)) => {
                *total += spent;
                *exit_week = week;
            }
            _ => {
                tracing::warn!(issue = %issue.key, status, spent_secs = spent.num_seconds(), "status outside the batch vocabulary, segment not credited");
            }
        }
    }

    fn segment(
        &self,
        issue: &Issue,
        status: &str,
        start: &DateTime<FixedOffset>,
        end: &DateTime<FixedOffset>,
    ) -> Result<Duration, HistoryError> {
        self.calendar.elapsed(start, end).map_err(|source| HistoryError::DataIntegrity {
            key: issue.key.clone(),
            status: status.to_string(),
            source,
        })
    }
}
