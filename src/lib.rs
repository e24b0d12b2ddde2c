//! # jira-kpi
//!
//! Builds per-issue KPI reports from a Jira instance: how long each issue
//! spent in every workflow status, measured in business hours, together with
//! sprint, attribution and source-control activity.
//!
//! ## Pipeline
//!
//! - [`api`]: tracker and source-control collaborators (Jira, GitHub).
//! - [`libs::business_time`]: elapsed working time over a work calendar.
//! - [`libs::history`]: status-history reconstruction.
//! - [`libs::row`]: row assembly and KPI classification.
//! - [`libs::driver`]: orchestration of one report run.
//! - [`libs::export`]: CSV, JSON and Excel output.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use jira_kpi::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod api;
pub mod commands;
pub mod libs;
