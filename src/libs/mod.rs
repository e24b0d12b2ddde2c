//! Core library modules.
//!
//! Pure report logic (`business_time`, `sprint`, `vocabulary`, `history`,
//! `row`) has no I/O; `driver` wires it to the collaborators in
//! [`crate::api`] and to the `export` sink. The rest is application plumbing.

pub mod business_time;
pub mod config;
pub mod data_storage;
pub mod driver;
pub mod export;
pub mod formatter;
pub mod history;
pub mod issue;
pub mod logging;
pub mod messages;
pub mod row;
pub mod secret;
pub mod sprint;
pub mod view;
pub mod vocabulary;
