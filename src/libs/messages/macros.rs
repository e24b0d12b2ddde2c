//! Message macros.
//!
//! In debug mode (`JIRA_KPI_DEBUG` or `RUST_LOG` set) messages are emitted
//! as `tracing` events so they interleave with the structured logs. Otherwise
//! they are printed to stdout, errors to stderr.
//!
//! ```rust
//! use jira_kpi::{msg_info, msg_warning};
//! use jira_kpi::libs::messages::Message;
//!
//! msg_info!(Message::IssuesFetched(12));
//! msg_warning!(Message::CommitLookupDisabled);
//! ```

use std::sync::OnceLock;

pub const DEBUG_ENV: &str = "JIRA_KPI_DEBUG";

static DEBUG_MODE: OnceLock<bool> = OnceLock::new();

#[doc(hidden)]
pub fn is_debug_mode() -> bool {
    *DEBUG_MODE.get_or_init(|| {
        std::env::var(DEBUG_ENV).is_ok() || std::env::var("RUST_LOG").is_ok()
    })
}

#[doc(hidden)]
#[macro_export]
macro_rules! __msg_emit {
    ($level:ident, $print:ident, $prefix:literal, $msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::$level!("{}{}", $prefix, $msg);
        } else {
            $print!("{}{}", $prefix, $msg);
        }
    };
    ($level:ident, $print:ident, $prefix:literal, $msg:expr, padded) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::$level!("\n{}{}\n", $prefix, $msg);
        } else {
            $print!("\n{}{}\n", $prefix, $msg);
        }
    };
}

/// Plain message, no prefix.
#[macro_export]
macro_rules! msg_print {
    ($msg:expr) => {
        $crate::__msg_emit!(info, println, "", $msg)
    };
    ($msg:expr, true) => {
        $crate::__msg_emit!(info, println, "", $msg, padded)
    };
}

#[macro_export]
macro_rules! msg_success {
    ($msg:expr) => {
        $crate::__msg_emit!(info, println, "✅ ", $msg)
    };
    ($msg:expr, true) => {
        $crate::__msg_emit!(info, println, "✅ ", $msg, padded)
    };
}

#[macro_export]
macro_rules! msg_info {
    ($msg:expr) => {
        $crate::__msg_emit!(info, println, "ℹ️ ", $msg)
    };
    ($msg:expr, true) => {
        $crate::__msg_emit!(info, println, "ℹ️ ", $msg, padded)
    };
}

#[macro_export]
macro_rules! msg_warning {
    ($msg:expr) => {
        $crate::__msg_emit!(warn, eprintln, "⚠️ ", $msg)
    };
    ($msg:expr, true) => {
        $crate::__msg_emit!(warn, eprintln, "⚠️ ", $msg, padded)
    };
}

/// Errors go to stderr outside debug mode.
#[macro_export]
macro_rules! msg_error {
    ($msg:expr) => {
        $crate::__msg_emit!(error, eprintln, "❌ ", $msg)
    };
    ($msg:expr, true) => {
        $crate::__msg_emit!(error, eprintln, "❌ ", $msg, padded)
    };
}

/// Only emitted in debug mode.
#[macro_export]
macro_rules! msg_debug {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::debug!("🔍 {}", $msg);
        }
    };
}

/// Error values carry no prefix; `main` prints them through `msg_error!`.
#[macro_export]
macro_rules! msg_error_anyhow {
    ($msg:expr) => {
        anyhow::anyhow!("{}", $msg)
    };
}

#[macro_export]
macro_rules! msg_bail_anyhow {
    ($msg:expr) => {
        anyhow::bail!("{}", $msg)
    };
}
