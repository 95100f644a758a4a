//! Communication protocol between a view and its monitor session.
//!
//! This module defines the message types for asynchronous communication
//! between a view (the TUI) and the monitor session that polls the backend.
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands sent from the view to the session
//! - `Event`: State updates sent from the session to the view
//!
//! Communication is asynchronous and channel-based, allowing the UI to
//! remain responsive while status and log polls are in flight.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::process_models::ProcessRecord;

/// Operations sent from the view to the monitor session.
///
/// Uses tagged enum serialization for TypeScript compatibility:
/// ```json
/// {
///   "type": "runCompany",
///   "payload": {
///     "company": "Acme",
///     "limit": 100,
///     "all_steps": true
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Start the gathering pipeline for a company.
    RunCompany {
        company: String,
        /// Falls back to the configured default when absent.
        limit: Option<u32>,
        all_steps: Option<bool>,
    },

    /// Show the log of another company, or of none.
    SelectCompany { company: Option<String> },

    /// Reload the active set and re-poll the selected company.
    RefreshAll,

    /// Fetch the selected company's log once.
    RefreshLogs,

    /// Tear the session down. No poll runs after this.
    Shutdown,
}

/// Events sent from the monitor session to the view.
///
/// Uses tagged enum serialization for TypeScript compatibility:
/// ```json
/// {
///   "type": "logReplaced",
///   "payload": {
///     "company": "Acme",
///     "content": "Started\n..."
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// The full tracked set after a reconciliation or a status poll batch.
    ///
    /// Always carries every record so views update all of them at once.
    ProcessesUpdated { records: Vec<ProcessRecord> },

    /// The displayed company changed.
    SelectionChanged { company: Option<String> },

    /// The displayed log was cleared. Sent before any content of a new
    /// selection.
    LogCleared { company: Option<String> },

    /// The displayed log was replaced wholesale.
    LogReplaced { company: String, content: String },

    /// A status lookup failed; the record kept its last known state.
    StatusPollFailed { company: String, error: String },

    /// A company reached the terminal stage.
    ProcessCompleted { company: String },

    /// A new pipeline run was accepted by the backend.
    ProcessStarted { company: String },

    /// Every tracked company is terminal, the status timer stopped.
    StatusPollingStopped,

    /// A user-triggered operation failed.
    Error { message: String },
}
