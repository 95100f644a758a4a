//! Pipeline stage table.
//!
//! The backend reports the progress of a data-gathering job as a free-form
//! status string. Every string it can emit is listed here, in pipeline order,
//! together with the progress percentage the dashboard shows for it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One milestone of the backend pipeline.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    /// Stable identifier used by views.
    pub id: &'static str,

    /// Human-readable name.
    pub name: &'static str,

    /// Exact status string reported by `GET /company/status`.
    pub status_label: &'static str,

    /// Progress percentage once this stage has been reached.
    pub progress: u8,
}

/// Status label shown when the backend reports nothing we recognise.
pub const UNKNOWN_STATUS: &str = "unknown";

/// Status label of the final stage.
pub const TERMINAL_STATUS: &str = "RAG Retriever Ready";

/// The ordered stage list. Percentages are non-decreasing and the last one is 100.
pub const STATUS_STEPS: [Stage; 8] = [
    Stage {
        id: "preparing",
        name: "Preparing",
        status_label: "preparing",
        progress: 5,
    },
    Stage {
        id: "started",
        name: "Started",
        status_label: "Started",
        progress: 10,
    },
    Stage {
        id: "scraping",
        name: "Scraping Completed",
        status_label: "Scraping Completed",
        progress: 15,
    },
    Stage {
        id: "gathering",
        name: "Info Gathering Completed",
        status_label: "Info Gathering Completed",
        progress: 35,
    },
    Stage {
        id: "preprocessing",
        name: "Preprocessing Completed",
        status_label: "Preprocessing Completed",
        progress: 55,
    },
    Stage {
        id: "population",
        name: "DB Population Completed",
        status_label: "DB Population Completed",
        progress: 75,
    },
    Stage {
        id: "embedding",
        name: "Embedding Completed",
        status_label: "Embedding Completed",
        progress: 95,
    },
    Stage {
        id: "rag",
        name: "RAG Retriever Ready",
        status_label: TERMINAL_STATUS,
        progress: 100,
    },
];

/// Per-stage classification relative to a company's current status.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
    /// Not reached yet.
    Pending,

    /// The stage the backend last reported.
    Processing,

    /// Already passed (or the whole pipeline is done).
    Completed,
}
