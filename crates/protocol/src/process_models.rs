//! Tracked process models.
//!
//! This module defines the client-side record of one backend data-gathering
//! job, and the snapshot format the backend uses to list active jobs.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::stage_models::{TERMINAL_STATUS, UNKNOWN_STATUS};

/// Outcome of the most recent status poll for a record.
///
/// A failed poll never touches the status fields of a record; it only
/// changes this marker so views can flag stale data.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PollHealth {
    /// The last poll succeeded.
    Fresh,

    /// The last poll failed with a transport or backend error.
    Failing { error: String },

    /// The backend no longer recognises the company.
    NotFound,
}

/// Client-side state of one company's backend job.
///
/// Records are keyed by `company`; the tracker keeps at most one per company.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    /// Company the job gathers mentions for.
    pub company: String,

    /// Most recently observed status label.
    ///
    /// Always one of the stage labels or [`UNKNOWN_STATUS`].
    pub current_status: String,

    /// True iff `current_status` is the terminal label.
    pub is_completed: bool,

    /// When the backend started the job.
    pub start_time: DateTime<Utc>,

    /// Log file reference handed out by the backend.
    pub log_file: Option<String>,

    /// When the status fields were last overwritten.
    pub last_updated: DateTime<Utc>,

    /// Outcome of the most recent poll.
    pub health: PollHealth,
}

impl ProcessRecord {
    /// Status to show to the user.
    ///
    /// A record the backend stopped recognising keeps its last status
    /// internally but is displayed as unknown.
    pub fn display_status(&self) -> &str {
        match self.health {
            PollHealth::NotFound => UNKNOWN_STATUS,
            _ => &self.current_status,
        }
    }

    /// Whether the record has reached the terminal stage.
    pub fn is_terminal(&self) -> bool {
        self.current_status == TERMINAL_STATUS
    }
}

/// One entry of `GET /companies/active-processes`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct ActiveProcess {
    pub company: String,

    #[serde(rename = "currentStatus", default)]
    pub current_status: Option<String>,

    #[serde(rename = "isCompleted", default)]
    pub is_completed: bool,

    /// Accepts RFC 3339 strings or epoch milliseconds.
    #[serde(
        rename = "startTime",
        default,
        deserialize_with = "deserialize_flexible_timestamp"
    )]
    #[ts(type = "string | number | null")]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub log_file: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Millis(i64),
    Float(f64),
}

/// Backend timestamps arrive either as ISO strings or as JavaScript-style
/// epoch milliseconds.
fn deserialize_flexible_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    let parsed = match raw {
        None => None,
        Some(RawTimestamp::Text(text)) => Some(parse_text_timestamp(&text).ok_or_else(|| {
            serde::de::Error::custom(format!("unrecognised timestamp: {}", text))
        })?),
        Some(RawTimestamp::Millis(ms)) => Utc.timestamp_millis_opt(ms).single(),
        Some(RawTimestamp::Float(ms)) => Utc.timestamp_millis_opt(ms as i64).single(),
    };
    Ok(parsed)
}

fn parse_text_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    // Python's isoformat() without an offset
    chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: &str, health: PollHealth) -> ProcessRecord {
        ProcessRecord {
            company: "Acme".to_string(),
            current_status: status.to_string(),
            is_completed: status == TERMINAL_STATUS,
            start_time: Utc::now(),
            log_file: None,
            last_updated: Utc::now(),
            health,
        }
    }

    #[test]
    fn test_display_status_hides_not_found() {
        let r = record("Started", PollHealth::NotFound);
        assert_eq!(r.display_status(), UNKNOWN_STATUS);
        assert_eq!(r.current_status, "Started");
    }

    #[test]
    fn test_display_status_keeps_failing_status() {
        let r = record(
            "Scraping Completed",
            PollHealth::Failing {
                error: "timeout".to_string(),
            },
        );
        assert_eq!(r.display_status(), "Scraping Completed");
    }

    #[test]
    fn test_active_process_accepts_millis() {
        let json = r#"{"company":"Acme","currentStatus":"Started","isCompleted":false,"startTime":1700000000000,"log_file":"logs/acme.log"}"#;
        let p: ActiveProcess = serde_json::from_str(json).unwrap();
        assert_eq!(p.start_time.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(p.log_file.as_deref(), Some("logs/acme.log"));
    }

    #[test]
    fn test_active_process_accepts_naive_iso() {
        let json = r#"{"company":"Acme","startTime":"2024-05-01T10:20:30.123456"}"#;
        let p: ActiveProcess = serde_json::from_str(json).unwrap();
        assert_eq!(p.start_time.unwrap().timestamp(), 1_714_558_830);
        assert!(p.current_status.is_none());
        assert!(!p.is_completed);
    }

    #[test]
    fn test_active_process_rejects_garbage_timestamp() {
        let json = r#"{"company":"Acme","startTime":"yesterday"}"#;
        assert!(serde_json::from_str::<ActiveProcess>(json).is_err());
    }
}
