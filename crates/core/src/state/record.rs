//! Process record transitions.
//!
//! This module provides the functions that create and mutate a
//! `ProcessRecord`. Status fields (label, completion flag, last update) are
//! always overwritten together; poll failures only touch `health`.

use chrono::{DateTime, Utc};
use mm_protocol::process_models::{ActiveProcess, PollHealth, ProcessRecord};
use mm_protocol::stage_models::{STATUS_STEPS, UNKNOWN_STATUS};

use crate::stages::{is_terminal, resolve_stage};
use crate::state::error::TrackerError;

/// Create a record for a job the backend just accepted.
///
/// # Arguments
///
/// * `company` - The company the job runs for
/// * `log_file` - Log reference returned by `POST /run-script`
/// * `now` - Creation time, used as start and last-update time
///
/// # Returns
///
/// A record in the first stage with fresh health.
pub fn create_record(company: String, log_file: Option<String>, now: DateTime<Utc>) -> ProcessRecord {
    ProcessRecord {
        company,
        current_status: STATUS_STEPS[0].status_label.to_string(),
        is_completed: false,
        start_time: now,
        log_file,
        last_updated: now,
        health: PollHealth::Fresh,
    }
}

/// Normalise a backend label: anything outside the stage table becomes `unknown`.
fn normalise_label(label: Option<&str>) -> &str {
    match label {
        Some(label) if resolve_stage(label).is_some() => label,
        _ => UNKNOWN_STATUS,
    }
}

/// Seed a record from one entry of the active-processes snapshot.
///
/// The completion flag is derived from the status label, not copied from
/// the backend, so the two can never disagree.
pub fn record_from_active(active: ActiveProcess, now: DateTime<Utc>) -> ProcessRecord {
    let status = normalise_label(active.current_status.as_deref()).to_string();

    ProcessRecord {
        is_completed: is_terminal(&status),
        current_status: status,
        company: active.company,
        start_time: active.start_time.unwrap_or(now),
        log_file: active.log_file,
        last_updated: now,
        health: PollHealth::Fresh,
    }
}

/// Overwrite the status fields with a freshly polled label.
///
/// # Arguments
///
/// * `record` - The record to update
/// * `label` - Status label reported by the backend
/// * `now` - Time of the poll
///
/// # Errors
///
/// Returns `TrackerError::UnknownStatus` when the label is not in the stage
/// table. The record is still updated (to `unknown`): the backend answered,
/// and the latest answer wins.
pub fn apply_status(record: &mut ProcessRecord, label: &str, now: DateTime<Utc>) -> Result<(), TrackerError> {
    let status = normalise_label(Some(label));

    record.current_status = status.to_string();
    record.is_completed = is_terminal(status);
    record.last_updated = now;
    record.health = PollHealth::Fresh;

    if status == UNKNOWN_STATUS && label != UNKNOWN_STATUS {
        return Err(TrackerError::UnknownStatus {
            company: record.company.clone(),
            status: label.to_string(),
        });
    }
    Ok(())
}

/// Flag a failed poll without touching the status fields.
pub fn mark_poll_failure(record: &mut ProcessRecord, error: &TrackerError) {
    record.health = PollHealth::Failing {
        error: error.to_string(),
    };
}

/// Flag that the backend no longer recognises the company.
///
/// The record stays in the active set and is displayed as unknown.
pub fn mark_not_found(record: &mut ProcessRecord) {
    record.health = PollHealth::NotFound;
}

/// Record a poll error on the matching health marker.
pub fn record_poll_error(record: &mut ProcessRecord, error: &TrackerError) {
    match error {
        TrackerError::NotFound(_) => mark_not_found(record),
        other => mark_poll_failure(record, other),
    }
}

/// Fold a newer snapshot entry into an existing record.
///
/// Status fields are replaced only when the snapshot reports a different
/// status, so `last_updated` keeps meaning "last status change observed".
pub fn merge_snapshot(record: &mut ProcessRecord, active: ActiveProcess, now: DateTime<Utc>) {
    let status = normalise_label(active.current_status.as_deref());

    if status != record.current_status {
        record.current_status = status.to_string();
        record.is_completed = is_terminal(status);
        record.last_updated = now;
    }
    if let Some(start_time) = active.start_time {
        record.start_time = start_time;
    }
    if active.log_file.is_some() {
        record.log_file = active.log_file;
    }
    record.health = PollHealth::Fresh;
}

/// Whether a record stays in the active set.
///
/// Completed records are dropped once `now - last_updated` exceeds the
/// retention window; everything else is kept.
pub fn should_retain_after_completion(
    record: &ProcessRecord,
    now: DateTime<Utc>,
    retention: chrono::Duration,
) -> bool {
    !record.is_completed || now - record.last_updated <= retention
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_create_record() {
        let t = now();
        let record = create_record("Acme".to_string(), Some("logs/acme.log".to_string()), t);

        assert_eq!(record.current_status, "preparing");
        assert!(!record.is_completed);
        assert_eq!(record.start_time, t);
        assert_eq!(record.last_updated, t);
        assert_eq!(record.health, PollHealth::Fresh);
    }

    #[test]
    fn test_apply_status_overwrites_all_status_fields() {
        let t0 = now();
        let mut record = create_record("Acme".to_string(), None, t0);
        record.health = PollHealth::Failing {
            error: "old".to_string(),
        };

        let t1 = t0 + Duration::seconds(5);
        apply_status(&mut record, "RAG Retriever Ready", t1).expect("known label");

        assert_eq!(record.current_status, "RAG Retriever Ready");
        assert!(record.is_completed);
        assert_eq!(record.last_updated, t1);
        assert_eq!(record.health, PollHealth::Fresh);
    }

    #[test]
    fn test_apply_status_allows_regression() {
        let t0 = now();
        let mut record = create_record("Acme".to_string(), None, t0);
        apply_status(&mut record, "Embedding Completed", t0).expect("known label");
        apply_status(&mut record, "Started", t0).expect("known label");

        assert_eq!(record.current_status, "Started");
    }

    #[test]
    fn test_apply_unknown_status() {
        let t0 = now();
        let mut record = create_record("Acme".to_string(), None, t0);
        apply_status(&mut record, "Started", t0).expect("known label");

        let err = apply_status(&mut record, "bogus", t0).expect_err("unknown label");

        assert_eq!(
            err,
            TrackerError::UnknownStatus {
                company: "Acme".to_string(),
                status: "bogus".to_string()
            }
        );
        assert_eq!(record.current_status, UNKNOWN_STATUS);
        assert!(!record.is_completed);
    }

    #[test]
    fn test_poll_failure_preserves_status_fields() {
        let t0 = now();
        let mut record = create_record("Acme".to_string(), None, t0);
        apply_status(&mut record, "Scraping Completed", t0).expect("known label");
        let before = record.clone();

        record_poll_error(&mut record, &TrackerError::NetworkFailure("timeout".to_string()));

        assert_eq!(record.current_status, before.current_status);
        assert_eq!(record.is_completed, before.is_completed);
        assert_eq!(record.last_updated, before.last_updated);
        assert!(matches!(record.health, PollHealth::Failing { .. }));
    }

    #[test]
    fn test_not_found_keeps_record_displayed_as_unknown() {
        let t0 = now();
        let mut record = create_record("Acme".to_string(), None, t0);
        apply_status(&mut record, "Started", t0).expect("known label");

        record_poll_error(&mut record, &TrackerError::NotFound("Acme".to_string()));

        assert_eq!(record.current_status, "Started");
        assert_eq!(record.display_status(), UNKNOWN_STATUS);
    }

    #[test]
    fn test_record_from_active_normalises_status() {
        let t0 = now();
        let active = ActiveProcess {
            company: "Acme".to_string(),
            current_status: Some("something odd".to_string()),
            is_completed: true,
            start_time: None,
            log_file: Some("logs/acme.log".to_string()),
        };

        let record = record_from_active(active, t0);

        assert_eq!(record.current_status, UNKNOWN_STATUS);
        assert!(!record.is_completed);
        assert_eq!(record.start_time, t0);
    }

    #[test]
    fn test_merge_snapshot_keeps_last_updated_when_unchanged() {
        let t0 = now();
        let mut record = create_record("Acme".to_string(), None, t0);
        let snapshot = ActiveProcess {
            company: "Acme".to_string(),
            current_status: Some("preparing".to_string()),
            is_completed: false,
            start_time: None,
            log_file: Some("logs/acme.log".to_string()),
        };

        merge_snapshot(&mut record, snapshot, t0 + Duration::minutes(10));

        assert_eq!(record.last_updated, t0);
        assert_eq!(record.log_file.as_deref(), Some("logs/acme.log"));
    }

    #[test]
    fn test_retention_window() {
        let t0 = now();
        let mut record = create_record("Acme".to_string(), None, t0);
        apply_status(&mut record, "RAG Retriever Ready", t0).expect("known label");
        let retention = Duration::hours(24);

        assert!(should_retain_after_completion(&record, t0 + Duration::hours(24), retention));
        assert!(!should_retain_after_completion(
            &record,
            t0 + Duration::hours(24) + Duration::seconds(1),
            retention
        ));
    }

    #[test]
    fn test_incomplete_records_are_always_retained() {
        let t0 = now();
        let record = create_record("Acme".to_string(), None, t0);

        assert!(should_retain_after_completion(
            &record,
            t0 + Duration::days(30),
            Duration::hours(24)
        ));
    }
}
