//! Integration tests for ProcessTracker batch polling.
//!
//! These tests verify that the tracker:
//! - Polls every non-terminal company in one batch
//! - Keeps the last good state when a poll fails
//! - Drops completed records only after the retention window
//! - Applies a batch atomically even when lookups finish at different times

mod common;

use chrono::{Duration, Utc};
use common::active;
use mm_core::api::{ApiError, MockMonitorApi};
use mm_core::state::error::TrackerError;
use mm_core::state::tracker::ProcessTracker;
use mm_protocol::process_models::PollHealth;
use std::sync::Arc;

fn tracker(api: &Arc<MockMonitorApi>) -> ProcessTracker {
    ProcessTracker::new(api.clone(), Duration::hours(24))
}

#[tokio::test]
async fn test_failed_second_poll_keeps_first_result() {
    let api = Arc::new(MockMonitorApi::new());
    api.push_status("Acme", Ok("Info Gathering Completed"));
    api.push_status("Acme", Err(ApiError::Network("timeout".to_string())));
    let tracker = tracker(&api);
    let t0 = Utc::now();
    tracker.reconcile(vec![active("Acme", "Started")], t0).await;

    let first = tracker.poll_active(t0).await;
    let second = tracker.poll_active(t0 + Duration::seconds(5)).await;

    let before = &first.records[0];
    let after = &second.records[0];
    assert_eq!(after.current_status, "Info Gathering Completed");
    assert_eq!(after.current_status, before.current_status);
    assert_eq!(after.is_completed, before.is_completed);
    assert_eq!(after.last_updated, before.last_updated);
    assert_eq!(after.start_time, before.start_time);
    assert!(matches!(after.health, PollHealth::Failing { .. }));
    assert!(matches!(
        second.failures.as_slice(),
        [(company, TrackerError::NetworkFailure(_))] if company == "Acme"
    ));
}

#[tokio::test]
async fn test_batch_polls_each_active_company_once() {
    let api = Arc::new(MockMonitorApi::new());
    api.set_status("Acme", "Scraping Completed");
    api.set_status("Globex", "RAG Retriever Ready");
    api.set_status("Initech", "Started");
    let tracker = tracker(&api);
    let t0 = Utc::now();
    tracker
        .reconcile(
            vec![
                active("Acme", "Started"),
                active("Globex", "Embedding Completed"),
                active("Initech", "RAG Retriever Ready"),
            ],
            t0,
        )
        .await;

    let report = tracker.poll_active(t0).await;

    assert_eq!(api.status_calls("Acme"), 1);
    assert_eq!(api.status_calls("Globex"), 1);
    assert_eq!(api.status_calls("Initech"), 0);
    assert_eq!(report.newly_completed, vec!["Globex".to_string()]);
    assert!(!report.all_terminal);
}

#[tokio::test]
async fn test_batch_reports_all_terminal() {
    let api = Arc::new(MockMonitorApi::new());
    api.set_status("Acme", "RAG Retriever Ready");
    let tracker = tracker(&api);
    let t0 = Utc::now();
    tracker.reconcile(vec![active("Acme", "Embedding Completed")], t0).await;

    let report = tracker.poll_active(t0).await;

    assert!(report.all_terminal);
    assert!(!tracker.has_active().await);

    let next = tracker.poll_active(t0 + Duration::seconds(5)).await;
    assert_eq!(api.status_calls("Acme"), 1);
    assert!(next.all_terminal);
}

#[tokio::test]
async fn test_unknown_label_is_reported_and_stored_as_unknown() {
    let api = Arc::new(MockMonitorApi::new());
    api.set_status("Acme", "Reticulating Splines");
    let tracker = tracker(&api);
    let t0 = Utc::now();
    tracker.reconcile(vec![active("Acme", "Started")], t0).await;

    let report = tracker.poll_active(t0).await;

    assert_eq!(report.records[0].current_status, "unknown");
    assert!(matches!(
        report.failures.as_slice(),
        [(_, TrackerError::UnknownStatus { status, .. })] if status == "Reticulating Splines"
    ));
}

#[tokio::test]
async fn test_completed_record_retained_for_exactly_24_hours() {
    let api = Arc::new(MockMonitorApi::new());
    api.set_status("Acme", "RAG Retriever Ready");
    api.set_status("Globex", "Started");
    let tracker = tracker(&api);
    let t0 = Utc::now();
    tracker
        .reconcile(vec![active("Acme", "Embedding Completed"), active("Globex", "Started")], t0)
        .await;
    tracker.poll_active(t0).await;

    let at_window = tracker.poll_active(t0 + Duration::hours(24)).await;
    assert!(at_window.records.iter().any(|r| r.company == "Acme"));
    assert!(at_window.expired.is_empty());

    let past_window = tracker
        .poll_active(t0 + Duration::hours(24) + Duration::seconds(1))
        .await;
    assert!(past_window.records.iter().all(|r| r.company != "Acme"));
    assert_eq!(past_window.expired, vec!["Acme".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_readers_never_see_a_partial_batch() {
    let api = Arc::new(MockMonitorApi::new());
    let companies = ["A", "B", "C", "D"];
    for (i, company) in companies.iter().enumerate() {
        api.set_status(company, "DB Population Completed");
        api.set_status_latency(company, std::time::Duration::from_millis(10 * (i as u64 + 1)));
    }
    let tracker = Arc::new(tracker(&api));
    let t0 = Utc::now();
    tracker
        .reconcile(companies.iter().map(|c| active(c, "Started")).collect(), t0)
        .await;

    let poller = {
        let tracker = Arc::clone(&tracker);
        tokio::spawn(async move { tracker.poll_active(t0).await })
    };

    let mut observations = 0;
    while !poller.is_finished() {
        let updated = tracker
            .records()
            .await
            .iter()
            .filter(|r| r.current_status == "DB Population Completed")
            .count();
        assert!(updated == 0 || updated == companies.len(), "saw {} of 4 updated", updated);
        observations += 1;
        tokio::time::sleep(std::time::Duration::from_millis(3)).await;
    }
    let report = poller.await.expect("poll task");

    assert!(observations > 3);
    assert!(report.failures.is_empty());
    assert!(report
        .records
        .iter()
        .all(|r| r.current_status == "DB Population Completed"));
    for company in companies {
        assert_eq!(api.status_calls(company), 1);
    }
}
