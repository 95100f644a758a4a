//! Process tracker for coordinating the active set of company records.
//!
//! The ProcessTracker is the single owner of every `ProcessRecord`. It
//! polls the backend for status, reconciles the set against the backend's
//! active-process snapshot, and drops completed records once their
//! retention window has passed.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use mm_protocol::api_models::RunScriptResponse;
use mm_protocol::process_models::{ActiveProcess, ProcessRecord};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::MonitorApi;
use crate::state::error::TrackerError;
use crate::state::record::{
    apply_status, create_record, merge_snapshot, record_from_active, record_poll_error,
    should_retain_after_completion,
};

/// Outcome of one status poll batch.
#[derive(Debug, Clone, Default)]
pub struct PollReport {
    /// The whole tracked set after the batch was applied.
    pub records: Vec<ProcessRecord>,

    /// Companies whose lookup failed or returned an unknown label.
    pub failures: Vec<(String, TrackerError)>,

    /// Companies that reached the terminal stage in this batch.
    pub newly_completed: Vec<String>,

    /// Companies dropped because their retention window passed.
    pub expired: Vec<String>,

    /// True when no tracked record is left to poll.
    pub all_terminal: bool,
}

/// Tracks one `ProcessRecord` per company.
///
/// Records are kept in insertion order so views list them stably.
pub struct ProcessTracker {
    /// The active set, guarded by a single lock so batch updates are atomic.
    records: Mutex<Vec<ProcessRecord>>,

    /// Backend used for status and snapshot lookups.
    api: Arc<dyn MonitorApi>,

    /// How long completed records stay in the set.
    retention: chrono::Duration,
}

impl ProcessTracker {
    /// Create an empty tracker.
    ///
    /// # Arguments
    ///
    /// * `api` - Backend client shared with the rest of the session
    /// * `retention` - How long completed records are kept after their last update
    pub fn new(api: Arc<dyn MonitorApi>, retention: chrono::Duration) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            api,
            retention,
        }
    }

    pub fn api(&self) -> Arc<dyn MonitorApi> {
        Arc::clone(&self.api)
    }

    /// Poll the backend once for `company` and update its record.
    ///
    /// A company that is not tracked yet is added when the backend knows it.
    ///
    /// # Errors
    ///
    /// - `TrackerError::NotFound` if the backend does not recognise the company
    /// - `TrackerError::NetworkFailure` on transport or backend errors
    ///
    /// On either error the record's status fields are left untouched; only
    /// its health marker changes.
    pub async fn poll_once(&self, company: &str) -> Result<ProcessRecord, TrackerError> {
        let reply = self.api.company_status(company).await;
        let now = Utc::now();

        let mut records = self.records.lock().await;
        match reply {
            Ok(label) => {
                let index = match records.iter().position(|r| r.company == company) {
                    Some(index) => index,
                    None => {
                        records.push(create_record(company.to_string(), None, now));
                        records.len() - 1
                    }
                };
                let record = &mut records[index];
                if let Err(e) = apply_status(record, &label, now) {
                    warn!(company, error = %e, "status not in stage table");
                }
                debug!(company, status = %record.current_status, "status polled");
                Ok(record.clone())
            }
            Err(api_error) => {
                let error = TrackerError::from_api(company, api_error);
                if let Some(record) = records.iter_mut().find(|r| r.company == company) {
                    record_poll_error(record, &error);
                }
                warn!(company, error = %error, "status poll failed, keeping last known state");
                Err(error)
            }
        }
    }

    /// Poll every non-terminal company in one batch.
    ///
    /// All lookups run concurrently and their results are applied together
    /// under a single lock, so observers never see half a batch.
    pub async fn poll_active(&self, now: DateTime<Utc>) -> PollReport {
        let targets: Vec<String> = {
            let records = self.records.lock().await;
            records
                .iter()
                .filter(|r| !r.is_completed)
                .map(|r| r.company.clone())
                .collect()
        };

        let replies = join_all(targets.iter().map(|company| {
            let api = Arc::clone(&self.api);
            async move { (company.clone(), api.company_status(company).await) }
        }))
        .await;

        let mut report = PollReport::default();
        let mut records = self.records.lock().await;

        for (company, reply) in replies {
            let Some(record) = records.iter_mut().find(|r| r.company == company) else {
                // Removed by a reconciliation while the lookup was in flight.
                continue;
            };
            match reply {
                Ok(label) => {
                    let was_completed = record.is_completed;
                    if let Err(e) = apply_status(record, &label, now) {
                        warn!(company = %company, error = %e, "status not in stage table");
                        report.failures.push((company.clone(), e));
                    }
                    if record.is_completed && !was_completed {
                        info!(company = %company, "pipeline completed");
                        report.newly_completed.push(company);
                    }
                }
                Err(api_error) => {
                    let error = TrackerError::from_api(&company, api_error);
                    warn!(company = %company, error = %error, "status poll failed, keeping last known state");
                    record_poll_error(record, &error);
                    report.failures.push((company, error));
                }
            }
        }

        report.expired = self.prune_locked(&mut records, now);
        report.all_terminal = records.iter().all(|r| r.is_completed);
        report.records = records.clone();

        debug!(
            polled = targets.len(),
            failures = report.failures.len(),
            "status batch applied"
        );
        report
    }

    /// Fold the backend's active-process snapshot into the tracked set.
    ///
    /// New companies are added, known ones updated, companies missing from
    /// the snapshot removed, and expired completed records dropped.
    pub async fn reconcile(&self, snapshot: Vec<ActiveProcess>, now: DateTime<Utc>) -> Vec<ProcessRecord> {
        let mut records = self.records.lock().await;

        let mut next = Vec::with_capacity(snapshot.len());
        for active in snapshot {
            if next.iter().any(|r: &ProcessRecord| r.company == active.company) {
                continue;
            }
            let record = match records.iter().position(|r| r.company == active.company) {
                Some(index) => {
                    let mut existing = records.swap_remove(index);
                    merge_snapshot(&mut existing, active, now);
                    existing
                }
                None => record_from_active(active, now),
            };
            next.push(record);
        }

        for dropped in records.iter() {
            debug!(company = %dropped.company, "no longer reported as active");
        }

        *records = next;
        self.prune_locked(&mut records, now);
        records.clone()
    }

    /// Fetch the active-process snapshot and reconcile against it.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NetworkFailure` if the snapshot cannot be
    /// fetched; the tracked set is left as it was.
    pub async fn refresh_from_backend(&self, now: DateTime<Utc>) -> Result<Vec<ProcessRecord>, TrackerError> {
        match self.api.active_processes().await {
            Ok(snapshot) => Ok(self.reconcile(snapshot, now).await),
            Err(e) => {
                warn!(error = %e, "failed to load active processes");
                Err(TrackerError::NetworkFailure(e.to_string()))
            }
        }
    }

    /// Start tracking a job the backend just accepted.
    ///
    /// Replaces any previous record for the same company.
    pub async fn track_started(
        &self,
        company: &str,
        response: &RunScriptResponse,
        now: DateTime<Utc>,
    ) -> ProcessRecord {
        let record = create_record(company.to_string(), response.log_file.clone(), now);
        let mut records = self.records.lock().await;

        match records.iter_mut().find(|r| r.company == company) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        info!(company, log_file = ?response.log_file, pid = ?response.pid, "tracking new pipeline run");
        record
    }

    fn prune_locked(&self, records: &mut Vec<ProcessRecord>, now: DateTime<Utc>) -> Vec<String> {
        let mut expired = Vec::new();
        records.retain(|record| {
            let keep = should_retain_after_completion(record, now, self.retention);
            if !keep {
                expired.push(record.company.clone());
            }
            keep
        });
        for company in &expired {
            info!(company = %company, "completed record expired");
        }
        expired
    }

    /// Get the current record of a company.
    pub async fn get(&self, company: &str) -> Option<ProcessRecord> {
        let records = self.records.lock().await;
        records.iter().find(|r| r.company == company).cloned()
    }

    /// Get every tracked record.
    pub async fn records(&self) -> Vec<ProcessRecord> {
        self.records.lock().await.clone()
    }

    /// Whether any tracked record still needs polling.
    pub async fn has_active(&self) -> bool {
        self.records.lock().await.iter().any(|r| !r.is_completed)
    }

    /// Get the number of tracked records.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}
