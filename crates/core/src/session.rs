//! Monitor session owning the polling timers of one view.
//!
//! A `MonitorSession` is created per view instance. It owns the status
//! timer and the log timer, so tearing a view down (via `shutdown` or by
//! dropping the session) cancels both. Views talk to it through `Op`s and
//! receive `Event`s back.

use anyhow::{anyhow, Result};
use chrono::Utc;
use mm_protocol::api_models::RunScriptRequest;
use mm_protocol::ipc::{Event, Op};
use mm_protocol::process_models::ProcessRecord;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::MonitorApi;
use crate::config::models::AppConfig;
use crate::polling::{PollTask, TickOutcome};
use crate::state::log_buffer::LogBuffer;
use crate::state::tracker::{PollReport, ProcessTracker};

pub struct MonitorSession {
    tracker: Arc<ProcessTracker>,
    api: Arc<dyn MonitorApi>,
    config: AppConfig,
    events_tx: UnboundedSender<Event>,
    logs: Arc<Mutex<LogBuffer>>,
    selected: Option<String>,
    status_task: Option<PollTask>,
    /// Set by the status timer once its current tick is committed to stopping.
    status_stopping: Arc<AtomicBool>,
    log_task: Option<PollTask>,
}

fn emit(events_tx: &UnboundedSender<Event>, event: Event) {
    if events_tx.send(event).is_err() {
        debug!("event receiver dropped");
    }
}

/// Publish the outcome of a status batch.
fn publish_report(events_tx: &UnboundedSender<Event>, report: PollReport) {
    for (company, error) in report.failures {
        emit(
            events_tx,
            Event::StatusPollFailed {
                company,
                error: error.to_string(),
            },
        );
    }
    for company in report.newly_completed {
        emit(events_tx, Event::ProcessCompleted { company });
    }
    emit(
        events_tx,
        Event::ProcessesUpdated {
            records: report.records,
        },
    );
}

/// Fetch the log of `company` once through the buffer's ticket guard.
///
/// Returns `Stop` when the company's record is completed, so the caller's
/// timer ends after this final fetch.
async fn fetch_log_once(
    api: &Arc<dyn MonitorApi>,
    tracker: &ProcessTracker,
    logs: &Mutex<LogBuffer>,
    events_tx: &UnboundedSender<Event>,
    company: &str,
) -> TickOutcome {
    let Some(record) = tracker.get(company).await else {
        debug!(company, "selected company is not tracked, skipping log fetch");
        return TickOutcome::Continue;
    };
    let finished = if record.is_completed {
        TickOutcome::Stop
    } else {
        TickOutcome::Continue
    };
    let Some(log_file) = record.log_file else {
        return finished;
    };

    let ticket = logs.lock().await.begin_request();
    let reply = api.fetch_log(&log_file).await;

    let mut buffer = logs.lock().await;
    let applied = match reply {
        Ok(content) => buffer.apply(ticket, content),
        Err(e) => {
            warn!(company, log_file = %log_file, error = %e, "log fetch failed");
            buffer.apply_error(ticket, &e.to_string())
        }
    };
    if applied {
        emit(
            events_tx,
            Event::LogReplaced {
                company: company.to_string(),
                content: buffer.content().to_string(),
            },
        );
    }
    finished
}

impl MonitorSession {
    /// Create a session with no timers running.
    ///
    /// # Arguments
    ///
    /// * `api` - Backend client
    /// * `config` - Loaded configuration (intervals, retention, run defaults)
    /// * `events_tx` - Channel the view receives events on
    pub fn new(api: Arc<dyn MonitorApi>, config: AppConfig, events_tx: UnboundedSender<Event>) -> Self {
        let tracker = Arc::new(ProcessTracker::new(Arc::clone(&api), config.retention()));

        Self {
            tracker,
            api,
            config,
            events_tx,
            logs: Arc::new(Mutex::new(LogBuffer::new())),
            selected: None,
            status_task: None,
            status_stopping: Arc::new(AtomicBool::new(false)),
            log_task: None,
        }
    }

    pub fn tracker(&self) -> Arc<ProcessTracker> {
        Arc::clone(&self.tracker)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub async fn log_content(&self) -> String {
        self.logs.lock().await.content().to_string()
    }

    pub fn is_status_polling(&self) -> bool {
        self.status_task.as_ref().is_some_and(|task| !task.is_finished())
            && !self.status_stopping.load(Ordering::SeqCst)
    }

    pub fn is_log_polling(&self) -> bool {
        self.log_task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Reload the active set from the backend.
    ///
    /// Keeps the selection if the company is still tracked, clears it
    /// otherwise, and selects the first record when nothing was selected.
    /// Starts status polling when any record is non-terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be fetched. The tracked set
    /// and the timers are left as they were.
    pub async fn load_processes(&mut self) -> Result<Vec<ProcessRecord>> {
        let records = match self.tracker.refresh_from_backend(Utc::now()).await {
            Ok(records) => records,
            Err(e) => {
                emit(
                    &self.events_tx,
                    Event::Error {
                        message: format!("Failed to load processes: {}", e),
                    },
                );
                return Err(anyhow!("Failed to load processes: {}", e));
            }
        };
        info!(count = records.len(), "loaded active processes");
        emit(
            &self.events_tx,
            Event::ProcessesUpdated {
                records: records.clone(),
            },
        );

        let still_tracked = self
            .selected
            .as_ref()
            .is_some_and(|selected| records.iter().any(|r| &r.company == selected));
        if !still_tracked {
            let next = records.first().map(|r| r.company.clone());
            if next != self.selected {
                self.select(next).await;
            }
        }

        self.ensure_status_polling().await;
        Ok(records)
    }

    /// Start the gathering pipeline for `company` and select it.
    ///
    /// # Errors
    ///
    /// Returns an error if the company name is empty or the backend rejects
    /// the request. An `Event::Error` is emitted as well.
    pub async fn start_company(
        &mut self,
        company: &str,
        limit: Option<u32>,
        all_steps: Option<bool>,
    ) -> Result<ProcessRecord> {
        let company = company.trim();
        if company.is_empty() {
            emit(
                &self.events_tx,
                Event::Error {
                    message: "Please enter a company name".to_string(),
                },
            );
            return Err(anyhow!("Company name must not be empty"));
        }

        let request = RunScriptRequest {
            company: company.to_string(),
            limit: limit.unwrap_or(self.config.settings.default_limit),
            all_steps: all_steps.unwrap_or(self.config.settings.all_steps),
        };
        let response = match self.api.run_script(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(company, error = %e, "run-script rejected");
                emit(
                    &self.events_tx,
                    Event::Error {
                        message: format!("Failed to start processing for {}: {}", company, e),
                    },
                );
                return Err(anyhow!("Failed to start processing for {}: {}", company, e));
            }
        };

        let record = self
            .tracker
            .track_started(company, &response, Utc::now())
            .await;
        emit(
            &self.events_tx,
            Event::ProcessStarted {
                company: company.to_string(),
            },
        );
        emit(
            &self.events_tx,
            Event::ProcessesUpdated {
                records: self.tracker.records().await,
            },
        );

        self.select(Some(company.to_string())).await;
        self.ensure_status_polling().await;
        Ok(record)
    }

    /// Switch the displayed log to another company.
    ///
    /// The previous log task is fully stopped and the buffer cleared
    /// (`LogCleared` emitted) before the new task starts, so content of the
    /// previous company can never show up under the new one.
    pub async fn select(&mut self, company: Option<String>) {
        if let Some(task) = self.log_task.take() {
            task.shutdown().await;
        }

        self.logs.lock().await.switch_to(company.clone());
        emit(
            &self.events_tx,
            Event::LogCleared {
                company: company.clone(),
            },
        );
        emit(
            &self.events_tx,
            Event::SelectionChanged {
                company: company.clone(),
            },
        );
        self.selected = company.clone();

        if let Some(company) = company {
            debug!(company = %company, "selected company");
            self.log_task = Some(self.spawn_log_task(company));
        }
    }

    fn spawn_log_task(&self, company: String) -> PollTask {
        let api = Arc::clone(&self.api);
        let tracker = Arc::clone(&self.tracker);
        let logs = Arc::clone(&self.logs);
        let events_tx = self.events_tx.clone();

        PollTask::spawn_immediate(
            format!("logs:{}", company),
            self.config.log_poll_interval(),
            move || {
                let api = Arc::clone(&api);
                let tracker = Arc::clone(&tracker);
                let logs = Arc::clone(&logs);
                let events_tx = events_tx.clone();
                let company = company.clone();
                async move { fetch_log_once(&api, &tracker, &logs, &events_tx, &company).await }
            },
        )
    }

    /// Restart the status timer if it stopped and anything still needs polling.
    ///
    /// Returns true if a new timer was started.
    pub async fn ensure_status_polling(&mut self) -> bool {
        if self.is_status_polling() || !self.tracker.has_active().await {
            return false;
        }

        // A timer whose tick already decided to stop is replaced, not reused.
        drop(self.status_task.take());
        let stopping = Arc::new(AtomicBool::new(false));
        self.status_stopping = Arc::clone(&stopping);

        let tracker = Arc::clone(&self.tracker);
        let events_tx = self.events_tx.clone();
        self.status_task = Some(PollTask::spawn(
            "status",
            self.config.status_poll_interval(),
            move || {
                let tracker = Arc::clone(&tracker);
                let events_tx = events_tx.clone();
                let stopping = Arc::clone(&stopping);
                async move {
                    let report = tracker.poll_active(Utc::now()).await;
                    let all_terminal = report.all_terminal;
                    publish_report(&events_tx, report);
                    if !all_terminal {
                        return TickOutcome::Continue;
                    }

                    // Publish the decision first, then look again: a record
                    // tracked after the batch either shows up here or sees
                    // the flag and starts a fresh timer.
                    stopping.store(true, Ordering::SeqCst);
                    if tracker.has_active().await {
                        stopping.store(false, Ordering::SeqCst);
                        return TickOutcome::Continue;
                    }
                    info!("all tracked companies are terminal, status polling stopped");
                    emit(&events_tx, Event::StatusPollingStopped);
                    TickOutcome::Stop
                }
            },
        ));
        info!(
            interval_secs = self.config.settings.status_poll_interval_secs,
            "status polling started"
        );
        true
    }

    /// Manual refresh: reload the snapshot, re-poll the selected company
    /// and refetch its log.
    pub async fn refresh_all(&mut self) -> Result<()> {
        self.load_processes().await?;

        if let Some(company) = self.selected.clone() {
            if let Err(e) = self.tracker.poll_once(&company).await {
                emit(
                    &self.events_tx,
                    Event::StatusPollFailed {
                        company: company.clone(),
                        error: e.to_string(),
                    },
                );
            }
            emit(
                &self.events_tx,
                Event::ProcessesUpdated {
                    records: self.tracker.records().await,
                },
            );
        }

        self.refresh_logs().await;
        Ok(())
    }

    /// Fetch the selected company's log once.
    pub async fn refresh_logs(&self) {
        if let Some(company) = &self.selected {
            fetch_log_once(&self.api, &self.tracker, &self.logs, &self.events_tx, company).await;
        }
    }

    /// Apply one operation from the view.
    ///
    /// Returns false once the view asked for shutdown.
    pub async fn handle_op(&mut self, op: Op) -> bool {
        match op {
            Op::RunCompany {
                company,
                limit,
                all_steps,
            } => {
                if let Err(e) = self.start_company(&company, limit, all_steps).await {
                    warn!(error = %e, "run request failed");
                }
            }
            Op::SelectCompany { company } => self.select(company).await,
            Op::RefreshAll => {
                if let Err(e) = self.refresh_all().await {
                    warn!(error = %e, "refresh failed");
                }
            }
            Op::RefreshLogs => self.refresh_logs().await,
            Op::Shutdown => return false,
        }
        true
    }

    /// Cancel both timers and wait for them to unwind.
    pub async fn shutdown(&mut self) {
        if let Some(task) = self.status_task.take() {
            task.shutdown().await;
        }
        if let Some(task) = self.log_task.take() {
            task.shutdown().await;
        }
        info!("monitor session shut down");
    }
}

/// Drive `session` from a view's operation channel until it shuts down.
///
/// The session is torn down when `Op::Shutdown` arrives or the sender is
/// dropped.
pub async fn serve(mut session: MonitorSession, mut op_rx: UnboundedReceiver<Op>) {
    if let Err(e) = session.load_processes().await {
        warn!(error = %e, "initial process load failed");
    }

    while let Some(op) = op_rx.recv().await {
        if !session.handle_op(op).await {
            break;
        }
    }

    session.shutdown().await;
}
