//! Test fixtures for snapshot data and wired-up sessions.

use mm_core::api::MockMonitorApi;
use mm_core::config::models::AppConfig;
use mm_core::session::MonitorSession;
use mm_protocol::ipc::Event;
use mm_protocol::process_models::ActiveProcess;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

/// One entry of the active-processes snapshot.
#[allow(dead_code)]
pub fn active(company: &str, status: &str) -> ActiveProcess {
    ActiveProcess {
        company: company.to_string(),
        current_status: Some(status.to_string()),
        is_completed: status == "RAG Retriever Ready",
        start_time: None,
        log_file: Some(log_file(company)),
    }
}

/// Log reference the fixtures use for `company`.
#[allow(dead_code)]
pub fn log_file(company: &str) -> String {
    format!("logs/{}.log", company.to_lowercase())
}

/// A config with the default 5 second intervals.
#[allow(dead_code)]
pub fn test_config() -> AppConfig {
    AppConfig::default()
}

/// A session on a fresh mock backend, with its event receiver.
#[allow(dead_code)]
pub fn mock_session() -> (MonitorSession, Arc<MockMonitorApi>, UnboundedReceiver<Event>) {
    let api = Arc::new(MockMonitorApi::new());
    let (events_tx, events_rx) = unbounded_channel();
    let session = MonitorSession::new(api.clone(), test_config(), events_tx);
    (session, api, events_rx)
}

/// Drain every event received so far.
#[allow(dead_code)]
pub fn drain(events_rx: &mut UnboundedReceiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = events_rx.try_recv() {
        events.push(event);
    }
    events
}

/// Create a temporary project directory with a `.mentions-monitor/config.toml`.
///
/// Returns a TempDir that must be kept alive for the test duration.
#[allow(dead_code)]
pub fn create_test_project(config_toml: &str) -> std::io::Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;
    let config_dir = temp_dir.path().join(".mentions-monitor");
    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(config_dir.join("config.toml"), config_toml)?;
    Ok(temp_dir)
}
