//! Integration test: settings loaded from disk drive the session timers.

mod common;

use common::create_test_project;
use mm_core::api::MockMonitorApi;
use mm_core::config::loader::load_config_with_env;
use mm_core::session::MonitorSession;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::unbounded_channel;

#[tokio::test(start_paused = true)]
async fn test_configured_interval_and_defaults_are_used() {
    let project = create_test_project(
        r#"
api_base_url = "http://backend.internal:9000"
status_poll_interval_secs = 2
default_limit = 40
all_steps = false
"#,
    )
    .expect("project");
    let config = load_config_with_env(project.path(), |_| None).expect("config");
    assert_eq!(config.settings.api_base_url, "http://backend.internal:9000");

    let api = Arc::new(MockMonitorApi::new());
    api.set_status("Acme", "Started");
    let (events_tx, _events_rx) = unbounded_channel();
    let mut session = MonitorSession::new(api.clone(), config, events_tx);

    session.start_company("Acme", None, None).await.expect("start");
    tokio::time::sleep(Duration::from_millis(4100)).await;

    assert_eq!(api.status_calls("Acme"), 2);
    let request = &api.run_requests()[0];
    assert_eq!(request.limit, 40);
    assert!(!request.all_steps);
    session.shutdown().await;
}
