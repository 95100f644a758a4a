//! # mm-tui
//!
//! Terminal dashboard for mentions-monitor.
//!
//! This crate renders the tracked companies, the selected company's stage
//! progress and its log. It talks to a `MonitorSession` from `mm-core`
//! through the `Op` and `Event` channels defined in `mm-protocol`; all
//! polling happens in the session, the view only reacts to events.

pub mod app;
pub mod event;
pub mod event_handler;
pub mod tui;
pub mod widgets;

pub use app::App;
pub use tui::Tui;

use anyhow::Result;
use mm_core::api::HttpMonitorApi;
use mm_core::config::models::AppConfig;
use mm_core::session::{serve, MonitorSession};
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;

/// Run the dashboard until the user quits.
///
/// Spawns a monitor session against the configured backend, drives the
/// terminal UI, and shuts the session down (stopping every timer) before
/// returning.
pub async fn run_app(config: AppConfig) -> Result<()> {
    let api = Arc::new(HttpMonitorApi::from_config(&config)?);
    tracing::info!(backend = %api.base_url(), "starting dashboard");

    let (op_tx, op_rx) = unbounded_channel();
    let (event_tx, event_rx) = unbounded_channel();
    let session = MonitorSession::new(api, config, event_tx);
    let session_handle = tokio::spawn(serve(session, op_rx));

    let mut tui = Tui::init()?;
    let mut app = App::new(op_tx.clone(), event_rx);
    let result = app.run(&mut tui).await;
    tui.restore()?;

    if op_tx.send(mm_protocol::Op::Shutdown).is_err() {
        tracing::debug!("monitor session already stopped");
    }
    if let Err(e) = session_handle.await {
        tracing::warn!("monitor session ended abnormally: {}", e);
    }

    result
}
