//! Main entry point for the mm-tui binary.
//!
//! This executable runs the dashboard against the backend configured in
//! `.mentions-monitor/config.toml` of the current directory.

use anyhow::Result;
use mm_core::config::loader::load_config;
use mm_tui::run_app;

#[tokio::main]
async fn main() -> Result<()> {
    let root = std::env::current_dir()?;
    let config = load_config(&root).await?;
    run_app(config).await
}
