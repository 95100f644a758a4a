use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result, WrapErr};
use mm_core::api::{HttpMonitorApi, MonitorApi};
use mm_core::config::loader::{load_config, validate_settings, CONFIG_DIR};
use mm_core::config::models::AppConfig;
use mm_core::logs::LogFilter;
use mm_protocol::MentionFilters;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

/// Environment variable holding the tracing filter.
const LOG_ENV: &str = "MENTIONS_MONITOR_LOG";

#[derive(Parser, Debug)]
#[command(name = "mentions-monitor")]
#[command(about = "Track company mention gathering runs and their logs")]
#[command(version)]
struct Cli {
    /// Directory containing `.mentions-monitor/` (defaults to the current directory)
    #[arg(long, global = true)]
    config_root: Option<PathBuf>,

    /// Backend base URL, overriding config.toml and MENTIONS_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print machine-readable JSON where supported (status, processes, stats, breakdown)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Open the interactive dashboard (default)
    Tui,
    /// Show a company's current stage and progress
    Status { company: String },
    /// Start the gathering pipeline for a company
    Run {
        company: String,
        /// Maximum number of mentions to scrape
        #[arg(long)]
        limit: Option<u32>,
        /// Only scrape, skip the later pipeline steps
        #[arg(long)]
        no_all_steps: bool,
    },
    /// Poll a company until its pipeline is ready
    Watch { company: String },
    /// Print or save a company's log
    Logs {
        /// Company name or log file reference
        target: String,
        #[arg(long, default_value_t = LogFilter::All)]
        filter: LogFilter,
        /// File or directory to save the log to
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the backend's active processes
    Processes,
    /// List collected mentions of a company
    Mentions {
        company: String,
        #[arg(long = "type")]
        mention_type: Option<String>,
        #[arg(long)]
        sentiment: Option<String>,
        #[arg(long)]
        keyword: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Dashboard totals over every company
    Stats,
    /// Sentiment, mention type and keyword breakdowns of a company
    Breakdown { company: String },
    /// Ask the assistant about a company's mentions
    Chat {
        company: String,
        /// Question to ask; without one, questions to ask are listed
        query: Option<String>,
        /// Continue an earlier conversation
        #[arg(long)]
        session: Option<String>,
        /// List recently asked questions instead of asking
        #[arg(long)]
        recent: bool,
    },
}

/// Apply `--api-url` and re-check the settings it changes.
fn override_api_url(config: &mut AppConfig, url: String, root: &Path) -> Result<()> {
    config.settings.api_base_url = url;
    validate_settings(&config.settings, &root.join(CONFIG_DIR).join("config.toml"))?;
    Ok(())
}

/// Install the tracing subscriber.
///
/// The dashboard owns the terminal, so in TUI mode output goes to
/// `.mentions-monitor/monitor.log` instead of stderr.
fn init_tracing(tui_mode: bool, config: &AppConfig, root: &Path) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    if tui_mode {
        let dir = config.config_dir.clone().unwrap_or_else(|| root.join(CONFIG_DIR));
        std::fs::create_dir_all(&dir).wrap_err_with(|| format!("Failed to create {}", dir.display()))?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("monitor.log"))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let root = match cli.config_root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let mut config = load_config(&root).await?;
    if let Some(url) = cli.api_url {
        override_api_url(&mut config, url, &root)?;
    }

    let command = cli.command.unwrap_or(Commands::Tui);
    init_tracing(command == Commands::Tui, &config, &root)?;
    tracing::debug!(backend = %config.settings.api_base_url, config_dir = ?config.config_dir, "configuration loaded");

    if command == Commands::Tui {
        // When called without arguments, launch the TUI
        return mm_tui::run_app(config).await.map_err(|e| eyre!(e));
    }

    let api: Arc<dyn MonitorApi> = Arc::new(HttpMonitorApi::from_config(&config)?);
    match command {
        Commands::Tui => Ok(()),
        Commands::Status { company } => commands::status(api, &config, &company, cli.json).await,
        Commands::Run {
            company,
            limit,
            no_all_steps,
        } => commands::run(api, &config, &company, limit, no_all_steps).await,
        Commands::Watch { company } => commands::watch(api, &config, &company).await,
        Commands::Logs { target, filter, output } => {
            commands::logs(api, &target, filter, output.as_deref()).await
        }
        Commands::Processes => commands::processes(api, &config, cli.json).await,
        Commands::Mentions {
            company,
            mention_type,
            sentiment,
            keyword,
            limit,
        } => {
            let filters = MentionFilters {
                mention_type,
                sentiment,
                keyword,
                limit,
            };
            commands::mentions(api, &company, filters).await
        }
        Commands::Stats => commands::stats(api, cli.json).await,
        Commands::Breakdown { company } => commands::breakdown(api, &company, cli.json).await,
        Commands::Chat {
            company,
            query,
            session,
            recent,
        } => commands::chat(api, &company, query.as_deref(), session, recent).await,
    }
}
