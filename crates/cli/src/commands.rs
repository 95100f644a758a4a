//! One-shot commands against the mentions backend.

use chrono::Utc;
use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use colored::Colorize;
use mm_core::api::MonitorApi;
use mm_core::chat::{recent_questions, ChatSession, RECENT_QUESTION_LIMIT, SUGGESTED_QUESTIONS};
use mm_core::config::models::AppConfig;
use mm_core::insights::{collect_dashboard_stats, collect_recent_activity};
use mm_core::logs::{log_download_name, LogFilter};
use mm_core::state::error::TrackerError;
use mm_core::state::tracker::ProcessTracker;
use mm_protocol::{MentionFilters, RunScriptRequest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};

use crate::output;

fn print_lines(lines: impl IntoIterator<Item = String>) {
    for line in lines {
        println!("{}", line);
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn status(api: Arc<dyn MonitorApi>, config: &AppConfig, company: &str, json: bool) -> Result<()> {
    let tracker = ProcessTracker::new(api, config.retention());
    match tracker.poll_once(company).await {
        Ok(record) if json => print_json(&record),
        Ok(record) => {
            print_lines(output::record_summary(&record));
            Ok(())
        }
        Err(TrackerError::NotFound(_)) => {
            println!("{} has no known status", company.bold());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn run(
    api: Arc<dyn MonitorApi>,
    config: &AppConfig,
    company: &str,
    limit: Option<u32>,
    no_all_steps: bool,
) -> Result<()> {
    let company = company.trim();
    if company.is_empty() {
        bail!("Please enter a company name");
    }
    let request = RunScriptRequest {
        company: company.to_string(),
        limit: limit.unwrap_or(config.settings.default_limit),
        all_steps: config.settings.all_steps && !no_all_steps,
    };

    let response = api
        .run_script(&request)
        .await
        .wrap_err_with(|| format!("Failed to start processing for {}", company))?;

    println!("{} {}", "Started processing".green(), company.bold());
    if let Some(pid) = response.pid {
        println!("  pid: {}", pid);
    }
    if let Some(log_file) = &response.log_file {
        println!("  log: {}", log_file);
    }
    if let Some(message) = &response.message {
        println!("  {}", message);
    }
    Ok(())
}

/// Poll until the company reaches the terminal stage or Ctrl-C.
pub async fn watch(api: Arc<dyn MonitorApi>, config: &AppConfig, company: &str) -> Result<()> {
    let tracker = ProcessTracker::new(api, config.retention());
    let mut ticker = interval(config.status_poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_status: Option<String> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                println!("{}", "Stopped watching".dimmed());
                return Ok(());
            }
        }

        match tracker.poll_once(company).await {
            Ok(record) => {
                if last_status.as_deref() != Some(record.display_status()) {
                    println!();
                    print_lines(output::record_summary(&record));
                    last_status = Some(record.display_status().to_string());
                }
                if record.is_terminal() {
                    println!("{} {} is ready", "✔".green(), company.bold());
                    return Ok(());
                }
            }
            Err(e) => {
                eprintln!("{} {}", "Status check failed:".yellow(), e);
            }
        }
    }
}

/// Resolve a company name or a log reference to a log reference.
async fn resolve_log_file(api: &dyn MonitorApi, target: &str) -> Result<String> {
    if target.ends_with(".log") || target.contains('/') {
        return Ok(target.to_string());
    }
    let active = api.active_processes().await?;
    active
        .into_iter()
        .find(|p| p.company == target)
        .and_then(|p| p.log_file)
        .ok_or_else(|| eyre!("No log file known for {}", target))
}

fn output_path(output: &Path, company: &str) -> PathBuf {
    if output.is_dir() {
        output.join(log_download_name(company, Utc::now()))
    } else {
        output.to_path_buf()
    }
}

pub async fn logs(api: Arc<dyn MonitorApi>, target: &str, filter: LogFilter, output: Option<&Path>) -> Result<()> {
    let log_file = resolve_log_file(api.as_ref(), target).await?;
    let content = api
        .fetch_log(&log_file)
        .await
        .wrap_err_with(|| format!("Error loading logs for {}", target))?;
    let filtered = filter.apply(&content);

    match output {
        Some(output) => {
            let path = output_path(output, target);
            tokio::fs::write(&path, filtered)
                .await
                .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
            println!("Saved {} to {}", log_file, path.display());
        }
        None if filtered.trim().is_empty() => println!("{}", "No logs available yet...".dimmed()),
        None => {
            for line in filtered.lines() {
                println!("{}", output::colored_log_line(line));
            }
        }
    }
    Ok(())
}

pub async fn processes(api: Arc<dyn MonitorApi>, config: &AppConfig, json: bool) -> Result<()> {
    let tracker = ProcessTracker::new(api, config.retention());
    let records = tracker.refresh_from_backend(Utc::now()).await?;
    if json {
        return print_json(&records);
    }

    if records.is_empty() {
        println!("{}", "No active processes".dimmed());
        return Ok(());
    }
    println!(
        "{}",
        format!(
            "{:<24} {:<32} {:>5}  {:<8} {}",
            "Company", "Status", "Prog", "State", "Updated"
        )
        .bold()
    );
    for record in &records {
        println!("{}", output::process_row(record));
    }
    Ok(())
}

pub async fn mentions(api: Arc<dyn MonitorApi>, company: &str, filters: MentionFilters) -> Result<()> {
    let mentions = api.mentions(company, &filters).await?;
    if mentions.is_empty() {
        println!("{}", "No mentions found".dimmed());
        return Ok(());
    }
    for mention in &mentions {
        print_lines(output::mention_block(mention));
        println!();
    }
    println!("{} mentions", mentions.len());
    Ok(())
}

pub async fn stats(api: Arc<dyn MonitorApi>, json: bool) -> Result<()> {
    let (stats, activity) = tokio::try_join!(
        collect_dashboard_stats(api.clone()),
        collect_recent_activity(api.clone())
    )?;
    if json {
        return print_json(&stats);
    }
    print_lines(output::stats_block(&stats, &activity));
    Ok(())
}

pub async fn breakdown(api: Arc<dyn MonitorApi>, company: &str, json: bool) -> Result<()> {
    let (sentiment, types, keywords) = tokio::try_join!(
        api.sentiment_breakdown(company),
        api.mention_types(company),
        api.keywords_breakdown(company)
    )
    .wrap_err_with(|| format!("Failed to load breakdowns for {}", company))?;

    if json {
        return print_json(&serde_json::json!({
            "sentiment": sentiment,
            "types": types,
            "keywords": keywords,
        }));
    }
    print_lines(output::breakdown_block(&sentiment, &types, &keywords));
    Ok(())
}

/// Lines offering questions to ask: recent ones, or the built-in suggestions.
async fn question_prompts(api: &dyn MonitorApi, company: &str) -> Result<Vec<String>> {
    let recent = recent_questions(api, company, RECENT_QUESTION_LIMIT).await?;
    if recent.is_empty() {
        Ok(output::question_list("Suggested questions", &SUGGESTED_QUESTIONS))
    } else {
        Ok(output::question_list("Recent questions", &recent))
    }
}

/// Ask `query`, or list questions to ask when there is none or `recent` is set.
pub async fn chat(
    api: Arc<dyn MonitorApi>,
    company: &str,
    query: Option<&str>,
    session: Option<String>,
    recent: bool,
) -> Result<()> {
    let Some(query) = query.filter(|_| !recent) else {
        print_lines(question_prompts(api.as_ref(), company).await?);
        return Ok(());
    };

    let mut chat = match session {
        Some(session_id) => {
            let mut chat = ChatSession::resume(company, session_id);
            chat.load_history(api.as_ref()).await?;
            chat
        }
        None => ChatSession::new(company),
    };

    let answer = chat.send(api.as_ref(), query).await?;
    println!("{}", answer);
    println!();
    println!("{} {}", "session:".dimmed(), chat.session_id());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_core::api::MockMonitorApi;
    use mm_protocol::{ActiveProcess, MentionTypeCount, SentimentCount};

    #[tokio::test]
    async fn test_resolve_log_file_by_company() {
        let api = MockMonitorApi::new();
        api.set_active(vec![ActiveProcess {
            company: "Acme".to_string(),
            current_status: Some("Started".to_string()),
            is_completed: false,
            start_time: None,
            log_file: Some("logs/acme.log".to_string()),
        }]);

        assert_eq!(resolve_log_file(&api, "Acme").await.unwrap(), "logs/acme.log");
        assert_eq!(resolve_log_file(&api, "other.log").await.unwrap(), "other.log");
        assert!(resolve_log_file(&api, "Globex").await.is_err());
    }

    #[test]
    fn test_output_path_in_directory_uses_download_name() {
        let dir = tempfile::tempdir().unwrap();

        let path = output_path(dir.path(), "Acme");
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("Acme_"));
        assert!(name.ends_with(".log"));

        let file = dir.path().join("out.log");
        assert_eq!(output_path(&file, "Acme"), file);
    }

    #[tokio::test]
    async fn test_question_prompts_fall_back_to_suggestions() {
        colored::control::set_override(false);
        let api = MockMonitorApi::new();

        let lines = question_prompts(&api, "Acme").await.unwrap();
        assert_eq!(lines[0], "Suggested questions");
        assert_eq!(lines.len(), SUGGESTED_QUESTIONS.len() + 1);

        ChatSession::new("Acme").send(&api, "Is there remote work?").await.unwrap();
        let lines = question_prompts(&api, "Acme").await.unwrap();
        assert_eq!(lines, vec!["Recent questions", "  1. Is there remote work?"]);
    }

    #[tokio::test]
    async fn test_chat_with_recent_flag_does_not_ask() {
        let api = Arc::new(MockMonitorApi::new());

        chat(api.clone(), "Acme", Some("Salary?"), None, true).await.unwrap();
        chat(api.clone(), "Acme", None, None, false).await.unwrap();
        assert!(api.chat_inputs().is_empty());

        chat(api.clone(), "Acme", Some("Salary?"), None, false).await.unwrap();
        assert_eq!(api.chat_inputs().len(), 1);
    }

    #[tokio::test]
    async fn test_breakdown_loads_all_three_tables() {
        let api = Arc::new(MockMonitorApi::new());
        api.set_sentiment(
            "Acme",
            vec![SentimentCount {
                sentiment: "positive".to_string(),
                count: 2,
            }],
        );
        api.set_mention_types(
            "Acme",
            vec![MentionTypeCount {
                mention_type: "review".to_string(),
                count: 2,
            }],
        );

        assert!(breakdown(api.clone(), "Acme", false).await.is_ok());
        assert!(breakdown(api, "Acme", true).await.is_ok());
    }

    #[tokio::test]
    async fn test_run_rejects_blank_company() {
        let api = Arc::new(MockMonitorApi::new());
        let result = run(api.clone(), &AppConfig::default(), "   ", None, false).await;

        assert!(result.is_err());
        assert!(api.run_requests().is_empty());
    }

    #[tokio::test]
    async fn test_run_applies_config_defaults() {
        let api = Arc::new(MockMonitorApi::new());
        let mut config = AppConfig::default();
        config.settings.default_limit = 40;

        run(api.clone(), &config, " Acme ", None, true).await.unwrap();

        let requests = api.run_requests();
        assert_eq!(requests[0].company, "Acme");
        assert_eq!(requests[0].limit, 40);
        assert!(!requests[0].all_steps);
    }
}
