//! Plain-terminal rendering for the one-shot commands.

use colored::{ColoredString, Colorize};
use mm_core::insights::{truncate_text, CompanyActivity};
use mm_core::logs::LineLevel;
use mm_core::stages::{compute_progress, stage_states};
use mm_protocol::{
    DashboardStats, KeywordCount, Mention, MentionTypeCount, PollHealth, ProcessRecord,
    SentimentCount, StageState, UNKNOWN_STATUS,
};

const BAR_WIDTH: usize = 30;

/// Width of the share bars in breakdown tables.
const SHARE_WIDTH: usize = 20;

/// Keywords listed in a breakdown.
const TOP_KEYWORDS: usize = 10;

/// `[#########.....]  35%`
pub fn progress_bar(percent: u8) -> String {
    let filled = BAR_WIDTH * usize::from(percent.min(100)) / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        percent
    )
}

pub fn status_label(record: &ProcessRecord) -> ColoredString {
    let status = record.display_status();
    if record.is_terminal() {
        status.green()
    } else if status == UNKNOWN_STATUS {
        status.red()
    } else {
        status.blue()
    }
}

/// One line per stage with its marker.
pub fn stage_checklist(status: &str) -> Vec<String> {
    stage_states(status)
        .into_iter()
        .map(|(stage, state)| match state {
            StageState::Completed => format!("  {} {}", "✔".green(), stage.name),
            StageState::Processing => format!("  {} {}", "…".blue().bold(), stage.name.bold()),
            StageState::Pending => format!("  {} {}", "○".dimmed(), stage.name.dimmed()),
        })
        .collect()
}

/// Summary block for `status` and `watch`.
pub fn record_summary(record: &ProcessRecord) -> Vec<String> {
    let mut lines = vec![
        format!("{} {}", "Company:".bold(), record.company),
        format!("{} {}", "Status: ".bold(), status_label(record)),
        format!(
            "{} {}",
            "Progress:".bold(),
            progress_bar(compute_progress(record.display_status()))
        ),
    ];
    if let Some(log_file) = &record.log_file {
        lines.push(format!("{} {}", "Log:".bold(), log_file));
    }
    if let PollHealth::Failing { error } = &record.health {
        lines.push(format!("{} {}", "Last poll failed:".yellow(), error));
    }
    lines.extend(stage_checklist(record.display_status()));
    lines
}

/// One row of the `processes` listing.
pub fn process_row(record: &ProcessRecord) -> String {
    let state = if record.is_completed {
        "Done".green()
    } else {
        "Running".yellow()
    };
    format!(
        "{:<24} {:<32} {:>4}%  {:<8} {}",
        truncate_text(&record.company, 24),
        status_label(record),
        compute_progress(record.display_status()),
        state,
        record.last_updated.format("%Y-%m-%d %H:%M:%S")
    )
}

pub fn colored_log_line(line: &str) -> ColoredString {
    match LineLevel::classify(line) {
        LineLevel::Error => line.red(),
        LineLevel::Warning => line.yellow(),
        LineLevel::Success => line.green(),
        LineLevel::Info => line.cyan(),
        LineLevel::Plain => line.normal(),
    }
}

fn sentiment_label(sentiment: &str) -> ColoredString {
    match sentiment {
        "positive" => sentiment.green(),
        "negative" => sentiment.red(),
        _ => sentiment.normal(),
    }
}

pub fn mention_block(mention: &Mention) -> Vec<String> {
    let mut header = format!("[{}] {}", mention.mention_type, sentiment_label(&mention.sentiment));
    if let Some(source) = &mention.source {
        header = format!("{} {}", source.bold(), header);
    }
    if let Some(rating) = mention.rating {
        header.push_str(&format!(" ({:.1})", rating));
    }

    let mut lines = vec![header, format!("  {}", truncate_text(&mention.text, 200))];
    if let Some(translated) = mention.translated.as_deref().filter(|t| !t.is_empty()) {
        lines.push(format!("  {} {}", "→".dimmed(), truncate_text(translated, 200)));
    }
    if !mention.keywords.is_empty() {
        lines.push(format!("  {} {}", "keywords:".dimmed(), mention.keywords.join(", ")));
    }
    lines
}

/// `label  ██████        12  (40%)`
fn share_row(label: &str, count: u64, total: u64) -> String {
    let percent = if total == 0 { 0 } else { count * 100 / total };
    let filled = SHARE_WIDTH * percent as usize / 100;
    format!(
        "  {:<20} {:<width$} {:>6}  ({}%)",
        truncate_text(label, 20),
        "█".repeat(filled),
        count,
        percent,
        width = SHARE_WIDTH
    )
}

fn share_section<'a>(title: &str, rows: impl Iterator<Item = (&'a str, u64)> + Clone) -> Vec<String> {
    let total: u64 = rows.clone().map(|(_, count)| count).sum();
    let mut lines = vec![title.bold().to_string()];
    if total == 0 {
        lines.push(format!("  {}", "no data".dimmed()));
        return lines;
    }
    lines.extend(rows.map(|(label, count)| share_row(label, count, total)));
    lines
}

/// Sentiment, mention type and keyword breakdowns of one company.
pub fn breakdown_block(
    sentiment: &[SentimentCount],
    types: &[MentionTypeCount],
    keywords: &[KeywordCount],
) -> Vec<String> {
    let mut lines = share_section(
        "Sentiment",
        sentiment.iter().map(|s| (s.sentiment.as_str(), s.count)),
    );
    lines.push(String::new());
    lines.extend(share_section(
        "Mention types",
        types.iter().map(|t| (t.mention_type.as_str(), t.count)),
    ));
    lines.push(String::new());

    let mut top: Vec<&KeywordCount> = keywords.iter().collect();
    top.sort_by(|a, b| b.count.cmp(&a.count));
    top.truncate(TOP_KEYWORDS);
    lines.extend(share_section(
        "Top keywords",
        top.into_iter().map(|k| (k.keyword.as_str(), k.count)),
    ));
    lines
}

/// Numbered list of questions under a heading.
pub fn question_list<S: AsRef<str>>(title: &str, questions: &[S]) -> Vec<String> {
    let mut lines = vec![title.bold().to_string()];
    for (i, question) in questions.iter().enumerate() {
        lines.push(format!("  {}. {}", i + 1, question.as_ref()));
    }
    lines
}

pub fn stats_block(stats: &DashboardStats, activity: &[CompanyActivity]) -> Vec<String> {
    let mut lines = vec![
        format!("{} {}", "Companies:".bold(), stats.total_companies),
        format!("{} {}", "Active:   ".bold(), stats.active_companies),
        format!("{} {}", "Mentions: ".bold(), stats.total_mentions),
        format!("{} {}", "Sentiment:".bold(), stats.avg_sentiment_score),
    ];
    if !activity.is_empty() {
        lines.push(String::new());
        lines.push("Recent activity".bold().to_string());
        for company in activity {
            lines.push(format!(
                "  {:<24} {:>5} mentions  {}",
                company.name,
                company.mentions,
                sentiment_label(&company.sentiment)
            ));
        }
    }
    lines
}
