//! Log filtering and line classification.
//!
//! Both work on case-insensitive substring matches over single lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which lines of a log to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFilter {
    #[default]
    All,
    Info,
    Warning,
    Error,
}

impl LogFilter {
    fn keywords(self) -> &'static [&'static str] {
        match self {
            LogFilter::All => &[],
            LogFilter::Info => &["info", "starting", "completed"],
            LogFilter::Warning => &["warning", "warn"],
            LogFilter::Error => &["error", "failed", "exception"],
        }
    }

    pub fn matches(self, line: &str) -> bool {
        if self == LogFilter::All {
            return true;
        }
        let lower = line.to_lowercase();
        self.keywords().iter().any(|keyword| lower.contains(keyword))
    }

    /// Keep the matching lines of `content`.
    pub fn apply(self, content: &str) -> String {
        if self == LogFilter::All {
            return content.to_string();
        }
        content
            .lines()
            .filter(|line| self.matches(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The next filter in display order, wrapping around.
    pub fn cycle(self) -> Self {
        match self {
            LogFilter::All => LogFilter::Info,
            LogFilter::Info => LogFilter::Warning,
            LogFilter::Warning => LogFilter::Error,
            LogFilter::Error => LogFilter::All,
        }
    }
}

impl fmt::Display for LogFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogFilter::All => "all",
            LogFilter::Info => "info",
            LogFilter::Warning => "warning",
            LogFilter::Error => "error",
        };
        f.write_str(name)
    }
}

impl FromStr for LogFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(LogFilter::All),
            "info" => Ok(LogFilter::Info),
            "warning" | "warn" => Ok(LogFilter::Warning),
            "error" => Ok(LogFilter::Error),
            other => Err(format!("Unknown log filter: {}", other)),
        }
    }
}

/// Severity of a single log line, used for colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineLevel {
    Error,
    Warning,
    Success,
    Info,
    Plain,
}

impl LineLevel {
    /// Classify a line. Earlier levels win when several keywords match.
    pub fn classify(line: &str) -> Self {
        let lower = line.to_lowercase();
        let has = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

        if has(&["error", "failed", "exception"]) {
            LineLevel::Error
        } else if has(&["warning", "warn"]) {
            LineLevel::Warning
        } else if has(&["completed", "success"]) {
            LineLevel::Success
        } else if has(&["info", "starting"]) {
            LineLevel::Info
        } else {
            LineLevel::Plain
        }
    }
}

/// File name used when saving a company's log locally.
pub fn log_download_name(company: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}.log", company, now.timestamp_millis())
}
