//! Aggregates over the collected mention data.

use futures::future::join_all;
use mm_protocol::api_models::{DashboardStats, MentionFilters, SentimentCount};
use std::sync::Arc;
use tracing::warn;

use crate::api::{ApiResult, MonitorApi};

/// Mention limit used when counting a company's mentions.
const STATS_MENTION_LIMIT: u32 = 1000;

/// Number of companies shown in the recent activity list.
const RECENT_ACTIVITY_COMPANIES: usize = 5;

/// Per-company inputs of the dashboard aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompanyStats {
    pub mentions: usize,
    pub sentiment: Vec<SentimentCount>,
}

/// One row of the recent activity list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyActivity {
    pub id: String,
    pub name: String,
    pub mentions: usize,
    pub sentiment: String,
}

/// URL-style identifier of a company name.
pub fn company_slug(name: &str) -> String {
    name.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
}

/// The sentiment with the highest count, `neutral` without data.
///
/// Ties go to the later entry.
pub fn overall_sentiment(breakdown: &[SentimentCount]) -> String {
    breakdown
        .iter()
        .max_by_key(|entry| entry.count)
        .map_or_else(|| "neutral".to_string(), |entry| entry.sentiment.clone())
}

fn sentiment_weight(sentiment: &str) -> u64 {
    match sentiment {
        "positive" => 8,
        "negative" => 2,
        _ => 5,
    }
}

/// Aggregate dashboard numbers from per-company data.
///
/// The sentiment score is the count-weighted mean of the sentiment weights
/// (positive 8, neutral 5, negative 2, anything else 5).
pub fn aggregate_stats(total_companies: usize, per_company: &[CompanyStats]) -> DashboardStats {
    let total_mentions = per_company.iter().map(|c| c.mentions).sum();

    let (weighted, count) = per_company
        .iter()
        .flat_map(|c| c.sentiment.iter())
        .fold((0u64, 0u64), |(weighted, count), entry| {
            (
                weighted + sentiment_weight(&entry.sentiment) * entry.count,
                count + entry.count,
            )
        });

    let avg_sentiment_score = if count > 0 {
        format!("{:.1}/10", weighted as f64 / count as f64)
    } else {
        "0/10".to_string()
    };

    DashboardStats {
        total_companies,
        total_mentions,
        avg_sentiment_score,
        active_companies: total_companies,
    }
}

async fn company_stats(api: &dyn MonitorApi, company: &str, limit: u32) -> ApiResult<CompanyStats> {
    let filters = MentionFilters {
        limit,
        ..MentionFilters::default()
    };
    let (mentions, sentiment) = futures::join!(
        api.mentions(company, &filters),
        api.sentiment_breakdown(company)
    );
    Ok(CompanyStats {
        mentions: mentions?.len(),
        sentiment: sentiment?,
    })
}

/// Fetch and aggregate stats over every company.
///
/// Companies whose data cannot be fetched are logged and left out.
///
/// # Errors
///
/// Returns an error only if the company list itself cannot be fetched.
pub async fn collect_dashboard_stats(api: Arc<dyn MonitorApi>) -> ApiResult<DashboardStats> {
    let companies = api.companies().await?;

    let results = join_all(
        companies
            .iter()
            .map(|company| company_stats(api.as_ref(), company, STATS_MENTION_LIMIT)),
    )
    .await;

    let per_company: Vec<CompanyStats> = companies
        .iter()
        .zip(results)
        .filter_map(|(company, result)| match result {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(company = %company, error = %e, "skipping company in dashboard stats");
                None
            }
        })
        .collect();

    Ok(aggregate_stats(companies.len(), &per_company))
}

/// Mention count and dominant sentiment of the first few companies.
pub async fn collect_recent_activity(api: Arc<dyn MonitorApi>) -> ApiResult<Vec<CompanyActivity>> {
    let companies = api.companies().await?;
    let mut activity = Vec::new();

    for company in companies.iter().take(RECENT_ACTIVITY_COMPANIES) {
        match company_stats(api.as_ref(), company, 100).await {
            Ok(stats) => activity.push(CompanyActivity {
                id: company_slug(company),
                name: company.clone(),
                mentions: stats.mentions,
                sentiment: overall_sentiment(&stats.sentiment),
            }),
            Err(e) => warn!(company = %company, error = %e, "skipping company in recent activity"),
        }
    }

    Ok(activity)
}

/// Shorten `text` to `max` characters, marking the cut with `...`.
pub fn truncate_text(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
