//! Upstream record sources.
//!
//! Each source fetches from one Atlassian product and normalizes the
//! records into [`NewsItem`]s for the news snapshot.

pub mod confluence;
pub mod jira;

pub use confluence::{derive_content_root, ConfluenceSource, ContentSearch, SpacesOptions};
pub use jira::{IssueQuery, JiraSource};

use crate::error::FeedResult;
use crate::models::NewsItem;
use async_trait::async_trait;

/// A producer of news records.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Label used when reporting counts.
    fn name(&self) -> &str;

    /// Fetch and normalize records. Upstream status errors degrade to an
    /// empty vector; transport and decode failures are returned.
    async fn fetch(&self) -> FeedResult<Vec<NewsItem>>;
}

/// Format an upstream timestamp as `dd/mm/yyyy` (plus ` HH:MM` when asked).
///
/// Unparseable input falls back to its first 10 characters; empty input
/// stays empty.
pub fn format_timestamp(raw: &str, with_time: bool) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let pattern = if with_time { "%d/%m/%Y %H:%M" } else { "%d/%m/%Y" };
    match parse_timestamp(raw) {
        Some(dt) => dt.format(pattern).to_string(),
        None => raw.chars().take(10).collect(),
    }
}

fn parse_timestamp(raw: &str) -> Option<chrono::DateTime<chrono::FixedOffset>> {
    // Jira sends `+0000`; Confluence sends RFC 3339 with `Z`
    chrono::DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| chrono::DateTime::parse_from_rfc3339(raw))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_jira_timestamp() {
        assert_eq!(
            format_timestamp("2024-03-15T10:30:00.000+0000", true),
            "15/03/2024 10:30"
        );
    }

    #[test]
    fn test_format_keeps_source_offset() {
        assert_eq!(
            format_timestamp("2024-03-15T23:05:12.345-0300", true),
            "15/03/2024 23:05"
        );
    }

    #[test]
    fn test_format_date_only() {
        assert_eq!(
            format_timestamp("2024-01-02T08:00:00.000Z", false),
            "02/01/2024"
        );
        assert_eq!(
            format_timestamp("2024-01-02T08:00:00.000+01:00", false),
            "02/01/2024"
        );
    }

    #[test]
    fn test_format_fallback_truncates() {
        assert_eq!(format_timestamp("not-a-date", true), "not-a-date");
        assert_eq!(format_timestamp("2024-03-15 garbage", true), "2024-03-15");
        assert_eq!(format_timestamp("short", true), "short");
    }

    #[test]
    fn test_format_fallback_respects_char_boundaries() {
        assert_eq!(format_timestamp("ççççççççççç", true), "çççççççççç");
    }

    #[test]
    fn test_format_empty_stays_empty() {
        assert_eq!(format_timestamp("", true), "");
    }
}
