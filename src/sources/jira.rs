//! Jira issue search.

use super::{format_timestamp, NewsSource};
use crate::config::JiraConfig;
use crate::error::FeedResult;
use crate::models::{NewsItem, Source, StatusDot, TagClass};
use crate::upstream::Upstream;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

const SEARCH_PATH: &str = "/rest/api/3/search/jql";

/// Prefix Jira Service Management puts on built-in issue types.
const SYSTEM_PREFIX: &str = "[System] ";

const SUCCESS_STATUSES: [&str; 4] = ["Concluído", "Resolvido", "Fechado", "Implementado"];
const WARNING_STATUSES: [&str; 4] = ["Monitorando", "Em progresso", "Em análise", "Aguardando"];

/// Parameters of one issue search.
#[derive(Debug, Clone)]
pub struct IssueQuery {
    pub jql: String,
    pub max_results: usize,
    pub fields: String,
}

impl From<&JiraConfig> for IssueQuery {
    fn from(config: &JiraConfig) -> Self {
        Self {
            jql: config.jql.clone(),
            max_results: config.max_results,
            fields: config.fields.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<IssueRecord>,
}

#[derive(Debug, Deserialize)]
struct IssueRecord {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    fields: IssueFields,
}

#[derive(Debug, Default, Deserialize)]
struct IssueFields {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    status: Option<Named>,
    #[serde(default)]
    issuetype: Option<Named>,
    #[serde(default)]
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Named {
    #[serde(default)]
    name: String,
}

/// Tag class for an issue type name. "Mudança" wins over "Incidente".
pub fn classify_tag(type_name: &str) -> TagClass {
    if type_name.contains("Mudança") {
        TagClass::Mudanca
    } else if type_name.contains("Incidente") {
        TagClass::Incidente
    } else {
        TagClass::Servico
    }
}

/// Status dot for an exact status name.
pub fn classify_status(status_name: &str) -> StatusDot {
    if SUCCESS_STATUSES.contains(&status_name) {
        StatusDot::Success
    } else if WARNING_STATUSES.contains(&status_name) {
        StatusDot::Warning
    } else {
        StatusDot::Info
    }
}

/// Search Jira and normalize the issues, keeping the upstream sort order.
///
/// A non-200 reply is logged and yields no records.
pub async fn fetch_issue_items(
    upstream: &dyn Upstream,
    base_url: &str,
    query: &IssueQuery,
) -> FeedResult<Vec<NewsItem>> {
    info!("Connecting to Jira...");

    let base_url = base_url.trim_end_matches('/');
    let url = format!("{}{}", base_url, SEARCH_PATH);
    let params = [
        ("jql", query.jql.clone()),
        ("maxResults", query.max_results.to_string()),
        ("fields", query.fields.clone()),
    ];

    let response = upstream.get(&url, &params).await?;
    if !response.is_ok() {
        warn!("Jira API error: {} - {}", response.status, response.body);
        return Ok(vec![]);
    }

    let search: SearchResponse = response.json()?;
    Ok(search
        .issues
        .into_iter()
        .map(|issue| to_news_item(issue, base_url))
        .collect())
}

fn to_news_item(issue: IssueRecord, base_url: &str) -> NewsItem {
    let key = issue.key.unwrap_or_default();
    let fields = issue.fields;

    let issue_type = fields.issuetype.map(|t| t.name).unwrap_or_default();
    let status_name = fields.status.map(|s| s.name).unwrap_or_default();
    let summary = fields.summary.unwrap_or_default();
    let updated = fields.updated.unwrap_or_default();

    NewsItem {
        source: Source::Jira,
        title: format!("{} - {}", key, summary),
        type_name: issue_type.replace(SYSTEM_PREFIX, ""),
        tag_class: classify_tag(&issue_type),
        status_dot: classify_status(&status_name),
        status_name,
        date: format_timestamp(&updated, true),
        url: format!("{}/browse/{}", base_url, key),
        key,
    }
}

/// Jira as a news source.
pub struct JiraSource {
    upstream: Arc<dyn Upstream>,
    base_url: String,
    query: IssueQuery,
}

impl JiraSource {
    pub fn new(upstream: Arc<dyn Upstream>, base_url: impl Into<String>, query: IssueQuery) -> Self {
        Self {
            upstream,
            base_url: base_url.into(),
            query,
        }
    }
}

#[async_trait]
impl NewsSource for JiraSource {
    fn name(&self) -> &str {
        "Jira"
    }

    async fn fetch(&self) -> FeedResult<Vec<NewsItem>> {
        fetch_issue_items(self.upstream.as_ref(), &self.base_url, &self.query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::fake::FakeUpstream;

    const BASE: &str = "https://acme.atlassian.net";
    const SEARCH_URL: &str = "https://acme.atlassian.net/rest/api/3/search/jql";

    fn query() -> IssueQuery {
        IssueQuery::from(&JiraConfig::default())
    }

    const TWO_ISSUES: &str = r#"{
        "issues": [
            {
                "key": "OFBI-7",
                "fields": {
                    "summary": "Atualização do diretório",
                    "status": {"name": "Em progresso"},
                    "issuetype": {"name": "[System] Mudança"},
                    "updated": "2024-03-15T10:30:00.000+0000"
                }
            },
            {
                "key": "OFBI-3",
                "fields": {
                    "summary": "Indisponibilidade parcial",
                    "status": {"name": "Resolvido"},
                    "issuetype": {"name": "[System] Incidente"},
                    "updated": "garbage-date-value"
                }
            }
        ]
    }"#;

    #[test]
    fn test_classify_tag() {
        assert_eq!(classify_tag("[System] Mudança"), TagClass::Mudanca);
        assert_eq!(classify_tag("Mudança emergencial"), TagClass::Mudanca);
        assert_eq!(classify_tag("[System] Incidente"), TagClass::Incidente);
        assert_eq!(classify_tag("Incidente de Mudança"), TagClass::Mudanca);
        assert_eq!(classify_tag("Solicitação de serviço"), TagClass::Servico);
        assert_eq!(classify_tag(""), TagClass::Servico);
        // Matching is case-sensitive
        assert_eq!(classify_tag("mudança"), TagClass::Servico);
    }

    #[test]
    fn test_classify_status() {
        for status in SUCCESS_STATUSES {
            assert_eq!(classify_status(status), StatusDot::Success);
        }
        for status in WARNING_STATUSES {
            assert_eq!(classify_status(status), StatusDot::Warning);
        }
        assert_eq!(classify_status("Aberto"), StatusDot::Info);
        assert_eq!(classify_status(""), StatusDot::Info);
        // Exact match only
        assert_eq!(classify_status("Concluído "), StatusDot::Info);
    }

    #[tokio::test]
    async fn test_fetch_issue_items_normalizes() {
        let upstream = FakeUpstream::new().reply(SEARCH_URL, 200, TWO_ISSUES);

        let items = fetch_issue_items(&upstream, BASE, &query()).await.unwrap();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.source, Source::Jira);
        assert_eq!(first.key, "OFBI-7");
        assert_eq!(first.title, "OFBI-7 - Atualização do diretório");
        assert_eq!(first.type_name, "Mudança");
        assert_eq!(first.tag_class, TagClass::Mudanca);
        assert_eq!(first.status_dot, StatusDot::Warning);
        assert_eq!(first.date, "15/03/2024 10:30");
        assert_eq!(first.url, "https://acme.atlassian.net/browse/OFBI-7");

        let second = &items[1];
        assert_eq!(second.key, "OFBI-3");
        assert_eq!(second.tag_class, TagClass::Incidente);
        assert_eq!(second.status_dot, StatusDot::Success);
        assert_eq!(second.date, "garbage-da");
    }

    #[tokio::test]
    async fn test_fetch_sends_query_params() {
        let upstream = FakeUpstream::new().reply(SEARCH_URL, 200, r#"{"issues": []}"#);

        fetch_issue_items(&upstream, "https://acme.atlassian.net/", &query())
            .await
            .unwrap();

        assert_eq!(upstream.called_urls(), vec![SEARCH_URL]);
        assert_eq!(upstream.query_param(0, "maxResults").as_deref(), Some("10"));
        assert!(upstream
            .query_param(0, "jql")
            .unwrap()
            .ends_with("ORDER BY updated DESC"));
        assert_eq!(
            upstream.query_param(0, "fields").as_deref(),
            Some("summary,status,issuetype,updated,created,priority")
        );
    }

    #[tokio::test]
    async fn test_zero_issues_is_empty() {
        let upstream = FakeUpstream::new().reply(SEARCH_URL, 200, r#"{"issues": []}"#);
        let items = fetch_issue_items(&upstream, BASE, &query()).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_non_200_degrades_to_empty() {
        let upstream = FakeUpstream::new().reply(SEARCH_URL, 401, "Unauthorized");
        let items = fetch_issue_items(&upstream, BASE, &query()).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_missing_fields_use_defaults() {
        let body = r#"{"issues": [{"key": "OFBI-9", "fields": {"status": null}}]}"#;
        let upstream = FakeUpstream::new().reply(SEARCH_URL, 200, body);

        let items = fetch_issue_items(&upstream, BASE, &query()).await.unwrap();
        assert_eq!(items[0].title, "OFBI-9 - ");
        assert_eq!(items[0].tag_class, TagClass::Servico);
        assert_eq!(items[0].status_dot, StatusDot::Info);
        assert_eq!(items[0].date, "");
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let upstream = FakeUpstream::new().fail(SEARCH_URL, "connection reset");
        let source = JiraSource::new(Arc::new(upstream), BASE, query());
        assert!(source.fetch().await.is_err());
    }

    #[test]
    fn test_source_name() {
        let source = JiraSource::new(Arc::new(FakeUpstream::new()), BASE, query());
        assert_eq!(source.name(), "Jira");
    }
}
