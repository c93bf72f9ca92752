//! Confluence content search and space listing.
//!
//! Confluence Cloud lives under `<site>/wiki`, but some instances serve the
//! REST API from the site root. Every request here tries the derived `/wiki`
//! root first and retries once against the Jira base URL on a 404.

use super::{format_timestamp, NewsSource};
use crate::config::{ConfluenceConfig, SpacesConfig};
use crate::error::FeedResult;
use crate::models::{LatestContent, NewsItem, SpaceSummary, Source, StatusDot, TagClass};
use crate::upstream::{Upstream, UpstreamResponse};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

const SEARCH_PATH: &str = "/rest/api/content/search";
const SPACE_PATH: &str = "/rest/api/space";
const HOSTED_DOMAIN: &str = "atlassian.net";

/// Derive the Confluence root from the Jira site root.
///
/// Hosted sites map to `https://<subdomain>.atlassian.net/wiki`; anything
/// else just gets `/wiki` appended.
pub fn derive_content_root(jira_url: &str) -> String {
    let base = jira_url.trim_end_matches('/');

    if base.contains(HOSTED_DOMAIN) {
        let host = base.split_once("//").map(|(_, rest)| rest).unwrap_or(base);
        let subdomain = host.split('.').next().unwrap_or(host);
        format!("https://{}.{}/wiki", subdomain, HOSTED_DOMAIN)
    } else {
        format!("{}/wiki", base)
    }
}

/// Which content a search selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentQuery {
    /// Pages carrying a label, newest first.
    Label(String),
    /// Pages and blog posts of a space, most recently modified first.
    Space(String),
}

impl ContentQuery {
    pub fn to_cql(&self) -> String {
        match self {
            ContentQuery::Label(label) => format!(
                r#"label = "{}" AND type = "page" order by created desc"#,
                label
            ),
            ContentQuery::Space(key) => format!(
                r#"space = "{}" AND type in (page,blogpost) order by lastModified desc"#,
                key
            ),
        }
    }
}

/// One content search request.
#[derive(Debug, Clone)]
pub struct ContentSearch {
    pub query: ContentQuery,
    pub limit: usize,
    pub expand: Option<String>,
}

impl From<&ConfluenceConfig> for ContentSearch {
    fn from(config: &ConfluenceConfig) -> Self {
        Self {
            query: ContentQuery::Label(config.label.clone()),
            limit: config.limit,
            expand: Some(config.expand.clone()).filter(|e| !e.is_empty()),
        }
    }
}

impl ContentSearch {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("cql", self.query.to_cql()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(ref expand) = self.expand {
            params.push(("expand", expand.clone()));
        }
        params
    }
}

/// Settings for the spaces listing.
#[derive(Debug, Clone)]
pub struct SpacesOptions {
    pub limit: usize,
    pub space_type: String,
    pub expand: String,
    pub description_max_chars: usize,
    pub default_description: String,
    pub no_recent_title: String,
    pub show_progress: bool,
}

impl From<&SpacesConfig> for SpacesOptions {
    fn from(config: &SpacesConfig) -> Self {
        Self {
            limit: config.limit,
            space_type: config.space_type.clone(),
            expand: config.expand.clone(),
            description_max_chars: config.description_max_chars,
            default_description: config.default_description.clone(),
            no_recent_title: config.no_recent_title.clone(),
            show_progress: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Links {
    #[serde(default)]
    webui: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentResults {
    #[serde(default)]
    results: Vec<ContentRecord>,
}

#[derive(Debug, Deserialize)]
struct ContentRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "_links")]
    links: Links,
    #[serde(default)]
    history: Option<History>,
}

#[derive(Debug, Deserialize)]
struct History {
    #[serde(default, rename = "createdDate")]
    created_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpaceResults {
    #[serde(default)]
    results: Vec<SpaceRecord>,
}

#[derive(Debug, Deserialize)]
struct SpaceRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default, rename = "_links")]
    links: Links,
    #[serde(default)]
    icon: Option<Icon>,
    #[serde(default)]
    description: Option<Description>,
}

#[derive(Debug, Deserialize)]
struct Icon {
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Description {
    #[serde(default)]
    plain: Option<PlainValue>,
}

#[derive(Debug, Deserialize)]
struct PlainValue {
    #[serde(default)]
    value: Option<String>,
}

impl SpaceRecord {
    fn description_text(&self) -> &str {
        self.description
            .as_ref()
            .and_then(|d| d.plain.as_ref())
            .and_then(|p| p.value.as_deref())
            .unwrap_or("")
    }

    fn icon_path(&self) -> &str {
        self.icon
            .as_ref()
            .and_then(|i| i.path.as_deref())
            .unwrap_or("")
    }
}

/// GET `path` under the `/wiki` root, retrying once under the site root on 404.
///
/// Returns the root that produced the final response.
async fn get_with_fallback(
    upstream: &dyn Upstream,
    jira_url: &str,
    path: &str,
    params: &[(&str, String)],
) -> FeedResult<(String, UpstreamResponse)> {
    let root = derive_content_root(jira_url);
    let url = format!("{}{}", root, path);
    let response = upstream.get(&url, params).await?;

    if !response.is_not_found() {
        return Ok((root, response));
    }

    let fallback_root = jira_url.trim_end_matches('/').to_string();
    warn!(
        "Confluence returned 404 at {}. Retrying under {}...",
        url, fallback_root
    );
    let fallback_url = format!("{}{}", fallback_root, path);
    let response = upstream.get(&fallback_url, params).await?;
    Ok((fallback_root, response))
}

/// Search Confluence content and normalize it into news records.
///
/// A non-200 reply (after the 404 fallback) is logged and yields no records.
pub async fn fetch_content_items(
    upstream: &dyn Upstream,
    jira_url: &str,
    search: &ContentSearch,
) -> FeedResult<Vec<NewsItem>> {
    info!("Connecting to Confluence...");

    let (root, response) =
        get_with_fallback(upstream, jira_url, SEARCH_PATH, &search.params()).await?;

    if !response.is_ok() {
        warn!(
            "Confluence API error: {} - {}",
            response.status, response.body
        );
        return Ok(vec![]);
    }

    let content: ContentResults = response.json()?;
    Ok(content
        .results
        .into_iter()
        .map(|page| {
            let created = page
                .history
                .and_then(|h| h.created_date)
                .unwrap_or_default();

            NewsItem {
                source: Source::Confluence,
                key: page.id.unwrap_or_default(),
                title: page.title.unwrap_or_default(),
                type_name: "Comunicado".to_string(),
                tag_class: TagClass::Comunicado,
                status_name: "Publicado".to_string(),
                status_dot: StatusDot::Info,
                date: format_timestamp(&created, false),
                url: format!("{}{}", root, page.links.webui.unwrap_or_default()),
            }
        })
        .collect())
}

/// Most recently modified page or blog post of a space.
///
/// Never fails: transport, status and decode problems become
/// [`LatestContent::Failed`].
pub async fn fetch_latest_content(
    upstream: &dyn Upstream,
    content_root: &str,
    space_key: &str,
) -> LatestContent {
    let search = ContentSearch {
        query: ContentQuery::Space(space_key.to_string()),
        limit: 1,
        expand: None,
    };
    let url = format!("{}{}", content_root, SEARCH_PATH);

    let response = match upstream.get(&url, &search.params()).await {
        Ok(response) => response,
        Err(e) => return LatestContent::Failed(e.to_string()),
    };

    if !response.is_ok() {
        return LatestContent::Failed(format!("HTTP {}", response.status));
    }

    match response.json::<ContentResults>() {
        Ok(content) => match content.results.into_iter().next() {
            Some(item) => LatestContent::Found {
                title: item.title.unwrap_or_default(),
                url: format!("{}{}", content_root, item.links.webui.unwrap_or_default()),
            },
            None => LatestContent::Empty,
        },
        Err(e) => LatestContent::Failed(e.to_string()),
    }
}

/// Shorten long descriptions to their first line; fill in empty ones.
fn clean_description(raw: &str, max_chars: usize, default: &str) -> String {
    if raw.is_empty() {
        return default.to_string();
    }

    if raw.chars().count() > max_chars {
        let first_line = raw.split('\n').next().unwrap_or(raw);
        let cut: String = first_line.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        raw.to_string()
    }
}

/// List Confluence spaces, each with its latest content.
///
/// A non-200 listing yields no spaces. Per-space lookups never abort the run.
pub async fn fetch_spaces(
    upstream: &dyn Upstream,
    jira_url: &str,
    options: &SpacesOptions,
) -> FeedResult<Vec<SpaceSummary>> {
    info!("Connecting to Confluence to list spaces...");

    let params = [
        ("limit", options.limit.to_string()),
        ("type", options.space_type.clone()),
        ("expand", options.expand.clone()),
    ];
    let (root, response) = get_with_fallback(upstream, jira_url, SPACE_PATH, &params).await?;

    if !response.is_ok() {
        warn!(
            "Failed to list spaces: {} - {}",
            response.status, response.body
        );
        return Ok(vec![]);
    }

    let spaces: SpaceResults = response.json()?;
    info!(
        "Found {} spaces. Fetching latest updates...",
        spaces.results.len()
    );

    let progress = if options.show_progress {
        let pb = ProgressBar::new(spaces.results.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{pos}/{len}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(pb)
    } else {
        None
    };

    let mut summaries = Vec::with_capacity(spaces.results.len());
    for space in &spaces.results {
        let name = space.name.clone().unwrap_or_default();
        let key = space.key.clone().unwrap_or_default();
        if let Some(ref pb) = progress {
            pb.set_message(name.clone());
        }

        let url = format!("{}{}", root, space.links.webui.as_deref().unwrap_or(""));
        let icon = match space.icon_path() {
            "" => String::new(),
            path => format!("{}{}", root, path),
        };

        let latest = fetch_latest_content(upstream, &root, &key).await;
        if let LatestContent::Failed(ref reason) = latest {
            warn!("Latest content lookup failed for space {}: {}", key, reason);
        }
        let (latest_title, latest_url) = latest.display(&options.no_recent_title, &url);
        debug!("Processed space: {}", name);

        summaries.push(SpaceSummary {
            description: clean_description(
                space.description_text(),
                options.description_max_chars,
                &options.default_description,
            ),
            latest_title: latest_title.to_string(),
            latest_url: latest_url.to_string(),
            name,
            key,
            url: url.clone(),
            icon,
        });

        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    Ok(summaries)
}

/// Confluence pages as a news source.
pub struct ConfluenceSource {
    upstream: Arc<dyn Upstream>,
    jira_url: String,
    search: ContentSearch,
}

impl ConfluenceSource {
    pub fn new(
        upstream: Arc<dyn Upstream>,
        jira_url: impl Into<String>,
        search: ContentSearch,
    ) -> Self {
        Self {
            upstream,
            jira_url: jira_url.into(),
            search,
        }
    }
}

#[async_trait]
impl NewsSource for ConfluenceSource {
    fn name(&self) -> &str {
        "Confluence"
    }

    async fn fetch(&self) -> FeedResult<Vec<NewsItem>> {
        fetch_content_items(self.upstream.as_ref(), &self.jira_url, &self.search).await
    }
}
