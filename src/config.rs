//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.portalfeed.toml` files, and resolving the Atlassian credentials.

use crate::error::{FeedError, FeedResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".portalfeed.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Jira issue search settings.
    #[serde(default)]
    pub jira: JiraConfig,

    /// Confluence news page settings.
    #[serde(default)]
    pub confluence: ConfluenceConfig,

    /// Confluence spaces job settings.
    #[serde(default)]
    pub spaces: SpacesConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Where the news snapshot is written.
    #[serde(default = "default_news_output")]
    pub news_output: PathBuf,

    /// Where the spaces snapshot is written.
    #[serde(default = "default_spaces_output")]
    pub spaces_output: PathBuf,

    /// Request timeout in seconds. Unset means the HTTP client default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            news_output: default_news_output(),
            spaces_output: default_spaces_output(),
            timeout_seconds: None,
        }
    }
}

fn default_news_output() -> PathBuf {
    PathBuf::from("news_data.json")
}

fn default_spaces_output() -> PathBuf {
    PathBuf::from("spaces_data.json")
}

/// Jira issue search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// JQL filter. Results keep the order this query sorts by.
    #[serde(default = "default_jql")]
    pub jql: String,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Comma-separated field selection.
    #[serde(default = "default_fields")]
    pub fields: String,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            jql: default_jql(),
            max_results: default_max_results(),
            fields: default_fields(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_jql() -> String {
    r#"project = OFBI AND issuetype in ("[System] Mudança", "[System] Incidente") AND statusCategory != Done ORDER BY updated DESC"#
        .to_string()
}

fn default_max_results() -> usize {
    10
}

fn default_fields() -> String {
    "summary,status,issuetype,updated,created,priority".to_string()
}

/// Confluence news page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfluenceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Pages carrying this label are published as news.
    #[serde(default = "default_label")]
    pub label: String,

    #[serde(default = "default_content_limit")]
    pub limit: usize,

    #[serde(default = "default_content_expand")]
    pub expand: String,
}

impl Default for ConfluenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            label: default_label(),
            limit: default_content_limit(),
            expand: default_content_expand(),
        }
    }
}

fn default_label() -> String {
    "portal-news".to_string()
}

fn default_content_limit() -> usize {
    5
}

fn default_content_expand() -> String {
    "metadata.labels,history".to_string()
}

/// Confluence spaces job settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpacesConfig {
    /// Spaces listed per run. Each one costs an extra lookup.
    #[serde(default = "default_spaces_limit")]
    pub limit: usize,

    #[serde(default = "default_space_type")]
    pub space_type: String,

    #[serde(default = "default_spaces_expand")]
    pub expand: String,

    /// Longer descriptions are cut to their first line.
    #[serde(default = "default_description_max_chars")]
    pub description_max_chars: usize,

    #[serde(default = "default_description")]
    pub default_description: String,

    /// Shown when a space has no recent page or blog post.
    #[serde(default = "default_no_recent_title")]
    pub no_recent_title: String,
}

impl Default for SpacesConfig {
    fn default() -> Self {
        Self {
            limit: default_spaces_limit(),
            space_type: default_space_type(),
            expand: default_spaces_expand(),
            description_max_chars: default_description_max_chars(),
            default_description: default_description(),
            no_recent_title: default_no_recent_title(),
        }
    }
}

fn default_spaces_limit() -> usize {
    10
}

fn default_space_type() -> String {
    "global".to_string()
}

fn default_spaces_expand() -> String {
    "icon,description.plain".to_string()
}

fn default_description_max_chars() -> usize {
    100
}

fn default_description() -> String {
    "Espaço corporativo Open Finance Brasil".to_string()
}

fn default_no_recent_title() -> String {
    "Nenhuma publicação recente".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only when explicitly given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref path) = args.news_output {
            self.general.news_output = path.clone();
        }
        if let Some(ref path) = args.spaces_output {
            self.general.spaces_output = path.clone();
        }
        if let Some(timeout) = args.timeout {
            self.general.timeout_seconds = Some(timeout);
        }
        if let Some(max_results) = args.max_results {
            self.jira.max_results = max_results;
        }

        // Disabling flags only ever switch a source off
        if args.no_jira {
            self.jira.enabled = false;
        }
        if args.no_confluence {
            self.confluence.enabled = false;
        }
    }

    /// Reject values that would make every request fail or return nothing.
    ///
    /// Run after `merge_with_args`, since file values bypass the CLI checks.
    pub fn validate(&self) -> Result<()> {
        if self.general.timeout_seconds == Some(0) {
            anyhow::bail!("general.timeout_seconds must be at least 1 second");
        }
        if self.jira.max_results == 0 {
            anyhow::bail!("jira.max_results must be at least 1");
        }
        if self.confluence.limit == 0 {
            anyhow::bail!("confluence.limit must be at least 1");
        }
        if self.spaces.limit == 0 {
            anyhow::bail!("spaces.limit must be at least 1");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

/// Load variables from a `.env` file, replacing values already in the
/// process environment. Returns how many variables were set.
pub fn load_env_file(path: &Path) -> Result<usize> {
    let entries = dotenv::from_path_iter(path)
        .with_context(|| format!("Failed to read env file: {}", path.display()))?;

    let mut count = 0;
    for entry in entries {
        let (key, value) =
            entry.with_context(|| format!("Failed to parse env file: {}", path.display()))?;
        std::env::set_var(key, value);
        count += 1;
    }

    Ok(count)
}

/// Account used against both Jira and Confluence.
#[derive(Clone)]
pub struct Credentials {
    /// Jira site root, without trailing slash.
    pub jira_url: String,
    pub email: String,
    pub token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("jira_url", &self.jira_url)
            .field("email", &self.email)
            .field("token", &"***")
            .finish()
    }
}

impl Credentials {
    /// Build credentials, failing with the names of every missing variable.
    pub fn resolve(
        jira_url: Option<&str>,
        email: Option<&str>,
        token: Option<&str>,
    ) -> FeedResult<Self> {
        fn present(value: Option<&str>) -> Option<&str> {
            value.map(str::trim).filter(|v| !v.is_empty())
        }

        let missing: Vec<&str> = [
            ("JIRA_URL", present(jira_url)),
            ("JIRA_EMAIL", present(email)),
            ("JIRA_API_TOKEN", present(token)),
        ]
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| *name)
        .collect();

        match (present(jira_url), present(email), present(token)) {
            (Some(url), Some(email), Some(token)) => Ok(Self {
                jira_url: url.trim_end_matches('/').to_string(),
                email: email.to_string(),
                token: token.to_string(),
            }),
            _ => Err(FeedError::MissingCredentials(missing.join(", "))),
        }
    }
}
