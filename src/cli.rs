//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// portal-feed - Jira/Confluence snapshots for the service portal
///
/// Queries Jira and Confluence Cloud and writes the static JSON files
/// the portal front end reads. Credentials come from the environment
/// (or a local .env file).
///
/// Examples:
///   portal-feed
///   portal-feed --job spaces
///   portal-feed --job all --news-output public/news_data.json
///   portal-feed --no-confluence --max-results 5
///   portal-feed --dry-run
///   portal-feed --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Jira site root (e.g. https://acme.atlassian.net)
    #[arg(long, value_name = "URL", env = "JIRA_URL")]
    pub jira_url: Option<String>,

    /// Atlassian account email
    #[arg(long, value_name = "EMAIL", env = "JIRA_EMAIL")]
    pub email: Option<String>,

    /// Atlassian API token
    #[arg(long, value_name = "TOKEN", env = "JIRA_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Which snapshot(s) to build
    #[arg(long, default_value = "news", value_name = "JOB")]
    pub job: Job,

    /// Output file for the news snapshot
    #[arg(long, value_name = "FILE")]
    pub news_output: Option<PathBuf>,

    /// Output file for the spaces snapshot
    #[arg(long, value_name = "FILE")]
    pub spaces_output: Option<PathBuf>,

    /// Skip the Jira issue source in the news job
    #[arg(long)]
    pub no_jira: bool,

    /// Skip the Confluence page source in the news job
    #[arg(long)]
    pub no_confluence: bool,

    /// Maximum number of Jira issues to include
    #[arg(long, value_name = "COUNT")]
    pub max_results: Option<usize>,

    /// Request timeout in seconds
    ///
    /// Defaults to the HTTP client's own behaviour when unset.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .portalfeed.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the endpoints that would be queried and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .portalfeed.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Snapshot job to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Job {
    /// Jira issues and Confluence pages (default)
    #[default]
    News,
    /// Confluence spaces with their latest content
    Spaces,
    /// Both snapshots
    All,
}

impl Job {
    pub fn runs_news(&self) -> bool {
        matches!(self, Job::News | Job::All)
    }

    pub fn runs_spaces(&self) -> bool {
        matches!(self, Job::Spaces | Job::All)
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    ///
    /// Missing credentials are not checked here; they are reported
    /// separately so the message can name every absent variable.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.jira_url {
            if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Jira URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.job.runs_news() && self.no_jira && self.no_confluence {
            return Err("Cannot disable both Jira and Confluence for the news job".to_string());
        }

        if let Some(max_results) = self.max_results {
            if max_results == 0 {
                return Err("Max results must be at least 1".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
