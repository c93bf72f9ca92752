//! portal-feed - Jira/Confluence snapshots for the service portal
//!
//! A batch CLI that queries Jira and Confluence Cloud and writes the
//! static JSON files consumed by the portal's news and spaces pages.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing credentials, config, transport, write failure)

mod aggregate;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod sources;
mod upstream;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, Credentials};
use sources::{
    derive_content_root, ConfluenceSource, ContentSearch, IssueQuery, JiraSource, NewsSource,
    SpacesOptions,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use upstream::{AtlassianClient, Upstream};

#[tokio::main]
async fn main() -> Result<()> {
    // Local runs keep credentials in .env, which wins over the shell;
    // CI injects them directly
    let env_file = Path::new(".env");
    if env_file.exists() {
        if let Err(e) = config::load_env_file(env_file) {
            eprintln!("⚠️  {:#}", e);
        }
    }

    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("portal-feed v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .portalfeed.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  .portalfeed.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .portalfeed.toml")?;

    println!("✅ Created .portalfeed.toml with default settings.");
    println!("   Edit it to customize the JQL, labels, limits and output paths.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the selected snapshot jobs against the live Atlassian site.
async fn run(args: Args) -> Result<()> {
    execute(&args, |credentials, timeout_seconds| {
        let client = AtlassianClient::new(credentials, timeout_seconds)?;
        Ok(Arc::new(client) as Arc<dyn Upstream>)
    })
    .await
}

/// Resolve config and credentials, then run the jobs through `connect`.
///
/// `connect` is only called once a request is actually going to be made.
async fn execute<F>(args: &Args, connect: F) -> Result<()>
where
    F: FnOnce(&Credentials, Option<u64>) -> Result<Arc<dyn Upstream>>,
{
    let start_time = Instant::now();

    let mut config = load_config(args)?;
    config.merge_with_args(args);
    config.validate()?;

    // Fail before any network call when the account is incomplete
    let credentials = Credentials::resolve(
        args.jira_url.as_deref(),
        args.email.as_deref(),
        args.token.as_deref(),
    )?;

    if args.dry_run {
        handle_dry_run(args, &config, &credentials);
        return Ok(());
    }

    let upstream = connect(&credentials, config.general.timeout_seconds)?;

    if args.job.runs_news() {
        run_news(&config, &credentials, upstream.clone()).await?;
    }

    if args.job.runs_spaces() {
        run_spaces(args, &config, &credentials, upstream.as_ref()).await?;
    }

    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Build the news snapshot from the enabled sources.
async fn run_news(
    config: &Config,
    credentials: &Credentials,
    upstream: Arc<dyn Upstream>,
) -> Result<()> {
    println!("📰 Updating news feed...");

    let sources = build_news_sources(config, credentials, upstream);
    let output = &config.general.news_output;
    let counts = aggregate::aggregate_and_write(&sources, output).await?;

    let breakdown = counts
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    println!(
        "✅ {} items saved to {} ({}).",
        aggregate::total_count(&counts),
        output.display(),
        breakdown
    );
    Ok(())
}

/// Enabled news sources, in the order their records are written.
fn build_news_sources(
    config: &Config,
    credentials: &Credentials,
    upstream: Arc<dyn Upstream>,
) -> Vec<Box<dyn NewsSource>> {
    let mut sources: Vec<Box<dyn NewsSource>> = Vec::new();

    if config.jira.enabled {
        sources.push(Box::new(JiraSource::new(
            upstream.clone(),
            credentials.jira_url.clone(),
            IssueQuery::from(&config.jira),
        )));
    }

    if config.confluence.enabled {
        sources.push(Box::new(ConfluenceSource::new(
            upstream,
            credentials.jira_url.clone(),
            ContentSearch::from(&config.confluence),
        )));
    }

    if sources.is_empty() {
        warn!("All news sources are disabled; the snapshot will be empty");
    }

    sources
}

/// Build the spaces snapshot.
async fn run_spaces(
    args: &Args,
    config: &Config,
    credentials: &Credentials,
    upstream: &dyn Upstream,
) -> Result<()> {
    println!("🗂️  Updating spaces...");

    let mut options = SpacesOptions::from(&config.spaces);
    options.show_progress = !args.quiet;

    let output = &config.general.spaces_output;
    let written = aggregate::write_spaces(upstream, &credentials.jira_url, &options, output).await?;

    println!("✅ {} spaces saved to {}.", written, output.display());
    Ok(())
}

/// Handle --dry-run: print the endpoints a run would query.
fn handle_dry_run(args: &Args, config: &Config, credentials: &Credentials) {
    let content_root = derive_content_root(&credentials.jira_url);

    println!("\n🔍 Dry run (no requests are made)\n");
    println!("   Account: {}", credentials.email);

    if args.job.runs_news() {
        println!("\n   News -> {}", config.general.news_output.display());
        if config.jira.enabled {
            println!("     Jira: {}/rest/api/3/search/jql", credentials.jira_url);
            println!("       JQL: {}", config.jira.jql);
            println!("       Max results: {}", config.jira.max_results);
        }
        if config.confluence.enabled {
            println!("     Confluence: {}/rest/api/content/search", content_root);
            println!("       Label: {} (limit {})", config.confluence.label, config.confluence.limit);
        }
    }

    if args.job.runs_spaces() {
        println!("\n   Spaces -> {}", config.general.spaces_output.display());
        println!("     Confluence: {}/rest/api/space", content_root);
        println!("       Type: {} (limit {})", config.spaces.space_type, config.spaces.limit);
    }

    println!("\n✅ Dry run complete.");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::fake::FakeUpstream;

    fn credentials() -> Credentials {
        Credentials::resolve(
            Some("https://acme.atlassian.net"),
            Some("ops@acme.com"),
            Some("secret"),
        )
        .unwrap()
    }

    /// Args for a run against acme with outputs and config inside `dir`.
    fn args_in(dir: &Path, extra: &[&str]) -> Args {
        use clap::Parser;

        let config_path = dir.join(config::DEFAULT_CONFIG_FILE);
        std::fs::write(
            &config_path,
            format!(
                "[general]\nnews_output = '{}'\nspaces_output = '{}'\n",
                dir.join("news_data.json").display(),
                dir.join("spaces_data.json").display()
            ),
        )
        .unwrap();

        let config_arg = config_path.display().to_string();
        let mut argv = vec![
            "portal-feed",
            "--jira-url",
            "https://acme.atlassian.net",
            "--email",
            "ops@acme.com",
            "--token",
            "secret",
            "--quiet",
            "--config",
            config_arg.as_str(),
        ];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[tokio::test]
    async fn test_dry_run_makes_no_requests() {
        let dir = tempfile::tempdir().unwrap();
        let args = args_in(dir.path(), &["--job", "all", "--dry-run"]);

        let fake = Arc::new(FakeUpstream::new());
        let handle = fake.clone();
        let connected = std::sync::atomic::AtomicBool::new(false);

        execute(&args, |_, _| {
            connected.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(handle as Arc<dyn Upstream>)
        })
        .await
        .unwrap();

        assert!(!connected.load(std::sync::atomic::Ordering::SeqCst));
        assert!(fake.called_urls().is_empty());
        assert!(!dir.path().join("news_data.json").exists());
        assert!(!dir.path().join("spaces_data.json").exists());
    }

    #[tokio::test]
    async fn test_news_run_goes_through_upstream() {
        let dir = tempfile::tempdir().unwrap();
        let args = args_in(dir.path(), &["--job", "news"]);

        let fake = Arc::new(
            FakeUpstream::new()
                .reply(
                    "https://acme.atlassian.net/rest/api/3/search/jql",
                    200,
                    r#"{"issues": []}"#,
                )
                .reply(
                    "https://acme.atlassian.net/wiki/rest/api/content/search",
                    200,
                    r#"{"results": []}"#,
                ),
        );
        let handle = fake.clone();

        execute(&args, |_, _| Ok(handle as Arc<dyn Upstream>))
            .await
            .unwrap();

        assert_eq!(fake.called_urls().len(), 2);
        let text = std::fs::read_to_string(dir.path().join("news_data.json")).unwrap();
        assert_eq!(text, "[]");
    }

    #[tokio::test]
    async fn test_zero_limit_in_config_fails_before_connecting() {
        let dir = tempfile::tempdir().unwrap();
        let args = args_in(dir.path(), &[]);
        let mut contents =
            std::fs::read_to_string(dir.path().join(config::DEFAULT_CONFIG_FILE)).unwrap();
        contents.push_str("[jira]\nmax_results = 0\n");
        std::fs::write(dir.path().join(config::DEFAULT_CONFIG_FILE), contents).unwrap();

        let fake = Arc::new(FakeUpstream::new());
        let handle = fake.clone();
        let result = execute(&args, |_, _| Ok(handle as Arc<dyn Upstream>)).await;

        assert!(result.is_err());
        assert!(fake.called_urls().is_empty());
    }

    #[test]
    fn test_build_news_sources_respects_enabled_flags() {
        let upstream: Arc<dyn Upstream> = Arc::new(FakeUpstream::new());
        let mut config = Config::default();

        let names: Vec<String> = build_news_sources(&config, &credentials(), upstream.clone())
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, vec!["Jira", "Confluence"]);

        config.jira.enabled = false;
        let sources = build_news_sources(&config, &credentials(), upstream);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name(), "Confluence");
    }
}
