//! Source aggregation for the news and spaces snapshots.

use crate::models::SourceCount;
use crate::report::write_snapshot;
use crate::sources::confluence::{fetch_spaces, SpacesOptions};
use crate::sources::NewsSource;
use crate::upstream::Upstream;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Run every source in declaration order and write the combined snapshot.
///
/// Records are concatenated as returned; there is no cross-source sort.
/// Any source error aborts the run before the file is touched.
pub async fn aggregate_and_write(
    sources: &[Box<dyn NewsSource>],
    output_path: &Path,
) -> Result<Vec<SourceCount>> {
    let mut items = Vec::new();
    let mut counts = Vec::with_capacity(sources.len());

    for source in sources {
        let fetched = source
            .fetch()
            .await
            .with_context(|| format!("Failed to fetch {} items", source.name()))?;

        info!("{} returned {} items", source.name(), fetched.len());
        counts.push(SourceCount {
            source: source.name().to_string(),
            count: fetched.len(),
        });
        items.extend(fetched);
    }

    write_snapshot(&items, output_path)?;
    Ok(counts)
}

/// Build the spaces snapshot. Returns the number of spaces written.
pub async fn write_spaces(
    upstream: &dyn Upstream,
    jira_url: &str,
    options: &SpacesOptions,
    output_path: &Path,
) -> Result<usize> {
    let spaces = fetch_spaces(upstream, jira_url, options)
        .await
        .context("Failed to list Confluence spaces")?;

    write_snapshot(&spaces, output_path)?;
    Ok(spaces.len())
}

/// Total number of records across sources.
pub fn total_count(counts: &[SourceCount]) -> usize {
    counts.iter().map(|c| c.count).sum()
}
