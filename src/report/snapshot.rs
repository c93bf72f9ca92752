//! JSON snapshot writing.
//!
//! Snapshots are pretty-printed with a two-space indent and keep non-ASCII
//! text literal. They are written to a temporary file next to the target and
//! renamed into place, so readers never see a half-written file.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Render records the way the front end expects them.
pub fn render_snapshot<T: Serialize>(items: &[T]) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(items).context("Failed to serialize snapshot")
}

/// Write records to `path`, replacing any previous snapshot.
pub fn write_snapshot<T: Serialize>(items: &[T], path: &Path) -> Result<()> {
    let bytes = render_snapshot(items)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(&bytes)
        .context("Failed to write snapshot contents")?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
