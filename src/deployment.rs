//! The deployment file on disk: read it, refresh it from the database, and
//! replace it without ever leaving a half-written file behind.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::configuration::{self, RawConfiguration};
use crate::error::{AppError, AppResult};

pub fn read_configuration(path: &Path) -> AppResult<RawConfiguration> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::io("read_failed", format!("{}: {}", path.display(), e)))?;
    let raw: RawConfiguration = serde_json::from_str(&text)?;
    debug!(target: "catalog::deployment", "read configuration from {}", path.display());
    Ok(raw)
}

/// Pretty-print `config` to a uniquely named temp file next to `path`, flush
/// it, then rename it over `path`. On failure the temp file is removed and
/// `path` is untouched; concurrent writers never share a temp file.
pub fn write_configuration(path: &Path, config: &RawConfiguration) -> AppResult<()> {
    let body = serde_json::to_string_pretty(config)?;
    let write_failed = |e: std::io::Error| AppError::io("write_failed", format!("{}: {}", path.display(), e));

    // Same directory as the target so the final rename stays on one filesystem.
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_failed)?;
    tmp.write_all(body.as_bytes()).map_err(write_failed)?;
    tmp.write_all(b"\n").map_err(write_failed)?;
    tmp.as_file().sync_all().map_err(write_failed)?;
    tmp.persist(path).map_err(|e| write_failed(e.error))?;

    debug!(target: "catalog::deployment", "wrote configuration to {}", path.display());
    Ok(())
}

/// Read the file at `path`, introspect the database it points at and write the
/// refreshed configuration back in place.
pub async fn update_deployment(path: &Path) -> AppResult<RawConfiguration> {
    let raw = read_configuration(path)?;
    let configured = configuration::configure(&raw).await?;
    write_configuration(path, &configured)?;
    info!(
        target: "catalog::deployment",
        "deployment updated: file={} tables={} aggregate_argument_types={}",
        path.display(), configured.metadata.tables.0.len(), configured.aggregate_functions.0.len()
    );
    Ok(configured)
}
