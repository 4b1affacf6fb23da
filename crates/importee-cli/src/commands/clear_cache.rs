//! Clear-cache command.

use anyhow::{Context, Result};
use importee_core::{CacheStore, CACHE_DIR_NAME};
use std::path::Path;

/// Removes the persisted extraction cache for the project containing
/// `path`. Works without a check run; a project without a cache is fine.
pub fn run(path: &Path, explicit_config: Option<&Path>) -> Result<()> {
    let source = crate::config_resolver::resolve(path, explicit_config)?;
    let root = source
        .path()
        .parent()
        .context("resolved config has no parent directory")?
        .to_path_buf();

    CacheStore::clear(&root)
        .with_context(|| format!("failed to clear cache under {}", root.display()))?;
    tracing::info!("removed {}", root.join(CACHE_DIR_NAME).display());
    Ok(())
}
