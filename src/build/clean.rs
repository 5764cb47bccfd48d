//! Deleting previous category outputs before a build.
//!
//! Only files matching the category's destination patterns are removed, so
//! categories sharing a destination root do not clobber each other.

use crate::build::discovery::{discover_files, DiscoveryError};
use crate::build::{BuildContext, Category};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error while deleting outputs.
#[derive(Debug, Error)]
pub enum CleanError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error("Failed to delete {path}: {source}")]
    Remove { path: PathBuf, source: io::Error },
}

/// Delete a category's previous outputs.
///
/// Returns the deleted files. Directories left empty inside the
/// destination folder are removed too; the folder itself is kept.
pub fn clean_category(ctx: &BuildContext, category: Category) -> Result<Vec<PathBuf>, CleanError> {
    let dest_dir = ctx.category_dest_dir(category);
    if !dest_dir.exists() {
        return Ok(vec![]);
    }

    let stale = discover_files(&dest_dir, ctx.config().dest_spec(category))?;
    for path in &stale {
        fs::remove_file(path).map_err(|source| CleanError::Remove { path: path.clone(), source })?;
    }

    prune_empty_dirs(&dest_dir).map_err(|source| CleanError::Remove { path: dest_dir.clone(), source })?;

    tracing::debug!(category = %category, deleted = stale.len(), "cleaned destination");
    Ok(stale)
}

/// Remove empty subdirectories below `root`, deepest first.
fn prune_empty_dirs(root: &Path) -> io::Result<()> {
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            prune_empty_dirs(&path)?;
            if fs::read_dir(&path)?.next().is_none() {
                fs::remove_dir(&path)?;
            }
        }
    }
    Ok(())
}
