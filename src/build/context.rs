//! Build context containing configuration and state for a build.

use crate::build::Category;
use crate::config::AssetConfig;
use std::path::{Path, PathBuf};

/// Build context containing configuration and paths for a build operation.
///
/// The context provides access to all information needed to execute a build,
/// including the configuration, project root, and per-category directories.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The loaded configuration
    config: AssetConfig,
    /// Project root directory (where assetpipe.toml is located)
    project_root: PathBuf,
}

impl BuildContext {
    /// Create a new build context.
    pub fn new(config: AssetConfig, project_root: PathBuf) -> Self {
        Self { config, project_root }
    }

    /// Get the configuration.
    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the source root (resolved to absolute path).
    pub fn src_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.src)
    }

    /// Get the destination root (resolved to absolute path).
    pub fn out_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.out)
    }

    /// Source folder of a category.
    pub fn category_src_dir(&self, category: Category) -> PathBuf {
        self.src_dir().join(&self.config.src_spec(category).folder)
    }

    /// Destination folder of a category.
    pub fn category_dest_dir(&self, category: Category) -> PathBuf {
        self.out_dir().join(&self.config.dest_spec(category).folder)
    }

    /// Resolve a path relative to the project root.
    ///
    /// If the path is absolute, returns it unchanged.
    /// If relative, joins it with the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}
