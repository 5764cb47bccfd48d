//! Source file discovery for the build system.
//!
//! Discovers category source files from a folder plus file-name patterns.
//! Patterns are matched recursively; `!`-prefixed patterns exclude files.

use crate::build::{BuildContext, Category};
use crate::config::PathSpec;
use glob::{glob, MatchOptions, Pattern};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error during source discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Invalid glob pattern
    #[error("Invalid glob pattern '{0}': {1}")]
    InvalidPattern(String, glob::PatternError),
    /// IO error during file enumeration
    #[error("IO error during discovery: {0}")]
    Io(#[from] std::io::Error),
}

const MATCH_OPTIONS: MatchOptions =
    MatchOptions { case_sensitive: true, require_literal_separator: true, require_literal_leading_dot: true };

/// Check a file name against a spec's include and exclude patterns.
pub fn matches_spec(spec: &PathSpec, file_name: &str) -> bool {
    let matches = |pattern: &str| {
        Pattern::new(pattern).map(|p| p.matches_with(file_name, MATCH_OPTIONS)).unwrap_or(false)
    };
    spec.includes().any(matches) && !spec.excludes().any(matches)
}

/// Discover files under `base_dir` selected by `spec.extensions`.
///
/// The spec's folder is not applied; callers pass the resolved folder.
/// Results are deduplicated and sorted.
pub fn discover_files(base_dir: &Path, spec: &PathSpec) -> Result<Vec<PathBuf>, DiscoveryError> {
    let base = Pattern::escape(&base_dir.to_string_lossy());
    let mut files = BTreeSet::new();

    for pattern in spec.includes() {
        let full_pattern = format!("{}/**/{}", base, pattern);
        let paths = glob(&full_pattern)
            .map_err(|e| DiscoveryError::InvalidPattern(pattern.to_string(), e))?;

        for entry in paths {
            match entry {
                Ok(path) => {
                    let selected = path.is_file()
                        && path
                            .file_name()
                            .map(|n| matches_spec(spec, &n.to_string_lossy()))
                            .unwrap_or(false);
                    if selected {
                        files.insert(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("error reading path during discovery: {}", e);
                }
            }
        }
    }

    Ok(files.into_iter().collect())
}

/// Discover the source files of one category.
pub fn discover_category(
    ctx: &BuildContext,
    category: Category,
) -> Result<Vec<PathBuf>, DiscoveryError> {
    discover_files(&ctx.category_src_dir(category), ctx.config().src_spec(category))
}

/// Map a changed path to the categories whose sources it belongs to.
pub fn categories_for_path(ctx: &BuildContext, path: &Path) -> Vec<Category> {
    let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return vec![];
    };

    Category::ALL
        .into_iter()
        .filter(|&category| {
            path.starts_with(ctx.category_src_dir(category))
                && matches_spec(ctx.config().src_spec(category), &file_name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetConfig;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        File::create(&path).unwrap().write_all(b"x").unwrap();
        path
    }

    #[test]
    fn test_discover_files_simple() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "app.js");
        create_test_file(temp.path(), "notes.txt");

        let files = discover_files(temp.path(), &PathSpec::new("", &["*.js"])).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("app.js"));
    }

    #[test]
    fn test_discover_files_recursive() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "a.scss");
        create_test_file(temp.path(), "components/b.scss");
        create_test_file(temp.path(), "components/forms/c.sass");

        let files =
            discover_files(temp.path(), &PathSpec::new("", &["*.scss", "*.sass"])).unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_discover_files_negated_pattern() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "logo.png");
        create_test_file(temp.path(), "icons/arrow.svg");
        create_test_file(temp.path(), "icons/arrow.png");

        let files = discover_files(temp.path(), &PathSpec::new("", &["*.*", "!*.svg"])).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "png"));
    }

    #[test]
    fn test_discover_files_overlapping_patterns_deduplicated() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "app.css");

        let files = discover_files(temp.path(), &PathSpec::new("", &["*.css", "*.*"])).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_discover_files_sorted() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "z.js");
        create_test_file(temp.path(), "a.js");
        create_test_file(temp.path(), "m/b.js");

        let files = discover_files(temp.path(), &PathSpec::new("", &["*.js"])).unwrap();
        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
    }

    #[test]
    fn test_discover_files_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        let files = discover_files(&temp.path().join("nope"), &PathSpec::new("", &["*.js"])).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_matches_spec() {
        let spec = PathSpec::new("images", &["*.*", "!*.svg"]);
        assert!(matches_spec(&spec, "hero.jpg"));
        assert!(!matches_spec(&spec, "icon.svg"));
        assert!(!matches_spec(&spec, "README"));
    }

    #[test]
    fn test_categories_for_path() {
        let ctx = BuildContext::new(AssetConfig::default(), PathBuf::from("/site"));

        assert_eq!(
            categories_for_path(&ctx, Path::new("/site/src/scss/partials/_vars.scss")),
            vec![Category::Style]
        );
        assert_eq!(
            categories_for_path(&ctx, Path::new("/site/src/scripts/app.js")),
            vec![Category::Script]
        );
        assert!(categories_for_path(&ctx, Path::new("/site/src/images/logo.svg")).is_empty());
        assert!(categories_for_path(&ctx, Path::new("/site/dist/css/app.css")).is_empty());
    }
}
