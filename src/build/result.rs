//! Build result types.
//!
//! Contains types for representing the outcome of category runs and of the
//! aggregate build.

use crate::build::Category;
use crate::stages::Diagnostic;
use std::path::PathBuf;
use std::time::Duration;

/// Files written by one category run.
#[derive(Debug, Clone)]
pub struct WrittenFileSet {
    /// Category that ran
    pub category: Category,
    /// Absolute paths of the written files, sorted
    pub files: Vec<PathBuf>,
    /// Recoverable findings collected from the stages
    pub diagnostics: Vec<Diagnostic>,
    /// Run duration
    pub duration: Duration,
}

/// Status of a single category run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    /// Run succeeded
    Success,
    /// Run skipped (dry run)
    Skipped,
    /// Run failed with error
    Failed(String),
}

impl BuildStatus {
    /// Check if the status indicates success.
    pub fn is_success(&self) -> bool {
        matches!(self, BuildStatus::Success | BuildStatus::Skipped)
    }

    /// Check if the status indicates failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, BuildStatus::Failed(_))
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildStatus::Success => write!(f, "success"),
            BuildStatus::Skipped => write!(f, "skipped"),
            BuildStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Result of running a single category within an aggregate build.
#[derive(Debug, Clone)]
pub struct CategoryResult {
    /// Category that ran
    pub category: Category,
    /// Run status
    pub status: BuildStatus,
    /// Output files produced
    pub outputs: Vec<PathBuf>,
    /// Source files selected (filled in for dry runs)
    pub sources: Vec<PathBuf>,
    /// Run duration
    pub duration: Duration,
    /// Warning messages (if any)
    pub warnings: Vec<String>,
}

impl CategoryResult {
    /// Create a successful result from a written fileset.
    pub fn success(written: WrittenFileSet) -> Self {
        Self {
            category: written.category,
            status: BuildStatus::Success,
            outputs: written.files,
            sources: vec![],
            duration: written.duration,
            warnings: written.diagnostics.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Create a skipped result listing the sources that would be processed.
    pub fn skipped(category: Category, sources: Vec<PathBuf>) -> Self {
        Self {
            category,
            status: BuildStatus::Skipped,
            outputs: vec![],
            sources,
            duration: Duration::ZERO,
            warnings: vec![],
        }
    }

    /// Create a failed result.
    pub fn failed(category: Category, error: String, duration: Duration) -> Self {
        Self {
            category,
            status: BuildStatus::Failed(error),
            outputs: vec![],
            sources: vec![],
            duration,
            warnings: vec![],
        }
    }

    /// Check if this result is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Result of a complete build run.
#[derive(Debug, Default)]
pub struct BuildResult {
    /// Results for each category, in category order
    pub categories: Vec<CategoryResult>,
    /// Total build duration
    pub total_duration: Duration,
}

impl BuildResult {
    /// Create a new empty build result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category result.
    pub fn add_result(&mut self, result: CategoryResult) {
        self.categories.push(result);
    }

    /// Set the total duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.total_duration = duration;
        self
    }

    /// Get the result of one category.
    pub fn get(&self, category: Category) -> Option<&CategoryResult> {
        self.categories.iter().find(|r| r.category == category)
    }

    /// Get the number of successful categories.
    pub fn success_count(&self) -> usize {
        self.categories.iter().filter(|r| matches!(r.status, BuildStatus::Success)).count()
    }

    /// Get the number of skipped categories.
    pub fn skipped_count(&self) -> usize {
        self.categories.iter().filter(|r| matches!(r.status, BuildStatus::Skipped)).count()
    }

    /// Get the number of failed categories.
    pub fn failed_count(&self) -> usize {
        self.categories.iter().filter(|r| r.status.is_failure()).count()
    }

    /// Check if the overall build succeeded (no failures).
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// Get all outputs produced.
    pub fn all_outputs(&self) -> Vec<&PathBuf> {
        self.categories.iter().flat_map(|r| r.outputs.iter()).collect()
    }

    /// Get all warnings.
    pub fn all_warnings(&self) -> Vec<&String> {
        self.categories.iter().flat_map(|r| r.warnings.iter()).collect()
    }

    /// Get failed category results.
    pub fn failures(&self) -> Vec<&CategoryResult> {
        self.categories.iter().filter(|r| r.status.is_failure()).collect()
    }

    /// Format a summary of the build result.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        let success = self.success_count();
        let skipped = self.skipped_count();
        let failed = self.failed_count();
        let total = self.categories.len();

        if failed > 0 {
            lines.push(format!(
                "Build failed: {} succeeded, {} skipped, {} failed ({} total)",
                success, skipped, failed, total
            ));
            for category in self.failures() {
                lines.push(format!("  - {}: {}", category.category, category.status));
            }
        } else {
            lines.push(format!(
                "Build succeeded: {} built, {} skipped ({} total), {} files in {:?}",
                success,
                skipped,
                total,
                self.all_outputs().len(),
                self.total_duration
            ));
        }

        let warnings = self.all_warnings();
        if !warnings.is_empty() {
            lines.push(format!("Warnings ({}): ", warnings.len()));
            for warning in warnings.iter().take(5) {
                lines.push(format!("  - {}", warning));
            }
            if warnings.len() > 5 {
                lines.push(format!("  ... and {} more", warnings.len() - 5));
            }
        }

        lines.join("\n")
    }
}
