//! Category runs and the aggregate build.

use crate::build::clean::{clean_category, CleanError};
use crate::build::discovery::{discover_category, DiscoveryError};
use crate::build::progress::{NullProgress, ProgressEvent, ProgressReporter};
use crate::build::{
    AssetFile, BuildContext, BuildResult, BuildStatus, Category, CategoryResult, Fileset, Pipeline, WrittenFileSet,
};
use crate::stages::StageError;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Fatal error of a category run.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The category's source folder does not exist
    #[error("Source folder not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    /// Discovery error
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    /// Cleaning the destination failed
    #[error(transparent)]
    Clean(#[from] CleanError),
    /// A source file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    /// A stage failed
    #[error(transparent)]
    Stage(#[from] StageError),
    /// The destination folder could not be created
    #[error("Destination not writable: {}: {source}", path.display())]
    DestinationNotWritable { path: PathBuf, source: io::Error },
    /// An output file could not be written
    #[error("Failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    /// Two sources produce the same output path
    #[error("{} and {} both produce {}", first.display(), second.display(), path.display())]
    OutputCollision { path: PathBuf, first: PathBuf, second: PathBuf },
}

impl BuildError {
    /// File the error is about, if any.
    pub fn file(&self) -> Option<&Path> {
        match self {
            BuildError::Read { path, .. } | BuildError::Write { path, .. } => Some(path),
            BuildError::Stage(e) => Some(&e.file),
            BuildError::OutputCollision { second, .. } => Some(second),
            _ => None,
        }
    }
}

/// List the source files of a category without reading them.
pub fn plan_sources(ctx: &BuildContext, category: Category) -> Result<Vec<PathBuf>, BuildError> {
    let src_dir = ctx.category_src_dir(category);
    if !src_dir.is_dir() {
        return Err(BuildError::SourceNotFound(src_dir));
    }
    Ok(discover_category(ctx, category)?)
}

/// Discover and read the sources of a category.
///
/// Paths in the returned set are relative to the category source folder.
pub fn read_sources(ctx: &BuildContext, category: Category) -> Result<Fileset, BuildError> {
    let src_dir = ctx.category_src_dir(category);
    let mut files = Vec::new();
    for origin in plan_sources(ctx, category)? {
        let contents = fs::read(&origin).map_err(|source| BuildError::Read { path: origin.clone(), source })?;
        let path = origin.strip_prefix(&src_dir).map(PathBuf::from).unwrap_or_else(|_| origin.clone());
        files.push(AssetFile::new(path, origin, contents));
    }
    Ok(Fileset::new(files))
}

/// Run one category: clean, discover, transform, write.
pub fn run_category(ctx: &BuildContext, category: Category) -> Result<WrittenFileSet, BuildError> {
    let start = Instant::now();

    let src_dir = ctx.category_src_dir(category);
    if !src_dir.is_dir() {
        return Err(BuildError::SourceNotFound(src_dir));
    }

    if ctx.config().cleans(category) {
        clean_category(ctx, category)?;
    }

    let sources = read_sources(ctx, category)?;
    tracing::debug!(category = %category, sources = sources.len(), "running pipeline");

    let mut diagnostics = Vec::new();
    let output = Pipeline::for_category(ctx, category).run(sources, &mut diagnostics)?;
    check_collisions(&output)?;

    let dest_dir = ctx.category_dest_dir(category);
    fs::create_dir_all(&dest_dir)
        .map_err(|source| BuildError::DestinationNotWritable { path: dest_dir.clone(), source })?;

    let mut written = Vec::with_capacity(output.len());
    for file in output {
        let target = dest_dir.join(&file.path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| BuildError::DestinationNotWritable { path: parent.to_path_buf(), source })?;
        }
        fs::write(&target, &file.contents).map_err(|source| BuildError::Write { path: target.clone(), source })?;
        written.push(target);
    }

    for diag in &diagnostics {
        tracing::debug!(category = %category, "{}", diag);
    }

    Ok(WrittenFileSet { category, files: written, diagnostics, duration: start.elapsed() })
}

/// Fail when two output files would land on the same path.
fn check_collisions(output: &Fileset) -> Result<(), BuildError> {
    let mut seen: HashMap<&Path, &Path> = HashMap::new();
    for file in output.iter() {
        if let Some(first) = seen.insert(&file.path, &file.origin) {
            return Err(BuildError::OutputCollision {
                path: file.path.clone(),
                first: first.to_path_buf(),
                second: file.origin.clone(),
            });
        }
    }
    Ok(())
}

/// Runs several categories, isolated from each other.
pub struct BuildRunner {
    context: BuildContext,
    dry_run: bool,
    progress: Arc<dyn ProgressReporter>,
}

impl BuildRunner {
    /// Create a new build runner.
    pub fn new(context: BuildContext) -> Self {
        Self { context, dry_run: false, progress: Arc::new(NullProgress) }
    }

    /// Set dry-run mode (discover only, no stages, no writes).
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the progress reporter.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Run every enabled category.
    pub fn build_all(&self) -> BuildResult {
        let categories: Vec<Category> =
            Category::ALL.into_iter().filter(|&c| self.context.config().is_enabled(c)).collect();
        self.build(&categories)
    }

    /// Run the given categories in parallel.
    ///
    /// One category failing does not stop the others. Results are returned
    /// in category order.
    pub fn build(&self, categories: &[Category]) -> BuildResult {
        let start = Instant::now();
        self.progress.report(ProgressEvent::BuildStarted { total_categories: categories.len() });

        let mut results: Vec<CategoryResult> = categories.par_iter().map(|&c| self.run_one(c)).collect();
        results.sort_by_key(|r| r.category);

        let mut result = BuildResult::new();
        for r in results {
            result.add_result(r);
        }
        let result = result.with_duration(start.elapsed());

        self.progress.report(ProgressEvent::BuildCompleted {
            success: result.is_success(),
            duration_ms: result.total_duration.as_millis() as u64,
            succeeded: result.success_count(),
            skipped: result.skipped_count(),
            failed: result.failed_count(),
        });
        result
    }

    fn run_one(&self, category: Category) -> CategoryResult {
        let start = Instant::now();
        self.progress.report(ProgressEvent::CategoryStarted { category });

        let result = if self.dry_run {
            match plan_sources(&self.context, category) {
                Ok(sources) => CategoryResult::skipped(category, sources),
                Err(e) => CategoryResult::failed(category, e.to_string(), start.elapsed()),
            }
        } else {
            match run_category(&self.context, category) {
                Ok(written) => {
                    for diag in &written.diagnostics {
                        self.progress
                            .report(ProgressEvent::Warning { category: Some(category), message: diag.to_string() });
                    }
                    CategoryResult::success(written)
                }
                Err(e) => CategoryResult::failed(category, e.to_string(), start.elapsed()),
            }
        };

        let files = match result.status {
            BuildStatus::Skipped => result.sources.len(),
            _ => result.outputs.len(),
        };
        self.progress.report(ProgressEvent::CategoryCompleted {
            category,
            status: result.status.clone(),
            duration_ms: result.duration.as_millis() as u64,
            files,
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetConfig;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn create_test_context() -> (TempDir, BuildContext) {
        let temp = TempDir::new().unwrap();
        let ctx = BuildContext::new(AssetConfig::default(), temp.path().to_path_buf());
        (temp, ctx)
    }

    fn write(path: &Path, contents: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_run_category_font_copies() {
        let (temp, ctx) = create_test_context();
        write(&temp.path().join("src/fonts/inter.woff2"), b"font-bytes");
        write(&temp.path().join("src/fonts/sub/mono.ttf"), b"mono");

        let written = run_category(&ctx, Category::Font).unwrap();

        assert_eq!(written.files.len(), 2);
        assert_eq!(fs::read(temp.path().join("dist/fonts/inter.woff2")).unwrap(), b"font-bytes");
        assert_eq!(fs::read(temp.path().join("dist/fonts/sub/mono.ttf")).unwrap(), b"mono");
    }

    #[test]
    fn test_run_category_missing_source_is_fatal() {
        let (_temp, ctx) = create_test_context();
        let err = run_category(&ctx, Category::Markup).unwrap_err();
        assert!(matches!(err, BuildError::SourceNotFound(_)));
    }

    #[test]
    fn test_run_category_empty_source_folder() {
        let (temp, ctx) = create_test_context();
        fs::create_dir_all(temp.path().join("src/html")).unwrap();

        let written = run_category(&ctx, Category::Markup).unwrap();

        assert!(written.files.is_empty());
        assert!(temp.path().join("dist/html").is_dir());
    }

    #[test]
    fn test_run_category_destination_not_writable() {
        let (temp, ctx) = create_test_context();
        write(&temp.path().join("src/fonts/a.woff"), b"a");
        // A file where the destination root should be.
        write(&temp.path().join("dist"), b"not a directory");

        let err = run_category(&ctx, Category::Font).unwrap_err();
        assert!(matches!(err, BuildError::DestinationNotWritable { .. }));
    }

    #[test]
    fn test_run_category_stage_error_writes_nothing() {
        let (temp, ctx) = create_test_context();
        write(&temp.path().join("src/scss/app.scss"), b".a { color: $nope; }");

        let err = run_category(&ctx, Category::Style).unwrap_err();

        assert!(matches!(err, BuildError::Stage(_)));
        assert!(err.file().unwrap().ends_with("app.scss"));
        assert!(!temp.path().join("dist/css").exists());
    }

    #[test]
    fn test_run_category_output_collision_is_fatal() {
        let (temp, ctx) = create_test_context();
        write(&temp.path().join("src/scss/app.scss"), b".a { color: red; }");
        write(&temp.path().join("src/scss/app.css"), b".x{color:blue}");

        let err = run_category(&ctx, Category::Style).unwrap_err();

        match &err {
            BuildError::OutputCollision { path, first, second } => {
                assert_eq!(path, Path::new("app.css"));
                let mut origins = vec![first.file_name().unwrap(), second.file_name().unwrap()];
                origins.sort();
                assert_eq!(origins, vec!["app.css", "app.scss"]);
            }
            other => panic!("expected collision, got {:?}", other),
        }
        assert!(err.file().is_some());
        assert!(!temp.path().join("dist/css").exists());
    }

    struct RecordingProgress(Mutex<Vec<ProgressEvent>>);

    impl ProgressReporter for RecordingProgress {
        fn report(&self, event: ProgressEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_build_reports_each_diagnostic_once() {
        let (temp, ctx) = create_test_context();
        write(&temp.path().join("src/scripts/app.js"), b"function broken( {\n");
        let progress = Arc::new(RecordingProgress(Mutex::new(Vec::new())));

        let result = BuildRunner::new(ctx).with_progress(progress.clone()).build(&[Category::Script]);

        assert!(result.is_success());
        let events = progress.0.lock().unwrap();
        let lint_warnings = events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Warning { message, .. } if message.contains("[lint]")))
            .count();
        assert_eq!(lint_warnings, 1);
    }

    #[test]
    fn test_build_isolates_failures() {
        let (temp, ctx) = create_test_context();
        write(&temp.path().join("src/fonts/a.woff"), b"a");

        let result = BuildRunner::new(ctx).build(&[Category::Markup, Category::Font]);

        assert_eq!(result.categories.len(), 2);
        assert!(result.get(Category::Markup).unwrap().status.is_failure());
        assert!(result.get(Category::Font).unwrap().is_success());
        assert!(temp.path().join("dist/fonts/a.woff").exists());
    }

    #[test]
    fn test_build_dry_run_touches_nothing() {
        let (temp, ctx) = create_test_context();
        write(&temp.path().join("src/fonts/a.woff"), b"a");

        let result = BuildRunner::new(ctx).with_dry_run(true).build(&[Category::Font]);

        let font = result.get(Category::Font).unwrap();
        assert_eq!(font.status, BuildStatus::Skipped);
        assert_eq!(font.sources.len(), 1);
        assert!(!temp.path().join("dist").exists());
    }

    #[test]
    fn test_build_all_respects_enabled() {
        let (temp, _) = create_test_context();
        let mut config = AssetConfig::default();
        config.markup.enabled = false;
        config.style.enabled = false;
        config.script.enabled = false;
        config.image.enabled = false;
        write(&temp.path().join("src/fonts/a.woff"), b"a");
        let ctx = BuildContext::new(config, temp.path().to_path_buf());

        let result = BuildRunner::new(ctx).build_all();

        assert_eq!(result.categories.len(), 1);
        assert!(result.is_success());
    }
}
