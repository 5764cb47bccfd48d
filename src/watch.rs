//! Watch mode for automatic category re-runs on file changes
//!
//! A debounced watcher over the source root maps every changed path to the
//! categories it belongs to and sends a [`ChangeEvent`] down a channel. A
//! single [`Scheduler`] drains that channel and re-runs each affected category
//! once per batch, one run at a time.

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind, Debouncer};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::build::progress::format_duration;
use crate::build::{categories_for_path, run_category, BuildContext, BuildError, Category, WrittenFileSet};
use crate::serve::reload::{ReloadHub, ReloadMessage};

/// Error during watch mode
#[derive(Debug, Error)]
pub enum WatchError {
    /// Failed to initialize file watcher
    #[error("Failed to initialize file watcher: {0}")]
    WatcherInit(notify::Error),
    /// Failed to add watch path
    #[error("Failed to watch path: {0}")]
    WatchPath(notify::Error),
    /// Source directory not found
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),
}

/// A changed source file and the categories it feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub categories: Vec<Category>,
}

/// Handle keeping the watcher alive; dropping it stops watching.
pub type WatchHandle = Debouncer<notify::RecommendedWatcher>;

/// Watch the source root and send a [`ChangeEvent`] for every relevant change.
///
/// Changes that no category picks up are dropped.
pub fn start_watcher(
    context: Arc<BuildContext>,
    debounce: Duration,
    tx: UnboundedSender<ChangeEvent>,
) -> Result<WatchHandle, WatchError> {
    let src_root = context.src_dir();
    if !src_root.is_dir() {
        return Err(WatchError::SourceNotFound(src_root));
    }
    // Events can arrive with the canonical form of the root.
    let canonical_root = src_root.canonicalize().ok();
    let watch_root = src_root.clone();

    let mut debouncer = new_debouncer(debounce, move |result: DebounceEventResult| match result {
        Ok(events) => {
            for event in events {
                if !matches!(event.kind, DebouncedEventKind::Any) {
                    continue;
                }
                let path = rebase(&event.path, canonical_root.as_deref(), &src_root);
                let categories = categories_for_path(&context, &path);
                if categories.is_empty() {
                    continue;
                }
                tracing::debug!(path = %path.display(), ?categories, "source changed");
                // Receiver gone means serve is shutting down.
                let _ = tx.send(ChangeEvent { path, categories });
            }
        }
        Err(error) => {
            eprintln!("[{}] Watch error: {:?}", timestamp(), error);
        }
    })
    .map_err(WatchError::WatcherInit)?;

    debouncer.watcher().watch(&watch_root, RecursiveMode::Recursive).map_err(WatchError::WatchPath)?;
    Ok(debouncer)
}

fn rebase(path: &Path, canonical_root: Option<&Path>, src_root: &Path) -> PathBuf {
    match canonical_root.and_then(|root| path.strip_prefix(root).ok()) {
        Some(rel) => src_root.join(rel),
        None => path.to_path_buf(),
    }
}

/// Tracks files with errors across runs for recovery detection
#[derive(Debug, Default)]
pub struct ErrorTracker {
    /// Files that had errors in the previous run of each category
    files_with_errors: HashMap<Category, HashSet<PathBuf>>,
}

impl ErrorTracker {
    /// Create a new error tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Update tracker with a category run, returns list of fixed files
    pub fn update(&mut self, category: Category, result: &Result<WrittenFileSet, BuildError>) -> Vec<PathBuf> {
        let current: HashSet<PathBuf> = match result {
            Ok(written) => written.diagnostics.iter().map(|d| d.file.clone()).collect(),
            Err(err) => err.file().map(Path::to_path_buf).into_iter().collect(),
        };

        let previous = self.files_with_errors.remove(&category).unwrap_or_default();
        let mut fixed: Vec<PathBuf> = previous.difference(&current).cloned().collect();
        fixed.sort();

        if !current.is_empty() {
            self.files_with_errors.insert(category, current);
        }
        fixed
    }

    /// Check if there are any tracked errors
    pub fn has_errors(&self) -> bool {
        !self.files_with_errors.is_empty()
    }

    /// Get the number of files with errors
    pub fn error_count(&self) -> usize {
        self.files_with_errors.values().map(HashSet::len).sum()
    }
}

/// Collect every category named by `first` and whatever is already queued.
pub fn collect_batch(first: ChangeEvent, rx: &mut UnboundedReceiver<ChangeEvent>) -> BTreeSet<Category> {
    let mut pending: BTreeSet<Category> = first.categories.into_iter().collect();
    while let Ok(event) = rx.try_recv() {
        pending.extend(event.categories);
    }
    pending
}

/// Single consumer of change events.
pub struct Scheduler {
    context: Arc<BuildContext>,
    reload: Option<ReloadHub>,
    clear_screen: bool,
    errors: ErrorTracker,
}

impl Scheduler {
    /// Create a scheduler; `reload` is `None` when live reload is off.
    pub fn new(context: Arc<BuildContext>, reload: Option<ReloadHub>) -> Self {
        Self { context, reload, clear_screen: false, errors: ErrorTracker::new() }
    }

    /// Clear the terminal before each batch.
    pub fn with_clear_screen(mut self, clear_screen: bool) -> Self {
        self.clear_screen = clear_screen;
        self
    }

    /// Process batches until every sender is dropped.
    pub async fn run(mut self, mut rx: UnboundedReceiver<ChangeEvent>) {
        while let Some(first) = rx.recv().await {
            let batch = collect_batch(first, &mut rx);
            self.run_batch(batch).await;
        }
    }

    async fn run_batch(&mut self, categories: BTreeSet<Category>) {
        if self.clear_screen {
            clear_screen();
        }
        for category in categories {
            println!("[{}] Building {}...", timestamp(), category);
            let context = Arc::clone(&self.context);
            let result = match tokio::task::spawn_blocking(move || run_category(&context, category)).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(category = %category, "run panicked: {}", e);
                    continue;
                }
            };

            let fixed = self.errors.update(category, &result);
            print_run_result(category, &result, &fixed);

            if let (Ok(written), Some(hub)) = (&result, &self.reload) {
                let sessions = hub.notify(ReloadMessage::for_run(written, &self.context.out_dir()));
                tracing::debug!(category = %category, sessions, "reload sent");
            }
        }
        println!("{}", self.watching_line());
    }

    fn watching_line(&self) -> String {
        let src = self.context.src_dir();
        if self.errors.has_errors() {
            let count = self.errors.error_count();
            format!(
                "[{}] Watching {} for changes ({} file{} with problems)...",
                timestamp(),
                src.display(),
                count,
                if count == 1 { "" } else { "s" }
            )
        } else {
            format!("[{}] Watching {} for changes...", timestamp(), src.display())
        }
    }
}

/// Clear the terminal screen
fn clear_screen() {
    print!("\x1B[2J\x1B[1;1H");
}

/// Get current timestamp for logging
pub(crate) fn timestamp() -> String {
    use std::time::SystemTime;
    let now = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
    let secs = now.as_secs() % 86400;
    format!("{:02}:{:02}:{:02}", (secs / 3600) % 24, (secs / 60) % 60, secs % 60)
}

/// Print a category run with fixed file notifications
fn print_run_result(category: Category, result: &Result<WrittenFileSet, BuildError>, fixed: &[PathBuf]) {
    for path in fixed {
        println!("[{}] Fixed: {}", timestamp(), path.display());
    }

    match result {
        Ok(written) => {
            println!(
                "[{}] {} complete ({}) - Files: {}",
                timestamp(),
                category,
                format_duration(written.duration.as_millis() as u64),
                written.files.len()
            );
            for diag in &written.diagnostics {
                eprintln!("[{}] Warning: {}", timestamp(), diag);
            }
        }
        Err(err) => {
            eprintln!("[{}] {} failed: {}", timestamp(), category, err);
        }
    }
}
