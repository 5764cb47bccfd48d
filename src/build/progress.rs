//! Build progress reporting.
//!
//! Category runs report through a [`ProgressReporter`] so the same build code
//! can print to the console, stay silent in tests, or feed the dev server's
//! rebuild log.
//!
//! # Example
//!
//! ```ignore
//! use assetpipe::build::progress::{ConsoleProgress, ProgressEvent, ProgressReporter};
//!
//! let reporter = ConsoleProgress::new();
//! reporter.report(ProgressEvent::BuildStarted { total_categories: 5 });
//! reporter.report(ProgressEvent::CategoryStarted { category: Category::Style });
//! ```

use crate::build::{BuildStatus, Category};
use std::io::{IsTerminal, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Events that can be reported during a build.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Build process started
    BuildStarted {
        /// Number of categories that will run
        total_categories: usize,
    },
    /// A category run started
    CategoryStarted { category: Category },
    /// A category run completed
    CategoryCompleted {
        category: Category,
        /// Run status
        status: BuildStatus,
        /// Duration in milliseconds
        duration_ms: u64,
        /// Number of files written (or selected, for dry runs)
        files: usize,
    },
    /// Build process completed
    BuildCompleted {
        /// Whether the overall build succeeded
        success: bool,
        /// Total duration in milliseconds
        duration_ms: u64,
        /// Number of successful categories
        succeeded: usize,
        /// Number of skipped categories
        skipped: usize,
        /// Number of failed categories
        failed: usize,
    },
    /// A warning was generated
    Warning {
        /// Category that generated the warning (if applicable)
        category: Option<Category>,
        /// Warning message
        message: String,
    },
}

/// Trait for progress reporters.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event.
    fn report(&self, event: ProgressEvent);
}

/// A progress reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl NullProgress {
    /// Create a new null progress reporter.
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Console progress reporter with optional colors.
pub struct ConsoleProgress {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show verbose output
    verbose: bool,
    /// Completed category count
    current: AtomicUsize,
    /// Total category count
    total: AtomicUsize,
    /// Output writer (for testing)
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress")
            .field("use_colors", &self.use_colors)
            .field("verbose", &self.verbose)
            .field("current", &self.current)
            .field("total", &self.total)
            .finish()
    }
}

impl ConsoleProgress {
    /// Create a console progress reporter writing to stderr.
    ///
    /// Colors are enabled when stderr is a terminal.
    pub fn new() -> Self {
        Self {
            use_colors: std::io::stderr().is_terminal(),
            verbose: false,
            current: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            output: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Create a console progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self {
            use_colors: false, // Disable colors for custom output
            verbose: false,
            current: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            output: Mutex::new(Box::new(output)),
        }
    }

    /// Set whether to use colors.
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.color(text, "\x1b[32m")
    }

    fn yellow(&self, text: &str) -> String {
        self.color(text, "\x1b[33m")
    }

    fn red(&self, text: &str) -> String {
        self.color(text, "\x1b[31m")
    }

    fn cyan(&self, text: &str) -> String {
        self.color(text, "\x1b[36m")
    }

    fn bold(&self, text: &str) -> String {
        self.color(text, "\x1b[1m")
    }

    /// Write a line to output.
    fn writeln(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", line);
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::BuildStarted { total_categories } => {
                self.total.store(total_categories, Ordering::SeqCst);
                self.current.store(0, Ordering::SeqCst);
                if total_categories > 0 {
                    self.writeln(&format!(
                        "{} Running {} task{}...",
                        self.cyan("[build]"),
                        total_categories,
                        if total_categories == 1 { "" } else { "s" }
                    ));
                }
            }
            ProgressEvent::CategoryStarted { category } => {
                if self.verbose {
                    self.writeln(&format!("{} Starting '{}'...", self.cyan("[build]"), category));
                }
            }
            ProgressEvent::CategoryCompleted { category, status, duration_ms, files } => {
                let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;
                let total = self.total.load(Ordering::SeqCst).max(current);

                let status_str = match &status {
                    BuildStatus::Success => self.green("ok"),
                    BuildStatus::Skipped => self.yellow("dry-run"),
                    BuildStatus::Failed(_) => self.red("FAILED"),
                };

                self.writeln(&format!(
                    "{} [{}/{}] {} {} ({} file{}, {})",
                    self.cyan("[build]"),
                    current,
                    total,
                    status_str,
                    category,
                    files,
                    if files == 1 { "" } else { "s" },
                    format_duration(duration_ms)
                ));

                if let BuildStatus::Failed(err) = status {
                    self.writeln(&format!("        {}", self.red(&err)));
                }
            }
            ProgressEvent::BuildCompleted { success, duration_ms, succeeded, skipped, failed } => {
                let duration_str = format_duration(duration_ms);
                let total = succeeded + skipped + failed;

                if success {
                    self.writeln(&format!(
                        "\n{} {} {} finished, {} skipped in {}",
                        self.green("[done]"),
                        self.bold(&format!("{}", total)),
                        if total == 1 { "task" } else { "tasks" },
                        skipped,
                        duration_str
                    ));
                } else {
                    self.writeln(&format!(
                        "\n{} Build failed: {} succeeded, {} skipped, {} {} in {}",
                        self.red("[error]"),
                        succeeded,
                        skipped,
                        failed,
                        if failed == 1 { "failure" } else { "failures" },
                        duration_str
                    ));
                }
            }
            ProgressEvent::Warning { category, message } => {
                let prefix = category.map(|c| format!("{}: ", c)).unwrap_or_default();
                self.writeln(&format!("{} {}{}", self.yellow("[warn]"), prefix, message));
            }
        }
    }
}

/// Format a duration in milliseconds to a human-readable string.
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60_000;
        let seconds = (ms % 60_000) / 1000;
        format!("{}m {}s", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn capture() -> (ConsoleProgress, Arc<Mutex<Vec<u8>>>) {
        let output = Arc::new(Mutex::new(Vec::new()));
        let reporter = ConsoleProgress::with_output(TestWriter(Arc::clone(&output))).with_colors(false);
        (reporter, output)
    }

    fn text(output: &Arc<Mutex<Vec<u8>>>) -> String {
        String::from_utf8_lossy(&output.lock().unwrap()).into_owned()
    }

    #[test]
    fn test_null_progress() {
        let reporter = NullProgress::new();
        reporter.report(ProgressEvent::BuildStarted { total_categories: 5 });
        reporter.report(ProgressEvent::CategoryStarted { category: Category::Style });
    }

    #[test]
    fn test_console_progress_build_started() {
        let (reporter, output) = capture();
        reporter.report(ProgressEvent::BuildStarted { total_categories: 5 });
        assert!(text(&output).contains("Running 5 tasks"));
    }

    #[test]
    fn test_console_progress_category_started_only_when_verbose() {
        let (reporter, output) = capture();
        reporter.report(ProgressEvent::CategoryStarted { category: Category::Font });
        assert!(text(&output).is_empty());

        let (reporter, output) = capture();
        let reporter = reporter.with_verbose(true);
        reporter.report(ProgressEvent::CategoryStarted { category: Category::Font });
        assert!(text(&output).contains("Starting 'font'"));
    }

    #[test]
    fn test_console_progress_category_completed_success() {
        let (reporter, output) = capture();
        reporter.report(ProgressEvent::BuildStarted { total_categories: 1 });
        reporter.report(ProgressEvent::CategoryCompleted {
            category: Category::Style,
            status: BuildStatus::Success,
            duration_ms: 150,
            files: 3,
        });

        let text = text(&output);
        assert!(text.contains("[1/1] ok style (3 files, 150ms)"));
    }

    #[test]
    fn test_console_progress_category_completed_failed() {
        let (reporter, output) = capture();
        reporter.report(ProgressEvent::CategoryCompleted {
            category: Category::Script,
            status: BuildStatus::Failed("source folder not found".to_string()),
            duration_ms: 5,
            files: 0,
        });

        let text = text(&output);
        assert!(text.contains("FAILED"));
        assert!(text.contains("source folder not found"));
    }

    #[test]
    fn test_console_progress_build_completed() {
        let (reporter, output) = capture();
        reporter.report(ProgressEvent::BuildCompleted {
            success: true,
            duration_ms: 1500,
            succeeded: 5,
            skipped: 0,
            failed: 0,
        });
        assert!(text(&output).contains("[done] 5 tasks finished, 0 skipped in 1.5s"));

        let (reporter, output) = capture();
        reporter.report(ProgressEvent::BuildCompleted {
            success: false,
            duration_ms: 500,
            succeeded: 3,
            skipped: 0,
            failed: 2,
        });
        assert!(text(&output).contains("2 failures"));
    }

    #[test]
    fn test_console_progress_warning() {
        let (reporter, output) = capture();
        reporter.report(ProgressEvent::Warning {
            category: Some(Category::Script),
            message: "app.js: [lint] Unexpected token".to_string(),
        });

        let text = text(&output);
        assert!(text.contains("[warn] script: app.js: [lint] Unexpected token"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0ms");
        assert_eq!(format_duration(999), "999ms");
        assert_eq!(format_duration(1500), "1.5s");
        assert_eq!(format_duration(90000), "1m 30s");
    }

    // Helper for testing output
    struct TestWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
