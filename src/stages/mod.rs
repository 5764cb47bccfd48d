//! Pipeline stages.
//!
//! Each stage wraps an external tool (style compiler, CSS processor, JS
//! minifier, HTML minifier, image encoder) and transforms a whole
//! [`Fileset`]. Recoverable findings are pushed as [`Diagnostic`]s; a
//! [`StageError`] aborts the category run.

pub mod css;
pub mod html;
pub mod image;
pub mod js;
pub mod rename;
pub mod sass;
pub mod sourcemap;

use crate::build::{decorate_stem, AssetFile, Fileset};
use std::path::PathBuf;
use thiserror::Error;

/// A named transformation over a fileset.
pub trait Transform: Send + Sync {
    /// Stage name as shown in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Transform the fileset.
    fn apply(&self, files: Fileset, diagnostics: &mut Vec<Diagnostic>) -> Result<Fileset, StageError>;
}

/// Fatal stage failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage}: {}: {message}", file.display())]
pub struct StageError {
    /// Stage that failed
    pub stage: &'static str,
    /// File being processed
    pub file: PathBuf,
    /// Error message from the wrapped tool
    pub message: String,
}

impl StageError {
    pub fn new(stage: &'static str, file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self { stage, file: file.into(), message: message.into() }
    }
}

/// Recoverable finding reported by a stage (lint warnings and the like).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Stage that reported it
    pub stage: &'static str,
    /// File the finding is about
    pub file: PathBuf,
    /// Line number (1-indexed, None if unknown)
    pub line: Option<u32>,
    /// Column number (1-indexed, None if unknown)
    pub column: Option<u32>,
    /// Message
    pub message: String,
}

impl Diagnostic {
    pub fn new(stage: &'static str, file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self { stage, file: file.into(), line: None, column: None, message: message.into() }
    }

    /// Attach a location.
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Escalate into a fatal error (strict mode).
    pub fn into_error(self) -> StageError {
        let message = match (self.line, self.column) {
            (Some(line), Some(col)) => format!("{}:{}: {}", line, col, self.message),
            _ => self.message,
        };
        StageError::new(self.stage, self.file, message)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
            if let Some(col) = self.column {
                write!(f, ":{}", col)?;
            }
        }
        write!(f, ": [{}] {}", self.stage, self.message)
    }
}

/// Settings shared by the style and script minifiers.
#[derive(Debug, Clone)]
pub struct MinifyTarget {
    /// Keep the unminified file next to the minified companion
    pub keep_original: bool,
    /// Stem suffix of the companion
    pub suffix: String,
}

impl MinifyTarget {
    /// Apply `minify` to every file whose extension is `ext`.
    ///
    /// With `keep_original`, each such file stays and a companion named with
    /// the suffix is added; files already carrying the suffix are left alone.
    pub(crate) fn run<F>(&self, files: Fileset, ext: &str, mut minify: F) -> Result<Fileset, StageError>
    where
        F: FnMut(&AssetFile) -> Result<Option<AssetFile>, StageError>,
    {
        let mut out = Vec::with_capacity(files.len());
        for file in files {
            if file.extension().as_deref() != Some(ext) || self.is_minified_name(&file) {
                out.push(file);
                continue;
            }

            let Some(mut minified) = minify(&file)? else {
                out.push(file);
                continue;
            };
            if self.keep_original {
                minified.path = decorate_stem(&file.path, "", &self.suffix);
                out.push(file);
            }
            out.push(minified);
        }
        Ok(Fileset::new(out))
    }

    fn is_minified_name(&self, file: &AssetFile) -> bool {
        self.keep_original
            && file
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().ends_with(self.suffix.as_str()))
                .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn upper(file: &AssetFile) -> Result<Option<AssetFile>, StageError> {
        let mut copy = file.clone();
        copy.contents = file.contents.to_ascii_uppercase();
        Ok(Some(copy))
    }

    #[test]
    fn test_minify_target_keeps_original() {
        let files = Fileset::new(vec![AssetFile::new("app.js", "/src/app.js", b"a".to_vec())]);
        let target = MinifyTarget { keep_original: true, suffix: ".min".to_string() };

        let out = target.run(files, "js", upper).unwrap();

        assert_eq!(out.paths(), vec![Path::new("app.js"), Path::new("app.min.js")]);
        assert_eq!(out.get(Path::new("app.js")).unwrap().contents, b"a");
        assert_eq!(out.get(Path::new("app.min.js")).unwrap().contents, b"A");
    }

    #[test]
    fn test_minify_target_in_place() {
        let files = Fileset::new(vec![AssetFile::new("app.js", "/src/app.js", b"a".to_vec())]);
        let target = MinifyTarget { keep_original: false, suffix: ".min".to_string() };

        let out = target.run(files, "js", upper).unwrap();

        assert_eq!(out.paths(), vec![Path::new("app.js")]);
        assert_eq!(out.get(Path::new("app.js")).unwrap().contents, b"A");
    }

    #[test]
    fn test_minify_target_skips_already_minified_and_other_types() {
        let files = Fileset::new(vec![
            AssetFile::new("vendor.min.js", "/src/vendor.min.js", b"v".to_vec()),
            AssetFile::new("data.json", "/src/data.json", b"{}".to_vec()),
        ]);
        let target = MinifyTarget { keep_original: true, suffix: ".min".to_string() };

        let out = target.run(files, "js", upper).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out.get(Path::new("vendor.min.js")).unwrap().contents, b"v");
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::new("lint", "css/app.css", "Unexpected token").at(3, 7);
        assert_eq!(diag.to_string(), "css/app.css:3:7: [lint] Unexpected token");
    }

    #[test]
    fn test_diagnostic_into_error() {
        let err = Diagnostic::new("lint", "app.js", "bad").at(1, 2).into_error();
        assert_eq!(err.stage, "lint");
        assert_eq!(err.message, "1:2: bad");
    }
}
