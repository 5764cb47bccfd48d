//! Script stages backed by minify-js.

use super::{Diagnostic, MinifyTarget, StageError, Transform};
use crate::build::{AssetFile, Fileset};
use minify_js::{minify, Session, TopLevelMode};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

/// Why a script could not be minified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// The parser rejected the source
    #[error("{0}")]
    Syntax(String),
    /// The source uses syntax the parser does not know
    #[error("uses {0}, which the minifier does not support")]
    Unsupported(&'static str),
    /// The minifier panicked
    #[error("minifier crashed: {0}")]
    Crashed(String),
}

/// Minify a script.
///
/// Sources with `import` or `export` statements are parsed as ES modules,
/// everything else as a classic script.
pub fn minify_script(source: &[u8]) -> Result<Vec<u8>, ScriptError> {
    if uses_for_await(source) {
        return Err(ScriptError::Unsupported("`for await`"));
    }
    let mode = if is_module(source) { TopLevelMode::Module } else { TopLevelMode::Global };
    let session = Session::new();
    let mut out = Vec::new();
    guarded(|| minify(&session, mode, source, &mut out).map_err(|e| format!("{:?}", e)))?;
    Ok(out)
}

/// Run the minifier, turning a panic into [`ScriptError::Crashed`].
fn guarded<F>(run: F) -> Result<(), ScriptError>
where
    F: FnOnce() -> Result<(), String>,
{
    match panic::catch_unwind(AssertUnwindSafe(run)) {
        Ok(result) => result.map_err(ScriptError::Syntax),
        Err(payload) => Err(ScriptError::Crashed(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Whether a line starts with an `import` or `export` statement.
///
/// `import(...)` is a dynamic import and valid in classic scripts.
fn is_module(source: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(source) else {
        return false;
    };
    text.lines().map(str::trim_start).any(|line| {
        ["import", "export"].iter().any(|keyword| {
            line.strip_prefix(keyword)
                .and_then(|rest| rest.chars().next())
                .map(|c| c.is_whitespace() || matches!(c, '{' | '*' | '"' | '\'' | '.'))
                .unwrap_or(false)
        })
    })
}

fn uses_for_await(source: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(source) else {
        return false;
    };
    text.match_indices("for").any(|(at, _)| {
        let word_start = !matches!(
            text[..at].chars().next_back(),
            Some(c) if c.is_alphanumeric() || c == '_' || c == '$'
        );
        let rest = &text[at + 3..];
        word_start && rest.starts_with(char::is_whitespace) && rest.trim_start().starts_with("await")
    })
}

fn is_script(file: &AssetFile) -> bool {
    file.extension().as_deref() == Some("js")
}

/// Syntax check. Findings are diagnostics; contents pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct ScriptLint {
    strict: bool,
}

impl ScriptLint {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }
}

impl Transform for ScriptLint {
    fn name(&self) -> &'static str {
        "lint"
    }

    fn apply(&self, files: Fileset, diagnostics: &mut Vec<Diagnostic>) -> Result<Fileset, StageError> {
        for file in files.iter().filter(|f| is_script(f)) {
            match minify_script(&file.contents) {
                Ok(_) => {}
                Err(ScriptError::Unsupported(what)) => {
                    tracing::debug!(file = %file.path.display(), "not checked: uses {}", what);
                }
                Err(ScriptError::Syntax(message)) if self.strict => {
                    return Err(Diagnostic::new(self.name(), &file.path, message).into_error());
                }
                Err(e) => diagnostics.push(Diagnostic::new(self.name(), &file.path, e.to_string())),
            }
        }
        Ok(files)
    }
}

/// Minifies scripts. Files that do not parse are kept as they are.
#[derive(Debug, Clone)]
pub struct ScriptMinify {
    target: MinifyTarget,
}

impl ScriptMinify {
    pub fn new(target: MinifyTarget) -> Self {
        Self { target }
    }
}

impl Transform for ScriptMinify {
    fn name(&self) -> &'static str {
        "minify"
    }

    fn apply(&self, files: Fileset, diagnostics: &mut Vec<Diagnostic>) -> Result<Fileset, StageError> {
        self.target.run(files, "js", |file| match minify_script(&file.contents) {
            Ok(contents) => Ok(Some(AssetFile { contents, ..file.clone() })),
            Err(e) => {
                let message = format!("left unminified: {}", e);
                diagnostics.push(Diagnostic::new(self.name(), &file.path, message));
                Ok(None)
            }
        })
    }
}
