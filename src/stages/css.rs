//! Stylesheet stages backed by lightningcss.
//!
//! Every stage here re-prints the stylesheet. When source map tracking is on,
//! the map of each print is composed onto the map carried by the file, so the
//! final map always points at the content the tracking started from.

use super::{Diagnostic, MinifyTarget, StageError, Transform};
use crate::build::{AssetFile, Fileset, MapState};
use lightningcss::error::ErrorLocation;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Resolve browserslist queries into printer targets.
fn resolve_targets(stage: &'static str, queries: &[String]) -> Result<Targets, StageError> {
    if queries.is_empty() {
        return Ok(Targets::default());
    }
    let browsers = Browsers::from_browserslist(queries.iter().map(String::as_str))
        .map_err(|e| StageError::new(stage, "", format!("invalid browser query: {}", e)))?;
    Ok(Targets { browsers, ..Targets::default() })
}

#[derive(Clone, Copy)]
struct PrintMode {
    /// Run lightningcss's rule-level minifier (adds prefixes for targets)
    transform: bool,
    /// Print without whitespace
    compact: bool,
    targets: Targets,
}

fn css_error<'a>(stage: &'static str, path: &'a Path) -> impl Fn(String) -> StageError + 'a {
    move |message| StageError::new(stage, path, message)
}

/// Parse, optionally transform, and print one stylesheet.
fn reprint(stage: &'static str, file: &AssetFile, mode: PrintMode) -> Result<AssetFile, StageError> {
    let fail = css_error(stage, &file.path);
    let code = file.text().map_err(&fail)?;
    let filename = file.path.to_string_lossy().replace('\\', "/");

    let mut sheet =
        StyleSheet::parse(code, ParserOptions { filename: filename.clone(), ..ParserOptions::default() })
            .map_err(|e| fail(e.to_string()))?;

    if mode.transform {
        sheet
            .minify(MinifyOptions { targets: mode.targets, ..MinifyOptions::default() })
            .map_err(|e| fail(e.to_string()))?;
    }

    let mut map = match file.map {
        MapState::Tracking(_) => {
            let mut sm = SourceMap::new("/");
            let index = sm.add_source(&filename);
            sm.set_source_content(index as usize, code).map_err(|e| fail(e.to_string()))?;
            Some(sm)
        }
        MapState::Off => None,
    };

    let printed = sheet
        .to_css(PrinterOptions {
            minify: mode.compact,
            targets: mode.targets,
            source_map: map.as_mut(),
            ..PrinterOptions::default()
        })
        .map_err(|e| fail(e.to_string()))?;

    let map = match (map, &file.map) {
        (Some(mut sm), MapState::Tracking(previous)) => {
            if let Some(previous) = previous {
                let mut previous = SourceMap::from_json("/", previous).map_err(|e| fail(e.to_string()))?;
                sm.extends(&mut previous).map_err(|e| fail(e.to_string()))?;
            }
            MapState::Tracking(Some(sm.to_json(None).map_err(|e| fail(e.to_string()))?))
        }
        _ => file.map.clone(),
    };

    Ok(AssetFile {
        path: file.path.clone(),
        origin: file.origin.clone(),
        contents: printed.code.into_bytes(),
        map,
    })
}

/// Reprint every `.css` file in the set.
fn reprint_all(stage: &'static str, files: Fileset, mode: PrintMode) -> Result<Fileset, StageError> {
    files
        .into_iter()
        .map(|file| if file.extension().as_deref() == Some("css") { reprint(stage, &file, mode) } else { Ok(file) })
        .collect()
}

/// Adds vendor prefixes required by the configured browsers.
#[derive(Debug, Clone)]
pub struct Autoprefix {
    browsers: Vec<String>,
}

impl Autoprefix {
    pub fn new(browsers: Vec<String>) -> Self {
        Self { browsers }
    }
}

impl Transform for Autoprefix {
    fn name(&self) -> &'static str {
        "autoprefix"
    }

    fn apply(&self, files: Fileset, _diagnostics: &mut Vec<Diagnostic>) -> Result<Fileset, StageError> {
        let targets = resolve_targets(self.name(), &self.browsers)?;
        reprint_all(self.name(), files, PrintMode { transform: true, compact: false, targets })
    }
}

/// Normalizes formatting: one declaration per line, consistent spacing.
#[derive(Debug, Clone, Default)]
pub struct Comb;

impl Transform for Comb {
    fn name(&self) -> &'static str {
        "comb"
    }

    fn apply(&self, files: Fileset, _diagnostics: &mut Vec<Diagnostic>) -> Result<Fileset, StageError> {
        reprint_all(self.name(), files, PrintMode { transform: false, compact: false, targets: Targets::default() })
    }
}

/// Reports invalid rules and declarations. Contents pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct StyleLint {
    strict: bool,
}

impl StyleLint {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }
}

fn located(stage: &'static str, path: &Path, message: String, loc: Option<&ErrorLocation>) -> Diagnostic {
    let diag = Diagnostic::new(stage, path, message);
    match loc {
        Some(loc) => diag.at(loc.line + 1, loc.column),
        None => diag,
    }
}

/// Lint a single stylesheet.
pub fn lint_stylesheet(stage: &'static str, file: &AssetFile) -> Result<Vec<Diagnostic>, StageError> {
    let code = file.text().map_err(css_error(stage, &file.path))?;
    let warnings = Arc::new(RwLock::new(Vec::new()));
    let options = ParserOptions {
        filename: file.path.to_string_lossy().into_owned(),
        error_recovery: true,
        warnings: Some(Arc::clone(&warnings)),
        ..ParserOptions::default()
    };

    let mut found = Vec::new();
    if let Err(e) = StyleSheet::parse(code, options) {
        found.push(located(stage, &file.path, e.kind.to_string(), e.loc.as_ref()));
    }

    let list = warnings.read().unwrap_or_else(|poisoned| poisoned.into_inner());
    for warning in list.iter() {
        found.push(located(stage, &file.path, warning.kind.to_string(), warning.loc.as_ref()));
    }
    Ok(found)
}

impl Transform for StyleLint {
    fn name(&self) -> &'static str {
        "lint"
    }

    fn apply(&self, files: Fileset, diagnostics: &mut Vec<Diagnostic>) -> Result<Fileset, StageError> {
        for file in files.iter().filter(|f| f.extension().as_deref() == Some("css")) {
            let mut found = lint_stylesheet(self.name(), file)?;
            if self.strict && !found.is_empty() {
                return Err(found.swap_remove(0).into_error());
            }
            diagnostics.append(&mut found);
        }
        Ok(files)
    }
}

/// Minifies stylesheets, optionally keeping the readable file.
#[derive(Debug, Clone)]
pub struct StyleMinify {
    target: MinifyTarget,
    browsers: Vec<String>,
}

impl StyleMinify {
    /// `browsers` keeps prefixes added for those targets; empty means no targets.
    pub fn new(target: MinifyTarget, browsers: Vec<String>) -> Self {
        Self { target, browsers }
    }
}

impl Transform for StyleMinify {
    fn name(&self) -> &'static str {
        "minify"
    }

    fn apply(&self, files: Fileset, _diagnostics: &mut Vec<Diagnostic>) -> Result<Fileset, StageError> {
        let targets = resolve_targets(self.name(), &self.browsers)?;
        let mode = PrintMode { transform: true, compact: true, targets };
        self.target.run(files, "css", |file| reprint(self.name(), file, mode).map(Some))
    }
}
