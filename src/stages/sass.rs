//! Sass/SCSS compilation via grass.

use super::{Diagnostic, StageError, Transform};
use crate::build::{AssetFile, Fileset};
use crate::config::OutputStyle;
use std::path::PathBuf;

/// Compiles `.scss`, `.sass` and `.css` sources to CSS.
///
/// Partials (file name starting with `_`) are only reachable through
/// imports and are dropped from the set. Sources are compiled from their
/// origin on disk so relative imports resolve next to them.
#[derive(Debug, Clone)]
pub struct Compile {
    include_paths: Vec<PathBuf>,
    style: OutputStyle,
}

impl Compile {
    /// `include_paths` must already be absolute.
    pub fn new(include_paths: Vec<PathBuf>, style: OutputStyle) -> Self {
        Self { include_paths, style }
    }

    fn compile(&self, file: &AssetFile) -> Result<AssetFile, StageError> {
        let style = match self.style {
            OutputStyle::Expanded => grass::OutputStyle::Expanded,
            OutputStyle::Compressed => grass::OutputStyle::Compressed,
        };
        let mut options = grass::Options::default().style(style);
        if let Some(dir) = file.origin.parent() {
            options = options.load_path(dir);
        }
        for path in &self.include_paths {
            options = options.load_path(path);
        }

        let css = grass::from_path(&file.origin, &options)
            .map_err(|e| StageError::new(self.name(), &file.origin, e.to_string()))?;

        Ok(AssetFile {
            path: file.path.with_extension("css"),
            origin: file.origin.clone(),
            contents: css.into_bytes(),
            map: file.map.clone(),
        })
    }
}

fn is_stylesheet(file: &AssetFile) -> bool {
    matches!(file.extension().as_deref(), Some("scss" | "sass" | "css"))
}

impl Transform for Compile {
    fn name(&self) -> &'static str {
        "compile"
    }

    fn apply(&self, files: Fileset, _diagnostics: &mut Vec<Diagnostic>) -> Result<Fileset, StageError> {
        let mut out = Vec::with_capacity(files.len());
        for file in files {
            if !is_stylesheet(&file) {
                out.push(file);
            } else if !file.file_name().starts_with('_') {
                out.push(self.compile(&file)?);
            }
        }
        Ok(Fileset::new(out))
    }
}
