//! Output file renaming.

use super::{Diagnostic, StageError, Transform};
use crate::build::{decorate_stem, AssetFile, Fileset};

/// Adds a prefix and/or suffix to every file stem.
#[derive(Debug, Clone, Default)]
pub struct Rename {
    prefix: String,
    suffix: String,
}

impl Rename {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), suffix: suffix.into() }
    }
}

impl Transform for Rename {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn apply(&self, files: Fileset, _diagnostics: &mut Vec<Diagnostic>) -> Result<Fileset, StageError> {
        Ok(files
            .into_iter()
            .map(|file| AssetFile { path: decorate_stem(&file.path, &self.prefix, &self.suffix), ..file })
            .collect())
    }
}
