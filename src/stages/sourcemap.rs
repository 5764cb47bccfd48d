//! Source map tracking for stylesheets.

use super::{Diagnostic, StageError, Transform};
use crate::build::{AssetFile, Fileset, MapState};
use crate::config::MapTarget;
use base64::Engine;
use std::path::PathBuf;

/// Starts map tracking on every file.
#[derive(Debug, Clone, Default)]
pub struct SourceMapsInit;

impl Transform for SourceMapsInit {
    fn name(&self) -> &'static str {
        "sourcemaps-init"
    }

    fn apply(&self, files: Fileset, _diagnostics: &mut Vec<Diagnostic>) -> Result<Fileset, StageError> {
        Ok(files.into_iter().map(|file| AssetFile { map: MapState::Tracking(None), ..file }).collect())
    }
}

/// Emits the tracked maps and links them from each stylesheet.
#[derive(Debug, Clone, Default)]
pub struct SourceMapsWrite {
    target: MapTarget,
}

impl SourceMapsWrite {
    pub fn new(target: MapTarget) -> Self {
        Self { target }
    }
}

/// Stamp the output file name into the map.
fn finish_map(stage: &'static str, file: &AssetFile, json: &str) -> Result<String, StageError> {
    let mut map: serde_json::Value =
        serde_json::from_str(json).map_err(|e| StageError::new(stage, &file.path, e.to_string()))?;
    if let Some(obj) = map.as_object_mut() {
        obj.insert("file".to_string(), serde_json::Value::String(file.file_name()));
    }
    serde_json::to_string(&map).map_err(|e| StageError::new(stage, &file.path, e.to_string()))
}

fn with_comment(mut contents: Vec<u8>, url: &str) -> Vec<u8> {
    if !contents.ends_with(b"\n") && !contents.is_empty() {
        contents.push(b'\n');
    }
    contents.extend_from_slice(format!("/*# sourceMappingURL={} */\n", url).as_bytes());
    contents
}

impl Transform for SourceMapsWrite {
    fn name(&self) -> &'static str {
        "sourcemaps-write"
    }

    fn apply(&self, files: Fileset, _diagnostics: &mut Vec<Diagnostic>) -> Result<Fileset, StageError> {
        let mut out = Vec::with_capacity(files.len());
        for mut file in files {
            let json = match std::mem::take(&mut file.map) {
                MapState::Tracking(Some(json)) => finish_map(self.name(), &file, &json)?,
                MapState::Tracking(None) => {
                    tracing::debug!(file = %file.path.display(), "no source map produced");
                    out.push(file);
                    continue;
                }
                MapState::Off => {
                    out.push(file);
                    continue;
                }
            };

            match self.target {
                MapTarget::External => {
                    let mut map_path = file.path.clone().into_os_string();
                    map_path.push(".map");
                    let map_path = PathBuf::from(map_path);
                    let url = map_path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

                    out.push(AssetFile::new(map_path, file.origin.clone(), json.into_bytes()));
                    out.push(AssetFile { contents: with_comment(file.contents, &url), ..file });
                }
                MapTarget::Inline => {
                    let encoded = base64::engine::general_purpose::STANDARD.encode(json);
                    let url = format!("data:application/json;charset=utf-8;base64,{}", encoded);
                    out.push(AssetFile { contents: with_comment(file.contents, &url), ..file });
                }
            }
        }
        Ok(Fileset::new(out))
    }
}
