//! In-flight files flowing between pipeline stages.

use std::path::{Path, PathBuf};

/// Source map tracking state of a file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MapState {
    /// No source map requested
    #[default]
    Off,
    /// Tracking started; holds the map JSON once a stage has produced one
    Tracking(Option<String>),
}

/// A single file in a fileset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    /// Path relative to the category's destination folder
    pub path: PathBuf,
    /// Absolute path of the source file this came from
    pub origin: PathBuf,
    /// Current contents
    pub contents: Vec<u8>,
    /// Source map tracking
    pub map: MapState,
}

impl AssetFile {
    /// Create a file with no source map tracking.
    pub fn new(path: impl Into<PathBuf>, origin: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        Self { path: path.into(), origin: origin.into(), contents, map: MapState::Off }
    }

    /// Contents as UTF-8 text.
    pub fn text(&self) -> Result<&str, String> {
        std::str::from_utf8(&self.contents)
            .map_err(|e| format!("{} is not valid UTF-8: {}", self.path.display(), e))
    }

    /// File name as a string, empty if the path has none.
    pub fn file_name(&self) -> String {
        self.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    }

    /// Lower-cased extension without the dot.
    pub fn extension(&self) -> Option<String> {
        self.path.extension().map(|e| e.to_string_lossy().to_lowercase())
    }
}

/// Insert `prefix` before and `suffix` after the file stem, keeping the extension.
///
/// `css/app.css` with suffix `.min` becomes `css/app.min.css`.
pub fn decorate_stem(path: &Path, prefix: &str, suffix: &str) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}{}{}.{}", prefix, stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}{}", prefix, stem, suffix),
    };
    path.with_file_name(name)
}

/// Ordered collection of in-flight files.
///
/// Files are kept sorted by destination path so every stage sees them in
/// the same order on every run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fileset {
    files: Vec<AssetFile>,
}

impl Fileset {
    /// Create a fileset from files, sorting them by path.
    pub fn new(mut files: Vec<AssetFile>) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Self { files }
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over files in path order.
    pub fn iter(&self) -> impl Iterator<Item = &AssetFile> {
        self.files.iter()
    }

    /// Find a file by destination-relative path.
    pub fn get(&self, path: &Path) -> Option<&AssetFile> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Destination-relative paths in order.
    pub fn paths(&self) -> Vec<&Path> {
        self.files.iter().map(|f| f.path.as_path()).collect()
    }
}

impl FromIterator<AssetFile> for Fileset {
    fn from_iter<I: IntoIterator<Item = AssetFile>>(iter: I) -> Self {
        Fileset::new(iter.into_iter().collect())
    }
}

impl IntoIterator for Fileset {
    type Item = AssetFile;
    type IntoIter = std::vec::IntoIter<AssetFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}
