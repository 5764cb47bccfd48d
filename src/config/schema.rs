//! Configuration schema types for `assetpipe.toml`
//!
//! Defines the structure and validation rules for project configuration:
//! source and destination roots, one section per asset category, and the
//! watch / serve settings used by the dev server.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::build::Category;

/// Project metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    #[serde(default = "default_name")]
    pub name: String,
    /// Source root
    #[serde(default = "default_src")]
    pub src: PathBuf,
    /// Destination root
    #[serde(default = "default_out")]
    pub out: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self { name: default_name(), src: default_src(), out: default_out() }
    }
}

fn default_name() -> String {
    "site".to_string()
}

fn default_src() -> PathBuf {
    PathBuf::from("src")
}

fn default_out() -> PathBuf {
    PathBuf::from("dist")
}

fn default_true() -> bool {
    true
}

/// A folder plus the file-name patterns selected inside it.
///
/// Patterns starting with `!` exclude matching files. A spec written without
/// `extensions` gets the category's default patterns when the config file is
/// loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSpec {
    /// Folder relative to the source or destination root
    pub folder: PathBuf,
    /// File-name glob patterns, e.g. `*.scss` or `!*.svg`
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl PathSpec {
    /// Create a path spec from a folder and pattern list.
    pub fn new(folder: &str, extensions: &[&str]) -> Self {
        Self {
            folder: PathBuf::from(folder),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Positive (including) patterns.
    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str).filter(|p| !p.starts_with('!'))
    }

    /// Negated patterns with the leading `!` stripped.
    pub fn excludes(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().filter_map(|p| p.strip_prefix('!'))
    }
}

/// Output style for the style compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    /// One declaration per line
    #[default]
    Expanded,
    /// Whitespace removed
    Compressed,
}

/// Where `sourcemaps-write` puts the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MapTarget {
    /// `<file>.map` next to the output
    #[default]
    External,
    /// Base64 data URI in the trailing comment
    Inline,
}

/// Source map settings (style only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMapsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub target: MapTarget,
}

impl Default for SourceMapsConfig {
    fn default() -> Self {
        Self { enabled: true, target: MapTarget::External }
    }
}

/// Style preprocessor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Extra directories searched by `@import` / `@use`
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,
    #[serde(default)]
    pub output_style: OutputStyle,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self { enabled: true, include_paths: vec![], output_style: OutputStyle::Expanded }
    }
}

/// Vendor prefixing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoprefixConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Browserslist queries
    #[serde(default = "default_browsers")]
    pub browsers: Vec<String>,
}

fn default_browsers() -> Vec<String> {
    vec!["> 1%".to_string(), "last 2 versions".to_string()]
}

impl Default for AutoprefixConfig {
    fn default() -> Self {
        Self { enabled: true, browsers: default_browsers() }
    }
}

/// A stage with nothing to configure beyond on/off
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Lint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Treat lint findings as fatal
    #[serde(default)]
    pub strict: bool,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self { enabled: true, strict: false }
    }
}

/// Minifier settings shared by styles and scripts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinifyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Keep the unminified file and add a suffixed companion
    #[serde(default = "default_true")]
    pub keep_original: bool,
    /// Stem suffix for the minified companion
    #[serde(default = "default_min_suffix")]
    pub suffix: String,
}

fn default_min_suffix() -> String {
    ".min".to_string()
}

impl Default for MinifyConfig {
    fn default() -> Self {
        Self { enabled: true, keep_original: true, suffix: default_min_suffix() }
    }
}

/// File renaming settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RenameConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
}

/// HTML minifier settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HtmlMinifyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub keep_comments: bool,
    #[serde(default)]
    pub minify_css: bool,
    #[serde(default)]
    pub minify_js: bool,
}

/// Image optimizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Re-encode JPEGs at this quality (1-100); unset leaves JPEGs alone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jpeg_quality: Option<u8>,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self { enabled: true, jpeg_quality: None }
    }
}

/// Markup category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkupConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub clean: bool,
    #[serde(default = "default_markup_src")]
    pub src: PathSpec,
    #[serde(default = "default_markup_dest")]
    pub dest: PathSpec,
    #[serde(default)]
    pub minify: HtmlMinifyConfig,
}

fn default_markup_src() -> PathSpec {
    PathSpec::new("html", &["*.html", "*.htm"])
}

fn default_markup_dest() -> PathSpec {
    PathSpec::new("html", &["*.html", "*.htm"])
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            clean: true,
            src: default_markup_src(),
            dest: default_markup_dest(),
            minify: HtmlMinifyConfig::default(),
        }
    }
}

/// Stylesheet category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub clean: bool,
    #[serde(default = "default_style_src")]
    pub src: PathSpec,
    #[serde(default = "default_style_dest")]
    pub dest: PathSpec,
    #[serde(default)]
    pub sourcemaps: SourceMapsConfig,
    #[serde(default)]
    pub compile: CompileConfig,
    #[serde(default)]
    pub autoprefix: AutoprefixConfig,
    #[serde(default)]
    pub comb: ToggleConfig,
    #[serde(default)]
    pub lint: LintConfig,
    #[serde(default)]
    pub minify: MinifyConfig,
    #[serde(default)]
    pub rename: RenameConfig,
}

fn default_style_src() -> PathSpec {
    PathSpec::new("scss", &["*.scss", "*.sass", "*.css"])
}

fn default_style_dest() -> PathSpec {
    PathSpec::new("css", &["*.css", "*.map"])
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            clean: true,
            src: default_style_src(),
            dest: default_style_dest(),
            sourcemaps: SourceMapsConfig::default(),
            compile: CompileConfig::default(),
            autoprefix: AutoprefixConfig::default(),
            comb: ToggleConfig::default(),
            lint: LintConfig::default(),
            minify: MinifyConfig::default(),
            rename: RenameConfig::default(),
        }
    }
}

/// Script category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub clean: bool,
    #[serde(default = "default_script_src")]
    pub src: PathSpec,
    #[serde(default = "default_script_dest")]
    pub dest: PathSpec,
    #[serde(default)]
    pub lint: LintConfig,
    #[serde(default)]
    pub minify: MinifyConfig,
    #[serde(default)]
    pub rename: RenameConfig,
}

fn default_script_src() -> PathSpec {
    PathSpec::new("scripts", &["*.js"])
}

fn default_script_dest() -> PathSpec {
    PathSpec::new("js", &["*.js"])
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            clean: true,
            src: default_script_src(),
            dest: default_script_dest(),
            lint: LintConfig::default(),
            minify: MinifyConfig::default(),
            rename: RenameConfig::default(),
        }
    }
}

/// Raster image category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub clean: bool,
    #[serde(default = "default_image_src")]
    pub src: PathSpec,
    #[serde(default = "default_image_dest")]
    pub dest: PathSpec,
    #[serde(default)]
    pub optimize: OptimizeConfig,
}

fn default_image_src() -> PathSpec {
    PathSpec::new("images", &["*.*", "!*.svg"])
}

fn default_image_dest() -> PathSpec {
    PathSpec::new("images", &["*.*", "!*.svg"])
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            clean: true,
            src: default_image_src(),
            dest: default_image_dest(),
            optimize: OptimizeConfig::default(),
        }
    }
}

/// Font category (copied as-is)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub clean: bool,
    #[serde(default = "default_font_src")]
    pub src: PathSpec,
    #[serde(default = "default_font_dest")]
    pub dest: PathSpec,
}

fn default_font_src() -> PathSpec {
    PathSpec::new("fonts", &["*.*"])
}

fn default_font_dest() -> PathSpec {
    PathSpec::new("fonts", &["*.*"])
}

impl Default for FontConfig {
    fn default() -> Self {
        Self { enabled: true, clean: true, src: default_font_src(), dest: default_font_dest() }
    }
}

/// Watch mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Debounce delay in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
    /// Clear terminal between rebuilds
    #[serde(default)]
    pub clear_screen: bool,
}

fn default_debounce_ms() -> u32 {
    100
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 100, clear_screen: false }
    }
}

/// Dev server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServeConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Push reload signals to connected browsers
    #[serde(default = "default_true")]
    pub live_reload: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), live_reload: true }
    }
}

/// Complete assetpipe.toml configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AssetConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub markup: MarkupConfig,
    #[serde(default)]
    pub style: StyleConfig,
    #[serde(default)]
    pub script: ScriptConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub font: FontConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub serve: ServeConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "style.minify.suffix")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "assetpipe.toml: '{}' {}", self.field, self.message)
    }
}

impl AssetConfig {
    /// Source path spec for a category.
    pub fn src_spec(&self, category: Category) -> &PathSpec {
        match category {
            Category::Markup => &self.markup.src,
            Category::Style => &self.style.src,
            Category::Script => &self.script.src,
            Category::Image => &self.image.src,
            Category::Font => &self.font.src,
        }
    }

    /// Destination path spec for a category.
    pub fn dest_spec(&self, category: Category) -> &PathSpec {
        match category {
            Category::Markup => &self.markup.dest,
            Category::Style => &self.style.dest,
            Category::Script => &self.script.dest,
            Category::Image => &self.image.dest,
            Category::Font => &self.font.dest,
        }
    }

    fn specs_mut(&mut self, category: Category) -> (&mut PathSpec, &mut PathSpec) {
        match category {
            Category::Markup => (&mut self.markup.src, &mut self.markup.dest),
            Category::Style => (&mut self.style.src, &mut self.style.dest),
            Category::Script => (&mut self.script.src, &mut self.script.dest),
            Category::Image => (&mut self.image.src, &mut self.image.dest),
            Category::Font => (&mut self.font.src, &mut self.font.dest),
        }
    }

    /// Give path specs without patterns the category's default patterns.
    pub fn fill_default_patterns(&mut self) {
        let defaults = AssetConfig::default();
        for category in Category::ALL {
            let (src, dest) = self.specs_mut(category);
            if src.extensions.is_empty() {
                src.extensions = defaults.src_spec(category).extensions.clone();
            }
            if dest.extensions.is_empty() {
                dest.extensions = defaults.dest_spec(category).extensions.clone();
            }
        }
    }

    /// Whether the category takes part in the aggregate build.
    pub fn is_enabled(&self, category: Category) -> bool {
        match category {
            Category::Markup => self.markup.enabled,
            Category::Style => self.style.enabled,
            Category::Script => self.script.enabled,
            Category::Image => self.image.enabled,
            Category::Font => self.font.enabled,
        }
    }

    /// Whether prior outputs are deleted before the category runs.
    pub fn cleans(&self, category: Category) -> bool {
        match category {
            Category::Markup => self.markup.clean,
            Category::Style => self.style.clean,
            Category::Script => self.script.clean,
            Category::Image => self.image.clean,
            Category::Font => self.font.clean,
        }
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        for category in Category::ALL {
            for (side, spec) in [("src", self.src_spec(category)), ("dest", self.dest_spec(category))] {
                let field = format!("{}.{}.extensions", category, side);
                if spec.includes().next().is_none() {
                    errors.push(ConfigValidationError {
                        field: field.clone(),
                        message: "must contain at least one non-negated pattern".to_string(),
                    });
                }
                for pattern in &spec.extensions {
                    let bare = pattern.strip_prefix('!').unwrap_or(pattern);
                    if bare.contains('/') {
                        errors.push(ConfigValidationError {
                            field: field.clone(),
                            message: format!("'{}' must be a file-name pattern", pattern),
                        });
                    } else if let Err(e) = glob::Pattern::new(bare) {
                        errors.push(ConfigValidationError {
                            field: field.clone(),
                            message: format!("'{}' is not a valid pattern: {}", pattern, e),
                        });
                    }
                }
                if spec.folder.is_absolute() {
                    errors.push(ConfigValidationError {
                        field: format!("{}.{}.folder", category, side),
                        message: "must be relative to the project root".to_string(),
                    });
                }
            }
        }

        for (field, minify) in [("style.minify", &self.style.minify), ("script.minify", &self.script.minify)] {
            if minify.enabled && minify.keep_original && minify.suffix.is_empty() {
                errors.push(ConfigValidationError {
                    field: format!("{}.suffix", field),
                    message: "must be non-empty when keep_original is set".to_string(),
                });
            }
        }

        if self.style.autoprefix.enabled && self.style.autoprefix.browsers.is_empty() {
            errors.push(ConfigValidationError {
                field: "style.autoprefix.browsers".to_string(),
                message: "must contain at least one browserslist query".to_string(),
            });
        }

        if let Some(quality) = self.image.optimize.jpeg_quality {
            if quality == 0 || quality > 100 {
                errors.push(ConfigValidationError {
                    field: "image.optimize.jpeg_quality".to_string(),
                    message: "must be between 1 and 100".to_string(),
                });
            }
        }

        if self.serve.host.is_empty() {
            errors.push(ConfigValidationError {
                field: "serve.host".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_parse() {
        let config: AssetConfig = toml::from_str("").unwrap();
        assert_eq!(config.project.src, PathBuf::from("src"));
        assert_eq!(config.project.out, PathBuf::from("dist"));
        assert_eq!(config.style.src.folder, PathBuf::from("scss"));
        assert_eq!(config.style.dest.folder, PathBuf::from("css"));
        assert_eq!(config.script.dest.folder, PathBuf::from("js"));
        assert!(config.is_valid());
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[project]
name = "landing"
src = "assets"
out = "public"

[style]
clean = false
src = { folder = "sass", extensions = ["*.scss"] }

[style.compile]
include_paths = ["node_modules"]
output_style = "compressed"

[style.autoprefix]
browsers = ["last 1 chrome version"]

[style.sourcemaps]
target = "inline"

[style.minify]
keep_original = false

[script.lint]
strict = true

[script.rename]
enabled = true
suffix = ".bundle"

[image]
src = { folder = "img", extensions = ["*.png", "*.jpg", "!*.svg"] }

[image.optimize]
jpeg_quality = 80

[watch]
debounce_ms = 250

[serve]
port = 8080
live_reload = false
"#;
        let config: AssetConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.project.name, "landing");
        assert_eq!(config.project.src, PathBuf::from("assets"));
        assert!(!config.style.clean);
        assert_eq!(config.style.src.folder, PathBuf::from("sass"));
        assert_eq!(config.style.compile.include_paths, vec![PathBuf::from("node_modules")]);
        assert_eq!(config.style.compile.output_style, OutputStyle::Compressed);
        assert_eq!(config.style.autoprefix.browsers, vec!["last 1 chrome version"]);
        assert_eq!(config.style.sourcemaps.target, MapTarget::Inline);
        assert!(!config.style.minify.keep_original);
        assert_eq!(config.style.minify.suffix, ".min");
        assert!(config.script.lint.strict);
        assert!(config.script.rename.enabled);
        assert_eq!(config.image.optimize.jpeg_quality, Some(80));
        assert_eq!(config.watch.debounce_ms, 250);
        assert_eq!(config.serve.port, 8080);
        assert!(!config.serve.live_reload);
        assert!(config.is_valid());
    }

    #[test]
    fn test_folder_only_path_spec_gets_default_patterns() {
        let toml = r#"
[image]
src = { folder = "img" }
dest = { folder = "assets/img", extensions = ["*.png"] }
"#;
        let mut config: AssetConfig = toml::from_str(toml).unwrap();
        assert!(config.image.src.extensions.is_empty());

        config.fill_default_patterns();

        assert_eq!(config.image.src.folder, PathBuf::from("img"));
        assert_eq!(config.image.src.extensions, vec!["*.*", "!*.svg"]);
        assert_eq!(config.image.dest.extensions, vec!["*.png"]);
        assert!(config.is_valid());
    }

    #[test]
    fn test_path_spec_includes_excludes() {
        let spec = PathSpec::new("images", &["*.*", "!*.svg", "!*.psd"]);
        assert_eq!(spec.includes().collect::<Vec<_>>(), vec!["*.*"]);
        assert_eq!(spec.excludes().collect::<Vec<_>>(), vec!["*.svg", "*.psd"]);
    }

    #[test]
    fn test_validation_only_negated_patterns() {
        let toml = r#"
[font]
src = { folder = "fonts", extensions = ["!*.txt"] }
"#;
        let config: AssetConfig = toml::from_str(toml).unwrap();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "font.src.extensions"));
    }

    #[test]
    fn test_validation_path_in_pattern() {
        let toml = r#"
[script]
src = { folder = "scripts", extensions = ["vendor/*.js"] }
"#;
        let config: AssetConfig = toml::from_str(toml).unwrap();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "script.src.extensions"));
    }

    #[test]
    fn test_validation_empty_min_suffix() {
        let toml = r#"
[style.minify]
suffix = ""
"#;
        let config: AssetConfig = toml::from_str(toml).unwrap();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "style.minify.suffix"));
    }

    #[test]
    fn test_validation_jpeg_quality_range() {
        let toml = r#"
[image.optimize]
jpeg_quality = 0
"#;
        let config: AssetConfig = toml::from_str(toml).unwrap();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "image.optimize.jpeg_quality"));
    }

    #[test]
    fn test_map_target_serde() {
        let config: AssetConfig = toml::from_str("[style.sourcemaps]\ntarget = \"external\"").unwrap();
        assert_eq!(config.style.sourcemaps.target, MapTarget::External);
    }

    #[test]
    fn test_category_accessors() {
        let config = AssetConfig::default();
        for category in Category::ALL {
            assert!(config.is_enabled(category));
            assert!(config.cleans(category));
        }
        assert_eq!(config.src_spec(Category::Image).folder, PathBuf::from("images"));
        assert_eq!(config.dest_spec(Category::Font).folder, PathBuf::from("fonts"));
    }
}
