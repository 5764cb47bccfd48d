//! Configuration loading and discovery for `assetpipe.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::AssetConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Project configuration file name
pub const CONFIG_FILENAME: &str = "assetpipe.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse assetpipe.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override destination root
    pub out: Option<PathBuf>,
    /// Override source root
    pub src: Option<PathBuf>,
    /// Override dev server host
    pub host: Option<String>,
    /// Override dev server port
    pub port: Option<u16>,
    /// Override live reload
    pub live_reload: Option<bool>,
}

/// Find assetpipe.toml by walking up from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find assetpipe.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from an assetpipe.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the
/// built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<AssetConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(default_config()),
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<AssetConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let mut config: AssetConfig = toml::from_str(&contents)?;
    config.fill_default_patterns();

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Create a default configuration when no assetpipe.toml is found.
///
/// The project name is taken from the current directory name.
pub fn default_config() -> AssetConfig {
    let mut config = AssetConfig::default();
    if let Some(name) = env::current_dir().ok().and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned())) {
        config.project.name = name;
    }
    config
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut AssetConfig, overrides: &CliOverrides) {
    if let Some(ref out) = overrides.out {
        config.project.out = out.clone();
    }
    if let Some(ref src) = overrides.src {
        config.project.src = src.clone();
    }
    if let Some(ref host) = overrides.host {
        config.serve.host = host.clone();
    }
    if let Some(port) = overrides.port {
        config.serve.port = port;
    }
    if let Some(live_reload) = overrides.live_reload {
        config.serve.live_reload = live_reload;
    }
}

/// Get the project root directory from a config file path.
pub fn project_root(config_path: &Path) -> Option<&Path> {
    config_path.parent()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_in_current_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join(CONFIG_FILENAME);
        File::create(&config_path)
            .expect("should create config file")
            .write_all(b"[project]\nname = \"test\"")
            .expect("should write config content");

        let found = find_config_from(temp.path().to_path_buf());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join(CONFIG_FILENAME);
        File::create(&config_path)
            .expect("should create config file")
            .write_all(b"[project]\nname = \"test\"")
            .expect("should write config content");

        let subdir = temp.path().join("src").join("scss");
        fs::create_dir_all(&subdir).expect("should create subdirectories");

        let found = find_config_from(subdir);
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_not_found() {
        let temp = TempDir::new().expect("should create temp dir");
        let found = find_config_from(temp.path().to_path_buf());
        assert_eq!(found, None);
    }

    #[test]
    fn test_load_config_from_file() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join(CONFIG_FILENAME);
        fs::write(
            &config_path,
            r#"
[project]
name = "shop"
out = "public"

[script.minify]
enabled = false
"#,
        )
        .expect("should write config content");

        let config = load_config(Some(&config_path)).expect("should load valid config");
        assert_eq!(config.project.name, "shop");
        assert_eq!(config.project.out, PathBuf::from("public"));
        assert!(!config.script.minify.enabled);
        assert!(config.style.minify.enabled);
    }

    #[test]
    fn test_load_config_folder_only_path_spec() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        fs::write(&path, "[style]\nsrc = { folder = \"sass\" }\n").unwrap();

        let config = load_config(Some(&path)).unwrap();

        assert_eq!(config.style.src.folder, PathBuf::from("sass"));
        assert_eq!(config.style.src.extensions, vec!["*.scss", "*.sass", "*.css"]);
    }

    #[test]
    fn test_load_config_missing_file_errors() {
        let temp = TempDir::new().expect("should create temp dir");
        let result = load_config(Some(&temp.path().join("nonexistent.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join(CONFIG_FILENAME);
        fs::write(&config_path, "this is not valid toml {{{").expect("should write");

        let result = load_config(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_validation_error() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join(CONFIG_FILENAME);
        fs::write(&config_path, "[image.optimize]\njpeg_quality = 101\n").expect("should write");

        let result = load_config(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_merge_cli_overrides() {
        let mut config = default_config();
        let overrides = CliOverrides {
            out: Some(PathBuf::from("build")),
            src: Some(PathBuf::from("assets")),
            port: Some(9000),
            live_reload: Some(false),
            ..Default::default()
        };

        merge_cli_overrides(&mut config, &overrides);
        assert_eq!(config.project.out, PathBuf::from("build"));
        assert_eq!(config.project.src, PathBuf::from("assets"));
        assert_eq!(config.serve.port, 9000);
        assert_eq!(config.serve.host, "127.0.0.1");
        assert!(!config.serve.live_reload);
    }

    #[test]
    fn test_project_root() {
        let config_path = Path::new("/project/assetpipe.toml");
        assert_eq!(project_root(config_path), Some(Path::new("/project")));
    }

    #[test]
    fn test_default_config() {
        let config = default_config();
        assert!(!config.project.name.is_empty());
        assert_eq!(config.project.src, PathBuf::from("src"));
        assert_eq!(config.project.out, PathBuf::from("dist"));
    }
}
