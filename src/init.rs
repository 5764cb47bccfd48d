//! Project initialization for assetpipe
//!
//! Writes a starter `assetpipe.toml`, the conventional source folders and a
//! few example sources so that `assetpipe build` works right away.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::CONFIG_FILENAME;

/// Error during project initialization
#[derive(Debug, Error)]
pub enum InitError {
    /// assetpipe.toml is already there and `force` was not given
    #[error("{} already exists (use --force to overwrite)", .0.display())]
    ConfigExists(std::path::PathBuf),
    /// Failed to create directory
    #[error("Failed to create directory: {0}")]
    CreateDir(std::io::Error),
    /// Failed to write file
    #[error("Failed to write file: {0}")]
    WriteFile(std::io::Error),
}

/// Initialize a project in `path`.
///
/// The config is only overwritten with `force`. Example sources are written
/// only where no file exists yet.
///
/// # Example
/// ```ignore
/// init_project(Path::new("my-site"), "my-site", false)?;
/// ```
pub fn init_project(path: &Path, name: &str, force: bool) -> Result<(), InitError> {
    let config_path = path.join(CONFIG_FILENAME);
    if config_path.exists() && !force {
        return Err(InitError::ConfigExists(config_path));
    }

    create_dir(path)?;
    write_file(&config_path, &generate_config(name))?;

    for folder in ["src/html", "src/scss", "src/scripts", "src/images", "src/fonts"] {
        create_dir(&path.join(folder))?;
    }

    write_new(&path.join(".gitignore"), GITIGNORE)?;
    write_new(&path.join("src/html/index.html"), &generate_index(name))?;
    write_new(&path.join("src/scss/_vars.scss"), VARS_SCSS)?;
    write_new(&path.join("src/scss/app.scss"), APP_SCSS)?;
    write_new(&path.join("src/scripts/app.js"), APP_JS)?;
    Ok(())
}

/// Create a directory and all parent directories.
fn create_dir(path: &Path) -> Result<(), InitError> {
    fs::create_dir_all(path).map_err(InitError::CreateDir)
}

/// Write content to a file.
fn write_file(path: &Path, content: &str) -> Result<(), InitError> {
    fs::write(path, content).map_err(InitError::WriteFile)
}

/// Write content unless the file already exists.
fn write_new(path: &Path, content: &str) -> Result<(), InitError> {
    if path.exists() {
        return Ok(());
    }
    write_file(path, content)
}

/// Generate the starter assetpipe.toml.
fn generate_config(name: &str) -> String {
    format!(
        r#"[project]
name = "{}"
src = "src"
out = "dist"

[markup]
src = {{ folder = "html", extensions = ["*.html", "*.htm"] }}
dest = {{ folder = "html", extensions = ["*.html", "*.htm"] }}

[markup.minify]
enabled = false

[style]
src = {{ folder = "scss", extensions = ["*.scss", "*.sass", "*.css"] }}
dest = {{ folder = "css", extensions = ["*.css", "*.map"] }}

[style.autoprefix]
browsers = ["last 2 versions", "> 1%"]

[style.minify]
keep_original = true
suffix = ".min"

[script]
src = {{ folder = "scripts", extensions = ["*.js"] }}
dest = {{ folder = "js", extensions = ["*.js"] }}

[image]
src = {{ folder = "images", extensions = ["*.*", "!*.svg"] }}
dest = {{ folder = "images", extensions = ["*.*", "!*.svg"] }}

[font]
src = {{ folder = "fonts", extensions = ["*.*"] }}
dest = {{ folder = "fonts", extensions = ["*.*"] }}

[watch]
debounce_ms = 100

[serve]
port = 3000
live_reload = true
"#,
        name
    )
}

fn generate_index(name: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>{name}</title>
    <link rel="stylesheet" href="/css/app.css">
  </head>
  <body>
    <h1>{name}</h1>
    <script src="/js/app.js"></script>
  </body>
</html>
"#
    )
}

const GITIGNORE: &str = r#"# assetpipe output
dist/

# OS files
.DS_Store
Thumbs.db
"#;

const VARS_SCSS: &str = r#"$primary: #4a90d9;
$text: #222;
"#;

const APP_SCSS: &str = r#"@import "vars";

body {
  color: $text;
  display: flex;
}

h1 {
  color: $primary;
}
"#;

const APP_JS: &str = r#"document.addEventListener("DOMContentLoaded", function () {
  var heading = document.querySelector("h1");
  if (heading) {
    heading.title = "Built with assetpipe";
  }
});
"#;
