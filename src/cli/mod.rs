//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod build;
mod serve;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::build::{BuildContext, Category};
use crate::config::loader::{default_config, find_config, load_config, merge_cli_overrides, CliOverrides};

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// assetpipe - front-end asset pipeline runner
#[derive(Parser)]
#[command(name = "assetpipe")]
#[command(about = "Build markup, styles, scripts, images and fonts from ./src into ./dist")]
#[command(version)]
pub struct Cli {
    /// Path to assetpipe.toml (default: search upwards from the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the source root
    #[arg(long, global = true)]
    pub src: Option<PathBuf>,

    /// Override the destination root
    #[arg(long, global = true)]
    pub out: Option<PathBuf>,

    /// Show debug logging and per-category detail
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the markup pipeline
    Markup {
        /// List the sources without running any stage
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the style pipeline
    Style {
        /// List the sources without running any stage
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the script pipeline
    Script {
        /// List the sources without running any stage
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the image pipeline
    Image {
        /// List the sources without running any stage
        #[arg(long)]
        dry_run: bool,
    },
    /// Copy fonts
    Font {
        /// List the sources without running any stage
        #[arg(long)]
        dry_run: bool,
    },
    /// Run every enabled category
    Build {
        /// List the sources without running any stage
        #[arg(long)]
        dry_run: bool,
    },
    /// Build, then serve the destination root and rebuild on change
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to bind
        #[arg(long)]
        port: Option<u16>,
        /// Do not push reload signals to browsers
        #[arg(long)]
        no_reload: bool,
    },
    /// Delete generated files of one category, or of all
    Clean {
        /// Category to clean (markup, style, script, image, font)
        category: Option<Category>,
    },
    /// Create assetpipe.toml and the source folders
    Init {
        /// Project directory (default: current directory)
        path: Option<PathBuf>,
        /// Overwrite an existing assetpipe.toml
        #[arg(long)]
        force: bool,
    },
}

/// Flags shared by every command.
#[derive(Debug, Clone, Default)]
pub(crate) struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub src: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub verbose: bool,
}

impl GlobalArgs {
    /// Load the configuration and build the context.
    ///
    /// Config errors are reported and mapped to `EXIT_INVALID_ARGS`.
    pub fn context(&self, mut overrides: CliOverrides) -> Result<BuildContext, ExitCode> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let config_path = self.config.clone().or_else(find_config);

        let (mut config, project_root) = match config_path {
            Some(path) => {
                if self.verbose {
                    println!("Using config: {}", path.display());
                }
                let config = load_config(Some(&path)).map_err(|e| {
                    eprintln!("Error loading config: {}", e);
                    ExitCode::from(EXIT_INVALID_ARGS)
                })?;
                (config, root_of(&path, &cwd))
            }
            None => {
                if self.verbose {
                    println!("No assetpipe.toml found, using defaults");
                }
                (default_config(), cwd)
            }
        };

        overrides.src = self.src.clone();
        overrides.out = self.out.clone();
        merge_cli_overrides(&mut config, &overrides);

        let errors = config.validate();
        if !errors.is_empty() {
            for e in errors {
                eprintln!("Error: {}", e);
            }
            return Err(ExitCode::from(EXIT_INVALID_ARGS));
        }

        Ok(BuildContext::new(config, project_root))
    }
}

/// Directory holding the config file, made absolute.
fn root_of(config_path: &Path, cwd: &Path) -> PathBuf {
    match crate::config::loader::project_root(config_path) {
        Some(dir) if !dir.as_os_str().is_empty() => cwd.join(dir),
        _ => cwd.to_path_buf(),
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    crate::logging::init(cli.verbose);

    let global = GlobalArgs { config: cli.config, src: cli.src, out: cli.out, verbose: cli.verbose };

    match cli.command {
        Commands::Markup { dry_run } => build::run_task(&global, &[Category::Markup], dry_run),
        Commands::Style { dry_run } => build::run_task(&global, &[Category::Style], dry_run),
        Commands::Script { dry_run } => build::run_task(&global, &[Category::Script], dry_run),
        Commands::Image { dry_run } => build::run_task(&global, &[Category::Image], dry_run),
        Commands::Font { dry_run } => build::run_task(&global, &[Category::Font], dry_run),
        Commands::Build { dry_run } => build::run_build(&global, dry_run),
        Commands::Serve { host, port, no_reload } => serve::run_serve(&global, host, port, no_reload),
        Commands::Clean { category } => build::run_clean(&global, category),
        Commands::Init { path, force } => build::run_init(path.as_deref(), force),
    }
}
