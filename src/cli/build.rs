//! Build command implementations (category tasks, build, clean, init)

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use super::{GlobalArgs, EXIT_ERROR, EXIT_SUCCESS};
use crate::build::progress::ConsoleProgress;
use crate::build::{clean_category, BuildContext, BuildResult, BuildRunner, Category};
use crate::config::loader::CliOverrides;

/// Run one or more categories regardless of their `enabled` flag.
pub(crate) fn run_task(global: &GlobalArgs, categories: &[Category], dry_run: bool) -> ExitCode {
    let context = match global.context(CliOverrides::default()) {
        Ok(context) => context,
        Err(code) => return code,
    };
    let result = runner(context, global.verbose, dry_run).build(categories);
    report(&result, dry_run)
}

/// Run every enabled category
pub(crate) fn run_build(global: &GlobalArgs, dry_run: bool) -> ExitCode {
    let context = match global.context(CliOverrides::default()) {
        Ok(context) => context,
        Err(code) => return code,
    };
    if dry_run {
        println!("Dry run - would build:");
        println!("  Source: {}", context.src_dir().display());
        println!("  Output: {}", context.out_dir().display());
    }
    let result = runner(context, global.verbose, dry_run).build_all();
    report(&result, dry_run)
}

fn runner(context: BuildContext, verbose: bool, dry_run: bool) -> BuildRunner {
    BuildRunner::new(context)
        .with_dry_run(dry_run)
        .with_progress(Arc::new(ConsoleProgress::new().with_verbose(verbose)))
}

fn report(result: &BuildResult, dry_run: bool) -> ExitCode {
    if dry_run {
        for category in &result.categories {
            println!("  {}: {} source(s)", category.category, category.sources.len());
            for source in &category.sources {
                println!("    - {}", source.display());
            }
        }
    }

    if result.is_success() {
        println!("{}", result.summary());
        ExitCode::from(EXIT_SUCCESS)
    } else {
        eprintln!("{}", result.summary());
        ExitCode::from(EXIT_ERROR)
    }
}

/// Run the clean command
pub(crate) fn run_clean(global: &GlobalArgs, category: Option<Category>) -> ExitCode {
    let context = match global.context(CliOverrides::default()) {
        Ok(context) => context,
        Err(code) => return code,
    };
    let categories: Vec<Category> = match category {
        Some(category) => vec![category],
        None => Category::ALL.to_vec(),
    };

    let mut failed = false;
    for category in categories {
        match clean_category(&context, category) {
            Ok(deleted) => {
                println!("Cleaned {}: {} file(s) removed", category, deleted.len());
                if global.verbose {
                    for path in deleted {
                        println!("  - {}", path.display());
                    }
                }
            }
            Err(e) => {
                eprintln!("Error cleaning {}: {}", category, e);
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}

/// Run the init command
pub(crate) fn run_init(path: Option<&Path>, force: bool) -> ExitCode {
    use crate::init::{init_project, InitError};

    let project_path = match path {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    let project_name = project_path
        .canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(&project_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "site".to_string());

    match init_project(&project_path, &project_name, force) {
        Ok(()) => {
            println!("Created assetpipe project '{}' at {}", project_name, project_path.display());
            println!();
            println!("Project structure:");
            println!("  {}/", project_path.display());
            println!("  ├── assetpipe.toml");
            println!("  ├── .gitignore");
            println!("  └── src/");
            println!("      ├── html/index.html");
            println!("      ├── scss/app.scss, _vars.scss");
            println!("      ├── scripts/app.js");
            println!("      ├── images/");
            println!("      └── fonts/");
            println!();
            println!("Next steps:");
            println!("  cd {}", project_path.display());
            println!("  assetpipe serve");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(InitError::ConfigExists(config)) => {
            eprintln!("Error: {} already exists", config.display());
            eprintln!("Use --force to overwrite it");
            ExitCode::from(EXIT_ERROR)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
