//! Build module for assetpipe
//!
//! Runs asset categories (markup, style, script, image, font) through their
//! fixed stage pipelines and writes the results to the destination root.
//!
//! # Overview
//!
//! A category run consists of:
//! - **Clean**: delete previous outputs matching the destination patterns
//! - **Discovery**: find source files using the category's folder and patterns
//! - **Pipeline**: fold the fileset through the category's stages
//! - **Write**: write the resulting files below the destination folder
//!
//! # Example
//!
//! ```ignore
//! use assetpipe::build::{BuildContext, BuildRunner, run_category, Category};
//! use assetpipe::config::load_config;
//!
//! let config = load_config(None)?;
//! let context = BuildContext::new(config, project_root);
//!
//! let written = run_category(&context, Category::Style)?;
//! let result = BuildRunner::new(context).build_all();
//! println!("{}", result.summary());
//! ```

pub mod category;
pub mod clean;
pub mod context;
pub mod discovery;
pub mod fileset;
pub mod pipeline;
pub mod progress;
pub mod result;
pub mod runner;

pub use category::*;
pub use clean::{clean_category, CleanError};
pub use context::*;
pub use discovery::{categories_for_path, discover_category, discover_files, DiscoveryError};
pub use fileset::*;
pub use pipeline::*;
pub use result::*;
pub use runner::*;
