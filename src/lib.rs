//! assetpipe - front-end asset pipeline runner
//!
//! This library provides functionality to:
//! - Load a project's `assetpipe.toml`
//! - Run the markup, style, script, image and font pipelines
//! - Serve the destination root with rebuild-on-change and live reload

pub mod build;
pub mod cli;
pub mod config;
pub mod init;
pub mod logging;
pub mod serve;
pub mod stages;
pub mod watch;
