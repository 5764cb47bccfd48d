//! Development server with live reload.
//!
//! `serve` runs the aggregate build, serves the destination root over HTTP,
//! re-runs categories whose sources change and tells connected browsers to
//! refresh.

pub mod reload;
pub mod server;

pub use reload::{inject_client, ReloadHub, ReloadMessage, CLIENT_SCRIPT};
pub use server::{router, serve, serve_with_ready_notifier, ServeError, ServeOptions};
