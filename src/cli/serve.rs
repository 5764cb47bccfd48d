//! Serve command implementation

use std::process::ExitCode;

use super::{GlobalArgs, EXIT_ERROR, EXIT_SUCCESS};
use crate::config::loader::CliOverrides;
use crate::serve::{serve, ServeOptions};

/// Run the serve command
pub(crate) fn run_serve(global: &GlobalArgs, host: Option<String>, port: Option<u16>, no_reload: bool) -> ExitCode {
    let overrides = CliOverrides { host, port, live_reload: no_reload.then_some(false), ..Default::default() };
    let context = match global.context(overrides) {
        Ok(context) => context,
        Err(code) => return code,
    };
    let options = ServeOptions::from_config(context.config());

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    println!("Press Ctrl+C to stop");
    match runtime.block_on(serve(context, options)) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Serve error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
