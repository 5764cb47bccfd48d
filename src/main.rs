//! assetpipe - command-line front-end asset pipeline runner

use std::process::ExitCode;

use assetpipe::cli;

fn main() -> ExitCode {
    cli::run()
}
