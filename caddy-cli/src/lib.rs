//! Shared plumbing for the caddy binaries
//!
//! Usage:
//!   caddy-run `<path>` [--input `<text>`] [--config `<file>`]            - Run a script, print its console output
//!   caddy-extract `<path>` [`<prefix>`] [--format json|yaml] [--config `<file>`]
//!                                                                       - Print matching function declarations
//!   caddy-check `<path>` `<challenge>` [`<prefix>`] [--config `<file>`]  - Test attempts against a challenge
//!
//! Diagnostics go to stderr; set `RUST_LOG=debug` for details.

use caddy_config::{CaddyConfig, Loader};
use clap::Parser;
use std::path::Path;
use std::process;

/// Process exit statuses shared by the binaries
pub mod exit {
    pub const SUCCESS: i32 = 0;
    /// Missing or malformed arguments
    pub const USAGE: i32 = 1;
    /// Extractor and checker operation failures share the usage status
    pub const FAILURE: i32 = 1;
    /// Runner read/execution failures; checker attempts that failed
    pub const RUN_FAILURE: i32 = 2;
}

/// Route `log` output to stderr, `warn` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();
}

/// Parse the command line, exiting with [`exit::USAGE`] on bad arguments.
///
/// clap exits with status 2 by default, which the runner reserves for
/// execution failures. Help and version output still exit successfully.
pub fn parse_args<T: Parser>() -> T {
    match T::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = if err.use_stderr() {
                exit::USAGE
            } else {
                exit::SUCCESS
            };
            // Nothing useful to do if stderr/stdout is gone.
            let _ = err.print();
            process::exit(code);
        }
    }
}

/// Embedded defaults, plus `path` when given, plus key overrides.
pub fn load_config(
    path: Option<&Path>,
    overrides: &[(&str, String)],
) -> Result<CaddyConfig, caddy_config::ConfigError> {
    let mut loader = Loader::new();
    if let Some(path) = path {
        log::debug!("layering config file {}", path.display());
        loader = loader.with_file(path);
    }
    for (key, value) in overrides {
        loader = loader.set_override(key, value.as_str())?;
    }
    loader.build()
}
