//! Run a JavaScript file and print what it logged.

use caddy_cli::{exit, init_logging, load_config, parse_args};
use caddy_js::runner::Runner;
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "caddy-run")]
#[command(about = "Run a JavaScript file and print its console.log output", long_about = None)]
#[command(version)]
struct Args {
    /// Script to execute
    path: PathBuf,

    /// Text bound to the input global (see `runner.input_binding`)
    #[arg(long, short = 'i')]
    input: Option<String>,

    /// Configuration file layered over the built-in defaults
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() {
    init_logging();
    let args: Args = parse_args();

    let config = load_config(args.config.as_deref(), &[]).unwrap_or_else(|e| {
        eprintln!("Error loading configuration: {}", e);
        process::exit(exit::RUN_FAILURE);
    });

    let runner = Runner::new(config.runner.runner_options());
    let bindings = config.runner.bindings(args.input);
    log::debug!("running {}", args.path.display());

    let outcome = runner.run_file(&args.path, &bindings).unwrap_or_else(|e| {
        eprintln!("Error evaluating code: {}", e);
        process::exit(exit::RUN_FAILURE);
    });
    log::debug!("completion value: {}", outcome.value);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in &outcome.stdout {
        if writeln!(out, "{}", line).is_err() {
            process::exit(exit::RUN_FAILURE);
        }
    }
}
