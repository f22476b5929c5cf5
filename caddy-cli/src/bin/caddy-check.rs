//! Test every attempt in a source file against a challenge definition.

use caddy_cli::{exit, init_logging, load_config, parse_args};
use caddy_js::check::{check_file, Challenge};
use clap::Parser;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "caddy-check")]
#[command(about = "Run each attempt in a file against a challenge's test cases", long_about = None)]
#[command(version)]
struct Args {
    /// Source file holding the attempts
    path: PathBuf,

    /// Challenge definition (JSON)
    challenge: PathBuf,

    /// Attempt name prefix (defaults to `check.prefix`)
    prefix: Option<String>,

    /// Configuration file layered over the built-in defaults
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() {
    init_logging();
    let args: Args = parse_args();

    let overrides: Vec<(&str, String)> = args
        .prefix
        .iter()
        .map(|prefix| ("check.prefix", prefix.clone()))
        .collect();
    let config = load_config(args.config.as_deref(), &overrides).unwrap_or_else(|e| {
        eprintln!("Error loading configuration: {}", e);
        process::exit(exit::FAILURE);
    });

    let challenge = Challenge::from_path(&args.challenge).unwrap_or_else(|e| {
        eprintln!("Error loading challenge: {}", e);
        process::exit(exit::FAILURE);
    });
    log::info!("checking {} against {}", args.path.display(), challenge.name);

    let reports = check_file(&args.path, &challenge, &config.check_options()).unwrap_or_else(|e| {
        eprintln!("Error checking attempts: {}", e);
        process::exit(exit::FAILURE);
    });

    for report in &reports {
        match &report.failure {
            None => println!("[P] {} {} chars", report.name, report.len),
            Some(reason) => println!("[F] {} {} chars: {}", report.name, report.len, reason),
        }
    }

    if reports.iter().any(|report| !report.passed) {
        process::exit(exit::RUN_FAILURE);
    }
}
