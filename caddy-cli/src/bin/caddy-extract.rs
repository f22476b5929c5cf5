//! Print the function declarations of a source file whose names start with a
//! prefix.

use caddy_cli::{exit, init_logging, load_config, parse_args};
use caddy_js::extract::Extractor;
use clap::Parser;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "caddy-extract")]
#[command(about = "Extract named function declarations from a JavaScript or TypeScript file", long_about = None)]
#[command(version)]
struct Args {
    /// Source file to parse
    path: PathBuf,

    /// Case-sensitive name prefix (defaults to `extractor.default_prefix`)
    prefix: Option<String>,

    /// Output format
    #[arg(long, short = 'f', value_parser = ["json", "yaml"])]
    format: Option<String>,

    /// Configuration file layered over the built-in defaults
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() {
    init_logging();
    let args: Args = parse_args();

    let overrides: Vec<(&str, String)> = args
        .format
        .iter()
        .map(|format| ("extractor.format", format.clone()))
        .collect();
    let config = load_config(args.config.as_deref(), &overrides).unwrap_or_else(|e| {
        eprintln!("Error loading configuration: {}", e);
        process::exit(exit::FAILURE);
    });

    let prefix = args
        .prefix
        .unwrap_or_else(|| config.extractor.default_prefix.clone());
    let extractor = Extractor::new(config.extractor.extract_options());

    let matches = extractor
        .extract_file(&args.path, &prefix)
        .unwrap_or_else(|e| {
            eprintln!("Error reading or parsing the file: {}", e);
            process::exit(exit::FAILURE);
        });
    log::debug!("{} declaration(s) match {:?}", matches.len(), prefix);

    let rendered = config.extractor.format.render(&matches).unwrap_or_else(|e| {
        eprintln!("Error formatting matches: {}", e);
        process::exit(exit::FAILURE);
    });
    println!("{}", rendered.trim_end());
}
