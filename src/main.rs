mod cli;

use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use verdict::{config::Config, storage::Storage};

fn main() {
    // Parse first so `--help` and usage errors never touch config or storage.
    let cli = cli::Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    // Logs go to stderr; stdout carries JSON output.
    let filter = EnvFilter::try_from_env("VERDICT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = config.database.clone().or_else(Storage::default_path) else {
        eprintln!("Could not determine home directory.");
        process::exit(1);
    };

    let storage = match Storage::new(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to initialize storage: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(cli, &config, &storage) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
