//! Main entry point for tabmatch CLI

use clap::Parser;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tabmatch::cli::Cli;
use tabmatch::commands::{execute_command, exit_status};

fn main() {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    // Parse command line arguments
    let cli = Cli::parse();

    // Set up verbose logging if requested
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    // The binary installs no interrupt handler, so nothing sets this flag
    // here; embedders that share it with `execute_command` can cancel a run.
    let cancel = Arc::new(AtomicBool::new(false));

    // Execute the comparison
    let result = execute_command(cli, cancel);
    if let Err(e) = &result {
        eprintln!("Error: {}", e);
    }
    std::process::exit(exit_status(&result));
}
