//! Berth CLI - builds native extension modules with CMake

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use berth::builder::errors::BuildError;
use berth::util::diagnostic::emit;
use cli::{Cli, Commands};

fn main() {
    // Parse CLI
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("berth=debug")
    } else {
        EnvFilter::new("berth=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(color)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<BuildError>() {
            Some(build_error) => emit(&build_error.to_diagnostic(), color),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::BuildExt(args) => commands::build_ext::execute(args),
        Commands::Toolchain(args) => commands::toolchain::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
