//! screens CLI - file-system routes for single-page applications.
//!
//! Provides commands for:
//! - `generate`: Write the routes module once
//! - `tree`: Print the route tree as JSON
//! - `watch`: Keep the routes module in sync with the page directory

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{GenerateArgs, TreeArgs, WatchArgs};
use output::Output;

/// screens - File-system routes for single-page applications.
#[derive(Parser)]
#[command(name = "screens", version, about)]
struct Cli {
    /// Enable verbose output (scan and generation timing logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the routes module.
    Generate(GenerateArgs),
    /// Print the route tree as JSON.
    Tree(TreeArgs),
    /// Regenerate the routes module whenever pages are added or removed.
    Watch(WatchArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to ERROR
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Generate(args) => args.execute(),
        Commands::Tree(args) => args.execute(),
        Commands::Watch(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&err);
        std::process::exit(1);
    }
}
