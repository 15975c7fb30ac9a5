//! zmd CLI - Markdown widget renderer.
//!
//! Provides commands for:
//! - `render`: Render markdown sources into self-contained widget HTML

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::RenderArgs;
use output::Output;

/// zmd - Markdown widget renderer.
#[derive(Parser)]
#[command(name = "zmd", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render markdown sources to widget HTML.
    Render(RenderArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Render(args) if args.verbose);

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Widgets are single-threaded; every cycle runs on this thread
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime");

    let result = match cli.command {
        Commands::Render(args) => rt.block_on(args.execute()),
    };

    if let Err(err) = result {
        output.fatal(&err);
        std::process::exit(1);
    }
}
