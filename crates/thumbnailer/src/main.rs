//! Thumbnailer CLI - batch thumbnail generation for image directories.
//!
//! Every supported image in the input directory gets a thumbnail written
//! next to it (`pic.jpg` → `pic_thumb.jpg`). Originals are never modified.
//!
//! # Usage
//!
//! ```bash
//! # Thumbnail ./pictures (or general.input_dir from the config)
//! thumbnailer process
//!
//! # Thumbnail a directory, skipping broken images instead of aborting
//! thumbnailer process ./photos/ --on-error continue
//!
//! # View configuration
//! thumbnailer config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Thumbnailer - batch thumbnail generation for image directories.
#[derive(Parser, Debug)]
#[command(name = "thumbnailer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate thumbnails for a directory of images
    Process(cli::process::ProcessArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match thumbnailer_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `thumbnailer config path`."
            );
            thumbnailer_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Thumbnailer v{}", thumbnailer_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Process(args) => cli::process::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
