//! The `thumbnailer config` command for configuration management.

use std::path::Path;

use clap::{Args, Subcommand};
use thumbnailer_core::Config;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with the default thumbnail settings
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            println!("{}", render_with_input(&config)?);
        }

        ConfigCommand::Path => {
            println!("{}", Config::default_path().display());
        }

        ConfigCommand::Init { force } => {
            let path = Config::default_path();
            let config = write_default_config(&path, force)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
            println!("  {}", thumbnail_overview(&config));
        }
    }

    Ok(())
}

/// Render the config as TOML, headed by the resolved input directory.
fn render_with_input(config: &Config) -> anyhow::Result<String> {
    Ok(format!(
        "# input directory: {}\n{}",
        config.input_dir().display(),
        config.to_toml()?
    ))
}

/// Write the default config to `path`, refusing to clobber it unless `force`.
fn write_default_config(path: &Path, force: bool) -> anyhow::Result<Config> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let config = Config::default();
    std::fs::write(path, config.to_toml()?)?;
    Ok(config)
}

/// One-line description of what `process` will produce with `config`.
fn thumbnail_overview(config: &Config) -> String {
    let thumb = &config.thumbnail;
    format!(
        "Thumbnails fit {}x{} ({:?}), named <name>{}.<ext>, from {}",
        thumb.max_width,
        thumb.max_height,
        thumb.filter,
        thumb.marker,
        config.input_dir().display()
    )
}
