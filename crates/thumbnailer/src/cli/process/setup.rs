//! Thumbnailer setup: input resolution and config overrides.

use std::path::PathBuf;

use thumbnailer_core::{Config, Thumbnailer};

use super::ProcessArgs;

/// Resolve the input directory: the positional argument, else `general.input_dir`.
pub fn resolve_input(args: &ProcessArgs, config: &Config) -> anyhow::Result<PathBuf> {
    let input = match &args.input {
        Some(path) => PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned()),
        None => config.input_dir(),
    };

    if !input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Pass a directory or set general.input_dir in the config.",
            input
        );
    }
    Ok(input)
}

/// Apply command-line overrides on top of the loaded configuration.
pub fn apply_overrides(args: &ProcessArgs, config: &mut Config) {
    if let Some(width) = args.max_width {
        config.thumbnail.max_width = width;
    }
    if let Some(height) = args.max_height {
        config.thumbnail.max_height = height;
    }
    if let Some(filter) = args.filter {
        config.thumbnail.filter = filter.into();
    }
    if let Some(ref marker) = args.marker {
        config.thumbnail.marker = marker.clone();
    }
    if let Some(policy) = args.on_error {
        config.pipeline.failure_policy = policy.into();
    }
    if let Some(workers) = args.decode_workers {
        config.pipeline.decode_workers = workers;
    }
    if let Some(workers) = args.resize_workers {
        config.pipeline.resize_workers = workers;
    }
    if let Some(size) = args.buffer_size {
        config.pipeline.buffer_size = size;
    }
    if args.recursive {
        config.processing.recursive = true;
    }
}

/// Apply overrides and build a validated Thumbnailer.
pub fn setup_thumbnailer(args: &ProcessArgs, mut config: Config) -> anyhow::Result<Thumbnailer> {
    apply_overrides(args, &mut config);
    tracing::debug!(
        "Thumbnails bounded to {}x{} ({:?}), policy {:?}",
        config.thumbnail.max_width,
        config.thumbnail.max_height,
        config.thumbnail.filter,
        config.pipeline.failure_policy
    );
    Ok(Thumbnailer::new(config)?)
}
