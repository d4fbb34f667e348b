//! The `thumbnailer process` command for generating thumbnails.

mod batch;
mod setup;
pub mod types;

pub use types::{Filter, OnError};

use clap::Args;
use std::path::PathBuf;
use thumbnailer_core::pipeline::FileDiscovery;
use thumbnailer_core::{Config, ProcessOptions};

use batch::run_batch;
use setup::{resolve_input, setup_thumbnailer};

/// Arguments for the `process` command.
///
/// Unset options fall back to the loaded configuration.
#[derive(Args, Debug, Default)]
pub struct ProcessArgs {
    /// Directory of images to thumbnail (defaults to general.input_dir)
    pub input: Option<PathBuf>,

    /// Maximum thumbnail width in pixels
    #[arg(long)]
    pub max_width: Option<u32>,

    /// Maximum thumbnail height in pixels
    #[arg(long)]
    pub max_height: Option<u32>,

    /// Resampling filter
    #[arg(long, value_enum)]
    pub filter: Option<Filter>,

    /// Token inserted before the extension of each thumbnail name
    #[arg(long)]
    pub marker: Option<String>,

    /// Abort on the first failing image, or skip it and continue
    #[arg(long, value_enum)]
    pub on_error: Option<OnError>,

    /// Skip images whose thumbnail already exists
    #[arg(long)]
    pub skip_existing: bool,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Number of concurrent decode workers
    #[arg(long)]
    pub decode_workers: Option<usize>,

    /// Number of concurrent resize workers
    #[arg(long)]
    pub resize_workers: Option<usize>,

    /// Images buffered between two stages
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Execute the process command.
pub async fn execute(args: ProcessArgs, config: Config) -> anyhow::Result<()> {
    let input = resolve_input(&args, &config)?;
    let thumbnailer = setup_thumbnailer(&args, config)?;

    let files = thumbnailer.discover(&input)?;
    if files.is_empty() {
        tracing::warn!("No supported image files found at {:?}", input);
        return Ok(());
    }
    tracing::info!(
        "Found {} image(s) to process ({:.1} MB)",
        files.len(),
        FileDiscovery::total_size(&files) as f64 / 1_000_000.0
    );

    let options = ProcessOptions {
        skip_existing: args.skip_existing,
    };
    run_batch(thumbnailer, files, &options, args.json).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        args: ProcessArgs,
    }

    #[test]
    fn process_args_default_leaves_overrides_unset() {
        let args = ProcessArgs::default();
        assert!(args.input.is_none());
        assert!(args.max_width.is_none());
        assert!(args.max_height.is_none());
        assert!(args.filter.is_none());
        assert!(args.marker.is_none());
        assert!(args.on_error.is_none());
        assert!(args.buffer_size.is_none());
    }

    #[test]
    fn process_args_default_bool_flags_are_false() {
        let args = ProcessArgs::default();
        assert!(!args.skip_existing);
        assert!(!args.recursive);
        assert!(!args.json);
    }

    #[test]
    fn process_args_parse_flags() {
        let cli = TestCli::parse_from([
            "thumbnailer",
            "./photos",
            "--max-width",
            "200",
            "--filter",
            "catmull-rom",
            "--on-error",
            "continue",
            "--skip-existing",
            "--json",
        ]);
        assert_eq!(cli.args.input, Some(PathBuf::from("./photos")));
        assert_eq!(cli.args.max_width, Some(200));
        assert_eq!(cli.args.filter, Some(Filter::CatmullRom));
        assert_eq!(cli.args.on_error, Some(OnError::Continue));
        assert!(cli.args.skip_existing);
        assert!(cli.args.json);
    }

    #[test]
    fn process_args_input_is_optional() {
        let cli = TestCli::parse_from(["thumbnailer"]);
        assert!(cli.args.input.is_none());
    }

    #[test]
    fn process_args_reject_unknown_policy() {
        assert!(TestCli::try_parse_from(["thumbnailer", "--on-error", "retry"]).is_err());
    }

    #[tokio::test]
    async fn execute_thumbnails_directory() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbImage::from_pixel(400, 200, image::Rgb([200, 40, 40]))
            .save(dir.path().join("red.jpg"))
            .unwrap();

        let args = ProcessArgs {
            input: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        execute(args, Config::default()).await.unwrap();

        let thumb = image::open(dir.path().join("red_thumb.jpg")).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (150, 75));
    }

    #[tokio::test]
    async fn execute_reports_failed_images() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.jpg"), b"not a jpeg").unwrap();

        let args = ProcessArgs {
            input: Some(dir.path().to_path_buf()),
            on_error: Some(OnError::Continue),
            ..Default::default()
        };
        assert!(execute(args, Config::default()).await.is_err());
    }
}
