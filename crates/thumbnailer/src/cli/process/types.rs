//! CLI enum types for the process command: resampling filter and error policy.

use clap::ValueEnum;
use thumbnailer_core::{FailurePolicy, ResizeFilter};

/// Resampling filters selectable from the command line.
#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq, Eq)]
pub enum Filter {
    /// Nearest neighbor (fastest, blocky)
    Nearest,
    /// Bilinear
    Triangle,
    /// Bicubic (Catmull-Rom)
    CatmullRom,
    /// Gaussian blur kernel
    Gaussian,
    /// Lanczos with window 3 (default, sharpest)
    #[default]
    Lanczos3,
}

impl From<Filter> for ResizeFilter {
    fn from(filter: Filter) -> Self {
        match filter {
            Filter::Nearest => ResizeFilter::Nearest,
            Filter::Triangle => ResizeFilter::Triangle,
            Filter::CatmullRom => ResizeFilter::CatmullRom,
            Filter::Gaussian => ResizeFilter::Gaussian,
            Filter::Lanczos3 => ResizeFilter::Lanczos3,
        }
    }
}

/// What to do when an image fails.
#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum OnError {
    /// Abort the run on the first failing image
    FailFast,
    /// Skip failing images and report them at the end
    Continue,
}

impl From<OnError> for FailurePolicy {
    fn from(policy: OnError) -> Self {
        match policy {
            OnError::FailFast => FailurePolicy::FailFast,
            OnError::Continue => FailurePolicy::Continue,
        }
    }
}

impl std::fmt::Display for OnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OnError::FailFast => write!(f, "fail-fast"),
            OnError::Continue => write!(f, "continue"),
        }
    }
}
