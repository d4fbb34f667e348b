//! Thumbnail pipeline components.
//!
//! This module contains the stages of the pipeline and their plumbing:
//! - **decode**: Read source files and decode them into rasters
//! - **thumbnail**: Shrink rasters into the thumbnail bounds
//! - **write**: Encode thumbnails and write them next to their sources
//! - **naming**: Derive thumbnail file names
//! - **discovery**: Find image files in directories
//! - **channel**: Bounded handoff channels for backpressure
//! - **failure**: Failure policy and per-run stage context
//! - **processor**: Wires the stages together and runs them

pub mod channel;
pub mod decode;
pub mod discovery;
pub mod failure;
pub mod item;
pub mod naming;
pub mod processor;
pub mod thumbnail;
pub mod write;

// Re-exports for convenient access
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use failure::{ProgressEvent, ProgressFn};
pub use item::WorkItem;
pub use naming::{derive_file_name, derive_os_file_name, thumbnail_path};
pub use processor::ThumbnailPipeline;
pub use thumbnail::ThumbnailGenerator;
pub use write::{Completion, ThumbnailWriter};
