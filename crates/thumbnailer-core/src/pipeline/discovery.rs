//! File discovery for finding source images.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;
use crate::error::{PipelineError, PipelineResult};

use super::naming;

/// Discovers image files in directories.
pub struct FileDiscovery {
    config: ProcessingConfig,
    marker: String,
}

/// Information about a discovered file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    ///
    /// `marker` identifies thumbnails from earlier runs so they are not
    /// picked up as sources.
    pub fn new(config: ProcessingConfig, marker: impl Into<String>) -> Self {
        Self {
            config,
            marker: marker.into(),
        }
    }

    /// Discover all supported image files at a path.
    ///
    /// If path is a file, returns it if supported.
    /// If path is a directory, lists its supported files (recursively when
    /// configured). Results are sorted by path.
    pub fn discover(&self, path: &Path) -> PipelineResult<Vec<DiscoveredFile>> {
        let root_meta = std::fs::metadata(path).map_err(|e| PipelineError::Enumeration {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if root_meta.is_file() {
            if self.is_candidate(path) {
                return Ok(vec![DiscoveredFile {
                    path: path.to_path_buf(),
                    size: root_meta.len(),
                }]);
            }
            return Ok(vec![]);
        }

        let max_depth = if self.config.recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();

        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(true)
        {
            let entry = match entry {
                Ok(entry) => entry,
                // The root itself could not be listed: nothing to run.
                Err(e) if e.depth() == 0 => {
                    return Err(PipelineError::Enumeration {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {e}");
                    continue;
                }
            };

            let entry_path = entry.path();
            if entry.file_type().is_file() && self.is_candidate(entry_path) {
                match entry.metadata() {
                    Ok(meta) => files.push(DiscoveredFile {
                        path: entry_path.to_path_buf(),
                        size: meta.len(),
                    }),
                    Err(e) => tracing::warn!("Skipping {:?}: {e}", entry_path),
                }
            }
        }

        // Sort by path for deterministic ordering
        files.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::debug!("Discovered {} file(s) in {:?}", files.len(), path);
        Ok(files)
    }

    /// Supported extension, and not a thumbnail from a previous run.
    fn is_candidate(&self, path: &Path) -> bool {
        if self.config.skip_derived && naming::is_derived(path, &self.marker) {
            return false;
        }
        self.is_supported(path)
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.to_lowercase() == ext_lower)
            })
            .unwrap_or(false)
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}
