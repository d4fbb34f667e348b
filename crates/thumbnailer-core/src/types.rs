//! Core data types describing the outcome of a pipeline run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The three stages of the thumbnail pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Read the source file and decode it into a raster
    Decode,
    /// Downscale the raster into the thumbnail bounds
    Resize,
    /// Encode the thumbnail and persist it next to the source
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Decode => write!(f, "decode"),
            Stage::Resize => write!(f, "resize"),
            Stage::Write => write!(f, "write"),
        }
    }
}

/// An image that was skipped because of an error under the continue policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemFailure {
    /// Source file that failed
    pub source: PathBuf,

    /// Stage in which it failed
    pub stage: Stage,

    /// Human-readable error
    pub message: String,
}

/// Result of a completed pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of sources handed to the decode stage
    pub submitted: usize,

    /// Thumbnails written, in the order the write stage persisted them
    pub written: Vec<PathBuf>,

    /// Sources skipped after an error (continue policy only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<ItemFailure>,

    /// Sources left out before the run because their thumbnail already existed
    #[serde(default)]
    pub skipped: usize,

    /// Wall-clock duration of the run in milliseconds
    pub elapsed_ms: u64,
}

impl RunSummary {
    /// Number of thumbnails written.
    pub fn succeeded(&self) -> usize {
        self.written.len()
    }

    /// Whether every submitted source produced a thumbnail.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.written.len() == self.submitted
    }

    /// Serialize the summary to JSON.
    pub fn to_json(&self, pretty: bool) -> crate::Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Decode.to_string(), "decode");
        assert_eq!(Stage::Resize.to_string(), "resize");
        assert_eq!(Stage::Write.to_string(), "write");
    }

    #[test]
    fn test_summary_complete() {
        let summary = RunSummary {
            submitted: 2,
            written: vec![PathBuf::from("a_thumb.jpg"), PathBuf::from("b_thumb.jpg")],
            ..Default::default()
        };
        assert!(summary.is_complete());
        assert_eq!(summary.succeeded(), 2);
    }

    #[test]
    fn test_summary_with_failure_is_incomplete() {
        let summary = RunSummary {
            submitted: 2,
            written: vec![PathBuf::from("a_thumb.jpg")],
            failed: vec![ItemFailure {
                source: PathBuf::from("b.jpg"),
                stage: Stage::Decode,
                message: "bad data".to_string(),
            }],
            ..Default::default()
        };
        assert!(!summary.is_complete());
    }

    #[test]
    fn test_summary_json_omits_empty_failures() {
        let summary = RunSummary {
            submitted: 1,
            written: vec![PathBuf::from("a_thumb.jpg")],
            elapsed_ms: 12,
            ..Default::default()
        };
        let json = summary.to_json(false).unwrap();
        assert!(!json.contains("failed"));
        assert!(json.contains("\"submitted\":1"));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["written"][0], "a_thumb.jpg");
    }

    #[test]
    fn test_stage_serializes_lowercase() {
        let json = serde_json::to_string(&Stage::Resize).unwrap();
        assert_eq!(json, "\"resize\"");
    }
}
