use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do with a tag frame whose payload cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameErrorPolicy {
    /// Keep the frame as an opaque blob.
    #[default]
    Preserve,
    /// Drop the frame and log a warning.
    Skip,
    /// Abort the whole tag.
    Fail,
}

/// What to do when one unknown type shows up with two different shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaPolicy {
    /// Declare the type as `mixed` and log a warning.
    #[default]
    Widen,
    /// Fail with `SchemaExtensionConflict`.
    Strict,
}

/// Options passed explicitly into every entry point of the crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub frame_errors: FrameErrorPolicy,
    pub schema: SchemaPolicy,
    /// File name assumed for data piped on stdin; drives format detection.
    pub stdin_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_errors: FrameErrorPolicy::default(),
            schema: SchemaPolicy::default(),
            stdin_name: "movie.mp4".to_string(),
        }
    }
}

impl Config {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
