//! Render Settings - defaults, JSON file, CLI overrides

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::compose::BlendMode;
use crate::shadow::{ShadowMethod, DEFAULT_BLUR};
use crate::text::BREAK_THRESHOLD;

pub const DEFAULT_COLOR: &str = "black";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Global render settings shared by every row of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// TrueType/OpenType file; `None` uses the built-in bitmap face.
    pub font: Option<PathBuf>,
    /// Used when a row has an empty color spec.
    pub default_color: String,
    pub shadow_method: ShadowMethod,
    /// Gaussian sigma; 0 disables the blur.
    pub shadow_blur: f32,
    pub shadow_offset: [i32; 2],
    pub blend_mode: BlendMode,
    /// Char index after which soft breaks may be inserted.
    pub break_start: usize,
    /// Root for preset background images; `None` leaves backgrounds out.
    pub backgrounds_dir: Option<PathBuf>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            font: None,
            default_color: DEFAULT_COLOR.to_string(),
            shadow_method: ShadowMethod::MostlyBlack,
            shadow_blur: DEFAULT_BLUR,
            shadow_offset: [1, 1],
            blend_mode: BlendMode::Add,
            break_start: BREAK_THRESHOLD,
            backgrounds_dir: None,
        }
    }
}

impl RenderSettings {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}
