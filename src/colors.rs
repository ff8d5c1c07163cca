//! Color Table and compound color spec resolution

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Background marker for specs that name a single color.
pub const UNDEFINED_COLOR: &str = "undefined";

/// Single-letter category tokens dropped from compound specs.
const COLOR_PREFIXES: [&str; 3] = ["i", "c", "h"];

/// Not present in the palette file.
const LIGHT_GRAY: Rgb = Rgb([200, 200, 200]);
const PINK: Rgb = Rgb([255, 192, 203]);

#[derive(Debug, Error)]
pub enum ColorError {
    #[error("Failed to read palette {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid palette JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Palette must be a JSON array with at least one object")]
    EmptyPalette,

    #[error("Unknown color: {0}")]
    UnknownColor(String),

    #[error("Color spec '{0}' has more than two colors")]
    TooManyColors(String),

    #[error("Color spec '{0}' names no color")]
    NoColor(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const BLACK: Rgb = Rgb([0, 0, 0]);
    pub const WHITE: Rgb = Rgb([255, 255, 255]);

    /// Mean of the three channels.
    pub fn brightness(&self) -> f32 {
        self.0.iter().map(|&c| c as f32).sum::<f32>() / 3.0
    }

    /// Rec. 601 luma, rounded.
    pub fn luma(&self) -> u8 {
        let [r, g, b] = self.0;
        (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32).round() as u8
    }

    pub fn inverted_gray(&self) -> Rgb {
        let v = 255 - self.luma();
        Rgb([v, v, v])
    }
}

/// Resolved background: a real color or the `undefined` placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    Undefined,
    Color(Rgb),
}

/// Color names as written in entity data, before table lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPair {
    pub fg: String,
    pub bg: String,
}

/// Name → RGB table built from the game's palette definitions
#[derive(Debug, Clone)]
pub struct ColorTable {
    colors: HashMap<String, Rgb>,
}

impl ColorTable {
    pub fn new() -> Self {
        let mut colors = HashMap::new();
        colors.insert("lightgray".to_string(), LIGHT_GRAY);
        colors.insert("pink".to_string(), PINK);
        Self { colors }
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ColorError> {
        let content = fs::read_to_string(path).map_err(|source| ColorError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parses `[{"type": ..., "BLACK": [0, 0, 0], "LRED": [...], ...}]`.
    pub fn from_json(content: &str) -> Result<Self, ColorError> {
        let defs: Vec<HashMap<String, serde_json::Value>> = serde_json::from_str(content)?;
        let first = defs.into_iter().next().ok_or(ColorError::EmptyPalette)?;

        let mut table = Self::new();
        for (name, value) in first {
            if name == "type" {
                continue;
            }
            let rgb: [u8; 3] = serde_json::from_value(value)?;
            table.insert(&canonical_name(&name), Rgb(rgb));
        }
        Ok(table)
    }

    pub fn insert(&mut self, name: &str, rgb: Rgb) {
        self.colors.insert(name.to_string(), rgb);
    }

    pub fn get(&self, name: &str) -> Option<Rgb> {
        self.colors.get(name).copied()
    }

    pub fn lookup(&self, name: &str) -> Result<Rgb, ColorError> {
        self.get(name).ok_or_else(|| ColorError::UnknownColor(name.to_string()))
    }

    /// Background lookup; the `undefined` sentinel never hits the table.
    pub fn lookup_background(&self, name: &str) -> Result<Background, ColorError> {
        if name == UNDEFINED_COLOR {
            return Ok(Background::Undefined);
        }
        self.lookup(name).map(Background::Color)
    }

    /// Resolve a compound spec straight to RGB values.
    pub fn resolve(&self, spec: &str, default_color: &str) -> Result<(Rgb, Background), ColorError> {
        let pair = resolve_colors(spec, default_color)?;
        Ok((self.lookup(&pair.fg)?, self.lookup_background(&pair.bg)?))
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::new()
    }
}

/// `LRED` → `lightred`, `DGRAY` → `darkgray`, `BLUE` → `blue`.
pub fn canonical_name(name: &str) -> String {
    let expanded = if let Some(rest) = name.strip_prefix('L') {
        format!("light{rest}")
    } else if let Some(rest) = name.strip_prefix('D') {
        format!("dark{rest}")
    } else {
        name.to_string()
    };
    expanded.to_lowercase()
}

/// Split a compound spec like `c_light_red_h_blue` into foreground and
/// background names. An empty spec falls back to `default_color`.
pub fn resolve_colors(spec: &str, default_color: &str) -> Result<ColorPair, ColorError> {
    let spec = if spec.is_empty() { default_color } else { spec };
    let merged = spec.replace("light_", "light").replace("dark_", "dark");

    let mut parts = merged
        .split('_')
        .filter(|p| !COLOR_PREFIXES.contains(p));

    let fg = parts.next().ok_or_else(|| ColorError::NoColor(spec.to_string()))?;
    let bg = parts.next().unwrap_or(UNDEFINED_COLOR);
    if parts.next().is_some() {
        return Err(ColorError::TooManyColors(spec.to_string()));
    }

    Ok(ColorPair {
        fg: fg.to_string(),
        bg: bg.to_string(),
    })
}
