//! Type Presets - per-entity-type layout contracts

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::validation::{PresetValidator, ViolationSeverity};

pub type TypeTag = String;

pub const DEFAULT_TYPE: &str = "default";

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("Failed to read presets {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid preset JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Preset '{0}' is invalid: {1}")]
    Invalid(TypeTag, String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypePreset {
    pub canvas_dimensions: [u32; 2],
    pub text_box: TextBox,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default)]
    pub text_gravity: Gravity,
    #[serde(default)]
    pub canvas_gravity: Gravity,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub transforms: Vec<Transform>,
}

fn default_font_size() -> f32 { 10.0 }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBox {
    pub width: u32,
    pub height: u32,
}

impl TypePreset {
    pub fn canvas_width(&self) -> u32 {
        self.canvas_dimensions[0]
    }

    pub fn canvas_height(&self) -> u32 {
        self.canvas_dimensions[1]
    }

    /// Text box dimensions after all transforms ran.
    pub fn transformed_box(&self) -> (u32, u32) {
        self.transforms
            .iter()
            .fold((self.text_box.width, self.text_box.height), |dims, t| t.output_size(dims))
    }

    /// `tff_32x64` style directory name.
    pub fn size_dir(&self) -> String {
        format!("tff_{}x{}", self.canvas_width(), self.canvas_height())
    }
}

/// Anchor used to place a smaller image inside a larger one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gravity {
    Centre,
    North,
    East,
    South,
    West,
    NorthEast,
    SouthEast,
    SouthWest,
    #[default]
    NorthWest,
}

impl Gravity {
    /// Offset of an `inner` sized image inside `outer`; negative means cropped.
    pub fn offset(&self, inner: (u32, u32), outer: (u32, u32)) -> (i64, i64) {
        let dx = outer.0 as i64 - inner.0 as i64;
        let dy = outer.1 as i64 - inner.1 as i64;
        let (fx, fy) = match self {
            Gravity::Centre => (1, 1),
            Gravity::North => (1, 0),
            Gravity::East => (2, 1),
            Gravity::South => (1, 2),
            Gravity::West => (0, 1),
            Gravity::NorthEast => (2, 0),
            Gravity::SouthEast => (2, 2),
            Gravity::SouthWest => (0, 2),
            Gravity::NorthWest => (0, 0),
        };
        (dx * fx / 2, dy * fy / 2)
    }
}

/// Post-processing step applied after the shadow composite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Transform {
    Rot90,
    Rot180,
    Rot270,
    FlipHorizontal,
    FlipVertical,
    Crop { x: u32, y: u32, width: u32, height: u32 },
}

impl Transform {
    pub fn output_size(&self, (w, h): (u32, u32)) -> (u32, u32) {
        match self {
            Transform::Rot90 | Transform::Rot270 => (h, w),
            Transform::Rot180 | Transform::FlipHorizontal | Transform::FlipVertical => (w, h),
            Transform::Crop { x, y, width, height } => (
                (*width).min(w.saturating_sub(*x)),
                (*height).min(h.saturating_sub(*y)),
            ),
        }
    }
}

/// Preset registry - built-ins plus optional overrides from a file
#[derive(Debug, Clone)]
pub struct PresetRegistry {
    presets: HashMap<TypeTag, TypePreset>,
}

impl PresetRegistry {
    /// Registry with only the built-in `default` and `monster` presets.
    pub fn builtin() -> Self {
        let mut presets = HashMap::new();
        presets.insert(DEFAULT_TYPE.to_string(), TypePreset {
            canvas_dimensions: [32, 32],
            text_box: TextBox { width: 32, height: 32 },
            font_size: 10.0,
            text_gravity: Gravity::NorthWest,
            canvas_gravity: Gravity::NorthWest,
            background: None,
            transforms: vec![],
        });
        presets.insert("monster".to_string(), TypePreset {
            canvas_dimensions: [32, 64],
            text_box: TextBox { width: 48, height: 32 },
            font_size: 10.0,
            text_gravity: Gravity::NorthWest,
            canvas_gravity: Gravity::South,
            background: Some("backgrounds/creature.png".to_string()),
            transforms: vec![Transform::Rot90],
        });
        Self { presets }
    }

    /// Built-ins overlaid with every preset in a `{"type": {...}}` JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self, PresetError> {
        let content = fs::read_to_string(path).map_err(|source| PresetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut registry = Self::builtin();
        registry.merge_json(&content)?;
        Ok(registry)
    }

    pub fn merge_json(&mut self, content: &str) -> Result<(), PresetError> {
        let loaded: HashMap<TypeTag, TypePreset> = serde_json::from_str(content)?;
        for (tag, preset) in loaded {
            self.register(tag.to_lowercase(), preset)?;
        }
        Ok(())
    }

    /// Validates, then inserts. Warnings are logged, errors reject the preset.
    pub fn register(&mut self, tag: TypeTag, preset: TypePreset) -> Result<(), PresetError> {
        let violations = PresetValidator::new().validate(&preset);
        for v in &violations {
            match v.severity {
                ViolationSeverity::Error => {
                    return Err(PresetError::Invalid(tag, format!("{}: {}", v.rule, v.message)));
                }
                ViolationSeverity::Warning => {
                    log::warn!("preset '{}': {}: {}", tag, v.rule, v.message);
                }
            }
        }
        self.presets.insert(tag, preset);
        Ok(())
    }

    pub fn get(&self, tag: &str) -> Option<&TypePreset> {
        self.presets.get(tag)
    }

    /// Preset for `tag`, or the `default` preset when the tag is unknown.
    pub fn get_or_default(&self, tag: &str) -> Result<&TypePreset, PresetError> {
        if let Some(preset) = self.presets.get(tag) {
            return Ok(preset);
        }
        log::debug!("no preset for type '{}', using default", tag);
        self.presets
            .get(DEFAULT_TYPE)
            .ok_or_else(|| PresetError::Invalid(DEFAULT_TYPE.to_string(), "missing".to_string()))
    }

    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<_> = self.presets.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
