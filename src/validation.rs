//! Preset Validation - rules produce structured violations
//!
//! Errors reject a preset at load time, warnings are only logged.

use serde::{Deserialize, Serialize};
use crate::presets::TypePreset;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
}

impl ValidationViolation {
    fn error(rule: &str, message: String) -> Self {
        Self { rule: rule.to_string(), severity: ViolationSeverity::Error, message }
    }

    fn warning(rule: &str, message: String) -> Self {
        Self { rule: rule.to_string(), severity: ViolationSeverity::Warning, message }
    }
}

/// Validation rule trait - produces violations
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, preset: &TypePreset) -> Vec<ValidationViolation>;
}

// --- Concrete Rules ---

pub struct CanvasRule;

impl ValidationRule for CanvasRule {
    fn name(&self) -> &'static str { "canvas" }

    fn validate(&self, preset: &TypePreset) -> Vec<ValidationViolation> {
        let [w, h] = preset.canvas_dimensions;
        if w == 0 || h == 0 {
            vec![ValidationViolation::error(self.name(), format!("canvas {}x{} has a zero dimension", w, h))]
        } else {
            vec![]
        }
    }
}

pub struct TextBoxRule;

impl ValidationRule for TextBoxRule {
    fn name(&self) -> &'static str { "text_box" }

    fn validate(&self, preset: &TypePreset) -> Vec<ValidationViolation> {
        let b = preset.text_box;
        if b.width == 0 || b.height == 0 {
            return vec![ValidationViolation::error(
                self.name(),
                format!("text box {}x{} has a zero dimension", b.width, b.height),
            )];
        }

        let (w, h) = preset.transformed_box();
        if w == 0 || h == 0 {
            return vec![ValidationViolation::error(
                self.name(),
                "transforms leave an empty text box".to_string(),
            )];
        }
        if w > preset.canvas_width() || h > preset.canvas_height() {
            return vec![ValidationViolation::warning(
                self.name(),
                format!(
                    "transformed text box {}x{} exceeds canvas {}x{} and will be cropped",
                    w, h, preset.canvas_width(), preset.canvas_height()
                ),
            )];
        }
        vec![]
    }
}

pub struct FontSizeRule;

impl ValidationRule for FontSizeRule {
    fn name(&self) -> &'static str { "font_size" }

    fn validate(&self, preset: &TypePreset) -> Vec<ValidationViolation> {
        if preset.font_size.is_finite() && preset.font_size > 0.0 {
            vec![]
        } else {
            vec![ValidationViolation::error(self.name(), format!("font size {} must be positive", preset.font_size))]
        }
    }
}

/// Runs every rule over a preset
pub struct PresetValidator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl PresetValidator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(CanvasRule),
                Box::new(TextBoxRule),
                Box::new(FontSizeRule),
            ],
        }
    }

    pub fn validate(&self, preset: &TypePreset) -> Vec<ValidationViolation> {
        self.rules.iter().flat_map(|rule| rule.validate(preset)).collect()
    }
}

impl Default for PresetValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{PresetRegistry, TextBox, Transform};

    #[test]
    fn test_builtin_presets_are_clean() {
        let registry = PresetRegistry::builtin();
        for tag in registry.tags() {
            let violations = PresetValidator::new().validate(registry.get(tag).unwrap());
            assert!(violations.is_empty(), "{tag}: {violations:?}");
        }
    }

    #[test]
    fn test_oversized_box_is_warning() {
        let mut preset = PresetRegistry::builtin().get("monster").unwrap().clone();
        preset.transforms.clear();
        let violations = PresetValidator::new().validate(&preset);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, ViolationSeverity::Warning);
    }

    #[test]
    fn test_zero_sizes_are_errors() {
        let mut preset = PresetRegistry::builtin().get("default").unwrap().clone();
        preset.text_box = TextBox { width: 0, height: 4 };
        preset.font_size = 0.0;
        let violations = PresetValidator::new().validate(&preset);
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| v.severity == ViolationSeverity::Error));
    }

    #[test]
    fn test_crop_outside_box_is_error() {
        let mut preset = PresetRegistry::builtin().get("default").unwrap().clone();
        preset.transforms = vec![Transform::Crop { x: 40, y: 0, width: 8, height: 8 }];
        let violations = PresetValidator::new().validate(&preset);
        assert_eq!(violations[0].rule, "text_box");
    }
}
