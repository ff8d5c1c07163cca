//! fillergen Core - text fallback filler generator
//!
//! Turns entity names into placeholder tile sprites: a colored, wrapped text
//! label with a soft drop shadow, one PNG and one tileset JSON per entity.
//!
//! # Guarantees
//! 1. Output is deterministic: same input, same PNG bytes
//! 2. A row that fails leaves no artifacts behind
//! 3. Lookup tables are loaded once and never mutated during a run

pub mod colors;
pub mod compose;
pub mod config;
pub mod font;
pub mod hashing;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod presets;
pub mod shadow;
pub mod text;
pub mod validation;

pub use colors::{resolve_colors, Background, ColorPair, ColorTable, Rgb};
pub use compose::{BlendMode, Composer, RenderRequest};
pub use config::RenderSettings;
pub use font::{BitmapFace, TrueTypeFace, Typeface};
pub use hashing::{canonical_json, compute_manifest_hash, sha256_hex};
pub use input::InputRow;
pub use output::{OutputLayout, WrittenFiller};
pub use pipeline::{FillerPipeline, PipelineError, RunManifest, RunSummary};
pub use presets::{Gravity, PresetRegistry, Transform, TypePreset};
pub use shadow::ShadowMethod;
pub use text::normalize;

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
