//! Output Layout - directory tree, JSON sidecar, PNG encoding

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::hashing::sha256_hex;
use crate::presets::TypePreset;

/// Directory used instead of the tree when output is flat.
pub const FLAT_DIR: &str = "text_fallback_fillers";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PNG encoding error: {0}")]
    Encoding(#[from] image::ImageError),

    #[error("Sidecar serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{field} '{value}' is not a valid path component")]
    PathComponent { field: &'static str, value: String },
}

/// Tileset mapping entry: the tile is its own foreground sprite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidecarEntry {
    pub id: String,
    pub fg: String,
    pub bg: String,
}

impl SidecarEntry {
    pub fn for_id(id: &str) -> Self {
        Self { id: id.to_string(), fg: id.to_string(), bg: String::new() }
    }
}

/// Paths (relative to the output root) and digest of one written artifact pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenFiller {
    pub id: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub png: PathBuf,
    pub sidecar: PathBuf,
    pub png_sha256: String,
}

#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    flat: bool,
}

impl OutputLayout {
    /// `<root>/tff_<W>x<H>/<type>/<id>/`
    pub fn tree(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), flat: false }
    }

    /// `<root>/text_fallback_fillers/`
    pub fn flat(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), flat: true }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artifact_dir(&self, preset: &TypePreset, type_tag: &str, id: &str) -> PathBuf {
        self.root.join(self.relative_dir(preset, type_tag, id))
    }

    fn relative_dir(&self, preset: &TypePreset, type_tag: &str, id: &str) -> PathBuf {
        if self.flat {
            PathBuf::from(FLAT_DIR)
        } else {
            Path::new(&preset.size_dir()).join(type_tag).join(id)
        }
    }

    /// Encodes first, then writes sidecar and PNG, so a failed encode leaves
    /// nothing behind.
    pub fn write(
        &self,
        preset: &TypePreset,
        type_tag: &str,
        id: &str,
        image: &RgbaImage,
    ) -> Result<WrittenFiller, OutputError> {
        check_component("type", type_tag)?;
        check_component("id", id)?;

        let png = encode_png(image)?;
        let sidecar = serde_json::to_string(&[SidecarEntry::for_id(id)])?;

        let rel = self.relative_dir(preset, type_tag, id);
        let dir = self.root.join(&rel);
        fs::create_dir_all(&dir).map_err(|source| OutputError::Io { path: dir.clone(), source })?;

        let sidecar_name = format!("{id}.json");
        write_file(&dir.join(&sidecar_name), sidecar.as_bytes())?;
        let png_name = format!("{id}.png");
        write_file(&dir.join(&png_name), &png)?;

        Ok(WrittenFiller {
            id: id.to_string(),
            type_tag: type_tag.to_string(),
            png: rel.join(png_name),
            sidecar: rel.join(sidecar_name),
            png_sha256: sha256_hex(&png),
        })
    }
}

/// Ids and type tags name directories and files; they must stay one level deep.
fn check_component(field: &'static str, value: &str) -> Result<(), OutputError> {
    let bad = value.is_empty() || value == "." || value == ".." || value.contains(['/', '\\']);
    if bad {
        return Err(OutputError::PathComponent { field, value: value.to_string() });
    }
    Ok(())
}

pub fn write_file(path: &Path, data: &[u8]) -> Result<(), OutputError> {
    fs::write(path, data).map_err(|source| OutputError::Io { path: path.to_path_buf(), source })
}

/// RGBA PNG with fixed encoder settings, so equal images give equal bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, OutputError> {
    let mut data = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut data, CompressionType::Default, FilterType::NoFilter);
    encoder.write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgba8)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::PresetRegistry;
    use image::Rgba;

    #[test]
    fn test_tree_and_flat_paths() {
        let registry = PresetRegistry::builtin();
        let monster = registry.get("monster").unwrap();
        let tree = OutputLayout::tree("out");
        assert_eq!(
            tree.artifact_dir(monster, "monster", "mon_test"),
            Path::new("out/tff_32x64/monster/mon_test")
        );
        let flat = OutputLayout::flat("out");
        assert_eq!(flat.artifact_dir(monster, "monster", "mon_test"), Path::new("out/text_fallback_fillers"));
    }

    #[test]
    fn test_sidecar_shape() {
        let json = serde_json::to_value([SidecarEntry::for_id("mon_test")]).unwrap();
        assert_eq!(json, serde_json::json!([{"id": "mon_test", "fg": "mon_test", "bg": ""}]));
    }

    #[test]
    fn test_png_encoding_deterministic() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 4]));
        let a = encode_png(&img).unwrap();
        let b = encode_png(&img).unwrap();
        assert_eq!(a, b);
        assert_eq!(&a[1..4], b"PNG");
    }

    #[test]
    fn test_write_creates_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let registry = PresetRegistry::builtin();
        let layout = OutputLayout::tree(dir.path());
        let img = RgbaImage::new(32, 32);
        let written = layout.write(registry.get("default").unwrap(), "item", "itm_rock", &img).unwrap();
        assert_eq!(written.png, Path::new("tff_32x32/item/itm_rock/itm_rock.png"));
        assert!(dir.path().join(&written.sidecar).exists());
        assert_eq!(written.png_sha256, sha256_hex(&fs::read(dir.path().join(&written.png)).unwrap()));
    }

    #[test]
    fn test_recorded_paths_independent_of_root() {
        let registry = PresetRegistry::builtin();
        let preset = registry.get("default").unwrap();
        let img = RgbaImage::new(32, 32);
        let (a, b) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let first = OutputLayout::flat(a.path()).write(preset, "item", "itm_rock", &img).unwrap();
        let second = OutputLayout::flat(b.path()).write(preset, "item", "itm_rock", &img).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.sidecar, Path::new("text_fallback_fillers/itm_rock.json"));
    }

    #[test]
    fn test_escaping_ids_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let registry = PresetRegistry::builtin();
        let preset = registry.get("default").unwrap();
        let layout = OutputLayout::tree(dir.path().join("out"));
        let img = RgbaImage::new(32, 32);
        for id in ["../x", "a/b", "a\\b", "..", ""] {
            let err = layout.write(preset, "item", id, &img).unwrap_err();
            assert!(matches!(err, OutputError::PathComponent { field: "id", .. }), "{id:?}");
        }
        let err = layout.write(preset, "../item", "itm_rock", &img).unwrap_err();
        assert!(matches!(err, OutputError::PathComponent { field: "type", .. }));
        assert!(!dir.path().join("out").exists());
    }
}
