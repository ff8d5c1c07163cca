//! Image Composer - text layer, shadow, transforms, canvas placement

use image::{imageops, GrayImage, ImageBuffer, Pixel, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::colors::{Background, Rgb};
use crate::config::RenderSettings;
use crate::font::{load_typeface, render_mask, FontError, Typeface};
use crate::presets::{Gravity, Transform, TypePreset};
use crate::shadow::render_shadow;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error(transparent)]
    Font(#[from] FontError),

    #[error("Background image {path} could not be loaded: {source}")]
    Background {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// How the shadow combines with the text layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Add,
    Over,
}

/// Everything one render needs; lives for a single compose call.
#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    pub preset: &'a TypePreset,
    pub id: &'a str,
    pub text: &'a str,
    pub fg: Rgb,
    pub bg: Background,
}

pub struct Composer {
    face: Box<dyn Typeface>,
    settings: RenderSettings,
}

impl Composer {
    /// Loads the configured font, or the built-in face when none is set.
    pub fn new(settings: RenderSettings) -> Result<Self, ComposeError> {
        let face = load_typeface(settings.font.as_deref())?;
        Ok(Self::with_face(face, settings))
    }

    pub fn with_face(face: Box<dyn Typeface>, settings: RenderSettings) -> Self {
        Self { face, settings }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn typeface(&self) -> &dyn Typeface {
        self.face.as_ref()
    }

    /// Full render: canvas-sized RGBA image for one entity.
    pub fn compose(&self, request: &RenderRequest<'_>) -> Result<RgbaImage, ComposeError> {
        let preset = request.preset;
        let text_box = (preset.text_box.width, preset.text_box.height);

        let mask = render_mask(self.face.as_ref(), request.text, preset.font_size, text_box.0);
        let boxed = gravity(&mask, preset.text_gravity, text_box);

        let text_layer = paint_mask(&boxed, request.fg);
        let shadow = render_shadow(
            &boxed,
            request.fg,
            request.bg,
            self.settings.shadow_method,
            self.settings.shadow_blur,
        );

        let [dx, dy] = self.settings.shadow_offset;
        let mut layered = composite_under(&text_layer, &shadow, dx as i64, dy as i64, self.settings.blend_mode);

        for transform in &preset.transforms {
            layered = apply_transform(&layered, transform);
        }

        let canvas = (preset.canvas_width(), preset.canvas_height());
        let placed = gravity(&layered, preset.canvas_gravity, canvas);

        match (&self.settings.backgrounds_dir, &preset.background) {
            (Some(dir), Some(background)) => {
                let backdrop = load_background(&dir.join(background))?;
                let backdrop = gravity(&backdrop, preset.canvas_gravity, canvas);
                Ok(composite_under(&placed, &backdrop, 0, 0, BlendMode::Over))
            }
            _ => Ok(placed),
        }
    }
}

fn load_background(path: &Path) -> Result<RgbaImage, ComposeError> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| ComposeError::Background { path: path.to_path_buf(), source })
}

/// Solid `color` with the mask as alpha.
pub fn paint_mask(mask: &GrayImage, color: Rgb) -> RgbaImage {
    let [r, g, b] = color.0;
    ImageBuffer::from_fn(mask.width(), mask.height(), |x, y| {
        Rgba([r, g, b, mask.get_pixel(x, y).0[0]])
    })
}

/// Place `img` in a `size` canvas per `anchor`, cropping what falls outside.
pub fn gravity<P>(img: &ImageBuffer<P, Vec<P::Subpixel>>, anchor: Gravity, size: (u32, u32)) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel,
{
    let mut canvas = ImageBuffer::new(size.0, size.1);
    let (ox, oy) = anchor.offset(img.dimensions(), size);
    imageops::replace(&mut canvas, img, ox, oy);
    canvas
}

/// Composite `under` beneath `top`, shifted by (dx, dy). Output keeps `top`'s size.
pub fn composite_under(top: &RgbaImage, under: &RgbaImage, dx: i64, dy: i64, mode: BlendMode) -> RgbaImage {
    ImageBuffer::from_fn(top.width(), top.height(), |x, y| {
        let ux = x as i64 - dx;
        let uy = y as i64 - dy;
        let lower = if ux >= 0 && uy >= 0 && (ux as u32) < under.width() && (uy as u32) < under.height() {
            *under.get_pixel(ux as u32, uy as u32)
        } else {
            Rgba([0, 0, 0, 0])
        };
        blend(*top.get_pixel(x, y), lower, mode)
    })
}

fn blend(top: Rgba<u8>, lower: Rgba<u8>, mode: BlendMode) -> Rgba<u8> {
    let at = top.0[3] as f32 / 255.0;
    let al = lower.0[3] as f32 / 255.0;

    let (alpha, premul): (f32, [f32; 3]) = match mode {
        BlendMode::Add => {
            let alpha = (at + al).min(1.0);
            let premul = std::array::from_fn(|i| {
                (top.0[i] as f32 / 255.0 * at + lower.0[i] as f32 / 255.0 * al).min(1.0)
            });
            (alpha, premul)
        }
        BlendMode::Over => {
            let alpha = at + al * (1.0 - at);
            let premul = std::array::from_fn(|i| {
                top.0[i] as f32 / 255.0 * at + lower.0[i] as f32 / 255.0 * al * (1.0 - at)
            });
            (alpha, premul)
        }
    };

    if alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |v: f32| ((v / alpha).clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([
        channel(premul[0]),
        channel(premul[1]),
        channel(premul[2]),
        (alpha * 255.0).round() as u8,
    ])
}

/// Dispatch one post-processing step.
pub fn apply_transform(img: &RgbaImage, transform: &Transform) -> RgbaImage {
    match transform {
        Transform::Rot90 => imageops::rotate90(img),
        Transform::Rot180 => imageops::rotate180(img),
        Transform::Rot270 => imageops::rotate270(img),
        Transform::FlipHorizontal => imageops::flip_horizontal(img),
        Transform::FlipVertical => imageops::flip_vertical(img),
        Transform::Crop { x, y, .. } => {
            let (width, height) = transform.output_size(img.dimensions());
            imageops::crop_imm(img, *x, *y, width, height).to_image()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::PresetRegistry;
    use crate::font::BitmapFace;
    use image::Luma;

    fn composer() -> Composer {
        Composer::with_face(Box::new(BitmapFace), RenderSettings::default())
    }

    #[test]
    fn test_monster_output_is_canvas_sized() {
        let registry = PresetRegistry::builtin();
        let request = RenderRequest {
            preset: registry.get("monster").unwrap(),
            id: "mon_test",
            text: &crate::text::normalize("Test Creature"),
            fg: Rgb::WHITE,
            bg: Background::Undefined,
        };
        let img = composer().compose(&request).unwrap();
        assert_eq!(img.dimensions(), (32, 64));
        // south gravity leaves the top rows empty
        assert!((0..32).all(|x| img.get_pixel(x, 0).0[3] == 0));
        assert!(img.pixels().any(|p| p.0[3] > 0));
    }

    #[test]
    fn test_text_pixels_keep_foreground() {
        let registry = PresetRegistry::builtin();
        let request = RenderRequest {
            preset: registry.get("default").unwrap(),
            id: "x",
            text: "I",
            fg: Rgb([255, 0, 0]),
            bg: Background::Undefined,
        };
        let img = composer().compose(&request).unwrap();
        // 'I' stem is column 2, rows 2..9; add blend with a black shadow keeps red
        let px = img.get_pixel(2, 4);
        assert_eq!(px.0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_compose_is_deterministic() {
        let registry = PresetRegistry::builtin();
        let request = RenderRequest {
            preset: registry.get("default").unwrap(),
            id: "x",
            text: "Zombie dog",
            fg: Rgb([80, 200, 80]),
            bg: Background::Undefined,
        };
        let c = composer();
        assert_eq!(c.compose(&request).unwrap(), c.compose(&request).unwrap());
    }

    #[test]
    fn test_gravity_crops_oversized() {
        let mut mask = GrayImage::new(4, 4);
        mask.put_pixel(3, 3, Luma([9]));
        let placed = gravity(&mask, Gravity::SouthEast, (2, 2));
        assert_eq!(placed.get_pixel(1, 1).0[0], 9);
    }

    #[test]
    fn test_shadow_offset_and_add_blend() {
        let top = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 0]));
        let under = RgbaImage::from_pixel(1, 1, Rgba([100, 0, 0, 255]));
        let out = composite_under(&top, &under, 1, 1, BlendMode::Add);
        assert_eq!(out.get_pixel(1, 1).0, [100, 0, 0, 255]);
        assert_eq!(out.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn test_over_keeps_opaque_top() {
        let top = RgbaImage::from_pixel(1, 1, Rgba([0, 255, 0, 255]));
        let under = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 255]));
        assert_eq!(composite_under(&top, &under, 0, 0, BlendMode::Over).get_pixel(0, 0).0, [0, 255, 0, 255]);
    }

    #[test]
    fn test_rot90_swaps_dimensions() {
        let img = RgbaImage::new(48, 32);
        assert_eq!(apply_transform(&img, &Transform::Rot90).dimensions(), (32, 48));
        let cropped = apply_transform(&img, &Transform::Crop { x: 40, y: 0, width: 16, height: 8 });
        assert_eq!(cropped.dimensions(), (8, 8));
    }

    #[test]
    fn test_missing_background_is_error() {
        let registry = PresetRegistry::builtin();
        let settings = RenderSettings {
            backgrounds_dir: Some(PathBuf::from("/nonexistent")),
            ..RenderSettings::default()
        };
        let composer = Composer::with_face(Box::new(BitmapFace), settings);
        let request = RenderRequest {
            preset: registry.get("monster").unwrap(),
            id: "m",
            text: "m",
            fg: Rgb::WHITE,
            bg: Background::Undefined,
        };
        assert!(matches!(composer.compose(&request), Err(ComposeError::Background { .. })));
    }
}
