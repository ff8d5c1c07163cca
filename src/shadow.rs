//! Shadow Renderer - fill color policies for the drop shadow

use image::{imageops, GrayImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::colors::{Background, Rgb};
use crate::compose::paint_mask;

/// Foregrounds at or below this average get a white shadow.
pub const DARK_THRESHOLD: f32 = 32.0;

pub const DEFAULT_BLUR: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ShadowMethod {
    /// Black, or white for very dark text.
    #[default]
    MostlyBlack,
    /// Inverted grayscale of the text color.
    InvertAll,
    /// Background color when defined, otherwise as `invert_all`.
    InvertUndefined,
}

/// Fill color of the shadow for a text/background pair.
pub fn shadow_color(fg: Rgb, bg: Background, method: ShadowMethod) -> Rgb {
    match method {
        ShadowMethod::MostlyBlack => {
            if fg.brightness() > DARK_THRESHOLD {
                Rgb::BLACK
            } else {
                Rgb::WHITE
            }
        }
        ShadowMethod::InvertAll => fg.inverted_gray(),
        ShadowMethod::InvertUndefined => match bg {
            Background::Undefined => fg.inverted_gray(),
            Background::Color(color) => color,
        },
    }
}

/// Shadow layer: the boxed mask painted with the shadow color, then blurred.
pub fn render_shadow(mask: &GrayImage, fg: Rgb, bg: Background, method: ShadowMethod, blur: f32) -> RgbaImage {
    let layer = paint_mask(mask, shadow_color(fg, bg, method));
    if blur > 0.0 && layer.width() > 0 && layer.height() > 0 {
        imageops::blur(&layer, blur)
    } else {
        layer
    }
}
