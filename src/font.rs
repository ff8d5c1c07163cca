//! Typefaces and text mask rendering
//!
//! Text is laid out greedily: lines break only after spaces, thin spaces and
//! zero-width spaces. A segment that cannot fit on an empty line is broken
//! per character. The result is a single-channel coverage mask sized to the
//! inked text, not to the text box.

use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
use image::GrayImage;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::text::{THIN_SPACE, ZWSP};

#[derive(Debug, Error)]
pub enum FontError {
    #[error("Font file {path} could not be read: {source}")]
    NotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Font file {0} is not a valid TrueType/OpenType font")]
    Invalid(String),
}

/// Glyph metrics and rasterization at a pixel size (72 dpi, so pt == px).
pub trait Typeface {
    fn name(&self) -> &str;

    /// Horizontal advance of `c`.
    fn advance(&self, c: char, size: f32) -> f32;

    /// Distance between the tops of two consecutive lines.
    fn line_height(&self, size: f32) -> f32;

    /// Rasterize `c` with its pen position at `x` on the line whose top edge
    /// is `top`. Coverage is max-combined into `mask`.
    fn draw(&self, c: char, size: f32, x: f32, top: f32, mask: &mut GrayImage);
}

/// `None` selects the built-in bitmap face.
pub fn load_typeface(path: Option<&Path>) -> Result<Box<dyn Typeface>, FontError> {
    match path {
        Some(path) => Ok(Box::new(TrueTypeFace::load(path)?)),
        None => Ok(Box::new(BitmapFace)),
    }
}

fn is_break(c: char) -> bool {
    c == ' ' || c == THIN_SPACE || c == ZWSP
}

fn is_combining(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}')
}

fn measure(face: &dyn Typeface, text: &str, size: f32) -> f32 {
    text.chars().map(|c| face.advance(c, size)).sum()
}

fn ink_width(face: &dyn Typeface, line: &str, size: f32) -> f32 {
    measure(face, line.trim_end_matches(is_break), size)
}

/// Runs of text each ending just after a break opportunity.
fn segments(text: &str) -> Vec<&str> {
    let mut out = vec![];
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if is_break(c) {
            let end = i + c.len_utf8();
            out.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

/// Wrap `text` to `max_width` pixels.
pub fn layout_lines(face: &dyn Typeface, text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = vec![];

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut width = 0.0;

        for seg in segments(paragraph) {
            let ink = ink_width(face, seg, size);
            if !current.is_empty() && width + ink > max_width {
                lines.push(std::mem::take(&mut current));
                width = 0.0;
            }

            if current.is_empty() && ink > max_width {
                for c in seg.chars() {
                    let advance = face.advance(c, size);
                    if !current.is_empty() && advance > 0.0 && width + advance > max_width {
                        lines.push(std::mem::take(&mut current));
                        width = 0.0;
                    }
                    current.push(c);
                    width += advance;
                }
                continue;
            }

            current.push_str(seg);
            width += measure(face, seg, size);
        }

        lines.push(current);
    }

    lines
}

/// Render wrapped text into a mask just large enough to hold it.
pub fn render_mask(face: &dyn Typeface, text: &str, size: f32, max_width: u32) -> GrayImage {
    if text.is_empty() {
        return GrayImage::new(0, 0);
    }

    let lines = layout_lines(face, text, size, max_width as f32);
    let line_height = face.line_height(size);
    let width = lines
        .iter()
        .map(|l| ink_width(face, l, size))
        .fold(0.0f32, f32::max)
        .ceil() as u32;
    let height = (line_height * lines.len() as f32).ceil() as u32;

    let mut mask = GrayImage::new(width, height);
    for (row, line) in lines.iter().enumerate() {
        let top = row as f32 * line_height;
        let mut x = 0.0;
        for c in line.chars() {
            if !is_break(c) {
                face.draw(c, size, x, top, &mut mask);
            }
            x += face.advance(c, size);
        }
    }
    mask
}

fn blend_coverage(mask: &mut GrayImage, x: i64, y: i64, coverage: u8) {
    if x < 0 || y < 0 || x >= mask.width() as i64 || y >= mask.height() as i64 {
        return;
    }
    let px = mask.get_pixel_mut(x as u32, y as u32);
    px.0[0] = px.0[0].max(coverage);
}

// --- TrueType ---

/// Scalable face backed by a font file.
pub struct TrueTypeFace {
    name: String,
    font: FontVec,
}

impl TrueTypeFace {
    pub fn load(path: &Path) -> Result<Self, FontError> {
        let data = fs::read(path).map_err(|source| FontError::NotFound {
            path: path.display().to_string(),
            source,
        })?;
        let font = FontVec::try_from_vec(data)
            .map_err(|_| FontError::Invalid(path.display().to_string()))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, font })
    }
}

impl Typeface for TrueTypeFace {
    fn name(&self) -> &str {
        &self.name
    }

    fn advance(&self, c: char, size: f32) -> f32 {
        if c == ZWSP || is_combining(c) {
            return 0.0;
        }
        let scaled = self.font.as_scaled(PxScale::from(size));
        scaled.h_advance(self.font.glyph_id(c))
    }

    fn line_height(&self, size: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(size));
        scaled.height() + scaled.line_gap()
    }

    fn draw(&self, c: char, size: f32, x: f32, top: f32, mask: &mut GrayImage) {
        let scale = PxScale::from(size);
        let ascent = self.font.as_scaled(scale).ascent();
        let glyph = self
            .font
            .glyph_id(c)
            .with_scale_and_position(scale, point(x, top + ascent));

        if let Some(outlined) = self.font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                blend_coverage(
                    mask,
                    bounds.min.x as i64 + gx as i64,
                    bounds.min.y as i64 + gy as i64,
                    value,
                );
            });
        }
    }
}

// --- Built-in bitmap face ---

/// 5x7 pixel face scaled by whole pixels; one scale step per 10px of size.
///
/// Each line reserves two rows above the glyphs for accents and one below.
pub struct BitmapFace;

const CELL_ADVANCE: u32 = 6;
const THIN_ADVANCE: u32 = 2;
const LINE_ROWS: u32 = 10;
const GLYPH_TOP: u32 = 2;

impl BitmapFace {
    fn scale(size: f32) -> u32 {
        ((size / 10.0).round() as u32).max(1)
    }

    fn columns(c: char) -> [u8; 5] {
        match c as u32 {
            code @ 0x20..=0x7E => GLYPHS_5X7[(code - 0x20) as usize],
            _ => MISSING_GLYPH,
        }
    }

    fn fill(mask: &mut GrayImage, x: i64, y: i64, scale: u32) {
        for dy in 0..scale as i64 {
            for dx in 0..scale as i64 {
                blend_coverage(mask, x + dx, y + dy, 255);
            }
        }
    }
}

impl Typeface for BitmapFace {
    fn name(&self) -> &str {
        "builtin-5x7"
    }

    fn advance(&self, c: char, size: f32) -> f32 {
        let scale = Self::scale(size);
        match c {
            ZWSP => 0.0,
            THIN_SPACE => (THIN_ADVANCE * scale) as f32,
            c if is_combining(c) => 0.0,
            _ => (CELL_ADVANCE * scale) as f32,
        }
    }

    fn line_height(&self, size: f32) -> f32 {
        (LINE_ROWS * Self::scale(size)) as f32
    }

    fn draw(&self, c: char, size: f32, x: f32, top: f32, mask: &mut GrayImage) {
        let s = Self::scale(size);
        let x = x.round() as i64;
        let top = top.round() as i64;

        if is_combining(c) {
            // tick over the previous cell
            let cell = x - (CELL_ADVANCE * s) as i64;
            Self::fill(mask, cell + 3 * s as i64, top, s);
            Self::fill(mask, cell + 2 * s as i64, top + s as i64, s);
            return;
        }

        for (col, bits) in Self::columns(c).iter().enumerate() {
            for row in 0..7 {
                if bits & (1 << row) != 0 {
                    Self::fill(
                        mask,
                        x + (col as u32 * s) as i64,
                        top + ((GLYPH_TOP + row) * s) as i64,
                        s,
                    );
                }
            }
        }
    }
}

const MISSING_GLYPH: [u8; 5] = [0x7F, 0x41, 0x41, 0x41, 0x7F];

/// ASCII 0x20..=0x7E, column-major, bit 0 is the top row.
const GLYPHS_5X7: [[u8; 5]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5F, 0x00, 0x00], // !
    [0x00, 0x07, 0x00, 0x07, 0x00], // "
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // #
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // $
    [0x23, 0x13, 0x08, 0x64, 0x62], // %
    [0x36, 0x49, 0x55, 0x22, 0x50], // &
    [0x00, 0x05, 0x03, 0x00, 0x00], // '
    [0x00, 0x1C, 0x22, 0x41, 0x00], // (
    [0x00, 0x41, 0x22, 0x1C, 0x00], // )
    [0x14, 0x08, 0x3E, 0x08, 0x14], // *
    [0x08, 0x08, 0x3E, 0x08, 0x08], // +
    [0x00, 0x50, 0x30, 0x00, 0x00], // ,
    [0x08, 0x08, 0x08, 0x08, 0x08], // -
    [0x00, 0x60, 0x60, 0x00, 0x00], // .
    [0x20, 0x10, 0x08, 0x04, 0x02], // /
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // 0
    [0x00, 0x42, 0x7F, 0x40, 0x00], // 1
    [0x42, 0x61, 0x51, 0x49, 0x46], // 2
    [0x21, 0x41, 0x45, 0x4B, 0x31], // 3
    [0x18, 0x14, 0x12, 0x7F, 0x10], // 4
    [0x27, 0x45, 0x45, 0x45, 0x39], // 5
    [0x3C, 0x4A, 0x49, 0x49, 0x30], // 6
    [0x01, 0x71, 0x09, 0x05, 0x03], // 7
    [0x36, 0x49, 0x49, 0x49, 0x36], // 8
    [0x06, 0x49, 0x49, 0x29, 0x1E], // 9
    [0x00, 0x36, 0x36, 0x00, 0x00], // :
    [0x00, 0x56, 0x36, 0x00, 0x00], // ;
    [0x08, 0x14, 0x22, 0x41, 0x00], // <
    [0x14, 0x14, 0x14, 0x14, 0x14], // =
    [0x00, 0x41, 0x22, 0x14, 0x08], // >
    [0x02, 0x01, 0x51, 0x09, 0x06], // ?
    [0x32, 0x49, 0x79, 0x41, 0x3E], // @
    [0x7E, 0x11, 0x11, 0x11, 0x7E], // A
    [0x7F, 0x49, 0x49, 0x49, 0x36], // B
    [0x3E, 0x41, 0x41, 0x41, 0x22], // C
    [0x7F, 0x41, 0x41, 0x22, 0x1C], // D
    [0x7F, 0x49, 0x49, 0x49, 0x41], // E
    [0x7F, 0x09, 0x09, 0x09, 0x01], // F
    [0x3E, 0x41, 0x49, 0x49, 0x7A], // G
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // H
    [0x00, 0x41, 0x7F, 0x41, 0x00], // I
    [0x20, 0x40, 0x41, 0x3F, 0x01], // J
    [0x7F, 0x08, 0x14, 0x22, 0x41], // K
    [0x7F, 0x40, 0x40, 0x40, 0x40], // L
    [0x7F, 0x02, 0x0C, 0x02, 0x7F], // M
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // N
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // O
    [0x7F, 0x09, 0x09, 0x09, 0x06], // P
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // Q
    [0x7F, 0x09, 0x19, 0x29, 0x46], // R
    [0x46, 0x49, 0x49, 0x49, 0x31], // S
    [0x01, 0x01, 0x7F, 0x01, 0x01], // T
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // U
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // V
    [0x3F, 0x40, 0x38, 0x40, 0x3F], // W
    [0x63, 0x14, 0x08, 0x14, 0x63], // X
    [0x07, 0x08, 0x70, 0x08, 0x07], // Y
    [0x61, 0x51, 0x49, 0x45, 0x43], // Z
    [0x00, 0x7F, 0x41, 0x41, 0x00], // [
    [0x02, 0x04, 0x08, 0x10, 0x20], // \
    [0x00, 0x41, 0x41, 0x7F, 0x00], // ]
    [0x04, 0x02, 0x01, 0x02, 0x04], // ^
    [0x40, 0x40, 0x40, 0x40, 0x40], // _
    [0x00, 0x01, 0x02, 0x04, 0x00], // `
    [0x20, 0x54, 0x54, 0x54, 0x78], // a
    [0x7F, 0x48, 0x44, 0x44, 0x38], // b
    [0x38, 0x44, 0x44, 0x44, 0x20], // c
    [0x38, 0x44, 0x44, 0x48, 0x7F], // d
    [0x38, 0x54, 0x54, 0x54, 0x18], // e
    [0x08, 0x7E, 0x09, 0x01, 0x02], // f
    [0x0C, 0x52, 0x52, 0x52, 0x3E], // g
    [0x7F, 0x08, 0x04, 0x04, 0x78], // h
    [0x00, 0x44, 0x7D, 0x40, 0x00], // i
    [0x20, 0x40, 0x44, 0x3D, 0x00], // j
    [0x7F, 0x10, 0x28, 0x44, 0x00], // k
    [0x00, 0x41, 0x7F, 0x40, 0x00], // l
    [0x7C, 0x04, 0x18, 0x04, 0x78], // m
    [0x7C, 0x08, 0x04, 0x04, 0x78], // n
    [0x38, 0x44, 0x44, 0x44, 0x38], // o
    [0x7C, 0x14, 0x14, 0x14, 0x08], // p
    [0x08, 0x14, 0x14, 0x18, 0x7C], // q
    [0x7C, 0x08, 0x04, 0x04, 0x08], // r
    [0x48, 0x54, 0x54, 0x54, 0x20], // s
    [0x04, 0x3F, 0x44, 0x40, 0x20], // t
    [0x3C, 0x40, 0x40, 0x20, 0x7C], // u
    [0x1C, 0x20, 0x40, 0x20, 0x1C], // v
    [0x3C, 0x40, 0x30, 0x40, 0x3C], // w
    [0x44, 0x28, 0x10, 0x28, 0x44], // x
    [0x0C, 0x50, 0x50, 0x50, 0x3C], // y
    [0x44, 0x64, 0x54, 0x4C, 0x44], // z
    [0x00, 0x08, 0x36, 0x41, 0x00], // {
    [0x00, 0x00, 0x7F, 0x00, 0x00], // |
    [0x00, 0x41, 0x36, 0x08, 0x00], // }
    [0x08, 0x04, 0x08, 0x10, 0x08], // ~
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_end_after_breaks() {
        let text = format!("ab{ZWSP}cd ef");
        assert_eq!(segments(&text), vec![format!("ab{ZWSP}").as_str(), "cd ", "ef"]);
    }

    #[test]
    fn test_short_text_single_line() {
        let lines = layout_lines(&BitmapFace, "Wolf", 10.0, 32.0);
        assert_eq!(lines, vec!["Wolf"]);
    }

    #[test]
    fn test_wraps_at_break_opportunities() {
        let text = format!("Test{THIN_SPACE}Crea{ZWSP}ture");
        let lines = layout_lines(&BitmapFace, &text, 10.0, 32.0);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Test"));
        assert!(lines[1].starts_with("Crea"));
        assert_eq!(lines[2], "ture");
    }

    #[test]
    fn test_long_word_breaks_per_char() {
        let lines = layout_lines(&BitmapFace, "abcdefghijkl", 10.0, 32.0);
        assert_eq!(lines, vec!["abcde", "fghij", "kl"]);
    }

    #[test]
    fn test_mask_sized_to_ink() {
        let mask = render_mask(&BitmapFace, "Hi", 10.0, 32);
        assert_eq!(mask.dimensions(), (12, 10));
        assert!(mask.pixels().any(|p| p.0[0] == 255));
        // accent rows stay blank without combining marks
        assert!((0..12).all(|x| mask.get_pixel(x, 0).0[0] == 0));
    }

    #[test]
    fn test_combining_mark_has_no_advance() {
        let plain = render_mask(&BitmapFace, "ab", 10.0, 64);
        let accented = render_mask(&BitmapFace, "a\u{0301}b", 10.0, 64);
        assert_eq!(plain.dimensions(), accented.dimensions());
        assert!(accented.get_pixel(3, 0).0[0] == 255);
    }

    #[test]
    fn test_scale_follows_font_size() {
        let mask = render_mask(&BitmapFace, "A", 20.0, 64);
        assert_eq!(mask.dimensions(), (12, 20));
    }

    #[test]
    fn test_missing_font_file() {
        let result = load_typeface(Some(Path::new("/nonexistent/font.ttf")));
        assert!(matches!(result, Err(FontError::NotFound { .. })));
    }

    #[test]
    fn test_empty_text_empty_mask() {
        assert_eq!(render_mask(&BitmapFace, "", 10.0, 32).dimensions(), (0, 0));
    }
}
