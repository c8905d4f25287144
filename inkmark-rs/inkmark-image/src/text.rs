//! Text watermarks.
//!
//! Text is laid out on a transparent layer the size of the base image: words
//! are wrapped to the image width, each line is centered horizontally and the
//! whole block is centered vertically. The layer is then blended onto the base.

use crate::overlay::blend_over;
use crate::{ImageError, open_image, save_max_quality};
use ab_glyph::{Font, FontArc, GlyphId, PxScale, PxScaleFont, ScaleFont, point};
use image::{DynamicImage, Rgba, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// DejaVu Sans, used whenever no usable font file is configured.
const BUNDLED_FONT: &[u8] = include_bytes!("fonts/DejaVuSans.ttf");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }
}

/// Parse `#RGB` or `#RRGGBB`.
pub fn parse_hex_color(value: &str) -> Result<Color, ImageError> {
    let invalid = |reason| ImageError::InvalidColor {
        value: value.to_string(),
        reason,
    };

    let hex = value
        .trim()
        .strip_prefix('#')
        .ok_or_else(|| invalid("color must start with '#'"))?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("color contains a non-hex digit"));
    }

    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid("bad digit"));

    match hex.len() {
        // #RGB doubles each digit: 0xA -> 0xAA
        3 => Ok(Color::new(
            channel(&hex[0..1])? * 17,
            channel(&hex[1..2])? * 17,
            channel(&hex[2..3])? * 17,
        )),
        6 => Ok(Color::new(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        _ => Err(invalid("color must be #RGB or #RRGGBB")),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Glyph height in pixels.
    pub font_size: f32,
    pub color: Color,
    /// Font file to render with. Falls back to the bundled DejaVu Sans.
    pub font_path: Option<PathBuf>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 32.0,
            color: Color::black(),
            font_path: None,
        }
    }
}

pub fn bundled_font() -> Result<FontArc, ImageError> {
    FontArc::try_from_slice(BUNDLED_FONT).map_err(|_| ImageError::BundledFont)
}

/// Load the configured font, or the bundled one when none is configured or
/// the configured file is missing. A file that exists but does not parse is
/// an error.
pub fn load_font(configured: Option<&Path>) -> Result<FontArc, ImageError> {
    let Some(path) = configured else {
        return bundled_font();
    };
    if !path.is_file() {
        warn!(path = %path.display(), "configured font not found, using bundled font");
        return bundled_font();
    }

    let bytes = fs::read(path).map_err(|source| ImageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let font = FontArc::try_from_vec(bytes).map_err(|_| ImageError::InvalidFont {
        path: path.to_path_buf(),
    })?;

    debug!(path = %path.display(), "loaded font");
    Ok(font)
}

/// Render `text` onto a transparent `width` x `height` layer.
pub fn render_text_layer(
    font: &FontArc,
    text: &str,
    width: u32,
    height: u32,
    style: &TextStyle,
) -> RgbaImage {
    let scaled = font.as_scaled(PxScale::from(style.font_size));
    let lines = wrap_lines(&scaled, text, width as f32);

    let line_height = scaled.height() + scaled.line_gap();
    let block_height = line_height * lines.len() as f32;
    let mut top = (height as f32 - block_height) / 2.0;

    let mut layer = RgbaImage::new(width, height);
    for line in &lines {
        let left = (width as f32 - line_width(&scaled, line)) / 2.0;
        draw_line(&scaled, &mut layer, line, left, top + scaled.ascent(), style.color);
        top += line_height;
    }

    layer
}

fn line_width(font: &PxScaleFont<&FontArc>, line: &str) -> f32 {
    let mut width = 0.0;
    let mut previous: Option<GlyphId> = None;

    for c in line.chars() {
        let id = font.glyph_id(c);
        if let Some(prev) = previous {
            width += font.kern(prev, id);
        }
        width += font.h_advance(id);
        previous = Some(id);
    }

    width
}

/// Greedy word wrap; explicit newlines always break. A single word wider
/// than `max_width` gets a line of its own.
fn wrap_lines(font: &PxScaleFont<&FontArc>, text: &str, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }

            let candidate = format!("{current} {word}");
            if line_width(font, &candidate) > max_width {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }

    lines
}

fn draw_line(
    font: &PxScaleFont<&FontArc>,
    layer: &mut RgbaImage,
    line: &str,
    left: f32,
    baseline: f32,
    color: Color,
) {
    let (width, height) = (i64::from(layer.width()), i64::from(layer.height()));
    let mut cursor = left;
    let mut previous: Option<GlyphId> = None;

    for c in line.chars() {
        let id = font.glyph_id(c);
        if let Some(prev) = previous {
            cursor += font.kern(prev, id);
        }

        let glyph = id.with_scale_and_position(font.scale, point(cursor, baseline));
        if let Some(outlined) = font.font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let x = bounds.min.x as i64 + i64::from(px);
                let y = bounds.min.y as i64 + i64::from(py);
                if x < 0 || y < 0 || x >= width || y >= height {
                    return;
                }

                let alpha = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                let pixel = layer.get_pixel_mut(x as u32, y as u32);
                // overlapping glyph edges keep the stronger coverage
                if alpha > pixel.0[3] {
                    *pixel = Rgba([color.r, color.g, color.b, alpha]);
                }
            });
        }

        cursor += font.h_advance(id);
        previous = Some(id);
    }
}

/// Print `text` over the middle of the image at `input` and write the result
/// to `output`. Blank text leaves the image unchanged and needs no font.
pub fn add_text_watermark(
    input: &Path,
    output: &Path,
    text: &str,
    style: &TextStyle,
) -> Result<(), ImageError> {
    let mut base = open_image(input)?.to_rgba8();

    if text.trim().is_empty() {
        debug!("watermark text is blank, copying image unchanged");
    } else {
        let font = load_font(style.font_path.as_deref())?;
        let layer = render_text_layer(&font, text, base.width(), base.height(), style);
        blend_over(&mut base, &layer, 0, 0);
    }

    save_max_quality(&DynamicImage::ImageRgba8(base), output)
}
