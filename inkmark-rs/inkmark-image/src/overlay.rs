//! Image watermarks: scale the watermark, center it and source-over blend it
//! at reduced opacity.

use crate::{ImageError, open_image, save_max_quality};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    /// Factor applied to both watermark dimensions.
    pub scale: f32,
    /// Multiplier for the watermark's own alpha channel (0.0 to 1.0).
    pub opacity: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            scale: 0.5,
            opacity: 0.5,
        }
    }
}

/// Where a scaled watermark lands on the base image. `x`/`y` go negative when
/// the watermark is larger than the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

pub fn overlay_placement(base: (u32, u32), watermark: (u32, u32), scale: f32) -> Placement {
    let width = scale_dimension(watermark.0, scale);
    let height = scale_dimension(watermark.1, scale);

    Placement {
        x: center_offset(base.0, width),
        y: center_offset(base.1, height),
        width,
        height,
    }
}

fn scale_dimension(value: u32, scale: f32) -> u32 {
    ((value as f64 * f64::from(scale)).round() as u32).max(1)
}

fn center_offset(outer: u32, inner: u32) -> i64 {
    (f64::from(outer) / 2.0 - f64::from(inner) / 2.0).round() as i64
}

/// Blend `watermark` onto the middle of `base` and report where it went.
pub fn composite_watermark(
    base: &mut RgbaImage,
    watermark: &RgbaImage,
    style: &OverlayStyle,
) -> Placement {
    let placement = overlay_placement(base.dimensions(), watermark.dimensions(), style.scale);

    let mut scaled = imageops::resize(
        watermark,
        placement.width,
        placement.height,
        FilterType::Triangle,
    );
    fade(&mut scaled, style.opacity);
    blend_over(base, &scaled, placement.x, placement.y);

    placement
}

fn fade(image: &mut RgbaImage, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    for pixel in image.pixels_mut() {
        pixel.0[3] = (f32::from(pixel.0[3]) * opacity).round() as u8;
    }
}

/// Source-over blend `top` onto `base` with its top-left corner at `(x, y)`.
/// Pixels falling outside `base` are dropped.
pub fn blend_over(base: &mut RgbaImage, top: &RgbaImage, x: i64, y: i64) {
    let (width, height) = (i64::from(base.width()), i64::from(base.height()));

    for (tx, ty, source) in top.enumerate_pixels() {
        let (bx, by) = (x + i64::from(tx), y + i64::from(ty));
        if bx < 0 || by < 0 || bx >= width || by >= height {
            continue;
        }

        let target = base.get_pixel_mut(bx as u32, by as u32);
        *target = source_over(*source, *target);
    }
}

fn source_over(source: Rgba<u8>, target: Rgba<u8>) -> Rgba<u8> {
    let source_alpha = f32::from(source.0[3]) / 255.0;
    if source_alpha == 0.0 {
        return target;
    }

    let target_weight = f32::from(target.0[3]) / 255.0 * (1.0 - source_alpha);
    let out_alpha = source_alpha + target_weight;

    let mut out = [0u8; 4];
    for ((channel, s), t) in out.iter_mut().zip(source.0).zip(target.0).take(3) {
        let blended = (f32::from(s) * source_alpha + f32::from(t) * target_weight) / out_alpha;
        *channel = blended.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;

    Rgba(out)
}

pub fn add_image_watermark(
    input: &Path,
    output: &Path,
    watermark: &Path,
    style: &OverlayStyle,
) -> Result<Placement, ImageError> {
    let mut base = open_image(input)?.to_rgba8();
    let mark = open_image(watermark)?.to_rgba8();

    let placement = composite_watermark(&mut base, &mark, style);
    debug!(?placement, watermark = %watermark.display(), "composited image watermark");

    save_max_quality(&DynamicImage::ImageRgba8(base), output)?;
    Ok(placement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_halves_and_centers() {
        let placement = overlay_placement((100, 80), (40, 20), 0.5);
        assert_eq!(
            placement,
            Placement {
                x: 40,
                y: 35,
                width: 20,
                height: 10,
            }
        );
    }

    #[test]
    fn placement_rounds_odd_dimensions() {
        let placement = overlay_placement((101, 51), (33, 7), 0.5);
        assert_eq!((placement.width, placement.height), (17, 4));
        assert_eq!((placement.x, placement.y), (42, 24));
    }

    #[test]
    fn placement_never_collapses_to_zero() {
        let placement = overlay_placement((10, 10), (1, 1), 0.5);
        assert_eq!((placement.width, placement.height), (1, 1));
    }

    #[test]
    fn oversized_watermark_is_offset_negatively() {
        let placement = overlay_placement((10, 10), (100, 60), 0.5);
        assert_eq!((placement.x, placement.y), (-20, -10));
    }

    #[test]
    fn composite_blends_at_half_opacity() {
        let mut base = RgbaImage::from_pixel(20, 20, Rgba([255, 0, 0, 255]));
        let watermark = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 255, 255]));

        let placement = composite_watermark(&mut base, &watermark, &OverlayStyle::default());
        assert_eq!(
            placement,
            Placement {
                x: 8,
                y: 8,
                width: 5,
                height: 5,
            }
        );

        for y in 8..13 {
            for x in 8..13 {
                assert_eq!(base.get_pixel(x, y).0, [127, 0, 128, 255], "pixel ({x}, {y})");
            }
        }

        assert_eq!(base.get_pixel(7, 10).0, [255, 0, 0, 255]);
        assert_eq!(base.get_pixel(13, 10).0, [255, 0, 0, 255]);
    }

    #[test]
    fn transparent_watermark_pixels_leave_base_untouched() {
        let mut base = RgbaImage::from_pixel(8, 8, Rgba([0, 255, 0, 255]));
        let watermark = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 0]));

        composite_watermark(&mut base, &watermark, &OverlayStyle::default());
        assert!(base.pixels().all(|p| p.0 == [0, 255, 0, 255]));
    }

    #[test]
    fn opaque_base_stays_opaque_for_any_coverage() {
        for alpha in [1u8, 64, 127, 128, 200, 254, 255] {
            let mut base = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 255]));
            let top = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 0, alpha]));

            blend_over(&mut base, &top, 0, 0);
            assert_eq!(base.get_pixel(0, 0).0[3], 255, "coverage {alpha}");
        }
    }

    #[test]
    fn blending_onto_transparent_base_keeps_source_color() {
        let mut base = RgbaImage::new(1, 1);
        let top = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 255, 128]));

        blend_over(&mut base, &top, 0, 0);
        assert_eq!(base.get_pixel(0, 0).0, [0, 0, 255, 128]);
    }

    #[test]
    fn blend_clips_to_base_bounds() {
        let mut base = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let top = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));

        blend_over(&mut base, &top, -2, 3);
        assert_eq!(base.get_pixel(0, 3).0, [0, 0, 0, 255]);
        assert_eq!(base.get_pixel(2, 3).0, [255, 255, 255, 255]);
        assert_eq!(base.get_pixel(0, 2).0, [255, 255, 255, 255]);
    }
}
