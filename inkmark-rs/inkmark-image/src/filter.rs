use image::RgbaImage;
use std::fmt;

/// Strength of the brightness and contrast filters on a `[-1, 1]` scale.
pub const FILTER_INTENSITY: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Brightness,
    Contrast,
    Grayscale,
    Invert,
}

impl FilterKind {
    pub const ALL: [FilterKind; 4] = [
        FilterKind::Brightness,
        FilterKind::Contrast,
        FilterKind::Grayscale,
        FilterKind::Invert,
    ];

    /// Menu label shown to the user.
    pub fn label(self) -> &'static str {
        match self {
            FilterKind::Brightness => "make image brighter",
            FilterKind::Contrast => "increase contrast",
            FilterKind::Grayscale => "make image b&w",
            FilterKind::Invert => "invert image",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == label)
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Transform every pixel of `image` in place. Alpha is never touched.
pub fn filter_image(image: &mut RgbaImage, kind: FilterKind) {
    match kind {
        FilterKind::Brightness => map_color_channels(image, |c| brighten(c, FILTER_INTENSITY)),
        FilterKind::Contrast => {
            let factor = contrast_factor(FILTER_INTENSITY);
            map_color_channels(image, |c| stretch(c, factor));
        }
        FilterKind::Grayscale => {
            for pixel in image.pixels_mut() {
                let [r, g, b, _] = pixel.0;
                let luma = (0.2126 * f32::from(r) + 0.7152 * f32::from(g) + 0.0722 * f32::from(b))
                    as u8;
                pixel.0[..3].fill(luma);
            }
        }
        FilterKind::Invert => map_color_channels(image, |c| 255 - c),
    }
}

fn map_color_channels(image: &mut RgbaImage, op: impl Fn(u8) -> u8) {
    for pixel in image.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = op(*channel);
        }
    }
}

fn brighten(channel: u8, amount: f32) -> u8 {
    let value = f32::from(channel);
    let adjusted = if amount < 0.0 {
        value * (1.0 + amount)
    } else {
        value + (255.0 - value) * amount
    };
    adjusted.clamp(0.0, 255.0) as u8
}

fn contrast_factor(amount: f32) -> f32 {
    (amount + 1.0) / (1.0 - amount)
}

fn stretch(channel: u8, factor: f32) -> u8 {
    (factor * (f32::from(channel) - 127.0) + 127.0)
        .floor()
        .clamp(0.0, 255.0) as u8
}
