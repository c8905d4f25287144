use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

mod filter;
mod overlay;
mod text;

pub use filter::{FILTER_INTENSITY, FilterKind, filter_image};
pub use overlay::{
    OverlayStyle, Placement, add_image_watermark, blend_over, composite_watermark,
    overlay_placement,
};
pub use text::{
    Color, TextStyle, add_text_watermark, bundled_font, load_font, parse_hex_color,
    render_text_layer,
};

/// JPEG quality used for every write; other encoders are lossless or ignore it.
pub const MAX_QUALITY: u8 = 100;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to open image {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to encode image to {path}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot infer an image format from {path}")]
    UnsupportedFormat { path: PathBuf },
    #[error("bundled font could not be parsed")]
    BundledFont,
    #[error("font file {path} could not be parsed")]
    InvalidFont { path: PathBuf },
    #[error("invalid color {value:?}: {reason}")]
    InvalidColor { value: String, reason: &'static str },
}

/// Decode the image stored at `path`, sniffing the format from its contents.
pub fn open_image(path: &Path) -> Result<DynamicImage, ImageError> {
    let open_error = |source| ImageError::Open {
        path: path.to_path_buf(),
        source,
    };

    let reader = ImageReader::open(path)
        .map_err(open_error)?
        .with_guessed_format()
        .map_err(open_error)?;

    reader.decode().map_err(|source| ImageError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Encode `image` to `path`, choosing the format from the file extension.
///
/// JPEG output is written at [`MAX_QUALITY`] and loses any alpha channel.
pub fn save_max_quality(image: &DynamicImage, path: &Path) -> Result<(), ImageError> {
    let format = ImageFormat::from_path(path).map_err(|_| ImageError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    let encode_error = |source| ImageError::Encode {
        path: path.to_path_buf(),
        source,
    };
    let io_error = |source| ImageError::Io {
        path: path.to_path_buf(),
        source,
    };

    match format {
        ImageFormat::Jpeg => {
            let file = File::create(path).map_err(io_error)?;
            let mut writer = BufWriter::new(file);
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, MAX_QUALITY);
            encoder.encode_image(&image.to_rgb8()).map_err(encode_error)?;
            writer.flush().map_err(io_error)?;
        }
        _ => image.save_with_format(path, format).map_err(encode_error)?,
    }

    debug!(path = %path.display(), ?format, "wrote image");
    Ok(())
}

/// Apply a single filter to the image at `path`, overwriting it in place.
pub fn apply_filter(path: &Path, kind: FilterKind) -> Result<(), ImageError> {
    let mut image = open_image(path)?.to_rgba8();
    filter_image(&mut image, kind);
    save_max_quality(&DynamicImage::ImageRgba8(image), path)
}
