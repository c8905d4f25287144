use std::path::{Path, PathBuf};

pub const OUTPUT_SUFFIX: &str = "with-watermark";

/// Derive the output file name for a watermarked image.
///
/// The name is split on `.`: the first segment becomes the base and the
/// second the extension, so `"a.b.jpg"` yields `"a-with-watermark.b"`.
/// Names without a dot get no extension at all.
pub fn prepare_output_filename(name: &str) -> String {
    let mut segments = name.split('.');
    let base = segments.next().unwrap_or_default();

    match segments.next() {
        Some(extension) => format!("{base}-{OUTPUT_SUFFIX}.{extension}"),
        None => format!("{base}-{OUTPUT_SUFFIX}"),
    }
}

/// Resolve a user-supplied file name against the image directory.
pub fn image_path(image_dir: &Path, name: &str) -> PathBuf {
    image_dir.join(name)
}

/// Resolve `name` against the image directory, returning the path only when a
/// file exists there right now.
pub fn existing_image(image_dir: &Path, name: &str) -> Option<PathBuf> {
    let path = image_path(image_dir, name);
    path.is_file().then_some(path)
}

pub fn trimmed_or_none(input: Option<&str>) -> Option<&str> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
