use std::path::Path;

use image::DynamicImage;

use crate::foundation::error::{ThumbError, ThumbResult};

/// Decode an image file, sniffing the format from its contents rather than its name.
pub fn decode_image_file(path: &Path) -> ThumbResult<DynamicImage> {
    let reader = image::ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| ThumbError::decode(format!("read '{}': {e}", path.display())))?;
    reader
        .decode()
        .map_err(|e| ThumbError::decode(format!("'{}': {e}", path.display())))
}

/// Decode encoded image bytes.
pub fn decode_image(bytes: &[u8]) -> ThumbResult<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| ThumbError::decode(format!("in-memory image: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
