use image::{GrayImage, Luma, imageops::FilterType};
use vello_cpu::kurbo::RoundedRect;

use crate::{
    foundation::error::{ThumbError, ThumbResult},
    render::raster::{alpha_plane, fill_rounded_rect, rasterize},
};

/// Oversampling factor used before downsampling the mask.
pub const SUPERSAMPLE: u32 = 4;

/// Build an anti-aliased rounded-rectangle opacity mask of `width x height`.
///
/// The shape is filled at [`SUPERSAMPLE`]x resolution and reduced with a Lanczos
/// filter. A radius `<= 0` gives a fully opaque rectangle; radii beyond half the
/// shorter side are clamped, producing a stadium or circle.
pub fn build_mask(width: u32, height: u32, radius: f64) -> ThumbResult<GrayImage> {
    if width == 0 || height == 0 {
        return Err(ThumbError::encode("mask dimensions must be > 0"));
    }
    if radius.is_nan() || radius <= 0.0 {
        return Ok(GrayImage::from_pixel(width, height, Luma([255])));
    }
    let radius = radius.min(f64::from(width.min(height)) / 2.0);

    let k = supersample_factor(width, height);
    let (big_w, big_h) = (width * k, height * k);
    let scale = f64::from(k);
    let shape = RoundedRect::new(0.0, 0.0, f64::from(big_w), f64::from(big_h), radius * scale);

    let pixmap = rasterize(big_w, big_h, |ctx| fill_rounded_rect(ctx, shape))?;
    let big = GrayImage::from_raw(big_w, big_h, alpha_plane(&pixmap))
        .ok_or_else(|| ThumbError::encode("mask buffer length mismatch"))?;

    if k == 1 {
        return Ok(big);
    }
    Ok(image::imageops::resize(
        &big,
        width,
        height,
        FilterType::Lanczos3,
    ))
}

// Oversampled canvases are limited to u16 per side.
fn supersample_factor(width: u32, height: u32) -> u32 {
    (u32::from(u16::MAX) / width.max(height)).clamp(1, SUPERSAMPLE)
}

#[cfg(test)]
#[path = "../../tests/unit/render/mask.rs"]
mod tests;
