use image::{DynamicImage, GrayImage, RgbaImage, imageops::FilterType};
use vello_cpu::kurbo::RoundedRect;

use crate::{
    config::{BorderSpec, Size},
    foundation::error::{ThumbError, ThumbResult},
    render::{
        composite::layer_over_straight_in_place,
        mask::build_mask,
        raster::{rasterize, stroke_rounded_rect},
    },
};

/// Turn a decoded source into the final thumbnail bitmap.
///
/// 1. normalize to RGBA8 (opaque alpha is synthesized when missing)
/// 2. scale to cover `target` and centre-crop the overflow
/// 3. replace alpha with the rounded mask
/// 4. stroke the optional border on its own layer and composite it on top
pub fn transform(
    source: &DynamicImage,
    target: Size,
    radius: f64,
    border: Option<BorderSpec>,
) -> ThumbResult<RgbaImage> {
    let mut out = fit_cover(source.to_rgba8(), target)?;

    let mask = build_mask(target.width, target.height, radius)?;
    apply_mask(&mut out, &mask);

    if let Some(border) = border.filter(|b| b.width > 0.0) {
        let layer = border_layer(target, radius, border)?;
        layer_over_straight_in_place(&mut out, layer.data_as_u8_slice())?;
    }
    Ok(out)
}

/// Resize preserving aspect ratio so the image covers `target`, then crop the centre.
///
/// An image already at `target` is returned as is.
pub fn fit_cover(src: RgbaImage, target: Size) -> ThumbResult<RgbaImage> {
    let (sw, sh) = src.dimensions();
    if sw == 0 || sh == 0 {
        return Err(ThumbError::decode("source image has no pixels"));
    }
    if (sw, sh) == (target.width, target.height) {
        return Ok(src);
    }

    let scale = (f64::from(target.width) / f64::from(sw))
        .max(f64::from(target.height) / f64::from(sh));
    let rw = ((f64::from(sw) * scale).round() as u32).max(target.width);
    let rh = ((f64::from(sh) * scale).round() as u32).max(target.height);

    let resized = image::imageops::resize(&src, rw, rh, FilterType::Lanczos3);
    let (x, y) = ((rw - target.width) / 2, (rh - target.height) / 2);
    Ok(image::imageops::crop_imm(&resized, x, y, target.width, target.height).to_image())
}

/// Overwrite the alpha channel of `img` with `mask`.
pub fn apply_mask(img: &mut RgbaImage, mask: &GrayImage) {
    debug_assert_eq!(img.dimensions(), mask.dimensions());
    for (px, m) in img.pixels_mut().zip(mask.pixels()) {
        px[3] = m[0];
    }
}

fn border_layer(target: Size, radius: f64, border: BorderSpec) -> ThumbResult<vello_cpu::Pixmap> {
    let (w, h) = (f64::from(target.width), f64::from(target.height));
    let inset = (border.width / 2.0).min(w.min(h) / 2.0);
    let corner = (radius.max(0.0) - inset).max(0.0);
    let shape = RoundedRect::new(inset, inset, w - inset, h - inset, corner);

    rasterize(target.width, target.height, |ctx| {
        stroke_rounded_rect(ctx, shape, border.width, border.color)
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/transform.rs"]
mod tests;
