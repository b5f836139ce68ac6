use crate::foundation::error::{ThumbError, ThumbResult};

/// Premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Porter-Duff source-over on premultiplied pixels.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(src[3]);

    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255(u16::from(dst[i]), inv));
    }
    out
}

/// Composite a premultiplied layer over a straight-alpha RGBA8 buffer in place.
///
/// Pixels where the layer is fully transparent are left bit-for-bit unchanged.
pub fn layer_over_straight_in_place(dst: &mut [u8], layer_premul: &[u8]) -> ThumbResult<()> {
    if dst.len() != layer_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(ThumbError::encode(
            "layer_over_straight_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(layer_premul.chunks_exact(4)) {
        if s[3] == 0 {
            continue;
        }
        let below = premultiply([d[0], d[1], d[2], d[3]]);
        let out = over(below, [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&unpremultiply(out));
    }
    Ok(())
}

pub(crate) fn premultiply(px: [u8; 4]) -> PremulRgba8 {
    let a = u16::from(px[3]);
    [
        mul_div255(u16::from(px[0]), a),
        mul_div255(u16::from(px[1]), a),
        mul_div255(u16::from(px[2]), a),
        px[3],
    ]
}

pub(crate) fn unpremultiply(px: PremulRgba8) -> [u8; 4] {
    let a = u32::from(px[3]);
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let un = |c: u8| ((u32::from(c) * 255 + a / 2) / a).min(255) as u8;
    [un(px[0]), un(px[1]), un(px[2]), px[3]]
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
