use vello_cpu::kurbo::{RoundedRect, Shape as _};

use crate::foundation::error::{ThumbError, ThumbResult};

const PATH_TOLERANCE: f64 = 0.1;

/// Draw onto a fresh fully transparent canvas and return its premultiplied RGBA8 pixels.
pub(crate) fn rasterize(
    width: u32,
    height: u32,
    draw: impl FnOnce(&mut vello_cpu::RenderContext),
) -> ThumbResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ThumbError::encode("canvas width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ThumbError::encode("canvas height exceeds u16"))?;

    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    let mut ctx = vello_cpu::RenderContext::new(w, h);
    draw(&mut ctx);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);
    Ok(pixmap)
}

/// Fill `shape` in opaque white.
pub(crate) fn fill_rounded_rect(ctx: &mut vello_cpu::RenderContext, shape: RoundedRect) {
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
    ctx.fill_path(&shape.to_path(PATH_TOLERANCE));
}

/// Rounded rectangle outline centred on the shape edge.
pub(crate) fn stroke_rounded_rect(
    ctx: &mut vello_cpu::RenderContext,
    shape: RoundedRect,
    width: f64,
    [r, g, b, a]: [u8; 4],
) {
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
    ctx.stroke_path(&shape.to_path(PATH_TOLERANCE));
}

/// Alpha channel of a premultiplied RGBA8 pixmap.
pub(crate) fn alpha_plane(pixmap: &vello_cpu::Pixmap) -> Vec<u8> {
    pixmap
        .data_as_u8_slice()
        .chunks_exact(4)
        .map(|px| px[3])
        .collect()
}
