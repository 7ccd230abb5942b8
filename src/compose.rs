//! Fixed-point pixel blending on premultiplied RGBA8 buffers.
//!
//! All compositing in this crate reduces to source-over blits of premultiplied
//! tiles onto a canvas-sized surface, so the arithmetic lives here in one
//! place. Integer-only math keeps output byte-identical across platforms.

use crate::foundation::core::Canvas;
use crate::foundation::error::{UnderlayError, UnderlayResult};

pub type PremulRgba8 = [u8; 4];

/// Source-over blend of one premultiplied pixel onto another.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let sa = src[3];
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    for i in 0..4 {
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(src[i], dc);
    }
    out
}

/// Premultiply a straight-alpha color by a coverage value.
///
/// This is how a glyph coverage tile becomes a colored shadow tile: each
/// coverage byte tints the shadow color and doubles as the pixel alpha.
pub fn tint(coverage: u8, r: u8, g: u8, b: u8) -> PremulRgba8 {
    let cov = u16::from(coverage);
    [
        mul_div255(u16::from(r), cov),
        mul_div255(u16::from(g), cov),
        mul_div255(u16::from(b), cov),
        coverage,
    ]
}

/// Source-over blit of a premultiplied tile onto a canvas-sized surface.
///
/// `origin_x`/`origin_y` position the tile's top-left corner in canvas
/// coordinates and may be negative; rows and columns falling outside the
/// canvas are clipped away pixel-exactly.
pub fn blit_over(
    dst: &mut [u8],
    dst_canvas: Canvas,
    src: &[u8],
    src_width: u32,
    src_height: u32,
    origin_x: i64,
    origin_y: i64,
) -> UnderlayResult<()> {
    if dst.len() != dst_canvas.pixel_count() * 4 {
        return Err(UnderlayError::render(
            "blit_over destination length does not match its canvas",
        ));
    }
    if src.len() != src_width as usize * src_height as usize * 4 {
        return Err(UnderlayError::render(
            "blit_over source length does not match its dimensions",
        ));
    }

    let dst_w = i64::from(dst_canvas.width);
    let dst_h = i64::from(dst_canvas.height);
    let src_w = i64::from(src_width);
    let src_h = i64::from(src_height);

    let x0 = origin_x.max(0);
    let y0 = origin_y.max(0);
    let x1 = origin_x.saturating_add(src_w).min(dst_w);
    let y1 = origin_y.saturating_add(src_h).min(dst_h);
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }

    for dy in y0..y1 {
        let sy = dy - origin_y;
        let src_row = sy as usize * src_width as usize * 4;
        let dst_row = dy as usize * dst_canvas.width as usize * 4;
        for dx in x0..x1 {
            let sx = (dx - origin_x) as usize;
            let si = src_row + sx * 4;
            let di = dst_row + dx as usize * 4;
            let out = over(
                [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]],
                [src[si], src[si + 1], src[si + 2], src[si + 3]],
            );
            dst[di..di + 4].copy_from_slice(&out);
        }
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}
