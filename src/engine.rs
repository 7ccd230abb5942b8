//! Deterministic layered compositing.
//!
//! One frame is always the same five blits in the same order: background
//! copy, optional shadow tile, glyph tile, then the foreground cutout over
//! everything. Identical inputs produce identical bytes; there is no hidden
//! state between renders.

use kurbo::Point;

use crate::blur::gaussian_blur_premul;
use crate::compose::{blit_over, tint};
use crate::fonts::FontCatalog;
use crate::foundation::error::UnderlayResult;
use crate::raster::RasterImage;
use crate::style::{ShadowSpec, TextStyleSpec};
use crate::text::{GlyphTile, TextRasterizer};

/// Renders styled text between a background photo and its foreground cutout.
///
/// The engine owns the text rasterizer (and through it the font catalog) but
/// no image state: layers and position arrive with every call, so a render
/// can never observe a previous one.
pub struct CompositingEngine {
    rasterizer: TextRasterizer,
}

impl Default for CompositingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositingEngine {
    /// Engine with an empty font catalog.
    pub fn new() -> Self {
        Self {
            rasterizer: TextRasterizer::new(FontCatalog::new()),
        }
    }

    /// Engine with OS fonts discovered up front.
    pub fn with_system_fonts() -> Self {
        Self {
            rasterizer: TextRasterizer::with_system_fonts(),
        }
    }

    /// Engine over a caller-built rasterizer.
    pub fn with_rasterizer(rasterizer: TextRasterizer) -> Self {
        Self { rasterizer }
    }

    /// The session's font catalog.
    pub fn fonts(&self) -> &FontCatalog {
        self.rasterizer.catalog()
    }

    /// Mutable catalog access, e.g. to register faces before rendering.
    pub fn fonts_mut(&mut self) -> &mut FontCatalog {
        self.rasterizer.catalog_mut()
    }

    /// Compose one frame.
    ///
    /// `position` is the text anchor (tile center) in background pixel
    /// coordinates. The output always spans the background's canvas; a
    /// foreground of a different size is blitted at the origin and clipped.
    #[tracing::instrument(skip_all)]
    pub fn render(
        &mut self,
        background: &RasterImage,
        foreground: &RasterImage,
        style: &TextStyleSpec,
        position: Point,
    ) -> UnderlayResult<RasterImage> {
        style.validate()?;
        if background.canvas() != foreground.canvas() {
            tracing::warn!(
                bg_w = background.width(),
                bg_h = background.height(),
                fg_w = foreground.width(),
                fg_h = foreground.height(),
                "foreground size differs from background; clipping at origin"
            );
        }

        let tile = self.rasterizer.rasterize(style)?;
        compose(background, foreground, &tile, style.shadow.as_ref(), position)
    }
}

/// The fixed draw order, working entirely on premultiplied buffers.
fn compose(
    background: &RasterImage,
    foreground: &RasterImage,
    tile: &GlyphTile,
    shadow: Option<&ShadowSpec>,
    position: Point,
) -> UnderlayResult<RasterImage> {
    let canvas = background.canvas();
    let mut out = background.data().to_vec();

    if !tile.is_empty() {
        let origin_x = (position.x - f64::from(tile.width()) / 2.0).round() as i64;
        let origin_y = (position.y - f64::from(tile.height()) / 2.0).round() as i64;

        if let Some(shadow) = shadow {
            let shadow_tile = shadow_tile(tile, shadow)?;
            let pad = i64::from(shadow.blur_px);
            blit_over(
                &mut out,
                canvas,
                shadow_tile.data(),
                shadow_tile.width(),
                shadow_tile.height(),
                origin_x + i64::from(shadow.offset_x_px) - pad,
                origin_y + i64::from(shadow.offset_y_px) - pad,
            )?;
        }

        blit_over(
            &mut out,
            canvas,
            tile.data(),
            tile.width(),
            tile.height(),
            origin_x,
            origin_y,
        )?;
    }

    blit_over(
        &mut out,
        canvas,
        foreground.data(),
        foreground.width(),
        foreground.height(),
        0,
        0,
    )?;

    RasterImage::from_premul_rgba8(canvas.width, canvas.height, out)
}

/// Tint the tile's coverage with the shadow color, pad by the blur radius on
/// every side, and blur.
///
/// A tile with no coverage produces an all-transparent shadow, so an attached
/// shadow can never mark the frame where the text itself would not.
fn shadow_tile(tile: &GlyphTile, shadow: &ShadowSpec) -> UnderlayResult<GlyphTile> {
    let pad = shadow.blur_px;
    let width = tile.width() + 2 * pad;
    let height = tile.height() + 2 * pad;
    let mut data = vec![0u8; width as usize * height as usize * 4];

    for y in 0..tile.height() {
        for x in 0..tile.width() {
            let src = (y as usize * tile.width() as usize + x as usize) * 4;
            let coverage = tile.data()[src + 3];
            if coverage == 0 {
                continue;
            }
            let px = tint(coverage, shadow.color.r, shadow.color.g, shadow.color.b);
            let dst = ((y + pad) as usize * width as usize + (x + pad) as usize) * 4;
            data[dst..dst + 4].copy_from_slice(&px);
        }
    }

    let data = gaussian_blur_premul(&data, width, height, pad, pad as f32 / 2.0)?;
    GlyphTile::from_premul(width, height, data)
}
