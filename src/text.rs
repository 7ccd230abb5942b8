//! Text shaping and glyph rasterization into standalone tiles.
//!
//! A [`GlyphTile`] is the styled text rendered alone on a transparent,
//! tightly sized surface. The engine later drops the tile between the photo
//! layers; keeping rasterization separate means shadow tinting and placement
//! never touch the shaping code.

use crate::fonts::FontCatalog;
use crate::foundation::error::{UnderlayError, UnderlayResult};
use crate::style::TextStyleSpec;

/// RGBA8 brush color carried through Parley layout styles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct GlyphBrush {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

/// Styled text rendered to a premultiplied RGBA8 tile of its own extent.
///
/// The tile is anchored by its center when placed on a canvas. A zero-sized
/// tile means "nothing to draw" and composites as a no-op.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphTile {
    width: u32,
    height: u32,
    rgba8_premul: Vec<u8>,
}

impl GlyphTile {
    pub(crate) fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            rgba8_premul: Vec::new(),
        }
    }

    pub(crate) fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> UnderlayResult<Self> {
        if rgba8_premul.len() != width as usize * height as usize * 4 {
            return Err(UnderlayError::render(
                "glyph tile byte length must equal width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul,
        })
    }

    /// Tile width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Tile height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.rgba8_premul
    }

    /// Return `true` when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Shapes styled text with Parley and rasterizes it with the CPU glyph
/// renderer.
///
/// Owns the session's [`FontCatalog`] plus a reusable layout context.
pub struct TextRasterizer {
    catalog: FontCatalog,
    layout_ctx: parley::LayoutContext<GlyphBrush>,
}

impl TextRasterizer {
    /// Rasterizer over an existing catalog.
    pub fn new(catalog: FontCatalog) -> Self {
        Self {
            catalog,
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Rasterizer over a catalog pre-populated with OS fonts.
    pub fn with_system_fonts() -> Self {
        let mut catalog = FontCatalog::new();
        catalog.ensure_system_fonts();
        Self::new(catalog)
    }

    /// The session's font catalog.
    pub fn catalog(&self) -> &FontCatalog {
        &self.catalog
    }

    /// Mutable access, e.g. to register extra faces.
    pub fn catalog_mut(&mut self) -> &mut FontCatalog {
        &mut self.catalog
    }

    /// Shape and rasterize `style` into a tile.
    ///
    /// Empty content yields an empty tile. A family with no usable face is
    /// non-fatal: after fallback fails the text layer is skipped with a
    /// warning, matching how a missing layer should degrade in an editor.
    /// Each glyph run draws with the face Parley shaped it with, so script
    /// fallback inside the content keeps its glyph ids valid.
    pub fn rasterize(&mut self, style: &TextStyleSpec) -> UnderlayResult<GlyphTile> {
        style.validate()?;
        if style.content.is_empty() {
            return Ok(GlyphTile::empty());
        }

        let Some(family) = self
            .catalog
            .resolve_or_fallback(style.font_family)
            .map(str::to_owned)
        else {
            tracing::warn!(
                family = style.font_family.name(),
                "no usable font face registered; skipping text layer"
            );
            return Ok(GlyphTile::empty());
        };
        if family != style.font_family.name() {
            tracing::debug!(
                requested = style.font_family.name(),
                resolved = %family,
                "font family fell back"
            );
        }

        let brush = GlyphBrush {
            r: style.fill.r,
            g: style.fill.g,
            b: style.fill.b,
            a: 255,
        };

        let mut builder =
            self.layout_ctx
                .ranged_builder(self.catalog.font_ctx_mut(), &style.content, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(
            style.font_size_px as f32,
        ));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<GlyphBrush> = builder.build(&style.content);
        layout.break_all_lines(None);

        let width = layout.width().ceil() as u32;
        let height = layout.height().ceil() as u32;
        if width == 0 || height == 0 {
            tracing::warn!(
                content_len = style.content.len(),
                "text layout has no extent; skipping text layer"
            );
            return Ok(GlyphTile::empty());
        }
        let width_u16: u16 = width
            .try_into()
            .map_err(|_| UnderlayError::render("text tile width exceeds u16"))?;
        let height_u16: u16 = height
            .try_into()
            .map_err(|_| UnderlayError::render("text tile height exceeds u16"))?;

        let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };

                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));

                // Positioned glyphs carry the run offset and baseline; the
                // raw per-run coordinates would stack everything at y 0.
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(run.run().font())
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        ctx.flush();

        let mut pixmap = vello_cpu::Pixmap::new(width_u16, height_u16);
        ctx.render_to_pixmap(&mut pixmap);

        GlyphTile::from_premul(width, height, pixmap.data_as_u8_slice().to_vec())
    }
}
