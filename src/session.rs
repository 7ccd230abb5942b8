//! Session-oriented editing API.
//!
//! An [`EditorSession`] owns everything one editing surface needs: the
//! installed layer pair, the text style, the placement controller and the
//! compositing engine. Mutations bump a revision counter; compositing is
//! lazy and cached, so repeated paints between edits reuse the last frame.
//!
//! Uploads are sequenced. Every upload gets a monotonically increasing
//! [`UploadSeq`]; only the newest sequence may install layers, so a slow
//! segmentation result can never overwrite a later upload.

use kurbo::Point;

use crate::engine::CompositingEngine;
use crate::export;
use crate::fonts::FontCatalog;
use crate::foundation::core::Canvas;
use crate::foundation::error::UnderlayResult;
use crate::placement::{DragState, PlacementController};
use crate::raster::RasterImage;
use crate::segmentation::{LayerPair, SegmentationAdapter, prepare_layers};
use crate::style::{FontFamily, Rgb, ShadowSpec, TextStyleSpec};

/// Identifies one upload within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UploadSeq(pub u64);

/// Outcome of handing a finished upload to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Installed {
    /// The pair became the session's layers.
    Current,
    /// A newer upload began meanwhile; the pair was discarded.
    Superseded,
}

/// Render scheduling counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Frames actually composited.
    pub renders: u64,
    /// Composite calls satisfied by the cached frame.
    pub reuses: u64,
}

/// One editing session: layers, style, placement and cached output.
pub struct EditorSession {
    engine: CompositingEngine,
    style: TextStyleSpec,
    layers: Option<LayerPair>,
    placement: Option<PlacementController>,
    upload_seq: u64,
    processing: bool,
    revision: u64,
    frame: Option<(u64, RasterImage)>,
    stats: SessionStats,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    /// Session with an empty font catalog.
    pub fn new() -> Self {
        Self::with_engine(CompositingEngine::new())
    }

    /// Session that discovers OS fonts up front.
    pub fn with_system_fonts() -> Self {
        Self::with_engine(CompositingEngine::with_system_fonts())
    }

    /// Session over a caller-built engine, e.g. with a custom font catalog.
    pub fn with_engine(engine: CompositingEngine) -> Self {
        Self {
            engine,
            style: TextStyleSpec::default(),
            layers: None,
            placement: None,
            upload_seq: 0,
            processing: false,
            revision: 0,
            frame: None,
            stats: SessionStats::default(),
        }
    }

    /// The session's font catalog.
    pub fn fonts(&self) -> &FontCatalog {
        self.engine.fonts()
    }

    /// Mutable catalog access, e.g. to register faces.
    pub fn fonts_mut(&mut self) -> &mut FontCatalog {
        self.engine.fonts_mut()
    }

    // Upload lifecycle.

    /// Start a new upload, superseding any upload still in flight.
    pub fn begin_upload(&mut self) -> UploadSeq {
        self.upload_seq += 1;
        self.processing = true;
        tracing::debug!(seq = self.upload_seq, "upload started");
        UploadSeq(self.upload_seq)
    }

    /// Install the finished layers for `seq`.
    ///
    /// Stale sequences are discarded without touching session state. A
    /// current install replaces both layers at once and re-centers the text
    /// on the new canvas.
    pub fn install_layers(&mut self, seq: UploadSeq, pair: LayerPair) -> Installed {
        if seq.0 != self.upload_seq {
            tracing::debug!(
                seq = seq.0,
                current = self.upload_seq,
                "upload superseded; discarding layers"
            );
            return Installed::Superseded;
        }

        self.processing = false;
        self.placement = Some(PlacementController::new(pair.canvas()));
        self.layers = Some(pair);
        self.frame = None;
        self.touch();
        tracing::debug!(seq = seq.0, "layers installed");
        Installed::Current
    }

    /// Record that upload `seq` failed.
    ///
    /// Existing layers and position are kept; a stale failure changes
    /// nothing.
    pub fn fail_upload(&mut self, seq: UploadSeq) {
        if seq.0 != self.upload_seq {
            return;
        }
        self.processing = false;
        tracing::debug!(seq = seq.0, "upload failed; previous layers kept");
    }

    /// Run the whole upload pipeline: decode, segment, install.
    ///
    /// On error the session keeps its previous layers and the error is
    /// returned to the caller.
    #[tracing::instrument(skip_all)]
    pub async fn process_upload<S: SegmentationAdapter>(
        &mut self,
        source: &[u8],
        adapter: &S,
    ) -> UnderlayResult<()> {
        let seq = self.begin_upload();
        match prepare_layers(source, adapter).await {
            Ok(pair) => {
                self.install_layers(seq, pair);
                Ok(())
            }
            Err(err) => {
                self.fail_upload(seq);
                Err(err)
            }
        }
    }

    /// Return `true` while an upload is being processed.
    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Return `true` once a layer pair is installed.
    pub fn has_layers(&self) -> bool {
        self.layers.is_some()
    }

    /// The installed layer pair, if any.
    pub fn layers(&self) -> Option<&LayerPair> {
        self.layers.as_ref()
    }

    /// The canvas of the installed layers, if any.
    pub fn canvas(&self) -> Option<Canvas> {
        self.layers.as_ref().map(LayerPair::canvas)
    }

    // Text style.

    /// Current text style.
    pub fn style(&self) -> &TextStyleSpec {
        &self.style
    }

    /// Replace the text content. Empty content renders no text layer.
    pub fn set_content(&mut self, content: impl Into<String>) {
        let content = content.into();
        if self.style.content != content {
            self.style.content = content;
            self.touch();
        }
    }

    /// Replace the font size, rejecting out-of-range values.
    pub fn set_font_size_px(&mut self, font_size_px: u32) -> UnderlayResult<()> {
        let mut next = self.style.clone();
        next.font_size_px = font_size_px;
        next.validate()?;
        self.replace_style(next);
        Ok(())
    }

    /// Replace the font family.
    pub fn set_font_family(&mut self, font_family: FontFamily) {
        if self.style.font_family != font_family {
            self.style.font_family = font_family;
            self.touch();
        }
    }

    /// Replace the fill color.
    pub fn set_fill(&mut self, fill: Rgb) {
        if self.style.fill != fill {
            self.style.fill = fill;
            self.touch();
        }
    }

    /// Attach, replace or detach the shadow, rejecting out-of-range values.
    pub fn set_shadow(&mut self, shadow: Option<ShadowSpec>) -> UnderlayResult<()> {
        let mut next = self.style.clone();
        next.shadow = shadow;
        next.validate()?;
        self.replace_style(next);
        Ok(())
    }

    /// Replace the entire style at once, rejecting out-of-range values.
    pub fn set_style(&mut self, style: TextStyleSpec) -> UnderlayResult<()> {
        style.validate()?;
        self.replace_style(style);
        Ok(())
    }

    fn replace_style(&mut self, style: TextStyleSpec) {
        if self.style != style {
            self.style = style;
            self.touch();
        }
    }

    // Placement.

    /// Current text anchor, present once layers are installed.
    pub fn position(&self) -> Option<Point> {
        self.placement.as_ref().map(PlacementController::position)
    }

    /// Current drag state; `Idle` before any layers exist.
    pub fn drag_state(&self) -> DragState {
        self.placement
            .as_ref()
            .map(PlacementController::drag_state)
            .unwrap_or(DragState::Idle)
    }

    /// Return `true` while the text is being dragged.
    pub fn is_dragging(&self) -> bool {
        self.drag_state().is_dragging()
    }

    /// Move the anchor programmatically, clamped to the canvas.
    pub fn set_text_position(&mut self, position: Point) {
        if let Some(placement) = &mut self.placement
            && placement.set_position(position)
        {
            self.touch();
        }
    }

    /// Pointer press in canvas coordinates. No-op without layers.
    pub fn pointer_down(&mut self, pointer: Point) {
        if let Some(placement) = &mut self.placement {
            placement.pointer_down(pointer);
        }
    }

    /// Pointer movement in canvas coordinates. No-op without layers.
    pub fn pointer_move(&mut self, pointer: Point) {
        if let Some(placement) = &mut self.placement
            && placement.pointer_move(pointer)
        {
            self.touch();
        }
    }

    /// Pointer release.
    pub fn pointer_up(&mut self) {
        if let Some(placement) = &mut self.placement {
            placement.pointer_up();
        }
    }

    /// Pointer left the canvas; treated as a release.
    pub fn pointer_leave(&mut self) {
        if let Some(placement) = &mut self.placement {
            placement.pointer_leave();
        }
    }

    // Rendering.

    /// Composite the current frame, reusing the cache when nothing changed.
    ///
    /// `None` until layers are installed.
    #[tracing::instrument(skip_all, fields(revision = self.revision))]
    pub fn composite(&mut self) -> UnderlayResult<Option<&RasterImage>> {
        let Some(layers) = &self.layers else {
            return Ok(None);
        };
        let Some(placement) = &self.placement else {
            return Ok(None);
        };

        let cached = matches!(&self.frame, Some((rev, _)) if *rev == self.revision);
        if cached {
            self.stats.reuses += 1;
        } else {
            let position = placement.position();
            let frame = self.engine.render(
                layers.background(),
                layers.foreground(),
                &self.style,
                position,
            )?;
            self.frame = Some((self.revision, frame));
            self.stats.renders += 1;
        }

        Ok(self.frame.as_ref().map(|(_, frame)| frame))
    }

    /// Composite (or reuse) the current frame and encode it as PNG.
    ///
    /// `None` until layers are installed. The conventional download name for
    /// the bytes is [`EXPORT_FILE_NAME`](crate::export::EXPORT_FILE_NAME).
    pub fn export_png(&mut self) -> UnderlayResult<Option<Vec<u8>>> {
        let Some(frame) = self.composite()? else {
            return Ok(None);
        };
        Ok(Some(export::encode_png(frame)?))
    }

    /// Render scheduling counters for this session.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}
