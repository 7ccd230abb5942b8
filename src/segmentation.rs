//! Background segmentation boundary and layer-pair assembly.
//!
//! Segmentation itself lives behind [`SegmentationAdapter`]; this crate only
//! defines the contract and turns one uploaded photo into the two decoded
//! layers the engine composites. Assembly is all-or-nothing: an error at any
//! stage yields no layers.

use std::future::Future;

use crate::foundation::core::Canvas;
use crate::foundation::error::{UnderlayError, UnderlayResult};
use crate::raster::RasterImage;

/// Removes the background from an encoded photo.
///
/// Implementations return encoded image bytes (typically PNG with alpha)
/// containing the isolated subject on a transparent backdrop. The call may
/// take seconds; it runs as a future so hosts can drive it off their UI
/// thread.
pub trait SegmentationAdapter {
    /// Produce background-removed image bytes for `source`.
    fn remove_background(&self, source: &[u8])
    -> impl Future<Output = UnderlayResult<Vec<u8>>> + Send;
}

/// The two decoded layers produced by one successful upload.
///
/// A pair only ever exists complete: there is no state with a background and
/// a pending foreground.
#[derive(Clone, Debug)]
pub struct LayerPair {
    background: RasterImage,
    foreground: RasterImage,
}

impl LayerPair {
    pub fn new(background: RasterImage, foreground: RasterImage) -> Self {
        Self {
            background,
            foreground,
        }
    }

    /// The original photo.
    pub fn background(&self) -> &RasterImage {
        &self.background
    }

    /// The background-removed subject cutout.
    pub fn foreground(&self) -> &RasterImage {
        &self.foreground
    }

    /// The canvas the pair renders onto, defined by the background.
    pub fn canvas(&self) -> Canvas {
        self.background.canvas()
    }
}

/// Decode an uploaded photo, run segmentation on it, and decode the result.
///
/// Failure modes keep their stage: unreadable uploads are decode errors,
/// adapter failures and unusable adapter output are processing errors. No
/// partial pair escapes this function.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub async fn prepare_layers<S: SegmentationAdapter>(
    source: &[u8],
    adapter: &S,
) -> UnderlayResult<LayerPair> {
    let background = RasterImage::load(source).await?;

    let cutout_bytes = adapter
        .remove_background(source)
        .await
        .map_err(|err| match err {
            UnderlayError::Processing(_) => err,
            other => UnderlayError::processing(format!("background removal failed: {other}")),
        })?;

    let foreground = RasterImage::load(&cutout_bytes)
        .await
        .map_err(|err| UnderlayError::processing(format!("segmentation output unusable: {err}")))?;

    tracing::debug!(
        width = background.width(),
        height = background.height(),
        "layer pair prepared"
    );
    Ok(LayerPair::new(background, foreground))
}
