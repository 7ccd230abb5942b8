//! PNG export of composited frames.

use std::io::Cursor;
use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{UnderlayError, UnderlayResult};
use crate::raster::RasterImage;

/// Conventional download name for exported frames.
pub const EXPORT_FILE_NAME: &str = "text-between-image-layers.png";

/// Encode a frame as PNG bytes with straight alpha.
pub fn encode_png(frame: &RasterImage) -> UnderlayResult<Vec<u8>> {
    let rgba = frame.to_straight_rgba8();
    let img = image::RgbaImage::from_raw(frame.width(), frame.height(), rgba)
        .ok_or_else(|| UnderlayError::render("frame byte length does not match its canvas"))?;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode frame as png")?;
    Ok(buf)
}

/// Write a frame to `path` as PNG.
pub fn save_png(frame: &RasterImage, path: &Path) -> UnderlayResult<()> {
    let rgba = frame.to_straight_rgba8();
    image::save_buffer_with_format(
        path,
        &rgba,
        frame.width(),
        frame.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}
