//! Decoded raster images in premultiplied RGBA8.

use std::sync::Arc;

use crate::foundation::core::{Canvas, Rgba8Premul};
use crate::foundation::error::{UnderlayError, UnderlayResult};

/// An immutable canvas-space raster: decoded photo, segmentation cutout, or
/// composited frame.
///
/// Pixels are premultiplied RGBA8 in row-major order. The buffer is shared
/// behind an `Arc` so clones are cheap and a frame handed out by the render
/// path can never be mutated behind the caller's back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    rgba8_premul: Arc<Vec<u8>>,
}

impl RasterImage {
    /// Decode an encoded image (PNG, JPEG, ...) and premultiply it.
    pub fn decode(bytes: &[u8]) -> UnderlayResult<Self> {
        let dyn_img = image::load_from_memory(bytes)
            .map_err(|err| UnderlayError::decode(format!("decode image from memory: {err}")))?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Canvas::new(width, height)?;

        let mut rgba8_premul = rgba.into_raw();
        premultiply_rgba8_in_place(&mut rgba8_premul);

        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// [`decode`](Self::decode) as a future, for async upload pipelines.
    pub async fn load(bytes: &[u8]) -> UnderlayResult<Self> {
        Self::decode(bytes)
    }

    /// Wrap an already premultiplied RGBA8 buffer.
    pub fn from_premul_rgba8(width: u32, height: u32, data: Vec<u8>) -> UnderlayResult<Self> {
        let canvas = Canvas::new(width, height)?;
        if data.len() != canvas.pixel_count() * 4 {
            return Err(UnderlayError::validation(
                "raster buffer length must equal width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(data),
        })
    }

    /// Premultiply a straight-alpha RGBA8 buffer and wrap it.
    pub fn from_straight_rgba8(width: u32, height: u32, mut data: Vec<u8>) -> UnderlayResult<Self> {
        let canvas = Canvas::new(width, height)?;
        if data.len() != canvas.pixel_count() * 4 {
            return Err(UnderlayError::validation(
                "raster buffer length must equal width*height*4",
            ));
        }
        premultiply_rgba8_in_place(&mut data);
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(data),
        })
    }

    /// A canvas-sized raster filled with one premultiplied pixel value.
    pub fn solid(canvas: Canvas, px: Rgba8Premul) -> UnderlayResult<Self> {
        let data = px.to_array().repeat(canvas.pixel_count());
        Self::from_premul_rgba8(canvas.width, canvas.height, data)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The canvas these pixels span.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Raw premultiplied RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.rgba8_premul
    }

    /// Read one pixel, `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8Premul> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let d = &self.rgba8_premul[i..i + 4];
        Some(Rgba8Premul {
            r: d[0],
            g: d[1],
            b: d[2],
            a: d[3],
        })
    }

    /// Copy out straight-alpha RGBA8 bytes, e.g. for PNG encoding.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.rgba8_premul.as_slice().to_vec();
        unpremultiply_rgba8_in_place(&mut out);
        out
    }
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u32;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u32 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u32 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u32 * 255 + a / 2) / a).min(255) as u8;
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn encode_png_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Vec<u8> {
        let img = image::RgbaImage::from_raw(width, height, rgba).unwrap();
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decode_png_dimensions_and_premul() {
        let buf = encode_png_rgba(1, 1, vec![100, 50, 200, 128]);

        let raster = RasterImage::decode(&buf).unwrap();
        assert_eq!(raster.width(), 1);
        assert_eq!(raster.height(), 1);
        assert_eq!(
            raster.data(),
            &[
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128u8
            ]
        );
    }

    #[test]
    fn decode_rejects_garbage_with_decode_error() {
        let err = RasterImage::decode(b"not an image").unwrap_err();
        assert!(err.to_string().contains("decode error:"));
    }

    #[test]
    fn from_straight_premultiplies() {
        let raster = RasterImage::from_straight_rgba8(1, 1, vec![255, 128, 0, 128]).unwrap();
        assert_eq!(raster.data(), &[128, 64, 0, 128]);
    }

    #[test]
    fn from_premul_rejects_bad_length() {
        assert!(RasterImage::from_premul_rgba8(2, 2, vec![0u8; 15]).is_err());
        assert!(RasterImage::from_premul_rgba8(0, 2, vec![]).is_err());
    }

    #[test]
    fn pixel_accessor_bounds() {
        let raster = RasterImage::from_premul_rgba8(2, 1, vec![1, 2, 3, 255, 4, 5, 6, 255]).unwrap();
        assert_eq!(raster.pixel(1, 0).unwrap().to_array(), [4, 5, 6, 255]);
        assert!(raster.pixel(2, 0).is_none());
        assert!(raster.pixel(0, 1).is_none());
    }

    #[test]
    fn straight_round_trip_at_full_alpha() {
        let raster = RasterImage::from_straight_rgba8(1, 2, vec![9, 8, 7, 255, 1, 2, 3, 255]).unwrap();
        assert_eq!(raster.to_straight_rgba8(), vec![9, 8, 7, 255, 1, 2, 3, 255]);
    }

    #[test]
    fn solid_fills_canvas() {
        let canvas = Canvas::new(3, 2).unwrap();
        let raster = RasterImage::solid(canvas, Rgba8Premul::from_straight_rgba(10, 20, 30, 255))
            .unwrap();
        assert_eq!(raster.data().len(), 24);
        assert_eq!(raster.pixel(2, 1).unwrap().to_array(), [10, 20, 30, 255]);
    }
}
