//! Underlay places styled text between the layers of a photo: behind the
//! subject, in front of the background.
//!
//! One upload is decoded into two layers: the photo itself becomes the
//! background, and a [`SegmentationAdapter`] supplies the subject cutout.
//! Every composited frame is background, then text (with optional shadow),
//! then cutout, in that fixed order, on the CPU, byte-deterministically.
//! The public API is session-oriented:
//!
//! - Create an [`EditorSession`] (usually via [`EditorSession::with_system_fonts`])
//! - Feed it an upload through [`EditorSession::process_upload`]
//! - Mutate the style, drag the text with the pointer methods
//! - [`EditorSession::composite`] re-renders only when something changed
//! - Export with [`EditorSession::export_png`]

#![forbid(unsafe_code)]

pub mod blur;
pub mod compose;
pub mod engine;
pub mod export;
pub mod fonts;
pub mod foundation;
pub mod placement;
pub mod raster;
pub mod segmentation;
pub mod session;
pub mod style;
pub mod text;

pub use foundation::core::{Canvas, Point, Rgba8Premul, Vec2};
pub use foundation::error::{UnderlayError, UnderlayResult};

pub use engine::CompositingEngine;
pub use export::{EXPORT_FILE_NAME, encode_png, save_png};
pub use fonts::FontCatalog;
pub use placement::{DragState, PlacementController, ViewScale};
pub use raster::RasterImage;
pub use segmentation::{LayerPair, SegmentationAdapter, prepare_layers};
pub use session::{EditorSession, Installed, SessionStats, UploadSeq};
pub use style::{FontFamily, Rgb, ShadowSpec, TextStyleSpec};
pub use text::{GlyphTile, TextRasterizer};
