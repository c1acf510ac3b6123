//! Collage is a composition and non-destructive edit engine for photo collages.
//!
//! Photos and text are placed on a fixed-size canvas with position, uniform scale and
//! rotation. Image layers can be masked (erase/reveal), torn in two along a drawn path, or
//! background-removed, and every mutating edit is recorded in an invertible undo log. The
//! compositor flattens the canvas deterministically, so export matches the live canvas.
//!
//! The entry point is [`EditSession`]:
//!
//! - Build or load a [`Canvas`] and an [`AssetStore`]
//! - Edit through the session (gestures, tears, mask strokes, drawing, undo)
//! - Render a [`FrameRGBA`] or export a PNG
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assets;
mod edit;
mod foundation;
mod geometry;
mod history;
mod model;
mod raster;
mod render;
mod session;

/// Background job helpers.
pub use crate::edit::jobs;

pub use crate::assets::cache::{
    BitmapCache, BitmapMeta, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_MAX_DIM, PixelBounds,
    PreparedBitmap,
};
pub use crate::assets::decode::{
    decode_bitmap, decode_mask, encode_png_gray, encode_png_rgba, load_mask,
};
pub use crate::assets::store::{AssetStore, FsAssetStore, MemoryAssetStore, normalize_rel_path};
pub use crate::edit::background::{
    BackgroundJob, BackgroundOutput, BackgroundRemover, BackgroundResult, ColorKeyRemover,
};
pub use crate::edit::guard::{OperationGuard, Ticket};
pub use crate::edit::mask_paint::{
    BrushMode, MaskStrokeJob, MaskStrokeOutput, MaskStrokeResult, StrokeBuffer,
};
pub use crate::edit::tear::{TearJob, TearOutput, TearParams, TearPieces, TearResult};
pub use crate::foundation::core::{
    Affine, BezPath, LayerId, Point, Rect, Rgba8, Rgba8Premul, Size, Vec2,
};
pub use crate::foundation::error::{CollageError, CollageResult};
pub use crate::geometry::gesture::{GestureDelta, GestureTracker, apply_gesture};
pub use crate::geometry::transform::{MAX_SCALE, MIN_SCALE, Transform, clamp_scale};
pub use crate::history::undo::{ActionKind, UndoAction, UndoLog};
pub use crate::model::canvas::Canvas;
pub use crate::model::drawing::{DrawStroke, Drawing, DrawingSession};
pub use crate::model::layer::{ImageLayer, Layer, LayerContent, TextLayer};
pub use crate::raster::mask::{
    DEFAULT_MASK_MAX_DIM, alpha_as_mask, bake_mask_into_alpha, cut_with_binary_mask,
    erase_with, mask_matches_aspect, non_white_count, resize_mask, reveal_with,
    synthesized_mask_size, white_mask,
};
pub use crate::raster::region::{
    DEFAULT_CLOSE_FRACTION, RegionMasks, clamp_path, rasterize_region, region_boundary,
};
pub use crate::raster::stroke::stroke_coverage;
pub use crate::render::compositor::{RenderSettings, Scene, output_size, render_canvas};
pub use crate::render::frame::{FrameRGBA, fingerprint};
pub use crate::session::edit_session::EditSession;
pub use crate::session::opts::SessionOpts;
pub use crate::session::outcome::{EditOutcome, UnchangedReason};
