//! The single owner of one document's mutable state.
//!
//! Every canvas read, transform update and undo log change runs on the thread that owns the
//! [`EditSession`]. Expensive work is captured into `Send` jobs (`begin_*`), run anywhere
//! (`Job::run`, usually via [`crate::jobs::spawn`]), and handed back (`finish_*`) to be applied
//! or discarded by ticket.

use std::sync::Arc;
use std::time::Instant;

use image::GrayImage;
use rayon::prelude::*;

use crate::assets::cache::{BitmapCache, PreparedBitmap};
use crate::assets::store::AssetStore;
use crate::edit::background::{BackgroundJob, BackgroundOutput, BackgroundRemover, BackgroundResult};
use crate::edit::guard::{OperationGuard, Ticket};
use crate::edit::jobs;
use crate::edit::mask_paint::{
    BrushMode, MaskStrokeJob, MaskStrokeOutput, MaskStrokeResult, StrokeBuffer, starting_mask,
};
use crate::edit::tear::{TearJob, TearOutput, TearParams, TearResult, child_layers};
use crate::foundation::core::{BezPath, LayerId, Point};
use crate::foundation::error::CollageResult;
use crate::geometry::gesture::{GestureDelta, GestureTracker};
use crate::geometry::transform::Transform;
use crate::history::undo::{UndoAction, UndoLog};
use crate::model::canvas::Canvas;
use crate::model::drawing::{DrawStroke, DrawingSession};
use crate::model::layer::{ImageLayer, Layer, LayerContent, TextLayer};
use crate::render::compositor::Scene;
use crate::render::frame::FrameRGBA;
use crate::session::opts::SessionOpts;
use crate::session::outcome::{EditOutcome, UnchangedReason};

struct ActiveStroke {
    ticket: Ticket,
    layer: LayerId,
    base: GrayImage,
    buffer: StrokeBuffer,
}

struct PendingMask {
    ticket: Ticket,
    previous_mask: Option<String>,
    previous_erased: Option<String>,
}

/// One document being edited: canvas, undo log, bitmap cache, asset store and tool state.
pub struct EditSession {
    canvas: Canvas,
    undo: UndoLog,
    cache: BitmapCache,
    store: Arc<dyn AssetStore>,
    opts: SessionOpts,
    tear_guard: OperationGuard,
    mask_guard: OperationGuard,
    background_guard: OperationGuard,
    gesture: Option<(LayerId, GestureTracker)>,
    stroke: Option<ActiveStroke>,
    pending_mask: Option<PendingMask>,
    drawing: Option<DrawingSession>,
    asset_seq: u64,
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("layers", &self.canvas.len())
            .field("undo_depth", &self.undo.len())
            .field("cached", &self.cache.len())
            .field("drawing", &self.drawing.is_some())
            .finish()
    }
}

impl EditSession {
    /// Start editing `canvas`, reading and writing assets through `store`.
    pub fn new(canvas: Canvas, store: Arc<dyn AssetStore>, opts: SessionOpts) -> Self {
        Self {
            canvas,
            undo: UndoLog::new(),
            cache: BitmapCache::new(opts.cache_capacity, opts.cache_max_dim),
            store,
            tear_guard: OperationGuard::new(opts.tear_cooldown()),
            mask_guard: OperationGuard::new(opts.mask_cooldown()),
            background_guard: OperationGuard::new(std::time::Duration::ZERO),
            opts,
            gesture: None,
            stroke: None,
            pending_mask: None,
            drawing: None,
            asset_seq: 0,
        }
    }

    /// Current canvas.
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// End the session, returning the canvas for persistence.
    pub fn into_canvas(self) -> Canvas {
        self.canvas
    }

    /// Session options.
    pub fn opts(&self) -> &SessionOpts {
        &self.opts
    }

    /// Undo history.
    pub fn undo_log(&self) -> &UndoLog {
        &self.undo
    }

    /// Bitmap cache.
    pub fn cache(&self) -> &BitmapCache {
        &self.cache
    }

    /// Asset store shared with background jobs.
    pub fn store(&self) -> &Arc<dyn AssetStore> {
        &self.store
    }

    // ---------------------------------------------------------------- layers

    /// Add the bitmap `source` as a new top image layer.
    ///
    /// Content size defaults to the natural pixel size, shrunk to fit the canvas.
    pub fn add_image(
        &mut self,
        source: &str,
        transform: Transform,
    ) -> Result<LayerId, UnchangedReason> {
        let prepared = prepare_from_store(self.store.as_ref(), source, self.cache.max_dim());
        self.apply_import(source, prepared, transform)
    }

    /// Decode several bitmaps in parallel, then add them in input order in one batch.
    pub fn import_images(&mut self, sources: &[String]) -> Vec<Result<LayerId, UnchangedReason>> {
        let store = self.store.as_ref();
        let max_dim = self.cache.max_dim();
        let decoded: Vec<CollageResult<PreparedBitmap>> = sources
            .par_iter()
            .map(|name| prepare_from_store(store, name, max_dim))
            .collect();
        sources
            .iter()
            .zip(decoded)
            .map(|(name, prepared)| self.apply_import(name, prepared, Transform::IDENTITY))
            .collect()
    }

    fn apply_import(
        &mut self,
        source: &str,
        prepared: CollageResult<PreparedBitmap>,
        transform: Transform,
    ) -> Result<LayerId, UnchangedReason> {
        let prepared = prepared.map_err(|e| {
            tracing::warn!(%source, error = %e, "image import failed");
            UnchangedReason::from_error(&e)
        })?;
        let (pw, ph) = prepared.source_size;
        let size = self.canvas.default_image_size(pw, ph);
        self.cache.insert(source, prepared);
        let id = self
            .canvas
            .add_image(ImageLayer::new(source, pw, ph, size), transform);
        self.undo.push(UndoAction::AddImage { layer: id });
        tracing::debug!(layer = %id, %source, "image added");
        Ok(id)
    }

    /// Add a text layer on top.
    pub fn add_text(
        &mut self,
        text: TextLayer,
        transform: Transform,
    ) -> Result<LayerId, UnchangedReason> {
        if text.text.is_empty() || !text.size.is_finite() || text.size <= 0.0 {
            return Err(UnchangedReason::TooSparse);
        }
        let id = self.canvas.add_text(text, transform);
        self.undo.push(UndoAction::AddText { layer: id });
        Ok(id)
    }

    /// Delete a layer.
    pub fn delete_layer(&mut self, id: LayerId) -> EditOutcome {
        let Some((index, layer)) = self.canvas.remove_layer(id) else {
            return UnchangedReason::UnknownLayer.into();
        };
        if self.gesture.as_ref().is_some_and(|(g, _)| *g == id) {
            self.gesture = None;
        }
        let action = match layer.content {
            LayerContent::Image(_) => UndoAction::DeleteImage { layer, index },
            LayerContent::Text(_) => UndoAction::DeleteText { layer, index },
        };
        self.undo.push(action);
        EditOutcome::Applied
    }

    /// Set a layer's opacity (clamped to `[0, 1]`). Not recorded in the undo log.
    pub fn set_opacity(&mut self, id: LayerId, opacity: f64) -> EditOutcome {
        match self.canvas.layer_mut(id) {
            Some(layer) => {
                layer.set_opacity(opacity);
                EditOutcome::Applied
            }
            None => UnchangedReason::UnknownLayer.into(),
        }
    }

    /// Raise a layer above every other layer of its kind. Not recorded in the undo log.
    pub fn bring_to_front(&mut self, id: LayerId) -> EditOutcome {
        let top = self.canvas.max_z().unwrap_or(0);
        match self.canvas.layer_mut(id) {
            Some(layer) if layer.z_index == top => EditOutcome::Applied,
            Some(layer) => {
                layer.z_index = top.saturating_add(1);
                EditOutcome::Applied
            }
            None => UnchangedReason::UnknownLayer.into(),
        }
    }

    /// Topmost image layer under a canvas point.
    pub fn hit_test(&self, point: Point) -> Option<LayerId> {
        self.canvas.hit_test(point, &self.cache)
    }

    // -------------------------------------------------------------- gestures

    /// Start a continuous gesture on `id`, capturing its transform as the base.
    pub fn begin_gesture(&mut self, id: LayerId) -> EditOutcome {
        let Some(layer) = self.canvas.layer(id) else {
            return UnchangedReason::UnknownLayer.into();
        };
        self.gesture = Some((id, GestureTracker::begin(layer.transform)));
        EditOutcome::Applied
    }

    /// Apply an accumulated delta relative to the gesture base. Returns the live transform.
    pub fn update_gesture(&mut self, delta: GestureDelta) -> Option<Transform> {
        let (id, tracker) = self.gesture.as_mut()?;
        let t = tracker.update(delta);
        let layer = self.canvas.layer_mut(*id)?;
        layer.transform = t;
        Some(t)
    }

    /// Commit the gesture; its last transform becomes the layer's base.
    pub fn end_gesture(&mut self) -> Option<Transform> {
        let (id, tracker) = self.gesture.take()?;
        let t = tracker.end();
        let layer = self.canvas.layer_mut(id)?;
        layer.transform = t;
        Some(t)
    }

    /// Abort the gesture and put the base transform back.
    pub fn cancel_gesture(&mut self) {
        if let Some((id, tracker)) = self.gesture.take()
            && let Some(layer) = self.canvas.layer_mut(id)
        {
            layer.transform = tracker.base();
        }
    }

    // ------------------------------------------------------------------ tear

    /// Capture a tear of image layer `id` along a canvas-space path.
    pub fn begin_tear(
        &mut self,
        id: LayerId,
        canvas_path: &[Point],
        now: Instant,
    ) -> Result<TearJob, UnchangedReason> {
        let layer = self.canvas.layer(id).ok_or(UnchangedReason::UnknownLayer)?;
        let source = layer
            .as_image()
            .ok_or(UnchangedReason::NotAnImage)?
            .source
            .clone();
        if canvas_path.len() < 2 {
            return Err(UnchangedReason::TooSparse);
        }
        let ticket = self.tear_guard.try_begin(now).ok_or_else(|| {
            tracing::debug!(layer = %id, "tear rejected: busy");
            UnchangedReason::Busy
        })?;
        let names = [
            self.fresh_name(&source, "tear", "a.png"),
            self.fresh_name(&source, "tear", "b.png"),
        ];
        let params = TearParams {
            close_fraction: self.opts.close_fraction,
            mask_aspect_tolerance: self.opts.mask_aspect_tolerance,
            cache_max_dim: self.cache.max_dim(),
        };
        let layer = self.canvas.layer(id).ok_or(UnchangedReason::UnknownLayer)?;
        TearJob::capture(
            ticket,
            layer,
            self.canvas.size,
            canvas_path,
            names,
            Arc::clone(&self.store),
            params,
        )
        .ok_or_else(|| {
            self.tear_guard.abandon();
            UnchangedReason::NotAnImage
        })
    }

    /// Apply a finished tear: replace the original with its two pieces in one step.
    pub fn finish_tear(&mut self, result: TearResult) -> EditOutcome {
        let current = self.tear_guard.finish(result.ticket);
        let pieces = match result.output {
            Ok(TearOutput::Split(pieces)) => pieces,
            _ if !current => {
                tracing::info!(layer = %result.layer, "stale tear result discarded");
                return UnchangedReason::Stale.into();
            }
            Ok(TearOutput::TooSparse) => return UnchangedReason::TooSparse.into(),
            Err(e) => return UnchangedReason::from_error(&e).into(),
        };
        let unchanged = self
            .canvas
            .layer(result.layer)
            .and_then(Layer::as_image)
            .is_some_and(|img| *img == result.image);
        let index = match self.canvas.index_of(result.layer) {
            Some(index) if current && unchanged => index,
            _ => {
                tracing::info!(layer = %result.layer, "torn layer changed or gone; result discarded");
                for name in &pieces.names {
                    discard_orphan(self.store.as_ref(), name);
                }
                return UnchangedReason::Stale.into();
            }
        };
        let ids = [self.canvas.allocate_id(), self.canvas.allocate_id()];
        let Some(original) = self.canvas.layer(result.layer) else {
            return UnchangedReason::Stale.into();
        };
        let Some(children) = child_layers(original, &pieces, ids, self.opts.tear_separation)
        else {
            return UnchangedReason::NotAnImage.into();
        };
        let Some((_, original)) = self.canvas.remove_layer(result.layer) else {
            return UnchangedReason::Stale.into();
        };
        if self.gesture.as_ref().is_some_and(|(g, _)| *g == original.id) {
            self.gesture = None;
        }
        self.canvas.insert_layer(index, children[0].clone());
        self.canvas.insert_layer(index + 1, children[1].clone());
        let [inside, outside] = pieces.prepared;
        self.cache.insert(&pieces.names[0], inside);
        self.cache.insert(&pieces.names[1], outside);
        tracing::debug!(
            layer = %original.id,
            a = %children[0].id,
            b = %children[1].id,
            "tear applied"
        );
        self.undo.push(UndoAction::Split {
            original,
            original_index: index,
            children,
        });
        EditOutcome::Applied
    }

    /// Tear on a worker thread and apply the result.
    pub fn tear(&mut self, id: LayerId, canvas_path: &[Point], now: Instant) -> EditOutcome {
        let job = match self.begin_tear(id, canvas_path, now) {
            Ok(job) => job,
            Err(r) => return r.into(),
        };
        let ticket = job.ticket;
        match jobs::spawn("tear", move || job.run()).and_then(jobs::JobHandle::wait) {
            Ok(result) => self.finish_tear(result),
            Err(e) => {
                self.tear_guard.finish(ticket);
                UnchangedReason::from_error(&e).into()
            }
        }
    }

    // ------------------------------------------------------------ mask paint

    /// Start an erase or reveal stroke on image layer `id`.
    ///
    /// `brush_size` is in canvas units. The layer's current mask is loaded now; a missing one
    /// is synthesized all white.
    pub fn begin_mask_stroke(
        &mut self,
        id: LayerId,
        mode: BrushMode,
        brush_size: f64,
        now: Instant,
    ) -> EditOutcome {
        if self.drawing.is_some() {
            return UnchangedReason::ModalToolActive.into();
        }
        let Some(layer) = self.canvas.layer(id) else {
            return UnchangedReason::UnknownLayer.into();
        };
        let Some(image) = layer.as_image() else {
            return UnchangedReason::NotAnImage.into();
        };
        if !brush_size.is_finite() || brush_size <= 0.0 {
            return UnchangedReason::TooSparse.into();
        }
        let Some(ticket) = self.mask_guard.try_begin(now) else {
            return UnchangedReason::Busy.into();
        };
        let Some(base) = starting_mask(
            self.store.as_ref(),
            image,
            self.opts.mask_max_dim,
            self.opts.mask_aspect_tolerance,
        ) else {
            self.mask_guard.abandon();
            return UnchangedReason::TooSparse.into();
        };
        let surface_brush = brush_size / layer.transform.scale;
        let buffer = StrokeBuffer::new(image.size, base.dimensions(), surface_brush, mode);
        self.stroke = Some(ActiveStroke {
            ticket,
            layer: id,
            base,
            buffer,
        });
        EditOutcome::Applied
    }

    /// Record a canvas-space point of the active stroke. Returns `false` if it was dropped.
    pub fn add_mask_point(&mut self, canvas_point: Point) -> bool {
        let Some(stroke) = self.stroke.as_mut() else {
            return false;
        };
        let Some(layer) = self.canvas.layer(stroke.layer) else {
            return false;
        };
        let Some(image) = layer.as_image() else {
            return false;
        };
        let local = layer
            .transform
            .to_local(canvas_point, self.canvas.size, image.size);
        stroke.buffer.push(local)
    }

    /// Live feedback path of the active stroke, in canvas coordinates.
    pub fn mask_stroke_preview(&self) -> Option<BezPath> {
        let stroke = self.stroke.as_ref()?;
        let layer = self.canvas.layer(stroke.layer)?;
        let image = layer.as_image()?;
        let to_canvas = layer.transform.content_affine(self.canvas.size, image.size);
        Some(to_canvas * stroke.buffer.preview_path())
    }

    /// Abort the active stroke without touching the mask.
    pub fn cancel_mask_stroke(&mut self) {
        if let Some(stroke) = self.stroke.take() {
            self.mask_guard.finish(stroke.ticket);
        }
    }

    /// End the stroke and capture its single rasterization pass as a job.
    pub fn end_mask_stroke(&mut self) -> Result<MaskStrokeJob, UnchangedReason> {
        let stroke = self.stroke.take().ok_or(UnchangedReason::TooSparse)?;
        if stroke.buffer.len() < 2 {
            self.mask_guard.finish(stroke.ticket);
            return Err(UnchangedReason::TooSparse);
        }
        let Some(image) = self.canvas.layer(stroke.layer).and_then(Layer::as_image) else {
            self.mask_guard.finish(stroke.ticket);
            return Err(UnchangedReason::UnknownLayer);
        };
        let (previous_mask, previous_erased) = (image.mask.clone(), image.erased.clone());
        let source = image.source.clone();
        let target = self.fresh_name(&source, "mask", ".png");
        self.pending_mask = Some(PendingMask {
            ticket: stroke.ticket,
            previous_mask,
            previous_erased,
        });
        Ok(MaskStrokeJob::new(
            stroke.ticket,
            stroke.layer,
            stroke.base,
            stroke.buffer,
            target,
            Arc::clone(&self.store),
        ))
    }

    /// Apply a finished stroke: point the layer at its new mask and record the erase.
    pub fn finish_mask_stroke(&mut self, result: MaskStrokeResult) -> EditOutcome {
        let current = self.mask_guard.finish(result.ticket);
        let pending = match self.pending_mask.take() {
            Some(p) if current && p.ticket == result.ticket => Some(p),
            other => {
                self.pending_mask = other;
                None
            }
        };
        let name = match result.output {
            Ok(MaskStrokeOutput::Painted { name, .. }) => name,
            _ if pending.is_none() => return UnchangedReason::Stale.into(),
            Ok(MaskStrokeOutput::TooSparse) => return UnchangedReason::TooSparse.into(),
            Err(e) => return UnchangedReason::from_error(&e).into(),
        };
        let image = self
            .canvas
            .layer_mut(result.layer)
            .and_then(Layer::as_image_mut);
        let image = image.filter(|img| {
            pending.as_ref().is_some_and(|p| {
                img.mask == p.previous_mask && img.erased == p.previous_erased
            })
        });
        let (Some(pending), Some(image)) = (pending, image) else {
            tracing::info!(layer = %result.layer, "stale mask result discarded");
            discard_orphan(self.store.as_ref(), &name);
            return UnchangedReason::Stale.into();
        };
        image.mask = Some(name);
        image.erased = None;
        self.undo.push(UndoAction::Erase {
            layer: result.layer,
            previous_mask: pending.previous_mask,
            previous_erased: pending.previous_erased,
        });
        EditOutcome::Applied
    }

    /// End the stroke, rasterize it on a worker, and apply the result.
    pub fn end_mask_stroke_and_apply(&mut self) -> EditOutcome {
        let job = match self.end_mask_stroke() {
            Ok(job) => job,
            Err(r) => return r.into(),
        };
        let ticket = job.ticket;
        match jobs::spawn("mask", move || job.run()).and_then(jobs::JobHandle::wait) {
            Ok(result) => self.finish_mask_stroke(result),
            Err(e) => {
                self.mask_guard.finish(ticket);
                self.pending_mask = None;
                UnchangedReason::from_error(&e).into()
            }
        }
    }

    /// Paint one complete stroke given as canvas-space points.
    pub fn paint_mask(
        &mut self,
        id: LayerId,
        mode: BrushMode,
        brush_size: f64,
        canvas_points: &[Point],
        now: Instant,
    ) -> EditOutcome {
        let begun = self.begin_mask_stroke(id, mode, brush_size, now);
        if !begun.is_applied() {
            return begun;
        }
        for &p in canvas_points {
            self.add_mask_point(p);
        }
        self.end_mask_stroke_and_apply()
    }

    // ----------------------------------------------------- background removal

    /// Capture background removal for image layer `id`.
    pub fn begin_remove_background(
        &mut self,
        id: LayerId,
        remover: Arc<dyn BackgroundRemover>,
        now: Instant,
    ) -> Result<BackgroundJob, UnchangedReason> {
        let layer = self.canvas.layer(id).ok_or(UnchangedReason::UnknownLayer)?;
        let source = layer
            .as_image()
            .ok_or(UnchangedReason::NotAnImage)?
            .source
            .clone();
        let ticket = self
            .background_guard
            .try_begin(now)
            .ok_or(UnchangedReason::Busy)?;
        let target = self.fresh_name(&source, "nobg", ".png");
        Ok(BackgroundJob::new(
            ticket,
            id,
            source,
            target,
            Arc::clone(&self.store),
            remover,
            self.cache.max_dim(),
        ))
    }

    /// Apply a finished removal: point the layer at the cut-out and clear its mask.
    ///
    /// The old source file stays untouched, so other layers sharing it are unaffected.
    pub fn finish_remove_background(&mut self, result: BackgroundResult) -> EditOutcome {
        if !self.background_guard.finish(result.ticket) {
            if let Ok(BackgroundOutput::Removed { source, .. }) = &result.output {
                discard_orphan(self.store.as_ref(), source);
            }
            return UnchangedReason::Stale.into();
        }
        let (cut, prepared) = match result.output {
            Ok(BackgroundOutput::Removed { source, prepared }) => (source, prepared),
            Ok(BackgroundOutput::NoPersonDetected) => {
                return UnchangedReason::NoPersonDetected.into();
            }
            Err(e) => return UnchangedReason::from_error(&e).into(),
        };
        let Some(image) = self
            .canvas
            .layer_mut(result.layer)
            .and_then(Layer::as_image_mut)
        else {
            tracing::info!(layer = %result.layer, "layer gone; background result discarded");
            discard_orphan(self.store.as_ref(), &cut);
            return UnchangedReason::Stale.into();
        };
        let previous_mask = image.mask.take();
        let previous_erased = image.erased.take();
        let previous_source = std::mem::replace(&mut image.source, cut.clone());
        self.cache.insert(&cut, prepared);
        self.undo.push(UndoAction::RemoveBackground {
            layer: result.layer,
            previous_source,
            previous_mask,
            previous_erased,
        });
        EditOutcome::Applied
    }

    /// Remove the background of image layer `id` on a worker thread and apply the result.
    pub fn remove_background(
        &mut self,
        id: LayerId,
        remover: Arc<dyn BackgroundRemover>,
        now: Instant,
    ) -> EditOutcome {
        let job = match self.begin_remove_background(id, remover, now) {
            Ok(job) => job,
            Err(r) => return r.into(),
        };
        let ticket = job.ticket;
        match jobs::spawn("background", move || job.run()).and_then(jobs::JobHandle::wait) {
            Ok(result) => self.finish_remove_background(result),
            Err(e) => {
                self.background_guard.finish(ticket);
                UnchangedReason::from_error(&e).into()
            }
        }
    }

    // --------------------------------------------------------------- drawing

    /// Engage the modal freehand tool. Session undo is disabled until it is finished.
    pub fn begin_drawing(&mut self) -> EditOutcome {
        if self.drawing.is_none() {
            self.drawing = Some(DrawingSession::begin(self.canvas.drawing.as_ref()));
        }
        EditOutcome::Applied
    }

    /// Return `true` while the freehand tool is engaged.
    pub fn is_drawing(&self) -> bool {
        self.drawing.is_some()
    }

    /// Freehand tool with its local stroke history.
    pub fn drawing_tool(&mut self) -> Option<&mut DrawingSession> {
        self.drawing.as_mut()
    }

    /// Append a stroke to the freehand tool.
    pub fn draw_stroke(&mut self, stroke: DrawStroke) -> bool {
        self.drawing.as_mut().is_some_and(|d| d.add_stroke(stroke))
    }

    /// Commit the freehand tool as one `draw` action.
    pub fn finish_drawing(&mut self) -> EditOutcome {
        let Some(tool) = self.drawing.take() else {
            return UnchangedReason::TooSparse.into();
        };
        let Some((previous, new)) = tool.finish() else {
            return UnchangedReason::TooSparse.into();
        };
        self.canvas.drawing = new;
        self.undo.push(UndoAction::Draw { previous });
        EditOutcome::Applied
    }

    /// Leave the freehand tool, discarding its strokes.
    pub fn cancel_drawing(&mut self) {
        self.drawing = None;
    }

    // ------------------------------------------------------------------ undo

    /// Pop and revert the most recent action.
    pub fn undo(&mut self) -> EditOutcome {
        if self.drawing.is_some() {
            return UnchangedReason::ModalToolActive.into();
        }
        let Some(action) = self.undo.pop() else {
            return UnchangedReason::NothingToUndo.into();
        };
        let kind = action.kind();
        tracing::debug!(?kind, "undo");
        self.gesture = None;
        if action.revert(&mut self.canvas, &mut self.cache, self.store.as_ref()) {
            EditOutcome::Applied
        } else {
            tracing::warn!(?kind, "undo entry no longer applies; dropped");
            UnchangedReason::Stale.into()
        }
    }

    // ---------------------------------------------------------------- render

    /// Resolve assets for a render. The returned scene can be rendered on any thread.
    pub fn prepare_scene(&mut self) -> CollageResult<Scene> {
        Scene::prepare(
            &self.canvas,
            &mut self.cache,
            self.store.as_ref(),
            self.opts.render_settings(),
        )
    }

    /// Flatten the canvas at the export scale.
    pub fn render(&mut self) -> CollageResult<FrameRGBA> {
        self.prepare_scene()?.render()
    }

    /// Flatten the canvas and encode it as PNG.
    pub fn export_png(&mut self) -> CollageResult<Vec<u8>> {
        self.render()?.to_png()
    }

    /// Unused asset name derived from `source`: `<stem>_<tag><n><suffix>`.
    fn fresh_name(&mut self, source: &str, tag: &str, suffix: &str) -> String {
        let stem = source
            .rsplit_once('.')
            .filter(|(_, ext)| !ext.contains('/'))
            .map_or(source, |(stem, _)| stem);
        loop {
            self.asset_seq += 1;
            let name = format!("{stem}_{tag}{}{suffix}", self.asset_seq);
            if !self.store.exists(&name) {
                return name;
            }
        }
    }
}

fn discard_orphan(store: &dyn AssetStore, name: &str) {
    if let Err(e) = store.delete(name) {
        tracing::warn!(%name, error = %e, "discarded result file not deleted");
    }
}

fn prepare_from_store(
    store: &dyn AssetStore,
    name: &str,
    max_dim: u32,
) -> CollageResult<PreparedBitmap> {
    let bytes = store.read(name)?;
    BitmapCache::prepare(&bytes, max_dim)
}

#[cfg(test)]
#[path = "../../tests/unit/session/edit_session.rs"]
mod tests;
