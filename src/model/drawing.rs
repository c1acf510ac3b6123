use crate::foundation::core::{Point, Rgba8};

/// One freehand stroke in canvas coordinates.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DrawStroke {
    /// Polyline points.
    pub points: Vec<Point>,
    /// Stroke color.
    pub color: Rgba8,
    /// Stroke width in canvas units.
    pub width: f64,
}

/// Full-canvas freehand overlay, painted above every layer.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Drawing {
    /// Strokes in paint order.
    pub strokes: Vec<DrawStroke>,
}

impl Drawing {
    /// Return `true` when there is nothing to paint.
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }
}

/// Modal freehand drawing tool with its own stroke-level history.
///
/// Strokes are too fine-grained for the session undo log, so the tool keeps them locally and
/// the session records one `draw` action when the tool is committed.
#[derive(Clone, Debug)]
pub struct DrawingSession {
    baseline: Option<Drawing>,
    working: Drawing,
    redo: Vec<DrawStroke>,
}

impl DrawingSession {
    /// Start editing from the canvas' current overlay.
    pub fn begin(current: Option<&Drawing>) -> Self {
        Self {
            baseline: current.cloned(),
            working: current.cloned().unwrap_or_default(),
            redo: Vec::new(),
        }
    }

    /// Strokes as currently edited.
    pub fn working(&self) -> &Drawing {
        &self.working
    }

    /// Append a stroke. Strokes with fewer than two points or a bad width are ignored.
    pub fn add_stroke(&mut self, stroke: DrawStroke) -> bool {
        if stroke.points.len() < 2 || !stroke.width.is_finite() || stroke.width <= 0.0 {
            return false;
        }
        self.working.strokes.push(stroke);
        self.redo.clear();
        true
    }

    /// Undo the last stroke inside the tool.
    pub fn undo_stroke(&mut self) -> bool {
        match self.working.strokes.pop() {
            Some(s) => {
                self.redo.push(s);
                true
            }
            None => false,
        }
    }

    /// Redo the last undone stroke inside the tool.
    pub fn redo_stroke(&mut self) -> bool {
        match self.redo.pop() {
            Some(s) => {
                self.working.strokes.push(s);
                true
            }
            None => false,
        }
    }

    /// Remove every stroke (undoable inside the tool one stroke at a time).
    pub fn clear(&mut self) {
        while self.undo_stroke() {}
    }

    /// Return `true` if the overlay differs from the one the tool started with.
    pub fn is_dirty(&self) -> bool {
        self.resolved() != self.baseline
    }

    /// Finish the tool: `(previous, new)` overlays when something changed.
    pub fn finish(self) -> Option<(Option<Drawing>, Option<Drawing>)> {
        if !self.is_dirty() {
            return None;
        }
        let new = self.resolved();
        Some((self.baseline, new))
    }

    fn resolved(&self) -> Option<Drawing> {
        (!self.working.is_empty()).then(|| self.working.clone())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/drawing.rs"]
mod tests;
