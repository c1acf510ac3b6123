use crate::assets::cache::BitmapCache;
use crate::assets::store::AssetStore;
use crate::foundation::core::LayerId;
use crate::model::canvas::Canvas;
use crate::model::drawing::Drawing;
use crate::model::layer::Layer;

/// Kind tag of an [`UndoAction`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Tear of one image layer into two.
    Split,
    /// Image layer added.
    AddImage,
    /// Image layer deleted.
    DeleteImage,
    /// Mask stroke.
    Erase,
    /// Background removal.
    RemoveBackground,
    /// Text layer added.
    AddText,
    /// Text layer deleted.
    DeleteText,
    /// Freehand overlay committed.
    Draw,
}

/// One invertible edit. Each variant carries exactly what is needed to restore the prior
/// canvas without replaying history.
#[derive(Clone, Debug, PartialEq)]
pub enum UndoAction {
    /// `original` (held at `original_index`) was replaced by `children`.
    Split {
        /// Layer that was torn.
        original: Layer,
        /// Insertion index the original held.
        original_index: usize,
        /// The two layers produced by the tear.
        children: [Layer; 2],
    },
    /// Image layer added.
    AddImage {
        /// Added layer.
        layer: LayerId,
    },
    /// Image layer deleted from `index`.
    DeleteImage {
        /// Deleted layer.
        layer: Layer,
        /// Insertion index it held.
        index: usize,
    },
    /// A mask stroke replaced the layer's mask reference.
    Erase {
        /// Edited layer.
        layer: LayerId,
        /// Mask file before the stroke.
        previous_mask: Option<String>,
        /// Legacy erased file before the stroke.
        previous_erased: Option<String>,
    },
    /// Background removal pointed the layer at a new cut-out bitmap.
    ///
    /// The previous source file is never modified, so it is the backup of the pre-removal
    /// bitmap.
    RemoveBackground {
        /// Edited layer.
        layer: LayerId,
        /// Source file before removal.
        previous_source: String,
        /// Mask cleared by the removal.
        previous_mask: Option<String>,
        /// Legacy erased file cleared by the removal.
        previous_erased: Option<String>,
    },
    /// Text layer added.
    AddText {
        /// Added layer.
        layer: LayerId,
    },
    /// Text layer deleted from `index`.
    DeleteText {
        /// Deleted layer.
        layer: Layer,
        /// Insertion index it held.
        index: usize,
    },
    /// Freehand overlay replaced; `previous` is the full prior snapshot.
    Draw {
        /// Overlay before the commit.
        previous: Option<Drawing>,
    },
}

impl UndoAction {
    /// Kind tag.
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Split { .. } => ActionKind::Split,
            Self::AddImage { .. } => ActionKind::AddImage,
            Self::DeleteImage { .. } => ActionKind::DeleteImage,
            Self::Erase { .. } => ActionKind::Erase,
            Self::RemoveBackground { .. } => ActionKind::RemoveBackground,
            Self::AddText { .. } => ActionKind::AddText,
            Self::DeleteText { .. } => ActionKind::DeleteText,
            Self::Draw { .. } => ActionKind::Draw,
        }
    }

    /// Restore the canvas to its state before this action.
    ///
    /// Files written only by this action are deleted. Missing layers or backup files are
    /// logged and skipped; the return value is `false` when nothing could be restored.
    pub(crate) fn revert(
        self,
        canvas: &mut Canvas,
        cache: &mut BitmapCache,
        store: &dyn AssetStore,
    ) -> bool {
        match self {
            Self::Split {
                original,
                original_index,
                children,
            } => {
                if canvas.layer(original.id).is_some() {
                    tracing::warn!(layer = %original.id, "undo split: original id already in use");
                    return false;
                }
                for child in &children {
                    if canvas.remove_layer(child.id).is_none() {
                        tracing::warn!(layer = %child.id, "undo split: child layer already gone");
                    }
                    if let Some(img) = child.as_image() {
                        discard_file(store, cache, &img.source);
                    }
                }
                // Same id as before the tear, so older entries still resolve.
                canvas.insert_layer(original_index, original);
                true
            }
            Self::AddImage { layer } | Self::AddText { layer } => {
                if canvas.remove_layer(layer).is_none() {
                    tracing::warn!(%layer, "undo add: layer already gone");
                    return false;
                }
                true
            }
            Self::DeleteImage { layer, index } | Self::DeleteText { layer, index } => {
                if canvas.layer(layer.id).is_some() {
                    tracing::warn!(layer = %layer.id, "undo delete: id already in use");
                    return false;
                }
                canvas.insert_layer(index, layer);
                true
            }
            Self::Erase {
                layer,
                previous_mask,
                previous_erased,
            } => {
                let Some(img) = canvas.layer_mut(layer).and_then(Layer::as_image_mut) else {
                    tracing::warn!(%layer, "undo erase: image layer missing");
                    return false;
                };
                let current = img.mask.take();
                img.mask = previous_mask;
                img.erased = previous_erased;
                if let Some(current) = current
                    && img.mask.as_deref() != Some(current.as_str())
                {
                    discard_file(store, cache, &current);
                }
                true
            }
            Self::RemoveBackground {
                layer,
                previous_source,
                previous_mask,
                previous_erased,
            } => {
                let Some(img) = canvas.layer_mut(layer).and_then(Layer::as_image_mut) else {
                    tracing::warn!(%layer, "undo remove-background: image layer missing");
                    return false;
                };
                if !store.exists(&previous_source) {
                    tracing::warn!(%layer, source = %previous_source, "undo remove-background: backup missing");
                    return false;
                }
                let cut = std::mem::replace(&mut img.source, previous_source);
                img.mask = previous_mask;
                img.erased = previous_erased;
                if cut != img.source {
                    discard_file(store, cache, &cut);
                }
                true
            }
            Self::Draw { previous } => {
                canvas.drawing = previous;
                true
            }
        }
    }
}

fn discard_file(store: &dyn AssetStore, cache: &mut BitmapCache, name: &str) {
    cache.invalidate(name);
    if let Err(e) = store.delete(name) {
        tracing::warn!(%name, error = %e, "undo: orphaned file not deleted");
    }
}

/// Single stack of invertible actions. Undo pops and reverts; there is no separate redo stack.
#[derive(Clone, Debug, Default)]
pub struct UndoLog {
    actions: Vec<UndoAction>,
}

impl UndoLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an action that has just been applied.
    pub fn push(&mut self, action: UndoAction) {
        tracing::debug!(kind = ?action.kind(), depth = self.actions.len() + 1, "undo push");
        self.actions.push(action);
    }

    /// Remove the most recent action.
    pub fn pop(&mut self) -> Option<UndoAction> {
        self.actions.pop()
    }

    /// Most recent action.
    pub fn last(&self) -> Option<&UndoAction> {
        self.actions.last()
    }

    /// Stack depth.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Return `true` when there is nothing to undo.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Kinds from oldest to newest.
    pub fn kinds(&self) -> Vec<ActionKind> {
        self.actions.iter().map(UndoAction::kind).collect()
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.actions.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/history/undo.rs"]
mod tests;
