use crate::foundation::error::CollageError;

/// Why a session call left the canvas untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnchangedReason {
    /// Fewer than two usable points, or a region with nothing on one side.
    TooSparse,
    /// Another operation of the same kind is in flight or cooling down.
    Busy,
    /// A bitmap, mask or font could not be read or decoded.
    AssetMissing,
    /// Writing a result failed.
    PersistFailed(String),
    /// No layer with that id.
    UnknownLayer,
    /// The layer is not an image layer.
    NotAnImage,
    /// The freehand drawing tool is active.
    ModalToolActive,
    /// The undo log is empty.
    NothingToUndo,
    /// Background removal found no subject.
    NoPersonDetected,
    /// The result or undo entry belongs to state that is no longer current.
    Stale,
}

impl UnchangedReason {
    /// Classify an internal error.
    pub fn from_error(err: &CollageError) -> Self {
        match err {
            CollageError::Asset(_) | CollageError::Decode(_) => Self::AssetMissing,
            CollageError::Validation(_) => Self::TooSparse,
            CollageError::Persist(msg) => Self::PersistFailed(msg.clone()),
            CollageError::Serde(_) | CollageError::Other(_) => Self::PersistFailed(err.to_string()),
        }
    }
}

impl std::fmt::Display for UnchangedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooSparse => f.write_str("input too sparse"),
            Self::Busy => f.write_str("operation already in flight"),
            Self::AssetMissing => f.write_str("asset missing or corrupt"),
            Self::PersistFailed(msg) => write!(f, "persist failed: {msg}"),
            Self::UnknownLayer => f.write_str("unknown layer"),
            Self::NotAnImage => f.write_str("not an image layer"),
            Self::ModalToolActive => f.write_str("drawing tool active"),
            Self::NothingToUndo => f.write_str("nothing to undo"),
            Self::NoPersonDetected => f.write_str("no person detected"),
            Self::Stale => f.write_str("stale result discarded"),
        }
    }
}

/// Result of a mutating session call: the canvas either changed or it did not.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub enum EditOutcome {
    /// The mutation was applied.
    Applied,
    /// Nothing changed.
    Unchanged(UnchangedReason),
}

impl EditOutcome {
    /// Return `true` for [`EditOutcome::Applied`].
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// Reason, if nothing changed.
    pub fn reason(&self) -> Option<&UnchangedReason> {
        match self {
            Self::Applied => None,
            Self::Unchanged(r) => Some(r),
        }
    }
}

impl From<UnchangedReason> for EditOutcome {
    fn from(r: UnchangedReason) -> Self {
        Self::Unchanged(r)
    }
}
