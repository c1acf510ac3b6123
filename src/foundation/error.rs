/// Result alias used throughout the crate.
pub type CollageResult<T> = Result<T, CollageError>;

/// Crate error type.
///
/// These errors stay inside the engine. The [`crate::EditSession`] maps them onto
/// [`crate::EditOutcome`] so callers only ever see an applied or an unchanged canvas.
#[derive(thiserror::Error, Debug)]
pub enum CollageError {
    /// Input failed a precondition (bad size, bad path, out of range value).
    #[error("validation error: {0}")]
    Validation(String),

    /// Bitmap or mask bytes could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A referenced asset does not exist or could not be read.
    #[error("asset error: {0}")]
    Asset(String),

    /// Writing an asset failed.
    #[error("persist error: {0}")]
    Persist(String),

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Any other error, with its source preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CollageError {
    /// Build a [`CollageError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CollageError::Decode`].
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`CollageError::Asset`].
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`CollageError::Persist`].
    pub fn persist(msg: impl Into<String>) -> Self {
        Self::Persist(msg.into())
    }

    /// Build a [`CollageError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for missing or undecodable inputs, which callers degrade around.
    pub fn is_missing_or_corrupt(&self) -> bool {
        matches!(self, Self::Asset(_) | Self::Decode(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
