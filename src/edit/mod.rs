pub(crate) mod background;
pub(crate) mod guard;
pub mod jobs;
pub(crate) mod mask_paint;
pub(crate) mod tear;
