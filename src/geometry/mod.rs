pub(crate) mod gesture;
pub(crate) mod transform;
