pub(crate) mod canvas;
pub(crate) mod drawing;
pub(crate) mod layer;
