pub(crate) mod mask;
pub(crate) mod region;
pub(crate) mod stroke;
