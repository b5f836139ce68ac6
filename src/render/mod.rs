pub mod composite;
pub mod mask;
pub(crate) mod raster;
pub mod transform;
