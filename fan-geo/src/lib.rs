pub mod raster;
pub mod roi;
