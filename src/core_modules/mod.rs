pub mod affine_warp;
pub mod assignment;
pub mod compositor;
pub mod distortion;
pub mod edge;
pub mod hashing;
pub mod indicator;
pub mod pixel;
pub mod region;
pub mod utils;
pub mod voronoi;
