//! Largest crop rectangle inside the corrected image.
//!
//! After correction the image outline is a general quadrilateral. For a given
//! rectangle centre and diagonal angle the largest inscribed rectangle follows
//! from the nearest intersection of its diagonals with the outline; a simplex
//! search over centre (and optionally angle) maximizes that area.
mod adjust;
mod fitter;
mod geometry;

pub use adjust::adjust_crop;
pub use fitter::{fit_crop, CropParams};
pub use geometry::CropGeometry;
