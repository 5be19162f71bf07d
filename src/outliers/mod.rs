//! Vanishing-point consensus filter for structural lines.
//!
//! Lines that are vertical (or horizontal) in the scene meet in a common
//! vanishing point after projection. For each direction the filter repeatedly
//! builds a candidate point from two lines, scores how many of the remaining
//! lines pass close to it, and keeps the best partition as the selected set.
//! The inlier threshold tunes itself in a series of dry runs towards a target
//! elimination ratio. Small sets are enumerated exhaustively with QuickPerm.
mod consensus;
mod permutation;

pub use consensus::{remove_outliers, OutlierDiagnostics, OutlierParams, SubsetReport, MAX_HURDLE};
pub use permutation::{factorial, QuickPerm};
