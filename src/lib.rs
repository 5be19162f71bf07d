#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod detector;
pub mod diagnostics;
pub mod error;
pub mod homography;
pub mod image;
pub mod params;
pub mod session;
pub mod types;

// Stage modules – public so tools can run single stages.
pub mod angle;
pub mod crop;
pub mod fit;
pub mod homogeneous;
pub mod lines;
pub mod outliers;
pub mod preprocess;
pub mod simplex;

// --- High-level re-exports -------------------------------------------------

// Main entry points: session + parameters.
pub use crate::detector::SegmentDetector;
pub use crate::error::CorrectionError;
pub use crate::params::KeystoneParams;
pub use crate::session::CorrectionSession;
pub use crate::types::{CropBox, CropMode, LensMode, ModelParameters};

// Reports returned by the session.
pub use crate::diagnostics::{CorrectionReport, StructureReport};
pub use crate::fit::{FitAxis, FitReport};

// Point transforms for the warp stage.
pub use crate::homography::{backtransform_points, output_extent, transform_points};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
pub mod prelude {
    pub use crate::image::{ImageF32, RgbImageF32};
    pub use crate::lines::RawSegment;
    pub use crate::preprocess::Enhance;
    pub use crate::{
        CorrectionError, CorrectionSession, CropMode, FitAxis, KeystoneParams, ModelParameters,
        SegmentDetector,
    };
}
