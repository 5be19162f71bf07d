//! Serializable reports emitted by the session and the demo binary.
//!
//! `StructureReport` summarizes one structure acquisition, `CorrectionReport`
//! bundles acquisition, fit and crop results for a full correction run.

pub mod report;
pub mod timing;

pub use report::{CorrectionReport, StructureReport};
pub use timing::{StageTiming, TimingBreakdown};
