use super::timing::TimingBreakdown;
use crate::fit::FitReport;
use crate::outliers::OutlierDiagnostics;
use crate::types::{CropBox, ModelParameters};
use serde::Serialize;

/// Summary of one structure acquisition.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureReport {
    /// Segments returned by the detector.
    pub segments: usize,
    /// Lines kept after border and degeneracy checks.
    pub lines: usize,
    pub relevant: usize,
    /// Selected vertical lines after outlier removal.
    pub vertical: usize,
    /// Selected horizontal lines after outlier removal.
    pub horizontal: usize,
    /// Geometry hash of the acquired lines.
    pub lines_hash: u64,
    pub outliers: OutlierDiagnostics,
    pub timing: TimingBreakdown,
}

/// Everything a correction run produced, as written by the demo binary.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionReport {
    pub width: usize,
    pub height: usize,
    pub flipped: bool,
    pub structure: Option<StructureReport>,
    pub fit: Option<FitReport>,
    pub crop: Option<CropBox>,
    /// Parameters after the run.
    pub params: ModelParameters,
    /// Size of the corrected output before cropping.
    pub output_size: [usize; 2],
    /// First error reported by the session, if any.
    pub error: Option<String>,
    pub timing: TimingBreakdown,
}

impl CorrectionReport {
    pub fn new(width: usize, height: usize, params: ModelParameters) -> Self {
        Self {
            width,
            height,
            flipped: false,
            structure: None,
            fit: None,
            crop: None,
            params,
            output_size: [width, height],
            error: None,
            timing: TimingBreakdown::default(),
        }
    }

    /// Plain text summary for terminals.
    pub fn print_text_summary(&self) {
        println!("Input: {}x{} (flipped: {})", self.width, self.height, self.flipped);
        if let Some(s) = &self.structure {
            println!(
                "Structure: {} segments -> {} lines, {} relevant, {} vertical, {} horizontal",
                s.segments, s.lines, s.relevant, s.vertical, s.horizontal
            );
        }
        if let Some(f) = &self.fit {
            println!(
                "Fit: {:?} after {} iterations (rotation {:.3}, lensshift_v {:.4}, lensshift_h {:.4}, shear {:.4})",
                f.outcome, f.iterations, f.rotation, f.lensshift_v, f.lensshift_h, f.shear
            );
        }
        if let Some(c) = &self.crop {
            println!(
                "Crop: [{:.4}, {:.4}] x [{:.4}, {:.4}]",
                c.cl, c.cr, c.ct, c.cb
            );
        }
        println!("Output: {}x{}", self.output_size[0], self.output_size[1]);
        if let Some(err) = &self.error {
            println!("Error: {err}");
        }
        println!("Total: {:.3} ms", self.timing.total_ms);
    }
}
