//! Error taxonomy of the correction engine.
//!
//! Every variant carries one human-readable message suitable for showing to
//! the user as is. Pure geometric helpers return `Option` instead and the
//! homography builder degrades to identity, so these errors only surface from
//! the fitting and cropping stages and from the session orchestration.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrectionError {
    /// The corrected image outline has no area to place a crop in.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
    /// Too few relevant lines in a requested direction.
    #[error("not enough structure for automatic correction")]
    InsufficientData,
    /// The optimizer hit its iteration cap.
    #[error("automatic correction failed, please correct manually")]
    NonConvergence,
    /// The fitted parameters blow the image up beyond the growth limit.
    #[error("automatic correction failed, please correct manually")]
    InsaneResult,
    /// The crop search did not produce a usable rectangle.
    #[error("automatic cropping failed")]
    CropFitFailure,
    /// A fit is already running on this session.
    #[error("a correction is already in progress")]
    Busy,
    /// No detection buffer has been provided yet.
    #[error("data pending - please repeat")]
    DataPending,
    /// The detector found no usable structure in the buffer.
    #[error("could not detect structural data in image")]
    NoStructure,
}

impl CorrectionError {
    /// Whether the caller may simply retry once the session has new data.
    pub fn is_transient(&self) -> bool {
        matches!(self, CorrectionError::Busy | CorrectionError::DataPending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_failures_share_one_message() {
        assert_eq!(
            CorrectionError::NonConvergence.to_string(),
            CorrectionError::InsaneResult.to_string()
        );
        assert_eq!(
            CorrectionError::InsufficientData.to_string(),
            "not enough structure for automatic correction"
        );
    }

    #[test]
    fn transient_errors() {
        assert!(CorrectionError::Busy.is_transient());
        assert!(CorrectionError::DataPending.is_transient());
        assert!(!CorrectionError::CropFitFailure.is_transient());
    }
}
