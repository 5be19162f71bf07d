//! Parameter bundle configuring every stage of a [`CorrectionSession`].
//!
//! [`CorrectionSession`]: crate::session::CorrectionSession
use crate::crop::CropParams;
use crate::fit::{FitParams, FitRanges};
use crate::lines::ClassifierParams;
use crate::outliers::OutlierParams;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeystoneParams {
    /// Direction and length thresholds of the line classifier.
    pub classifier: ClassifierParams,
    /// Vantage-point consensus filter.
    pub outlier: OutlierParams,
    /// Parameter optimizer and its sanity limits.
    pub fit: FitParams,
    /// Crop rectangle search.
    pub crop: CropParams,
    /// Soft bounds of the fitted variables.
    pub ranges: FitRanges,
}
