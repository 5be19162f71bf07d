//! Caller-owned correction session.
//!
//! A [`CorrectionSession`] holds the detection buffer, the lines acquired on
//! it and the crop cache, and sequences the stages:
//! structure acquisition → outlier filter → parameter fit → crop.
//!
//! Model parameters stay with the caller and are only written when a stage
//! succeeds. A failed crop is the exception: it switches cropping off and
//! restores the full frame.
//!
//! Lines remember the hash of the buffer they were detected on; after
//! [`CorrectionSession::set_buffer`] with different content they are stale and
//! [`CorrectionSession::fit`] acquires fresh structure first.
use crate::angle::is_quarter_turn;
use crate::crop::{adjust_crop, fit_crop};
use crate::detector::SegmentDetector;
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{StructureReport, TimingBreakdown};
use crate::error::CorrectionError;
use crate::fit::{fit_parameters, FitAxis, FitOutcome, FitReport};
use crate::image::{ImageF32, RgbImageF32};
use crate::lines::{classify_segments, DetectionFrame, LineSet};
use crate::outliers::{self, OutlierDiagnostics};
use crate::params::KeystoneParams;
use crate::preprocess::{self, Enhance, RAW_GAMMA};
use crate::types::{CropBox, CropMode, ModelParameters};
use log::{debug, warn};
use std::hash::Hasher;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Greyscale buffer the detector runs on, with its placement in the input.
#[derive(Clone, Debug)]
pub struct DetectionBuffer {
    pub image: ImageF32,
    /// Colour source of `image` (after the raw gamma lift), for detail enhancement.
    pub rgb: Option<RgbImageF32>,
    pub x_off: f64,
    pub y_off: f64,
    pub scale: f64,
    /// Hash of pixels and placement.
    pub content_hash: u64,
}

impl DetectionBuffer {
    pub fn new(image: ImageF32, x_off: f64, y_off: f64, scale: f64) -> Self {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        hasher.write_u64(image.content_hash());
        hasher.write_u64(x_off.to_bits());
        hasher.write_u64(y_off.to_bits());
        hasher.write_u64(scale.to_bits());
        Self {
            image,
            rgb: None,
            x_off,
            y_off,
            scale,
            content_hash: hasher.finish(),
        }
    }

    /// Applies `enhance`, using the colour source when there is one.
    pub fn prepared(&self, enhance: Enhance) -> ImageF32 {
        preprocess::prepare(&self.image, self.rgb.as_ref(), enhance)
    }

    pub fn frame(&self) -> DetectionFrame {
        DetectionFrame {
            width: self.image.w,
            height: self.image.h,
            x_off: self.x_off,
            y_off: self.y_off,
            scale: self.scale,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct CachedCrop {
    key: u64,
    crop: CropBox,
}

/// Inputs that determine the crop rectangle.
fn crop_key(params: &ModelParameters, width: f64, height: f64) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for v in [
        params.rotation,
        params.lensshift_v,
        params.lensshift_h,
        params.shear,
        params.focal_length,
        params.crop_factor,
        params.orthocorr,
        params.aspect,
        width,
        height,
    ] {
        hasher.write_u64(v.to_bits());
    }
    hasher.write_u8(params.mode as u8);
    hasher.write_u8(params.crop_mode as u8);
    hasher.finish()
}

/// Clears the fitting flag when dropped.
struct FittingGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for FittingGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

fn fit_error(outcome: FitOutcome) -> Option<CorrectionError> {
    match outcome {
        FitOutcome::Success => None,
        FitOutcome::NotEnoughLines => Some(CorrectionError::InsufficientData),
        FitOutcome::DidNotConverge => Some(CorrectionError::NonConvergence),
        FitOutcome::Insane => Some(CorrectionError::InsaneResult),
    }
}

pub struct CorrectionSession {
    params: KeystoneParams,
    buffer: Option<DetectionBuffer>,
    lines: Option<LineSet>,
    flipped: bool,
    enhance: Enhance,
    fitting: Arc<AtomicBool>,
    crop_cache: Option<CachedCrop>,
    last_outliers: Option<OutlierDiagnostics>,
}

impl CorrectionSession {
    pub fn new(params: KeystoneParams) -> Self {
        Self {
            params,
            buffer: None,
            lines: None,
            flipped: false,
            enhance: Enhance::None,
            fitting: Arc::new(AtomicBool::new(false)),
            crop_cache: None,
            last_outliers: None,
        }
    }

    pub fn params(&self) -> &KeystoneParams {
        &self.params
    }

    /// Replaces the stage parameters. Cached crops are dropped.
    pub fn set_params(&mut self, params: KeystoneParams) {
        self.params = params;
        self.crop_cache = None;
    }

    /// Shared fitting flag. While it is set every session operation returns
    /// [`CorrectionError::Busy`]; other threads may watch it.
    pub fn fitting_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.fitting)
    }

    pub fn is_fitting(&self) -> bool {
        self.fitting.load(Ordering::Acquire)
    }

    fn begin(&self) -> Result<FittingGuard, CorrectionError> {
        self.fitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CorrectionError::Busy)?;
        Ok(FittingGuard {
            flag: Arc::clone(&self.fitting),
        })
    }

    /// Stores a greyscale detection buffer placed at `(x_off, y_off)` of the
    /// input scaled by `scale`.
    pub fn set_buffer(&mut self, image: ImageF32, x_off: f64, y_off: f64, scale: f64) {
        self.store(DetectionBuffer::new(image, x_off, y_off, scale));
    }

    fn store(&mut self, buffer: DetectionBuffer) {
        debug!(
            "session: buffer {}x{} at ({:.1}, {:.1}) scale {:.3}, hash {:016x}",
            buffer.image.w,
            buffer.image.h,
            buffer.x_off,
            buffer.y_off,
            buffer.scale,
            buffer.content_hash
        );
        self.buffer = Some(buffer);
    }

    /// Converts an RGB buffer to greyscale (lifting linear raw data first)
    /// and stores both.
    pub fn set_rgb_buffer(
        &mut self,
        rgb: &RgbImageF32,
        x_off: f64,
        y_off: f64,
        scale: f64,
        is_raw: bool,
    ) {
        let mut source = rgb.clone();
        if is_raw {
            preprocess::apply_gamma(&mut source, RAW_GAMMA);
        }
        let mut buffer =
            DetectionBuffer::new(preprocess::greyscale(&source), x_off, y_off, scale);
        buffer.rgb = Some(source);
        self.store(buffer);
    }

    pub fn buffer(&self) -> Option<&DetectionBuffer> {
        self.buffer.as_ref()
    }

    /// Input extent covered by the buffer.
    pub fn image_size(&self) -> Option<(f64, f64)> {
        self.buffer.as_ref().map(|b| b.frame().image_size())
    }

    pub fn set_flipped(&mut self, flipped: bool) {
        self.flipped = flipped;
    }

    /// Derives the flip state from the image diagonal before and after the
    /// preceding pipeline transforms.
    pub fn update_orientation(&mut self, input_diagonal: [f64; 2], output_diagonal: [f64; 2]) {
        self.flipped = is_quarter_turn(&input_diagonal, &output_diagonal);
        debug!("session: flipped {}", self.flipped);
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn lines(&self) -> Option<&LineSet> {
        self.lines.as_ref()
    }

    pub fn last_outliers(&self) -> Option<&OutlierDiagnostics> {
        self.last_outliers.as_ref()
    }

    /// Whether lines exist and were detected on the current buffer.
    pub fn has_fresh_lines(&self) -> bool {
        match (&self.lines, &self.buffer) {
            (Some(lines), Some(buffer)) => lines.content_hash == buffer.content_hash,
            _ => false,
        }
    }

    /// Runs detection, classification and outlier removal on the current buffer.
    pub fn acquire_structure<D: SegmentDetector + ?Sized>(
        &mut self,
        detector: &D,
        enhance: Enhance,
    ) -> Result<StructureReport, CorrectionError> {
        let _guard = self.begin()?;
        self.acquire(detector, enhance)
    }

    fn acquire<D: SegmentDetector + ?Sized>(
        &mut self,
        detector: &D,
        enhance: Enhance,
    ) -> Result<StructureReport, CorrectionError> {
        let buffer = self.buffer.as_ref().ok_or(CorrectionError::DataPending)?;
        let start = Instant::now();
        let mut timing = TimingBreakdown::default();

        let mut t = Instant::now();
        let prepared = buffer.prepared(enhance);
        t = timing.lap("preprocess", t);
        let segments = detector.detect(&prepared);
        t = timing.lap("detect", t);
        let mut set = classify_segments(
            &segments,
            buffer.frame(),
            buffer.content_hash,
            &self.params.classifier,
        );
        t = timing.lap("classify", t);

        self.enhance = enhance;
        if set.is_empty() {
            warn!("session: no structure in {} segments", segments.len());
            self.lines = None;
            self.last_outliers = None;
            return Err(CorrectionError::NoStructure);
        }

        let diag = outliers::remove_outliers(&mut set, &self.params.outlier);
        timing.lap("outliers", t);
        timing.total_ms = elapsed_ms(start);

        let report = StructureReport {
            segments: segments.len(),
            lines: set.len(),
            relevant: set.relevant_count(),
            vertical: set.vertical_count,
            horizontal: set.horizontal_count,
            lines_hash: set.lines_hash(),
            outliers: diag.clone(),
            timing,
        };
        debug!(
            "session: structure with {} lines ({} vertical, {} horizontal) in {:.3} ms",
            report.lines, report.vertical, report.horizontal, report.timing.total_ms
        );
        self.lines = Some(set);
        self.last_outliers = Some(diag);
        Ok(report)
    }

    /// Re-runs the consensus filter on the current lines.
    pub fn remove_outliers(&mut self) -> Result<OutlierDiagnostics, CorrectionError> {
        let _guard = self.begin()?;
        let lines = self.lines.as_mut().ok_or(CorrectionError::NoStructure)?;
        let diag = outliers::remove_outliers(lines, &self.params.outlier);
        self.last_outliers = Some(diag.clone());
        Ok(diag)
    }

    /// Selects or deselects relevant lines inside `rect` (`[x0, y0, x1, y1]`,
    /// input coordinates). Returns the number of changed lines.
    pub fn select_lines_in_rect(
        &mut self,
        rect: [f64; 4],
        selected: bool,
    ) -> Result<usize, CorrectionError> {
        let _guard = self.begin()?;
        let lines = self.lines.as_mut().ok_or(CorrectionError::NoStructure)?;
        Ok(lines.set_selection_in_rect(rect, selected))
    }

    /// Drops the acquired lines.
    pub fn clean_structure(&mut self) -> Result<(), CorrectionError> {
        let _guard = self.begin()?;
        self.lines = None;
        self.last_outliers = None;
        Ok(())
    }

    /// Fits the variables named by `axis`, acquiring structure first when
    /// there are no lines for the current buffer.
    ///
    /// On success `params` holds the fitted values and, when cropping is on,
    /// the new crop. A failing crop does not fail the fit; it leaves cropping
    /// switched off.
    pub fn fit<D: SegmentDetector + ?Sized>(
        &mut self,
        params: &mut ModelParameters,
        axis: FitAxis,
        detector: &D,
    ) -> Result<FitReport, CorrectionError> {
        let _guard = self.begin()?;
        if !self.has_fresh_lines() {
            self.acquire(detector, self.enhance)?;
        }
        let lines = self.lines.as_ref().ok_or(CorrectionError::NoStructure)?;
        let report = fit_parameters(
            lines,
            params,
            axis,
            self.flipped,
            &self.params.ranges,
            &self.params.fit,
        );
        if let Some(err) = fit_error(report.outcome) {
            warn!("session: fit failed ({:?})", report.outcome);
            return Err(err);
        }
        if let Err(err) = self.crop_with_cache(params) {
            warn!("session: {err}");
        }
        Ok(report)
    }

    /// Computes the crop for the current parameters and writes it to `params`.
    pub fn crop(&mut self, params: &mut ModelParameters) -> Result<CropBox, CorrectionError> {
        let _guard = self.begin()?;
        self.crop_with_cache(params)
    }

    fn crop_with_cache(&mut self, params: &mut ModelParameters) -> Result<CropBox, CorrectionError> {
        if params.crop_mode == CropMode::Off {
            params.crop = CropBox::FULL;
            return Ok(CropBox::FULL);
        }
        let (width, height) = self.image_size().ok_or(CorrectionError::DataPending)?;
        let key = crop_key(params, width, height);
        if let Some(cached) = self.crop_cache.filter(|c| c.key == key) {
            params.crop = cached.crop;
            return Ok(cached.crop);
        }
        match fit_crop(params, width, height, &self.params.crop) {
            Ok(crop) => {
                params.crop = crop;
                self.crop_cache = Some(CachedCrop { key, crop });
                Ok(crop)
            }
            Err(err) => {
                params.crop_mode = CropMode::Off;
                params.crop = CropBox::FULL;
                self.crop_cache = None;
                Err(err)
            }
        }
    }

    /// Recentres the crop at `(x, y)` in output fractions. Returns whether the
    /// crop changed; moves leaving less than 1 % of the area are ignored.
    pub fn adjust_crop(
        &self,
        params: &mut ModelParameters,
        x: f64,
        y: f64,
    ) -> Result<bool, CorrectionError> {
        if self.is_fitting() {
            return Err(CorrectionError::Busy);
        }
        let (width, height) = self.image_size().ok_or(CorrectionError::DataPending)?;
        match adjust_crop(params, width, height, x, y) {
            Some(crop) => {
                params.crop = crop;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
