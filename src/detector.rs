//! Seam to the external line-segment extractor.
//!
//! Any LSD-style detector can drive the session by implementing
//! [`SegmentDetector`]; plain closures implement it as well.
use crate::image::ImageF32;
use crate::lines::RawSegment;

/// Extracts straight segments from a greyscale detection buffer.
///
/// Coordinates are buffer pixels; the session maps them to input
/// coordinates through the buffer's offsets and scale.
pub trait SegmentDetector {
    fn detect(&self, image: &ImageF32) -> Vec<RawSegment>;
}

impl<F> SegmentDetector for F
where
    F: Fn(&ImageF32) -> Vec<RawSegment>,
{
    fn detect(&self, image: &ImageF32) -> Vec<RawSegment> {
        self(image)
    }
}

/// Detector returning a fixed list, handy for replaying recorded segments.
#[derive(Clone, Debug, Default)]
pub struct RecordedSegments(pub Vec<RawSegment>);

impl SegmentDetector for RecordedSegments {
    fn detect(&self, _image: &ImageF32) -> Vec<RawSegment> {
        self.0.clone()
    }
}
