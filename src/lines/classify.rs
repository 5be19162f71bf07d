use super::line::{Line, Orientation};
use super::set::{DetectionFrame, LineSet};
use log::debug;
use serde::{Deserialize, Serialize};

/// Segment as reported by a detector, in detection buffer pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawSegment {
    pub p1: [f64; 2],
    pub p2: [f64; 2],
    /// Width of the supporting region.
    pub width: f64,
    /// Angular precision reported by the detector, used as a weight factor.
    pub precision: f64,
}

impl RawSegment {
    pub fn new(p1: [f64; 2], p2: [f64; 2]) -> Self {
        Self {
            p1,
            p2,
            width: 1.0,
            precision: 1.0,
        }
    }
}

/// Thresholds of the direction classifier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassifierParams {
    /// Lines at or below this length (input pixels) are irrelevant.
    pub min_line_length: f64,
    /// Maximum deviation from the vertical/horizontal axis in degrees.
    pub max_tangential_deviation_deg: f64,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            min_line_length: 5.0,
            max_tangential_deviation_deg: 30.0,
        }
    }
}

/// Segments parallel to and hugging a buffer border are processing artifacts.
fn hugs_border(seg: &RawSegment, frame: &DetectionFrame) -> bool {
    let [x1, y1] = seg.p1;
    let [x2, y2] = seg.p2;
    let w = frame.width as f64;
    let h = frame.height as f64;
    let along_x = (x1 - x2).abs() < 1.0;
    let along_y = (y1 - y2).abs() < 1.0;
    (along_x && x1.max(x2) < 2.0)
        || (along_x && x1.min(x2) > w - 3.0)
        || (along_y && y1.max(y2) < 2.0)
        || (along_y && y1.min(y2) > h - 3.0)
}

fn orientation_of(angle_deg: f64, max_dev: f64) -> Option<Orientation> {
    let from_vertical = (angle_deg.abs() - 90.0).abs();
    if from_vertical < max_dev {
        Some(Orientation::Vertical)
    } else if (from_vertical - 90.0).abs() < max_dev {
        Some(Orientation::Horizontal)
    } else {
        None
    }
}

/// Classifies raw detector output into a [`LineSet`].
///
/// Border artifacts and zero-length segments are dropped. Remaining segments
/// are mapped into input coordinates and become relevant (and selected) when
/// longer than `min_line_length` and close enough to an axis.
pub fn classify_segments(
    segments: &[RawSegment],
    frame: DetectionFrame,
    content_hash: u64,
    params: &ClassifierParams,
) -> LineSet {
    let mut lines = Vec::with_capacity(segments.len());
    let mut skipped_border = 0usize;
    for seg in segments {
        if hugs_border(seg, &frame) {
            skipped_border += 1;
            continue;
        }
        let p1 = frame.to_input(seg.p1);
        let p2 = frame.to_input(seg.p2);
        let dx = p2[0] - p1[0];
        let dy = p2[1] - p1[1];
        let length = (dx * dx + dy * dy).sqrt();
        let angle = dy.atan2(dx).to_degrees();
        let orientation = if length > params.min_line_length {
            orientation_of(angle, params.max_tangential_deviation_deg)
        } else {
            None
        };
        let width = seg.width / frame.scale;
        if let Some(line) = Line::new(p1, p2, width, seg.precision, orientation) {
            lines.push(line);
        }
    }

    let set = LineSet::new(lines, frame, content_hash);
    debug!(
        "classify: {} segments -> {} lines (vertical {}, horizontal {}, irrelevant {}, border {})",
        segments.len(),
        set.len(),
        set.vertical_count,
        set.horizontal_count,
        set.len() - set.relevant_count(),
        skipped_border
    );
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DetectionFrame {
        DetectionFrame::new(200, 100)
    }

    #[test]
    fn direction_classes() {
        let params = ClassifierParams::default();
        let segs = [
            RawSegment::new([50.0, 10.0], [55.0, 90.0]),
            RawSegment::new([20.0, 50.0], [180.0, 40.0]),
            RawSegment::new([20.0, 20.0], [80.0, 80.0]),
            RawSegment::new([60.0, 90.0], [58.0, 10.0]),
        ];
        let set = classify_segments(&segs, frame(), 0, &params);
        let kinds: Vec<_> = set.lines.iter().map(|l| l.orientation).collect();
        assert_eq!(
            kinds,
            vec![
                Some(Orientation::Vertical),
                Some(Orientation::Horizontal),
                None,
                Some(Orientation::Vertical),
            ]
        );
        assert_eq!(set.vertical_count, 2);
        assert_eq!(set.horizontal_count, 1);
    }

    #[test]
    fn short_lines_are_irrelevant() {
        let segs = [RawSegment::new([50.0, 10.0], [50.0, 14.0])];
        let set = classify_segments(&segs, frame(), 0, &ClassifierParams::default());
        assert_eq!(set.len(), 1);
        assert!(!set.lines[0].is_relevant());
        assert!(!set.lines[0].selected);
    }

    #[test]
    fn border_artifacts_are_skipped() {
        let segs = [
            RawSegment::new([0.5, 5.0], [1.0, 95.0]),
            RawSegment::new([198.0, 5.0], [198.5, 95.0]),
            RawSegment::new([5.0, 0.2], [195.0, 0.8]),
            RawSegment::new([5.0, 98.0], [195.0, 98.0]),
            RawSegment::new([100.0, 5.0], [100.0, 95.0]),
        ];
        let set = classify_segments(&segs, frame(), 0, &ClassifierParams::default());
        assert_eq!(set.len(), 1);
        assert_eq!(set.lines[0].p1, [100.0, 5.0]);
    }

    #[test]
    fn frame_offset_and_scale_applied() {
        let frame = DetectionFrame {
            width: 100,
            height: 100,
            x_off: 10.0,
            y_off: 0.0,
            scale: 0.5,
        };
        let seg = RawSegment {
            p1: [20.0, 10.0],
            p2: [20.0, 60.0],
            width: 2.0,
            precision: 0.5,
        };
        let set = classify_segments(&[seg], frame, 0, &ClassifierParams::default());
        let line = &set.lines[0];
        assert_eq!(line.p1, [60.0, 20.0]);
        assert_eq!(line.length, 100.0);
        assert_eq!(line.width, 4.0);
        assert_eq!(line.weight, 200.0);
    }
}
