use super::line::{Line, Orientation};
use serde::Serialize;

/// Placement of the detection buffer relative to the input image.
///
/// Segment coordinates from the detector live in buffer pixels; input
/// coordinates are `(buffer + offset) / scale`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DetectionFrame {
    pub width: usize,
    pub height: usize,
    pub x_off: f64,
    pub y_off: f64,
    pub scale: f64,
}

impl DetectionFrame {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            x_off: 0.0,
            y_off: 0.0,
            scale: 1.0,
        }
    }

    /// Buffer position to input image position.
    #[inline]
    pub fn to_input(&self, p: [f64; 2]) -> [f64; 2] {
        [(p[0] + self.x_off) / self.scale, (p[1] + self.y_off) / self.scale]
    }

    /// Visible area `[xmin, xmax, ymin, ymax]` in input coordinates.
    pub fn visible_bounds(&self) -> [f64; 4] {
        let [xmin, ymin] = self.to_input([0.0, 0.0]);
        let [xmax, ymax] = self.to_input([self.width as f64, self.height as f64]);
        [xmin, xmax, ymin, ymax]
    }

    /// Extent of the input image covered by the buffer, measured from the input origin.
    pub fn image_size(&self) -> (f64, f64) {
        (
            (self.width as f64 + self.x_off) / self.scale,
            (self.height as f64 + self.y_off) / self.scale,
        )
    }
}

/// Lines from one structure acquisition with per-direction accounting.
#[derive(Clone, Debug, Serialize)]
pub struct LineSet {
    pub lines: Vec<Line>,
    /// Selected relevant vertical lines.
    pub vertical_count: usize,
    /// Selected relevant horizontal lines.
    pub horizontal_count: usize,
    /// Summed weight of all relevant vertical lines.
    pub vertical_weight: f64,
    /// Summed weight of all relevant horizontal lines.
    pub horizontal_weight: f64,
    pub frame: DetectionFrame,
    /// Hash of the detection buffer the lines were found in.
    pub content_hash: u64,
    /// Bumped whenever selection flags change.
    pub version: u32,
}

impl LineSet {
    pub fn new(lines: Vec<Line>, frame: DetectionFrame, content_hash: u64) -> Self {
        let mut set = Self {
            lines,
            vertical_count: 0,
            horizontal_count: 0,
            vertical_weight: 0.0,
            horizontal_weight: 0.0,
            frame,
            content_hash,
            version: 0,
        };
        for line in &set.lines {
            match line.orientation {
                Some(Orientation::Vertical) => set.vertical_weight += line.weight,
                Some(Orientation::Horizontal) => set.horizontal_weight += line.weight,
                None => {}
            }
        }
        set.recount();
        set
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn relevant_count(&self) -> usize {
        self.lines.iter().filter(|l| l.is_relevant()).count()
    }

    pub fn count(&self, orientation: Orientation) -> usize {
        match orientation {
            Orientation::Vertical => self.vertical_count,
            Orientation::Horizontal => self.horizontal_count,
        }
    }

    pub fn total_weight(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Vertical => self.vertical_weight,
            Orientation::Horizontal => self.horizontal_weight,
        }
    }

    /// Indices of selected lines of one orientation, in storage order.
    pub fn active_indices(&self, orientation: Orientation) -> Vec<usize> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_active(orientation))
            .map(|(i, _)| i)
            .collect()
    }

    /// Recomputes the selected counts from the line flags.
    pub fn recount(&mut self) {
        self.vertical_count = self
            .lines
            .iter()
            .filter(|l| l.is_active(Orientation::Vertical))
            .count();
        self.horizontal_count = self
            .lines
            .iter()
            .filter(|l| l.is_active(Orientation::Horizontal))
            .count();
    }

    /// Selects or deselects relevant lines lying fully inside `rect`
    /// (`[x0, y0, x1, y1]`, input coordinates). Returns the number of changed lines.
    pub fn set_selection_in_rect(&mut self, rect: [f64; 4], selected: bool) -> usize {
        let x0 = rect[0].min(rect[2]);
        let x1 = rect[0].max(rect[2]);
        let y0 = rect[1].min(rect[3]);
        let y1 = rect[1].max(rect[3]);
        let inside = |p: [f64; 2]| p[0] >= x0 && p[0] <= x1 && p[1] >= y0 && p[1] <= y1;

        let mut changed = 0;
        for line in self.lines.iter_mut().filter(|l| l.is_relevant()) {
            if line.selected != selected && inside(line.p1) && inside(line.p2) {
                line.selected = selected;
                changed += 1;
            }
        }
        if changed > 0 {
            self.recount();
            self.version = self.version.wrapping_add(1);
        }
        changed
    }

    /// djb2-style hash over the endpoint bit patterns.
    pub fn lines_hash(&self) -> u64 {
        let mut hash: u64 = 5381;
        for line in &self.lines {
            for v in [line.p1[0], line.p1[1], line.p2[0], line.p2[1]] {
                let bits = (v as f32).to_bits() as u64;
                hash = ((hash << 5).wrapping_add(hash)) ^ bits;
            }
        }
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertical(x: f64) -> Line {
        Line::new([x, 10.0], [x, 90.0], 1.0, 1.0, Some(Orientation::Vertical)).unwrap()
    }

    fn horizontal(y: f64) -> Line {
        Line::new([10.0, y], [90.0, y], 1.0, 1.0, Some(Orientation::Horizontal)).unwrap()
    }

    #[test]
    fn counts_and_weights() {
        let set = LineSet::new(
            vec![vertical(20.0), vertical(40.0), horizontal(50.0)],
            DetectionFrame::new(100, 100),
            7,
        );
        assert_eq!(set.vertical_count, 2);
        assert_eq!(set.horizontal_count, 1);
        assert_eq!(set.vertical_weight, 160.0);
        assert_eq!(set.horizontal_weight, 80.0);
        assert_eq!(set.active_indices(Orientation::Vertical), vec![0, 1]);
    }

    #[test]
    fn rect_selection_updates_counts_and_version() {
        let mut set = LineSet::new(
            vec![vertical(20.0), vertical(60.0), horizontal(50.0)],
            DetectionFrame::new(100, 100),
            0,
        );
        let changed = set.set_selection_in_rect([0.0, 0.0, 30.0, 100.0], false);
        assert_eq!(changed, 1);
        assert_eq!(set.vertical_count, 1);
        assert_eq!(set.version, 1);
        assert_eq!(set.set_selection_in_rect([0.0, 0.0, 30.0, 100.0], false), 0);
        assert_eq!(set.version, 1);
    }

    #[test]
    fn hash_tracks_geometry() {
        let frame = DetectionFrame::new(100, 100);
        let a = LineSet::new(vec![vertical(20.0)], frame, 0);
        let b = LineSet::new(vec![vertical(20.0)], frame, 0);
        let c = LineSet::new(vec![vertical(21.0)], frame, 0);
        assert_eq!(a.lines_hash(), b.lines_hash());
        assert_ne!(a.lines_hash(), c.lines_hash());
    }

    #[test]
    fn frame_maps_buffer_to_input() {
        let frame = DetectionFrame {
            width: 50,
            height: 40,
            x_off: 10.0,
            y_off: 20.0,
            scale: 0.5,
        };
        assert_eq!(frame.to_input([0.0, 0.0]), [20.0, 40.0]);
        assert_eq!(frame.visible_bounds(), [20.0, 120.0, 40.0, 120.0]);
        assert_eq!(frame.image_size(), (120.0, 120.0));
    }
}
