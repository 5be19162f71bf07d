use crate::homogeneous::line_through;
use nalgebra::Vector3;
use serde::Serialize;

/// Direction class of a relevant line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

/// A classified structural line in input image coordinates.
#[derive(Clone, Debug, Serialize)]
pub struct Line {
    pub p1: [f64; 2],
    pub p2: [f64; 2],
    pub length: f64,
    pub width: f64,
    pub weight: f64,
    /// Homogeneous coefficients with `Lx² + Ly² = 1`.
    pub l: Vector3<f64>,
    /// Set for relevant lines only.
    pub orientation: Option<Orientation>,
    pub selected: bool,
}

impl Line {
    /// Builds a line from its endpoints; `None` when they coincide.
    pub fn new(
        p1: [f64; 2],
        p2: [f64; 2],
        width: f64,
        precision: f64,
        orientation: Option<Orientation>,
    ) -> Option<Self> {
        let dx = p2[0] - p1[0];
        let dy = p2[1] - p1[1];
        let length = (dx * dx + dy * dy).sqrt();
        if !length.is_finite() || length <= f64::EPSILON {
            return None;
        }
        let l = line_through(p1, p2);
        Some(Self {
            p1,
            p2,
            length,
            width,
            weight: length * width * precision,
            l,
            orientation,
            selected: orientation.is_some(),
        })
    }

    pub fn is_relevant(&self) -> bool {
        self.orientation.is_some()
    }

    /// Relevant, selected and of the given orientation.
    pub fn is_active(&self, orientation: Orientation) -> bool {
        self.selected && self.orientation == Some(orientation)
    }

    /// Direction angle in degrees, `atan2(dy, dx)`.
    pub fn angle_deg(&self) -> f64 {
        (self.p2[1] - self.p1[1])
            .atan2(self.p2[0] - self.p1[0])
            .to_degrees()
    }
}
