use crate::homogeneous::{cross_normalized, line_normalized};
use crate::homography::{build, Direction, Warp};
use crate::lines::{Line, Orientation};
use crate::types::LensGeometry;
use nalgebra::Vector3;

/// Line directions entering the fitness.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineSelection {
    pub vertical: bool,
    pub horizontal: bool,
}

impl LineSelection {
    pub fn accepts(&self, line: &Line) -> bool {
        if !line.selected {
            return false;
        }
        match line.orientation {
            Some(Orientation::Vertical) => self.vertical,
            Some(Orientation::Horizontal) => self.horizontal,
            None => false,
        }
    }
}

/// Residual tilt of the selected lines after applying `warp`; zero when every
/// line is exactly axis aligned.
///
/// Each transformed line contributes `s²·w`, where `s` is its normalized
/// coefficient along the axis it should be perpendicular to. The per-direction
/// means are weighted by their share of lines and combined as
/// `sqrt(1 − (1 − v)(1 − h))`, scaled by `1e6`.
pub fn model_fitness(
    lines: &[Line],
    warp: &Warp,
    lens: &LensGeometry,
    width: f64,
    height: f64,
    selection: LineSelection,
) -> f64 {
    let h = build(warp, lens, width, height, Direction::Forward);
    let axis_v = Vector3::new(0.0, 1.0, 0.0);
    let axis_h = Vector3::new(1.0, 0.0, 0.0);

    let mut sumsq = [0.0f64; 2];
    let mut weight = [0.0f64; 2];
    let mut count = [0usize; 2];
    for line in lines.iter().filter(|l| selection.accepts(l)) {
        let vertical = line.orientation == Some(Orientation::Vertical);
        let p1 = h * Vector3::new(line.p1[0], line.p1[1], 1.0);
        let p2 = h * Vector3::new(line.p2[0], line.p2[1], 1.0);
        let l = line_normalized(&cross_normalized(&p1, &p2));
        let (s, k) = if vertical {
            (l.dot(&axis_v), 0)
        } else {
            (l.dot(&axis_h), 1)
        };
        sumsq[k] += s * s * line.weight;
        weight[k] += line.weight;
        count[k] += 1;
    }

    let total = count[0] + count[1];
    let share = |k: usize| {
        if weight[k] > 0.0 && total > 0 {
            sumsq[k] / weight[k] * count[k] as f64 / total as f64
        } else {
            0.0
        }
    };
    let v = share(0);
    let hz = share(1);
    (1.0 - (1.0 - v) * (1.0 - hz)).max(0.0).sqrt() * 1.0e6
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lens() -> LensGeometry {
        LensGeometry {
            f_length_kb: 28.0,
            orthocorr: 0.0,
            aspect: 1.0,
        }
    }

    fn line(p1: [f64; 2], p2: [f64; 2], o: Orientation) -> Line {
        Line::new(p1, p2, 1.0, 1.0, Some(o)).unwrap()
    }

    const BOTH: LineSelection = LineSelection {
        vertical: true,
        horizontal: true,
    };

    #[test]
    fn aligned_lines_have_zero_fitness() {
        let lines = vec![
            line([100.0, 50.0], [100.0, 400.0], Orientation::Vertical),
            line([500.0, 50.0], [500.0, 400.0], Orientation::Vertical),
            line([50.0, 200.0], [600.0, 200.0], Orientation::Horizontal),
        ];
        let f = model_fitness(&lines, &Warp::default(), &lens(), 640.0, 480.0, BOTH);
        assert!(f.abs() < 1e-6, "fitness {f}");
    }

    #[test]
    fn rotation_is_penalized_and_undone() {
        let lines = vec![
            line([100.0, 50.0], [110.0, 400.0], Orientation::Vertical),
            line([500.0, 50.0], [510.0, 400.0], Orientation::Vertical),
        ];
        let tilt = (10.0f64 / 350.0).atan().to_degrees();
        let sel = LineSelection {
            vertical: true,
            horizontal: false,
        };
        let raw = model_fitness(&lines, &Warp::default(), &lens(), 640.0, 480.0, sel);
        assert!(raw > 1e4);
        let fix = |deg: f64| Warp {
            rotation: deg,
            ..Default::default()
        };
        let plus = model_fitness(&lines, &fix(tilt), &lens(), 640.0, 480.0, sel);
        let minus = model_fitness(&lines, &fix(-tilt), &lens(), 640.0, 480.0, sel);
        assert!(plus.min(minus) < 1.0, "plus {plus} minus {minus}");
    }

    #[test]
    fn unselected_directions_are_ignored() {
        let lines = vec![line([10.0, 10.0], [300.0, 60.0], Orientation::Horizontal)];
        let sel = LineSelection {
            vertical: true,
            horizontal: false,
        };
        assert_eq!(
            model_fitness(&lines, &Warp::default(), &lens(), 640.0, 480.0, sel),
            0.0
        );
    }
}
