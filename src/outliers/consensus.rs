use super::permutation::{factorial, QuickPerm};
use crate::homogeneous::{cross_normalized, is_null};
use crate::lines::{Line, LineSet, Orientation};
use log::debug;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

/// Largest set permuted exhaustively (8! arrangements); `hurdle` is capped here.
pub const MAX_HURDLE: usize = 8;

/// Knobs of the consensus filter.
#[derive(Clone, Debug, PartialEq)]
pub struct OutlierParams {
    /// Random runs on sets larger than `hurdle`.
    pub runs: usize,
    /// Sets up to this size are permuted exhaustively, at most [`MAX_HURDLE`].
    pub hurdle: usize,
    /// Initial threshold is `10^-epsilon_exponent`.
    pub epsilon_exponent: f64,
    /// Initial log10 step of the threshold tuning; halved after every block.
    pub epsilon_step: f64,
    /// Target share of eliminated lines in percent.
    pub elimination_ratio: f64,
    /// Number of threshold tuning blocks.
    pub optimization_steps: usize,
    /// Dry runs per tuning block.
    pub dry_runs: usize,
    /// Seed of the run shuffler.
    pub seed: u64,
}

impl Default for OutlierParams {
    fn default() -> Self {
        Self {
            runs: 400,
            hurdle: 5,
            epsilon_exponent: 2.0,
            epsilon_step: 1.0,
            elimination_ratio: 60.0,
            optimization_steps: 5,
            dry_runs: 50,
            seed: 0x5eed_1e55,
        }
    }
}

/// Result of the filter on one direction.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsetReport {
    pub input: usize,
    pub kept: usize,
    pub epsilon: f64,
    pub best_quality: f64,
    /// Scored runs after threshold tuning.
    pub runs: usize,
    /// `false` when the set was too small to filter.
    pub filtered: bool,
}

/// Diagnostics emitted by [`remove_outliers`].
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierDiagnostics {
    pub vertical: SubsetReport,
    pub horizontal: SubsetReport,
}

/// Visible image area; a vanishing point inside it cannot be corrected for.
#[derive(Clone, Copy, Debug)]
struct Frame {
    xmin: f64,
    xmax: f64,
    ymin: f64,
    ymax: f64,
}

impl Frame {
    fn contains(&self, v: &Vector3<f64>) -> bool {
        if v[2].abs() == 0.0 {
            return false;
        }
        let x = v[0] / v[2];
        let y = v[1] / v[2];
        x >= self.xmin && y >= self.ymin && x <= self.xmax && y <= self.ymax
    }
}

/// Scores one arrangement: the first two lines define the model.
struct Evaluation {
    valid: bool,
    quality: f64,
    eliminated: usize,
}

fn evaluate(
    lines: &[Line],
    order: &[usize],
    inout: &mut [bool],
    total_weight: f64,
    epsilon: f64,
    frame: &Frame,
) -> Evaluation {
    let n = order.len();
    let v = cross_normalized(&lines[order[0]].l, &lines[order[1]].l);
    if is_null(&v) || frame.contains(&v) {
        return Evaluation {
            valid: false,
            quality: 0.0,
            eliminated: 0,
        };
    }

    inout[0] = true;
    inout[1] = true;
    let mut quality = 0.0;
    let mut eliminated = 0;
    for k in 2..n {
        let line = &lines[order[k]];
        let d = v.dot(&line.l).abs();
        inout[k] = d < epsilon;
        if inout[k] {
            let share = if total_weight > 0.0 {
                line.weight / total_weight
            } else {
                0.0
            };
            quality += 0.33 / n as f64
                + 0.33 * share
                + 0.33 * (1.0 - d / epsilon) * n as f64 * share;
        } else {
            eliminated += 1;
        }
    }
    Evaluation {
        valid: true,
        quality,
        eliminated,
    }
}

/// Best partition of one direction's selected lines.
struct Consensus {
    order: Vec<usize>,
    inout: Vec<bool>,
    report: SubsetReport,
}

fn consensus(
    lines: &[Line],
    mut order: Vec<usize>,
    total_weight: f64,
    frame: &Frame,
    params: &OutlierParams,
    rng: &mut StdRng,
) -> Consensus {
    let n = order.len();
    let mut inout = vec![false; n];
    let mut best_order = order.clone();
    let mut best_inout = vec![false; n];
    let mut best_quality = 0.0;

    let mut epsilon = 10f64.powf(-params.epsilon_exponent);
    let mut step = params.epsilon_step;
    let mut eliminated = 0usize;
    let mut valid_runs = 0usize;

    // threshold tuning on random arrangements
    let dry = params.dry_runs.max(1);
    let optiruns = params.optimization_steps * dry;
    for r in 0..optiruns {
        order.shuffle(rng);
        let eval = evaluate(lines, &order, &mut inout, total_weight, epsilon, frame);
        if eval.valid {
            eliminated += eval.eliminated;
            valid_runs += 1;
        }
        if r % dry == dry - 1 && valid_runs > 0 {
            let ratio = 100.0 * eliminated as f64 / (n as f64 * valid_runs as f64);
            if ratio < params.elimination_ratio {
                epsilon = 10f64.powf(epsilon.log10() - step);
            } else if ratio > params.elimination_ratio {
                epsilon = 10f64.powf(epsilon.log10() + step);
            }
            step /= 2.0;
            eliminated = 0;
            valid_runs = 0;
        }
    }

    let exhaustive = n <= params.hurdle.min(MAX_HURDLE);
    let runs = if exhaustive { factorial(n) } else { params.runs };
    let mut perm = QuickPerm::new(n);
    for r in 0..runs {
        if !exhaustive {
            order.shuffle(rng);
        } else if r > 0 {
            perm.advance(&mut order);
        }
        let eval = evaluate(lines, &order, &mut inout, total_weight, epsilon, frame);
        if eval.valid && eval.quality > best_quality {
            best_quality = eval.quality;
            best_order.copy_from_slice(&order);
            best_inout.copy_from_slice(&inout);
        }
    }

    let kept = best_inout.iter().filter(|&&b| b).count();
    Consensus {
        order: best_order,
        inout: best_inout,
        report: SubsetReport {
            input: n,
            kept,
            epsilon,
            best_quality,
            runs,
            filtered: true,
        },
    }
}

fn filter_direction(
    set: &mut LineSet,
    orientation: Orientation,
    frame: &Frame,
    params: &OutlierParams,
    rng: &mut StdRng,
) -> SubsetReport {
    let order = set.active_indices(orientation);
    if order.len() < 3 {
        return SubsetReport {
            input: order.len(),
            kept: order.len(),
            ..Default::default()
        };
    }
    let total_weight = set.total_weight(orientation);
    let result = consensus(&set.lines, order, total_weight, frame, params, rng);
    for (&idx, &keep) in result.order.iter().zip(result.inout.iter()) {
        set.lines[idx].selected = keep;
    }
    set.recount();
    set.version = set.version.wrapping_add(1);
    result.report
}

/// Deselects lines that do not share a vanishing point with the majority of
/// their direction. Directions with fewer than three selected lines are left as is.
pub fn remove_outliers(set: &mut LineSet, params: &OutlierParams) -> OutlierDiagnostics {
    let [xmin, xmax, ymin, ymax] = set.frame.visible_bounds();
    let frame = Frame {
        xmin,
        xmax,
        ymin,
        ymax,
    };
    let mut rng = StdRng::seed_from_u64(params.seed);
    let vertical = filter_direction(set, Orientation::Vertical, &frame, params, &mut rng);
    let horizontal = filter_direction(set, Orientation::Horizontal, &frame, params, &mut rng);
    debug!(
        "outliers: vertical {}/{} (eps {:.2e}), horizontal {}/{} (eps {:.2e})",
        vertical.kept,
        vertical.input,
        vertical.epsilon,
        horizontal.kept,
        horizontal.input,
        horizontal.epsilon
    );
    OutlierDiagnostics {
        vertical,
        horizontal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lines::DetectionFrame;

    fn through(vp: [f64; 2], p: [f64; 2], len: f64) -> Line {
        let dx = vp[0] - p[0];
        let dy = vp[1] - p[1];
        let n = (dx * dx + dy * dy).sqrt();
        let q = [p[0] + dx / n * len, p[1] + dy / n * len];
        Line::new(p, q, 1.0, 1.0, Some(Orientation::Vertical)).unwrap()
    }

    #[test]
    fn small_sets_are_untouched() {
        let frame = DetectionFrame::new(100, 100);
        let lines = vec![
            through([50.0, -500.0], [10.0, 90.0], 40.0),
            through([900.0, -500.0], [80.0, 90.0], 40.0),
        ];
        let mut set = LineSet::new(lines, frame, 0);
        let diag = remove_outliers(&mut set, &OutlierParams::default());
        assert!(!diag.vertical.filtered);
        assert_eq!(set.vertical_count, 2);
        assert_eq!(set.version, 0);
    }

    #[test]
    fn vanishing_point_inside_frame_is_rejected() {
        let frame = Frame {
            xmin: 0.0,
            xmax: 100.0,
            ymin: 0.0,
            ymax: 100.0,
        };
        assert!(frame.contains(&Vector3::new(50.0, 50.0, 1.0)));
        assert!(!frame.contains(&Vector3::new(50.0, -5.0, 1.0)));
        assert!(!frame.contains(&Vector3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let frame = DetectionFrame::new(400, 400);
        let vp = [200.0, -3000.0];
        let mut lines: Vec<Line> = (0..8)
            .map(|k| through(vp, [20.0 + 45.0 * k as f64, 380.0], 200.0))
            .collect();
        lines.push(through([5000.0, -100.0], [60.0, 300.0], 200.0));
        let mut a = LineSet::new(lines.clone(), frame, 0);
        let mut b = LineSet::new(lines, frame, 0);
        let params = OutlierParams::default();
        remove_outliers(&mut a, &params);
        remove_outliers(&mut b, &params);
        let sel_a: Vec<bool> = a.lines.iter().map(|l| l.selected).collect();
        let sel_b: Vec<bool> = b.lines.iter().map(|l| l.selected).collect();
        assert_eq!(sel_a, sel_b);
    }

    #[test]
    fn oversized_hurdle_falls_back_to_random_runs() {
        let frame = DetectionFrame::new(400, 400);
        let vp = [200.0, -3000.0];
        let lines: Vec<Line> = (0..12)
            .map(|k| through(vp, [20.0 + 30.0 * k as f64, 380.0], 200.0))
            .collect();
        let mut set = LineSet::new(lines, frame, 0);
        let params = OutlierParams {
            hurdle: 40,
            runs: 50,
            ..Default::default()
        };
        let diag = remove_outliers(&mut set, &params);
        assert!(diag.vertical.filtered);
        assert_eq!(diag.vertical.runs, 50);
    }
}
