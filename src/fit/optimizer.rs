use super::axis::FitAxis;
use super::bounds::{ilogit, logit, FitRanges};
use super::fitness::{model_fitness, LineSelection};
use crate::homography::{build, corner_bounds, Direction, Warp};
use crate::lines::LineSet;
use crate::simplex::{minimize, SimplexOptions};
use crate::types::ModelParameters;
use log::debug;
use serde::Serialize;
use std::time::Instant;

/// Simplex settings and acceptance limits of the parameter fit.
#[derive(Clone, Debug, PartialEq)]
pub struct FitParams {
    pub epsilon: f64,
    pub scale: f64,
    pub max_iterations: usize,
    /// Minimum selected lines per requested direction.
    pub min_lines: usize,
    /// Largest accepted ratio of corrected corner bounds to input area.
    pub max_area_growth: f64,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            epsilon: 1e-3,
            scale: 1.0,
            max_iterations: 400,
            min_lines: 4,
            max_area_growth: 4.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitOutcome {
    Success,
    NotEnoughLines,
    DidNotConverge,
    Insane,
}

/// What a fit attempt did; `warp` holds the fitted values even when rejected.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitReport {
    pub outcome: FitOutcome,
    pub iterations: usize,
    pub fitness: f64,
    pub rotation: f64,
    pub lensshift_v: f64,
    pub lensshift_h: f64,
    pub shear: f64,
    pub vertical_lines: usize,
    pub horizontal_lines: usize,
    pub area_growth: f64,
    pub elapsed_ms: f64,
}

impl FitReport {
    fn new(outcome: FitOutcome, warp: &Warp, lines: &LineSet) -> Self {
        Self {
            outcome,
            iterations: 0,
            fitness: 0.0,
            rotation: warp.rotation,
            lensshift_v: warp.lensshift_v,
            lensshift_h: warp.lensshift_h,
            shear: warp.shear,
            vertical_lines: lines.vertical_count,
            horizontal_lines: lines.horizontal_count,
            area_growth: 1.0,
            elapsed_ms: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Variable {
    Rotation,
    LensShiftV,
    LensShiftH,
    Shear,
}

impl Variable {
    fn range(self, ranges: &FitRanges) -> f64 {
        match self {
            Variable::Rotation => ranges.rotation,
            Variable::LensShiftV => ranges.lensshift_v,
            Variable::LensShiftH => ranges.lensshift_h,
            Variable::Shear => ranges.shear,
        }
    }

    fn get(self, warp: &Warp) -> f64 {
        match self {
            Variable::Rotation => warp.rotation,
            Variable::LensShiftV => warp.lensshift_v,
            Variable::LensShiftH => warp.lensshift_h,
            Variable::Shear => warp.shear,
        }
    }

    fn slot(self, warp: &mut Warp) -> &mut f64 {
        match self {
            Variable::Rotation => &mut warp.rotation,
            Variable::LensShiftV => &mut warp.lensshift_v,
            Variable::LensShiftH => &mut warp.lensshift_h,
            Variable::Shear => &mut warp.shear,
        }
    }
}

fn variables(axis: &FitAxis) -> Vec<Variable> {
    let mut vars = Vec::with_capacity(4);
    if axis.rotation {
        vars.push(Variable::Rotation);
    }
    if axis.lens_vertical {
        vars.push(Variable::LensShiftV);
    }
    if axis.lens_horizontal {
        vars.push(Variable::LensShiftH);
    }
    if axis.shear {
        vars.push(Variable::Shear);
    }
    vars
}

fn decode(base: &Warp, vars: &[Variable], x: &[f64], ranges: &FitRanges) -> Warp {
    let mut warp = *base;
    for (&var, &l) in vars.iter().zip(x.iter()) {
        let r = var.range(ranges);
        *var.slot(&mut warp) = ilogit(l, -r, r);
    }
    warp
}

/// Fits the variables named by `axis` against the selected lines.
///
/// `params` is only written on [`FitOutcome::Success`]. The axis is adapted to
/// flipped images first; the image size is the extent covered by the lines'
/// detection frame.
pub fn fit_parameters(
    lines: &LineSet,
    params: &mut ModelParameters,
    axis: FitAxis,
    flipped: bool,
    ranges: &FitRanges,
    fit: &FitParams,
) -> FitReport {
    let start = Instant::now();
    let base = Warp::from_params(params);
    if axis.is_none() {
        return FitReport::new(FitOutcome::Success, &base, lines);
    }
    if lines.is_empty() {
        return FitReport::new(FitOutcome::NotEnoughLines, &base, lines);
    }

    let axis = axis.oriented(flipped);
    let selection = LineSelection {
        vertical: axis.lines_vertical,
        horizontal: axis.lines_horizontal,
    };
    let enough_v = !axis.lines_vertical || lines.vertical_count >= fit.min_lines;
    let enough_h = !axis.lines_horizontal || lines.horizontal_count >= fit.min_lines;
    if !(enough_v && enough_h) {
        debug!(
            "fit: not enough lines (vertical {}, horizontal {}, need {})",
            lines.vertical_count, lines.horizontal_count, fit.min_lines
        );
        return FitReport::new(FitOutcome::NotEnoughLines, &base, lines);
    }

    let lens = params.lens_geometry();
    let (width, height) = lines.frame.image_size();
    let vars = variables(&axis);
    let mut x: Vec<f64> = vars
        .iter()
        .map(|&v| {
            let r = v.range(ranges);
            logit(v.get(&base), -r, r)
        })
        .collect();

    let objective = |x: &[f64]| {
        let warp = decode(&base, &vars, x, ranges);
        model_fitness(&lines.lines, &warp, &lens, width, height, selection)
    };
    let options = SimplexOptions {
        epsilon: fit.epsilon,
        scale: fit.scale,
        max_iterations: fit.max_iterations,
    };
    let result = minimize(objective, &mut x, &options, None);
    let warp = decode(&base, &vars, &x, ranges);

    let mut report = FitReport::new(FitOutcome::Success, &warp, lines);
    report.iterations = result.iterations;
    report.fitness = result.value;
    report.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    if !result.converged {
        report.outcome = FitOutcome::DidNotConverge;
        debug!("fit: no convergence after {} iterations", result.iterations);
        return report;
    }

    let h = build(&warp, &lens, width, height, Direction::Forward);
    let growth = corner_bounds(&h, width, height)
        .map(|b| b.area() / (width * height))
        .unwrap_or(f64::INFINITY);
    report.area_growth = growth;
    if !growth.is_finite() || growth > fit.max_area_growth {
        report.outcome = FitOutcome::Insane;
        debug!("fit: area growth {:.2} exceeds limit", growth);
        return report;
    }

    params.rotation = warp.rotation;
    params.lensshift_v = warp.lensshift_v;
    params.lensshift_h = warp.lensshift_h;
    params.shear = warp.shear;
    debug!(
        "fit: converged in {} iterations, rotation {:.3}, lensshift_v {:.4}, lensshift_h {:.4}, shear {:.4}",
        result.iterations, warp.rotation, warp.lensshift_v, warp.lensshift_h, warp.shear
    );
    report
}
