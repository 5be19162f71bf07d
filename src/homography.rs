//! The parametric perspective correction model.
//!
//! A correction is one 3×3 homography composed from rotation, shear, vertical
//! and horizontal lens shift (with orthographic compression), aspect scaling and
//! a final translation that keeps every output coordinate non-negative. The
//! lens shift steps are formulated on swapped `(y, x)` coordinates, so the
//! composition starts and ends with an axis swap.
//!
//! Matrices are never mutated once built; callers rebuild from
//! [`ModelParameters`] whenever a parameter changes.
use crate::homogeneous::to_pixel;
use crate::types::{CropBox, LensGeometry, ModelParameters};
use log::debug;
use nalgebra::{Matrix3, Vector3};

const EPS: f64 = 1e-12;

/// Tolerance of the neutral-parameter check.
pub const NEUTRAL_EPS: f64 = 1e-4;

/// Which way a homography maps points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Input image → corrected image.
    Forward,
    /// Corrected image → input image.
    Inverse,
}

/// Adjustable values of the model, separated from the lens constants.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Warp {
    pub rotation: f64,
    pub lensshift_v: f64,
    pub lensshift_h: f64,
    pub shear: f64,
}

impl Warp {
    pub fn from_params(params: &ModelParameters) -> Self {
        Self {
            rotation: params.rotation,
            lensshift_v: params.lensshift_v,
            lensshift_h: params.lensshift_h,
            shear: params.shear,
        }
    }
}

/// Homography for `params` on an image of `width × height` pixels.
pub fn homography(
    params: &ModelParameters,
    width: f64,
    height: f64,
    direction: Direction,
) -> Matrix3<f64> {
    build(
        &Warp::from_params(params),
        &params.lens_geometry(),
        width,
        height,
        direction,
    )
}

/// Builds the correction homography from explicit warp values and lens constants.
///
/// The inverse of a singular matrix degrades to identity.
pub fn build(
    warp: &Warp,
    lens: &LensGeometry,
    width: f64,
    height: f64,
    direction: Direction,
) -> Matrix3<f64> {
    let forward = forward_matrix(warp, lens, width, height);
    match direction {
        Direction::Forward => forward,
        Direction::Inverse => forward.try_inverse().unwrap_or_else(|| {
            debug!(
                "homography: singular matrix for {:?} on {}x{}, using identity",
                warp, width, height
            );
            Matrix3::identity()
        }),
    }
}

/// Compression factor of the orthographic correction for one shift axis.
fn compression(f_length_kb: f64, orthofac: f64, shift: f64, along: f64, across: f64) -> f64 {
    let exppa = shift.exp();
    let fdb = f_length_kb / (14.4 + (along / across - 1.0) * 7.2);
    let rad = fdb * (exppa - 1.0) / (exppa + 1.0);
    let alpha = rad.atan().clamp(-1.5, 1.5);
    let rt = (0.5 * alpha).sin();
    (2.0 * (orthofac - 1.0) * rt * rt + 1.0).max(0.1)
}

/// Projective lens shift along the second axis of an `(a, b)` frame.
fn lens_shift(shift: f64, a: f64, b: f64) -> Matrix3<f64> {
    let e = shift.exp();
    Matrix3::new(
        e,
        0.0,
        0.0,
        0.5 * (e - 1.0) * a / b,
        2.0 * e / (e + 1.0),
        -0.5 * (e - 1.0) * a / (e + 1.0),
        (e - 1.0) / b,
        0.0,
        1.0,
    )
}

fn forward_matrix(warp: &Warp, lens: &LensGeometry, width: f64, height: f64) -> Matrix3<f64> {
    let u = width;
    let v = height;

    let phi = warp.rotation.to_radians();
    let (sini, cosi) = phi.sin_cos();
    let ascale = lens.aspect.sqrt();
    let orthofac = 1.0 - lens.orthocorr / 100.0;
    let r_v = compression(lens.f_length_kb, orthofac, warp.lensshift_v, v, u);
    let r_h = compression(lens.f_length_kb, orthofac, warp.lensshift_h, u, v);

    let swap = Matrix3::new(0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);

    let rotation = Matrix3::new(
        cosi,
        -sini,
        -0.5 * v * cosi + 0.5 * u * sini + 0.5 * v,
        sini,
        cosi,
        -0.5 * v * sini - 0.5 * u * cosi + 0.5 * u,
        0.0,
        0.0,
        1.0,
    );
    let shear = Matrix3::new(1.0, warp.shear, 0.0, warp.shear, 1.0, 0.0, 0.0, 0.0, 1.0);
    let squeeze_v = Matrix3::new(1.0, 0.0, 0.0, 0.0, r_v, 0.5 * u * (1.0 - r_v), 0.0, 0.0, 1.0);
    let squeeze_h = Matrix3::new(1.0, 0.0, 0.0, 0.0, r_h, 0.5 * v * (1.0 - r_h), 0.0, 0.0, 1.0);
    let aspect = Matrix3::new(ascale, 0.0, 0.0, 0.0, 1.0 / ascale, 0.0, 0.0, 0.0, 1.0);

    // each step left-multiplies the accumulated transform
    let steps = [
        rotation,
        shear,
        lens_shift(warp.lensshift_v, u, v),
        squeeze_v,
        swap,
        lens_shift(warp.lensshift_h, v, u),
        squeeze_h,
        aspect,
    ];
    let m = steps.iter().fold(swap, |acc, step| step * acc);

    let mut umin = f64::MAX;
    let mut vmin = f64::MAX;
    for [x, y] in corners(width, height) {
        let p = m * Vector3::new(x, y, 1.0);
        if p[2].abs() <= EPS {
            continue;
        }
        umin = umin.min(p[0] / p[2]);
        vmin = vmin.min(p[1] / p[2]);
    }
    if !umin.is_finite() || !vmin.is_finite() {
        return m;
    }
    let translate = Matrix3::new(1.0, 0.0, -umin, 0.0, 1.0, -vmin, 0.0, 0.0, 1.0);
    translate * m
}

/// Pixel centres of the four image corners.
fn corners(width: f64, height: f64) -> [[f64; 2]; 4] {
    let xr = (width - 1.0).max(0.0);
    let yb = (height - 1.0).max(0.0);
    [[0.0, 0.0], [xr, 0.0], [0.0, yb], [xr, yb]]
}

/// True when the parameters leave the image untouched.
pub fn is_neutral(params: &ModelParameters) -> bool {
    params.rotation.abs() < NEUTRAL_EPS
        && params.lensshift_v.abs() < NEUTRAL_EPS
        && params.lensshift_h.abs() < NEUTRAL_EPS
        && params.shear.abs() < NEUTRAL_EPS
        && (params.aspect - 1.0).abs() < NEUTRAL_EPS
        && params.crop.is_full(NEUTRAL_EPS)
}

/// Applies `h` to pixel positions; `None` if any point maps to infinity.
pub fn apply_homography_points(h: &Matrix3<f64>, pts: &[[f64; 2]]) -> Option<Vec<[f64; 2]>> {
    let mut out = Vec::with_capacity(pts.len());
    for &p in pts {
        let v = h * Vector3::new(p[0], p[1], 1.0);
        if v[2].abs() <= EPS {
            return None;
        }
        out.push(to_pixel(&v)?);
    }
    Some(out)
}

/// Axis-aligned bounds of the projected image corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl CornerBounds {
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }
}

/// Bounds of the four corners of a `width × height` image under `h`.
pub fn corner_bounds(h: &Matrix3<f64>, width: f64, height: f64) -> Option<CornerBounds> {
    let projected = apply_homography_points(h, &corners(width, height))?;
    let mut b = CornerBounds {
        x_min: f64::MAX,
        x_max: f64::MIN,
        y_min: f64::MAX,
        y_max: f64::MIN,
    };
    for [x, y] in projected {
        b.x_min = b.x_min.min(x);
        b.x_max = b.x_max.max(x);
        b.y_min = b.y_min.min(y);
        b.y_max = b.y_max.max(y);
    }
    Some(b)
}

/// Size of the corrected output in pixels, after applying the crop margins.
pub fn output_extent(params: &ModelParameters, width: usize, height: usize) -> (usize, usize) {
    if is_neutral(params) {
        return (width, height);
    }
    let (full_w, full_h) = full_extent(params, width as f64, height as f64);
    let w = (full_w * params.crop.width()).floor().max(1.0);
    let h = (full_h * params.crop.height()).floor().max(1.0);
    (w as usize, h as usize)
}

/// Uncropped output size; falls back to the input size when the bounds are undefined.
fn full_extent(params: &ModelParameters, width: f64, height: f64) -> (f64, f64) {
    let h = homography(params, width, height, Direction::Forward);
    match corner_bounds(&h, width, height) {
        Some(b) => (b.width() + 1.0, b.height() + 1.0),
        None => (width, height),
    }
}

/// Offset of the crop box origin inside the uncropped output.
fn crop_offset(params: &ModelParameters, width: f64, height: f64) -> [f64; 2] {
    let (full_w, full_h) = full_extent(params, width, height);
    let CropBox { cl, ct, .. } = params.crop;
    [full_w * cl, full_h * ct]
}

/// Maps input pixel positions to cropped output positions.
pub fn transform_points(
    params: &ModelParameters,
    width: usize,
    height: usize,
    pts: &[[f64; 2]],
) -> Option<Vec<[f64; 2]>> {
    if is_neutral(params) {
        return Some(pts.to_vec());
    }
    let (w, h) = (width as f64, height as f64);
    let m = homography(params, w, h, Direction::Forward);
    let [cx, cy] = crop_offset(params, w, h);
    let mapped = apply_homography_points(&m, pts)?;
    Some(mapped.into_iter().map(|[x, y]| [x - cx, y - cy]).collect())
}

/// Maps cropped output positions back to input pixel positions.
pub fn backtransform_points(
    params: &ModelParameters,
    width: usize,
    height: usize,
    pts: &[[f64; 2]],
) -> Option<Vec<[f64; 2]>> {
    if is_neutral(params) {
        return Some(pts.to_vec());
    }
    let (w, h) = (width as f64, height as f64);
    let m = homography(params, w, h, Direction::Inverse);
    let [cx, cy] = crop_offset(params, w, h);
    let shifted: Vec<[f64; 2]> = pts.iter().map(|&[x, y]| [x + cx, y + cy]).collect();
    apply_homography_points(&m, &shifted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LensMode;
    use approx::assert_relative_eq;

    fn tilted() -> ModelParameters {
        ModelParameters {
            rotation: 3.5,
            lensshift_v: 0.4,
            lensshift_h: -0.2,
            shear: 0.05,
            ..Default::default()
        }
    }

    #[test]
    fn neutral_parameters_give_identity() {
        let params = ModelParameters::default();
        assert!(is_neutral(&params));
        let fwd = homography(&params, 640.0, 480.0, Direction::Forward);
        let inv = homography(&params, 640.0, 480.0, Direction::Inverse);
        assert_relative_eq!(fwd, Matrix3::identity(), epsilon = 1e-9);
        assert_relative_eq!(inv, Matrix3::identity(), epsilon = 1e-9);
    }

    #[test]
    fn neutral_in_specific_mode() {
        let params = ModelParameters {
            mode: LensMode::Specific,
            focal_length: 50.0,
            orthocorr: 0.0,
            ..Default::default()
        };
        let fwd = homography(&params, 300.0, 200.0, Direction::Forward);
        assert_relative_eq!(fwd, Matrix3::identity(), epsilon = 1e-9);
    }

    #[test]
    fn inverse_undoes_forward() {
        let params = tilted();
        let fwd = homography(&params, 640.0, 480.0, Direction::Forward);
        let inv = homography(&params, 640.0, 480.0, Direction::Inverse);
        let grid: Vec<[f64; 2]> = (0..5)
            .flat_map(|i| (0..5).map(move |j| [i as f64 * 150.0, j as f64 * 110.0]))
            .collect();
        let there = apply_homography_points(&fwd, &grid).unwrap();
        let back = apply_homography_points(&inv, &there).unwrap();
        for (p, q) in grid.iter().zip(back.iter()) {
            assert!((p[0] - q[0]).abs() < 1e-6, "{p:?} vs {q:?}");
            assert!((p[1] - q[1]).abs() < 1e-6, "{p:?} vs {q:?}");
        }
    }

    #[test]
    fn output_has_no_negative_corners() {
        let params = tilted();
        let fwd = homography(&params, 640.0, 480.0, Direction::Forward);
        let b = corner_bounds(&fwd, 640.0, 480.0).unwrap();
        assert!(b.x_min.abs() < 1e-6);
        assert!(b.y_min.abs() < 1e-6);
    }

    #[test]
    fn pure_rotation_keeps_center_relation() {
        let params = ModelParameters {
            rotation: 90.0,
            ..Default::default()
        };
        let fwd = homography(&params, 200.0, 100.0, Direction::Forward);
        let b = corner_bounds(&fwd, 200.0, 100.0).unwrap();
        // a quarter turn swaps the extents
        assert!((b.width() - 99.0).abs() < 1e-6);
        assert!((b.height() - 199.0).abs() < 1e-6);
    }

    #[test]
    fn crop_offset_round_trip() {
        let mut params = tilted();
        params.crop = CropBox {
            cl: 0.1,
            cr: 0.9,
            ct: 0.05,
            cb: 0.8,
        };
        let pts = [[10.0, 20.0], [320.0, 240.0], [600.0, 450.0]];
        let out = transform_points(&params, 640, 480, &pts).unwrap();
        let back = backtransform_points(&params, 640, 480, &out).unwrap();
        for (p, q) in pts.iter().zip(back.iter()) {
            assert!((p[0] - q[0]).abs() < 1e-6);
            assert!((p[1] - q[1]).abs() < 1e-6);
        }
        let (w, h) = output_extent(&params, 640, 480);
        assert!(w > 0 && h > 0);
    }

    #[test]
    fn neutral_transform_is_passthrough() {
        let params = ModelParameters::default();
        let pts = [[1.5, 2.5]];
        assert_eq!(transform_points(&params, 10, 10, &pts).unwrap(), pts.to_vec());
        assert_eq!(output_extent(&params, 640, 480), (640, 480));
    }
}
