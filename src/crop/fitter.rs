use super::geometry::CropGeometry;
use crate::error::CorrectionError;
use crate::simplex::{minimize, SimplexOptions};
use crate::types::{CropBox, CropMode, ModelParameters};
use log::{debug, warn};
use std::f64::consts::FRAC_PI_2;

/// Simplex settings of the crop search. The objective is an area in square
/// output pixels, hence the coarse epsilon.
#[derive(Clone, Debug, PartialEq)]
pub struct CropParams {
    pub epsilon: f64,
    pub scale: f64,
    pub max_iterations: usize,
}

impl Default for CropParams {
    fn default() -> Self {
        Self {
            epsilon: 100.0,
            scale: 0.5,
            max_iterations: 100,
        }
    }
}

/// Folds centre fractions into `[0, 1]` and the angle into `[0, π/2]`.
fn crop_constraint(p: &mut [f64]) {
    const UPPER: [f64; 3] = [1.0, 1.0, FRAC_PI_2];
    for (v, upper) in p.iter_mut().zip(UPPER) {
        *v = v.abs();
        if *v > upper {
            *v = upper - *v;
        }
    }
}

/// Computes crop margins for `params.crop_mode` on a `width × height` image.
///
/// [`CropMode::Off`] yields the full frame. The search maximizes the area of
/// a rectangle centred at an input-image position (so the centre is always
/// inside the corrected outline), with a free diagonal angle for
/// [`CropMode::LargestArea`] and the image's own for
/// [`CropMode::OriginalAspect`].
pub fn fit_crop(
    params: &ModelParameters,
    width: f64,
    height: f64,
    options: &CropParams,
) -> Result<CropBox, CorrectionError> {
    if params.crop_mode == CropMode::Off {
        return Ok(CropBox::FULL);
    }
    let failed = || {
        warn!("crop: no usable rectangle for {}x{}", width, height);
        CorrectionError::CropFitFailure
    };
    let geo = CropGeometry::new(params, width, height).ok_or_else(|| {
        warn!("crop: corrected outline of {}x{} collapses", width, height);
        CorrectionError::DegenerateGeometry(format!(
            "corrected outline of a {width}x{height} image has no area"
        ))
    })?;
    let image_alpha = geo.image_alpha();

    let fixed_alpha = match params.crop_mode {
        CropMode::OriginalAspect => Some(image_alpha),
        _ => None,
    };
    let mut x: Vec<f64> = match fixed_alpha {
        Some(_) => vec![0.5, 0.5],
        None => vec![0.5, 0.5, image_alpha],
    };

    let area_of = |x: &[f64]| -> f64 {
        let alpha = fixed_alpha.unwrap_or_else(|| x[2]);
        match geo.center(x[0], x[1]) {
            Some(p) => CropGeometry::area(geo.half_diagonal_sq(p, alpha), alpha),
            None => 0.0,
        }
    };
    let simplex = SimplexOptions {
        epsilon: options.epsilon,
        scale: options.scale,
        max_iterations: options.max_iterations,
    };
    let result = minimize(|x| -area_of(x), &mut x, &simplex, Some(&crop_constraint));
    if !result.converged {
        return Err(failed());
    }

    let area = area_of(&x).abs();
    let alpha = fixed_alpha.unwrap_or_else(|| x[2]);
    if area == 0.0 {
        return Err(failed());
    }
    let d = (area / (2.0 * (2.0 * alpha).sin())).sqrt();
    let p = geo.center(x[0], x[1]).ok_or_else(failed)?;
    let crop = geo.margins(p, d, alpha);
    if !crop.is_valid() || !d.is_finite() {
        return Err(failed());
    }
    debug!(
        "crop: {} iterations, centre ({:.3}, {:.3}), alpha {:.3} -> [{:.3}, {:.3}] x [{:.3}, {:.3}]",
        result.iterations, x[0], x[1], alpha, crop.cl, crop.cr, crop.ct, crop.cb
    );
    Ok(crop)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_folds_back_into_range() {
        let mut p = [-0.25, 1.25, 2.0];
        crop_constraint(&mut p);
        assert_eq!(p[0], 0.25);
        assert!((p[1] + 0.25).abs() < 1e-12);
        assert!((p[2] - (FRAC_PI_2 - 2.0)).abs() < 1e-12);
    }

    #[test]
    fn off_mode_is_full_frame() {
        let params = ModelParameters {
            rotation: 5.0,
            ..Default::default()
        };
        assert_eq!(
            fit_crop(&params, 640.0, 480.0, &CropParams::default()),
            Ok(CropBox::FULL)
        );
    }

    #[test]
    fn neutral_largest_area_is_full_frame() {
        let params = ModelParameters {
            crop_mode: CropMode::LargestArea,
            ..Default::default()
        };
        let crop = fit_crop(&params, 640.0, 480.0, &CropParams::default()).unwrap();
        assert!(crop.cl < 1e-3 && crop.ct < 1e-3, "{crop:?}");
        assert!(crop.cr > 1.0 - 1e-3 && crop.cb > 1.0 - 1e-3, "{crop:?}");
    }

    #[test]
    fn rotated_image_crops_inside() {
        let params = ModelParameters {
            rotation: 5.0,
            crop_mode: CropMode::OriginalAspect,
            ..Default::default()
        };
        let crop = fit_crop(&params, 640.0, 480.0, &CropParams::default()).unwrap();
        assert!(crop.is_valid());
        assert!(crop.cl > 0.0 && crop.cr < 1.0);
        assert!(crop.width() > 0.5 && crop.height() > 0.5, "{crop:?}");
    }

    #[test]
    fn collapsed_outline_is_degenerate() {
        let params = ModelParameters {
            mode: crate::types::LensMode::Specific,
            aspect: 0.0,
            crop_mode: CropMode::LargestArea,
            ..Default::default()
        };
        let err = fit_crop(&params, 640.0, 480.0, &CropParams::default()).unwrap_err();
        assert!(matches!(err, CorrectionError::DegenerateGeometry(_)), "{err:?}");
    }

    #[test]
    fn neutral_original_aspect_is_full_frame() {
        let params = ModelParameters {
            crop_mode: CropMode::OriginalAspect,
            ..Default::default()
        };
        let crop = fit_crop(&params, 640.0, 480.0, &CropParams::default()).unwrap();
        assert!(crop.cl < 1e-2 && crop.ct < 1e-2, "{crop:?}");
        assert!(crop.cr > 1.0 - 1e-2 && crop.cb > 1.0 - 1e-2, "{crop:?}");
    }

    #[test]
    fn original_aspect_keeps_the_image_ratio() {
        let params = ModelParameters {
            rotation: -4.0,
            crop_mode: CropMode::OriginalAspect,
            ..Default::default()
        };
        let crop = fit_crop(&params, 640.0, 480.0, &CropParams::default()).unwrap();
        let geo = CropGeometry::new(&params, 640.0, 480.0).unwrap();
        let w = crop.width() * geo.out_width;
        let h = crop.height() * geo.out_height;
        assert!((w / h - 640.0 / 480.0).abs() < 1e-6, "{w} x {h}");
    }
}
