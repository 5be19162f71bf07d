use crate::homogeneous::{cross_normalized, is_null, point};
use crate::homography::{homography, Direction};
use crate::types::{CropBox, ModelParameters};
use nalgebra::{Matrix3, Vector3};

/// Corrected image outline for one set of parameters.
#[derive(Clone, Debug)]
pub struct CropGeometry {
    h: Matrix3<f64>,
    /// Input image size.
    pub width: f64,
    pub height: f64,
    /// Bounding box size of the corrected outline.
    pub out_width: f64,
    pub out_height: f64,
    edges: [Vector3<f64>; 4],
}

impl CropGeometry {
    /// `None` when a corner maps to infinity or the outline collapses.
    pub fn new(params: &ModelParameters, width: f64, height: f64) -> Option<Self> {
        let h = homography(params, width, height, Direction::Forward);
        let corners = [
            [0.0, 0.0],
            [0.0, height],
            [width, height],
            [width, 0.0],
        ];
        let mut v = [Vector3::zeros(); 4];
        let mut xmin = f64::MAX;
        let mut xmax = f64::MIN;
        let mut ymin = f64::MAX;
        let mut ymax = f64::MIN;
        for (out, [x, y]) in v.iter_mut().zip(corners) {
            let p = h * point(x, y);
            if p[2] == 0.0 {
                return None;
            }
            *out = point(p[0] / p[2], p[1] / p[2]);
            xmin = xmin.min(out[0]);
            xmax = xmax.max(out[0]);
            ymin = ymin.min(out[1]);
            ymax = ymax.max(out[1]);
        }
        let out_width = xmax - xmin;
        let out_height = ymax - ymin;
        if out_width <= 0.0 || out_height <= 0.0 || !(out_width * out_height).is_finite() {
            return None;
        }
        let edges = [0, 1, 2, 3].map(|n| cross_normalized(&v[n], &v[(n + 1) % 4]));
        Some(Self {
            h,
            width,
            height,
            out_width,
            out_height,
            edges,
        })
    }

    /// Output position of the input point at fractions `(x, y)` of the image.
    pub fn center(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        let p = self.h * point(x * self.width, y * self.height);
        if p[2] == 0.0 {
            return None;
        }
        Some([p[0] / p[2], p[1] / p[2]])
    }

    /// Squared half diagonal of the largest rectangle centred at `p` (output
    /// coordinates) whose diagonals make angle `alpha` with the x axis.
    pub fn half_diagonal_sq(&self, p: [f64; 2], alpha: f64) -> f64 {
        let c = point(p[0], p[1]);
        let (sin, cos) = alpha.sin_cos();
        let diagonals = [
            cross_normalized(&c, &point(p[0] + 10.0 * cos, p[1] + 10.0 * sin)),
            cross_normalized(&c, &point(p[0] + 10.0 * cos, p[1] - 10.0 * sin)),
        ];
        let mut d2min = f64::MAX;
        for edge in &self.edges {
            for diagonal in &diagonals {
                let i = cross_normalized(edge, diagonal);
                // centre lies on the outline
                if is_null(&i) {
                    return 0.0;
                }
                if i[2] == 0.0 {
                    continue;
                }
                let dx = p[0] - i[0] / i[2];
                let dy = p[1] - i[1] / i[2];
                d2min = d2min.min(dx * dx + dy * dy);
            }
        }
        if d2min == f64::MAX {
            0.0
        } else {
            d2min
        }
    }

    /// Area of the rectangle with half diagonal `sqrt(d2)` at angle `alpha`.
    pub fn area(d2: f64, alpha: f64) -> f64 {
        2.0 * d2 * (2.0 * alpha).sin()
    }

    /// Margins of the rectangle centred at `p` with half diagonal `d`.
    pub fn margins(&self, p: [f64; 2], d: f64, alpha: f64) -> CropBox {
        let (sin, cos) = alpha.sin_cos();
        CropBox {
            cl: ((p[0] - d * cos) / self.out_width).clamp(0.0, 1.0),
            cr: ((p[0] + d * cos) / self.out_width).clamp(0.0, 1.0),
            ct: ((p[1] - d * sin) / self.out_height).clamp(0.0, 1.0),
            cb: ((p[1] + d * sin) / self.out_height).clamp(0.0, 1.0),
        }
    }

    /// Diagonal angle of the input image.
    pub fn image_alpha(&self) -> f64 {
        self.height.atan2(self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_outline_is_the_image() {
        let geo = CropGeometry::new(&ModelParameters::default(), 400.0, 300.0).unwrap();
        assert_eq!(geo.out_width, 400.0);
        assert_eq!(geo.out_height, 300.0);
        let alpha = geo.image_alpha();
        let d2 = geo.half_diagonal_sq([200.0, 150.0], alpha);
        assert!((d2 - 250.0 * 250.0).abs() < 1e-6);
        assert!((CropGeometry::area(d2, alpha) - 120_000.0).abs() < 1e-6);
    }

    #[test]
    fn off_centre_rectangle_shrinks() {
        let geo = CropGeometry::new(&ModelParameters::default(), 400.0, 300.0).unwrap();
        let alpha = geo.image_alpha();
        let d2 = geo.half_diagonal_sq([100.0, 150.0], alpha);
        // limited by the left edge: d·cos(alpha) = 100
        let d = d2.sqrt();
        assert!((d * alpha.cos() - 100.0).abs() < 1e-6);
        let m = geo.margins([100.0, 150.0], d, alpha);
        assert!(m.cl.abs() < 1e-9);
        assert!((m.cr - 0.5).abs() < 1e-9);
    }
}
