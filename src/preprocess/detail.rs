//! Local contrast boost through a bilateral grid on CIE Lab lightness.
//!
//! Lightness is splatted into a coarse `(x, y, L)` grid, blurred there and
//! sliced back, which yields an edge-preserving base layer. The output pushes
//! every pixel away from its base by [`DETAIL_GAIN`]. Only `L` changes; the
//! chroma channels round-trip unchanged.
use crate::image::{ImageF32, RgbImageF32};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Range sigma in Lab lightness units.
pub const SIGMA_R: f32 = 5.0;
/// Spatial sigma as a fraction of the smaller image dimension.
pub const SIGMA_S_FRACTION: f32 = 0.02;
/// Detail strength.
pub const DETAIL: f32 = 10.0;
/// Multiplier of the detail layer `L - base`.
pub const DETAIL_GAIN: f32 = DETAIL * SIGMA_R * 0.04;

const L_MAX: f32 = 100.0;

// D50 white
const WHITE: [f32; 3] = [0.9642, 1.0, 0.8249];

fn srgb_to_xyz(rgb: &[f32]) -> [f32; 3] {
    [
        0.436_074_7 * rgb[0] + 0.385_064_9 * rgb[1] + 0.143_080_4 * rgb[2],
        0.222_504_5 * rgb[0] + 0.716_878_6 * rgb[1] + 0.060_616_9 * rgb[2],
        0.013_932_2 * rgb[0] + 0.097_104_5 * rgb[1] + 0.714_173_3 * rgb[2],
    ]
}

fn xyz_to_srgb(xyz: [f32; 3], rgb: &mut [f32]) {
    rgb[0] = 3.133_856_1 * xyz[0] - 1.616_866_7 * xyz[1] - 0.490_614_6 * xyz[2];
    rgb[1] = -0.978_768_4 * xyz[0] + 1.916_141_5 * xyz[1] + 0.033_454 * xyz[2];
    rgb[2] = 0.071_945_3 * xyz[0] - 0.228_991_4 * xyz[1] + 1.405_242_7 * xyz[2];
}

fn lab_f(t: f32) -> f32 {
    const EPSILON: f32 = 216.0 / 24389.0;
    const KAPPA: f32 = 24389.0 / 27.0;
    if t > EPSILON {
        t.cbrt()
    } else {
        (KAPPA * t + 16.0) / 116.0
    }
}

fn lab_f_inv(f: f32) -> f32 {
    const EPSILON: f32 = 6.0 / 29.0;
    const KAPPA: f32 = 24389.0 / 27.0;
    if f > EPSILON {
        f * f * f
    } else {
        (116.0 * f - 16.0) / KAPPA
    }
}

fn xyz_to_lab(xyz: [f32; 3]) -> [f32; 3] {
    let fx = lab_f(xyz[0] / WHITE[0]);
    let fy = lab_f(xyz[1] / WHITE[1]);
    let fz = lab_f(xyz[2] / WHITE[2]);
    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

fn lab_to_xyz(lab: [f32; 3]) -> [f32; 3] {
    let fy = (lab[0] + 16.0) / 116.0;
    let fx = fy + lab[1] / 500.0;
    let fz = fy - lab[2] / 200.0;
    [
        WHITE[0] * lab_f_inv(fx),
        WHITE[1] * lab_f_inv(fy),
        WHITE[2] * lab_f_inv(fz),
    ]
}

/// Lightness of a luminance value.
fn lightness(y: f32) -> f32 {
    116.0 * lab_f(y) - 16.0
}

/// Luminance of a lightness value.
fn luminance(l: f32) -> f32 {
    lab_f_inv((l + 16.0) / 116.0)
}

/// Homogeneous `(Σ L·w, Σ w)` samples over a `(x, y, L)` lattice.
struct BilateralGrid {
    nx: usize,
    ny: usize,
    nz: usize,
    sigma_s: f32,
    data: Vec<[f32; 2]>,
}

impl BilateralGrid {
    fn new(w: usize, h: usize, sigma_s: f32) -> Self {
        let nx = ((w.max(1) - 1) as f32 / sigma_s) as usize + 2;
        let ny = ((h.max(1) - 1) as f32 / sigma_s) as usize + 2;
        let nz = (L_MAX / SIGMA_R) as usize + 2;
        Self {
            nx,
            ny,
            nz,
            sigma_s,
            data: vec![[0.0; 2]; nx * ny * nz],
        }
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.ny + y) * self.nx + x
    }

    /// Lower lattice corner and fractional offsets of a sample position.
    #[inline]
    fn locate(&self, x: usize, y: usize, l: f32) -> ([usize; 3], [f32; 3]) {
        let gx = x as f32 / self.sigma_s;
        let gy = y as f32 / self.sigma_s;
        let gz = l.clamp(0.0, L_MAX) / SIGMA_R;
        let ix = (gx as usize).min(self.nx - 2);
        let iy = (gy as usize).min(self.ny - 2);
        let iz = (gz as usize).min(self.nz - 2);
        (
            [ix, iy, iz],
            [gx - ix as f32, gy - iy as f32, gz - iz as f32],
        )
    }

    fn splat(&mut self, l: &ImageF32) {
        for y in 0..l.h {
            for x in 0..l.w {
                let v = l.get(x, y);
                let ([ix, iy, iz], [fx, fy, fz]) = self.locate(x, y, v);
                for (dz, wz) in [(0, 1.0 - fz), (1, fz)] {
                    for (dy, wy) in [(0, 1.0 - fy), (1, fy)] {
                        for (dx, wx) in [(0, 1.0 - fx), (1, fx)] {
                            let wt = wx * wy * wz;
                            let i = self.index(ix + dx, iy + dy, iz + dz);
                            self.data[i][0] += v * wt;
                            self.data[i][1] += wt;
                        }
                    }
                }
            }
        }
    }

    /// `[1 4 6 4 1] / 16` along each lattice axis, zero outside.
    fn blur(&mut self) {
        const TAPS: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];
        let dims = [self.nx, self.ny, self.nz];
        let strides = [1, self.nx, self.nx * self.ny];
        for axis in 0..3 {
            let src = self.data.clone();
            let n = dims[axis];
            let stride = strides[axis];
            for (i, out) in self.data.iter_mut().enumerate() {
                let pos = (i / stride) % n;
                let mut acc = [0.0f32; 2];
                for (k, tap) in TAPS.iter().enumerate() {
                    let p = pos as isize + k as isize - 2;
                    if p < 0 || p >= n as isize {
                        continue;
                    }
                    let j = (i as isize + (p - pos as isize) * stride as isize) as usize;
                    acc[0] += tap * src[j][0];
                    acc[1] += tap * src[j][1];
                }
                *out = acc;
            }
        }
    }

    /// Edge-preserving base value at a pixel of lightness `l`.
    fn slice(&self, x: usize, y: usize, l: f32) -> f32 {
        let ([ix, iy, iz], [fx, fy, fz]) = self.locate(x, y, l);
        let mut acc = [0.0f32; 2];
        for (dz, wz) in [(0, 1.0 - fz), (1, fz)] {
            for (dy, wy) in [(0, 1.0 - fy), (1, fy)] {
                for (dx, wx) in [(0, 1.0 - fx), (1, fx)] {
                    let wt = wx * wy * wz;
                    let s = self.data[self.index(ix + dx, iy + dy, iz + dz)];
                    acc[0] += wt * s[0];
                    acc[1] += wt * s[1];
                }
            }
        }
        if acc[1] > 1e-6 {
            acc[0] / acc[1]
        } else {
            l
        }
    }
}

/// Boosts local contrast of a lightness plane in place.
fn boost_lightness(l: &mut ImageF32) {
    let (w, h) = (l.w, l.h);
    if w == 0 || h == 0 {
        return;
    }
    let sigma_s = (w.min(h) as f32 * SIGMA_S_FRACTION).max(1.0);
    let mut grid = BilateralGrid::new(w, h, sigma_s);
    grid.splat(l);
    grid.blur();

    let src = l.clone();
    let boost = |(y, row): (usize, &mut [f32])| {
        for (x, out) in row.iter_mut().enumerate() {
            let v = src.get(x, y);
            let base = grid.slice(x, y, v);
            *out = (v + DETAIL_GAIN * (v - base)).clamp(0.0, L_MAX);
        }
    };
    #[cfg(feature = "parallel")]
    l.data.par_chunks_mut(w).enumerate().for_each(boost);
    #[cfg(not(feature = "parallel"))]
    l.data.chunks_mut(w).enumerate().for_each(boost);
}

/// Detail enhancement of an RGB buffer, treated as sRGB.
pub fn detail_enhance(img: &RgbImageF32) -> RgbImageF32 {
    let (w, h) = (img.w, img.h);
    let mut lab = img.data.clone();
    let to_lab = |px: &mut [f32]| {
        let v = xyz_to_lab(srgb_to_xyz(px));
        px.copy_from_slice(&v);
    };
    #[cfg(feature = "parallel")]
    lab.par_chunks_exact_mut(3).for_each(to_lab);
    #[cfg(not(feature = "parallel"))]
    lab.chunks_exact_mut(3).for_each(to_lab);

    let mut l = ImageF32::new(w, h);
    for (dst, px) in l.data.iter_mut().zip(lab.chunks_exact(3)) {
        *dst = px[0];
    }
    boost_lightness(&mut l);

    let mut out = RgbImageF32::new(w, h);
    let to_rgb = |(dst, (px, &boosted)): (&mut [f32], (&[f32], &f32))| {
        xyz_to_srgb(lab_to_xyz([boosted, px[1], px[2]]), dst);
    };
    #[cfg(feature = "parallel")]
    out.data
        .par_chunks_exact_mut(3)
        .zip(lab.par_chunks_exact(3).zip(l.data.par_iter()))
        .for_each(to_rgb);
    #[cfg(not(feature = "parallel"))]
    out.data
        .chunks_exact_mut(3)
        .zip(lab.chunks_exact(3).zip(l.data.iter()))
        .for_each(to_rgb);
    out
}

/// Detail enhancement of a greyscale buffer, treated as neutral luminance.
pub fn detail_enhance_grey(img: &ImageF32) -> ImageF32 {
    let mut l = img.clone();
    l.data.iter_mut().for_each(|v| *v = lightness(v.max(0.0)));
    boost_lightness(&mut l);
    l.data.iter_mut().for_each(|v| *v = luminance(*v));
    l
}
