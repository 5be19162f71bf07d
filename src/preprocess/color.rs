use crate::image::{ImageF32, RgbImageF32};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Gamma lift applied to linear raw data before detection.
pub const RAW_GAMMA: f32 = 0.45;

/// Raises every sample to `gamma` in place.
pub fn apply_gamma(img: &mut RgbImageF32, gamma: f32) {
    let lift = |v: &mut f32| *v = v.max(0.0).powf(gamma);
    #[cfg(feature = "parallel")]
    img.data.par_iter_mut().for_each(lift);
    #[cfg(not(feature = "parallel"))]
    img.data.iter_mut().for_each(lift);
}

/// Luma `0.3 R + 0.59 G + 0.11 B`.
pub fn greyscale(img: &RgbImageF32) -> ImageF32 {
    let mut out = ImageF32::new(img.w, img.h);
    if img.w == 0 || img.h == 0 {
        return out;
    }
    let convert = |(y, row): (usize, &mut [f32])| {
        let src = img.row(y);
        for (dst, px) in row.iter_mut().zip(src.chunks_exact(3)) {
            *dst = 0.3 * px[0] + 0.59 * px[1] + 0.11 * px[2];
        }
    };
    #[cfg(feature = "parallel")]
    out.data.par_chunks_mut(img.w).enumerate().for_each(convert);
    #[cfg(not(feature = "parallel"))]
    out.data.chunks_mut(img.w).enumerate().for_each(convert);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luma_weights() {
        let mut img = RgbImageF32::new(2, 1);
        img.data = vec![1.0, 0.0, 0.0, 0.5, 0.5, 0.5];
        let grey = greyscale(&img);
        assert!((grey.get(0, 0) - 0.3).abs() < 1e-6);
        assert!((grey.get(1, 0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn gamma_lifts_shadows() {
        let mut img = RgbImageF32::new(1, 1);
        img.data = vec![0.25, 1.0, -0.1];
        apply_gamma(&mut img, RAW_GAMMA);
        assert!(img.data[0] > 0.25);
        assert!((img.data[1] - 1.0).abs() < 1e-6);
        assert_eq!(img.data[2], 0.0);
    }
}
