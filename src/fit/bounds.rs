/// Maps `x ∈ [min, max]` to the real line.
#[inline]
pub fn logit(x: f64, min: f64, max: f64) -> f64 {
    let p = ((x - min) / (max - min)).clamp(1e-6, 1.0 - 1e-6);
    2.0 * (2.0 * p - 1.0).atanh()
}

/// Inverse of [`logit`].
#[inline]
pub fn ilogit(l: f64, min: f64, max: f64) -> f64 {
    let p = 0.5 * (1.0 + (0.5 * l).tanh());
    p * (max - min) + min
}

/// Symmetric soft bounds of the fitted variables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitRanges {
    /// Degrees.
    pub rotation: f64,
    pub lensshift_v: f64,
    pub lensshift_h: f64,
    pub shear: f64,
}

/// The narrower ranges offered for manual adjustment.
pub const HARD_RANGES: FitRanges = FitRanges {
    rotation: 10.0,
    lensshift_v: 1.0,
    lensshift_h: 1.0,
    shear: 0.2,
};

impl Default for FitRanges {
    fn default() -> Self {
        Self {
            rotation: 20.0,
            lensshift_v: 2.0,
            lensshift_h: 2.0,
            shear: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logit_inverts() {
        for x in [-19.0, -3.5, 0.0, 0.25, 12.0] {
            let l = logit(x, -20.0, 20.0);
            assert!((ilogit(l, -20.0, 20.0) - x).abs() < 1e-9, "x={x}");
        }
        assert_eq!(logit(0.0, -2.0, 2.0), 0.0);
    }

    #[test]
    fn ilogit_stays_in_range() {
        for l in [-1e3, -40.0, 0.0, 40.0, 1e3] {
            let x = ilogit(l, -0.5, 0.5);
            assert!((-0.5..=0.5).contains(&x));
        }
        // values outside the range saturate
        let far = logit(100.0, -1.0, 1.0);
        assert!((ilogit(far, -1.0, 1.0) - 1.0).abs() < 1e-5);
    }
}
