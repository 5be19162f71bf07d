use serde::{Deserialize, Serialize};

/// Version tag carried by serialized [`ModelParameters`].
pub const PARAMS_VERSION: u32 = 4;

/// Focal length (35 mm equivalent) assumed in generic lens mode.
pub const DEFAULT_FOCAL_LENGTH: f64 = 28.0;

/// How the lens constants of the correction model are chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LensMode {
    /// Fixed 28 mm equivalent, no orthographic correction, unit aspect.
    #[default]
    Generic,
    /// Focal length, crop factor, orthocorr and aspect taken from the parameters.
    Specific,
}

/// Automatic cropping behaviour after a successful fit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropMode {
    #[default]
    Off,
    LargestArea,
    OriginalAspect,
}

/// Crop margins expressed as fractions of the corrected output extent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CropBox {
    pub cl: f64,
    pub cr: f64,
    pub ct: f64,
    pub cb: f64,
}

impl Default for CropBox {
    fn default() -> Self {
        Self::FULL
    }
}

impl CropBox {
    pub const FULL: CropBox = CropBox {
        cl: 0.0,
        cr: 1.0,
        ct: 0.0,
        cb: 1.0,
    };

    /// Horizontal fraction covered by the box.
    pub fn width(&self) -> f64 {
        self.cr - self.cl
    }

    /// Vertical fraction covered by the box.
    pub fn height(&self) -> f64 {
        self.cb - self.ct
    }

    /// Margins inside `[0, 1]` with strictly positive extent in both axes.
    pub fn is_valid(&self) -> bool {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        in_unit(self.cl)
            && in_unit(self.cr)
            && in_unit(self.ct)
            && in_unit(self.cb)
            && self.width() > 0.0
            && self.height() > 0.0
    }

    pub fn is_full(&self, eps: f64) -> bool {
        self.cl < eps && self.ct < eps && 1.0 - self.cr < eps && 1.0 - self.cb < eps
    }
}

/// Parameters of the perspective correction model.
///
/// Rotation is in degrees; lens shifts and shear are unitless. Owned by the
/// caller; the fitting stages only write back on success.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParameters {
    pub version: u32,
    pub rotation: f64,
    pub lensshift_v: f64,
    pub lensshift_h: f64,
    pub shear: f64,
    /// Focal length in millimetres, used in specific lens mode.
    pub focal_length: f64,
    pub crop_factor: f64,
    /// Orthographic correction in percent (0 = none, 100 = full).
    pub orthocorr: f64,
    pub aspect: f64,
    pub mode: LensMode,
    pub crop_mode: CropMode,
    pub crop: CropBox,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            version: PARAMS_VERSION,
            rotation: 0.0,
            lensshift_v: 0.0,
            lensshift_h: 0.0,
            shear: 0.0,
            focal_length: DEFAULT_FOCAL_LENGTH,
            crop_factor: 1.0,
            orthocorr: 100.0,
            aspect: 1.0,
            mode: LensMode::Generic,
            crop_mode: CropMode::Off,
            crop: CropBox::FULL,
        }
    }
}

impl ModelParameters {
    /// Effective lens constants for the current lens mode.
    pub fn lens_geometry(&self) -> LensGeometry {
        match self.mode {
            LensMode::Generic => LensGeometry {
                f_length_kb: DEFAULT_FOCAL_LENGTH,
                orthocorr: 0.0,
                aspect: 1.0,
            },
            LensMode::Specific => LensGeometry {
                f_length_kb: self.focal_length * self.crop_factor,
                orthocorr: self.orthocorr,
                aspect: self.aspect,
            },
        }
    }

    /// The parameter values the optimizer may change, in fitting order.
    pub fn fit_values(&self) -> [f64; 4] {
        [self.rotation, self.lensshift_v, self.lensshift_h, self.shear]
    }
}

/// Lens constants derived from [`ModelParameters`] for homography construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LensGeometry {
    /// Focal length in 35 mm equivalent ("kleinbild").
    pub f_length_kb: f64,
    pub orthocorr: f64,
    pub aspect: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_mode_ignores_lens_fields() {
        let params = ModelParameters {
            focal_length: 85.0,
            crop_factor: 1.5,
            orthocorr: 40.0,
            aspect: 1.2,
            ..Default::default()
        };
        let geo = params.lens_geometry();
        assert_eq!(geo.f_length_kb, DEFAULT_FOCAL_LENGTH);
        assert_eq!(geo.orthocorr, 0.0);
        assert_eq!(geo.aspect, 1.0);

        let specific = ModelParameters {
            mode: LensMode::Specific,
            ..params
        };
        let geo = specific.lens_geometry();
        assert!((geo.f_length_kb - 127.5).abs() < 1e-9);
        assert_eq!(geo.orthocorr, 40.0);
        assert_eq!(geo.aspect, 1.2);
    }

    #[test]
    fn crop_box_validity() {
        assert!(CropBox::FULL.is_valid());
        assert!(CropBox::FULL.is_full(1e-4));
        let collapsed = CropBox {
            cl: 0.4,
            cr: 0.4,
            ct: 0.0,
            cb: 1.0,
        };
        assert!(!collapsed.is_valid());
        let outside = CropBox {
            cl: -0.1,
            ..CropBox::FULL
        };
        assert!(!outside.is_valid());
    }

    #[test]
    fn parameters_deserialize_with_defaults() {
        let params: ModelParameters =
            serde_json::from_str(r#"{"rotation": 1.5, "crop_mode": "largest_area"}"#).unwrap();
        assert_eq!(params.rotation, 1.5);
        assert_eq!(params.crop_mode, CropMode::LargestArea);
        assert_eq!(params.version, PARAMS_VERSION);
        assert_eq!(params.crop, CropBox::FULL);
    }
}
