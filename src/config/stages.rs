use crate::crop::CropParams;
use crate::fit::{FitParams, FitRanges};
use crate::lines::ClassifierParams;
use crate::outliers::OutlierParams;
use crate::params::KeystoneParams;
use serde::Deserialize;

/// Stage overrides; every missing value keeps its default.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct KeystoneConfig {
    pub classify: ClassifyConfig,
    pub outlier: OutlierConfig,
    pub fit: FitConfig,
    pub crop: CropConfig,
    pub ranges: RangesConfig,
}

impl KeystoneConfig {
    pub fn resolve(&self) -> KeystoneParams {
        KeystoneParams {
            classifier: self.classify.resolve(),
            outlier: self.outlier.resolve(),
            fit: self.fit.resolve(),
            crop: self.crop.resolve(),
            ranges: self.ranges.resolve(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ClassifyConfig {
    pub min_line_length: Option<f64>,
    pub max_tangential_deviation_deg: Option<f64>,
}

impl ClassifyConfig {
    pub fn resolve(&self) -> ClassifierParams {
        let mut params = ClassifierParams::default();
        if let Some(v) = self.min_line_length {
            params.min_line_length = v;
        }
        if let Some(v) = self.max_tangential_deviation_deg {
            params.max_tangential_deviation_deg = v;
        }
        params
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct OutlierConfig {
    pub runs: Option<usize>,
    pub hurdle: Option<usize>,
    pub epsilon_exponent: Option<f64>,
    pub elimination_ratio: Option<f64>,
    pub optimization_steps: Option<usize>,
    pub dry_runs: Option<usize>,
    pub seed: Option<u64>,
}

impl OutlierConfig {
    pub fn resolve(&self) -> OutlierParams {
        let mut params = OutlierParams::default();
        if let Some(v) = self.runs {
            params.runs = v;
        }
        if let Some(v) = self.hurdle {
            params.hurdle = v;
        }
        if let Some(v) = self.epsilon_exponent {
            params.epsilon_exponent = v;
        }
        if let Some(v) = self.elimination_ratio {
            params.elimination_ratio = v;
        }
        if let Some(v) = self.optimization_steps {
            params.optimization_steps = v;
        }
        if let Some(v) = self.dry_runs {
            params.dry_runs = v;
        }
        if let Some(v) = self.seed {
            params.seed = v;
        }
        params
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FitConfig {
    pub epsilon: Option<f64>,
    pub max_iterations: Option<usize>,
    pub min_lines: Option<usize>,
    pub max_area_growth: Option<f64>,
}

impl FitConfig {
    pub fn resolve(&self) -> FitParams {
        let mut params = FitParams::default();
        if let Some(v) = self.epsilon {
            params.epsilon = v;
        }
        if let Some(v) = self.max_iterations {
            params.max_iterations = v;
        }
        if let Some(v) = self.min_lines {
            params.min_lines = v;
        }
        if let Some(v) = self.max_area_growth {
            params.max_area_growth = v;
        }
        params
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CropConfig {
    pub epsilon: Option<f64>,
    pub max_iterations: Option<usize>,
}

impl CropConfig {
    pub fn resolve(&self) -> CropParams {
        let mut params = CropParams::default();
        if let Some(v) = self.epsilon {
            params.epsilon = v;
        }
        if let Some(v) = self.max_iterations {
            params.max_iterations = v;
        }
        params
    }
}

/// Soft bounds of the fitted variables. `hard: true` starts from the narrow ranges.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RangesConfig {
    pub hard: bool,
    pub rotation: Option<f64>,
    pub lensshift_v: Option<f64>,
    pub lensshift_h: Option<f64>,
    pub shear: Option<f64>,
}

impl RangesConfig {
    pub fn resolve(&self) -> FitRanges {
        let mut ranges = if self.hard {
            crate::fit::HARD_RANGES
        } else {
            FitRanges::default()
        };
        if let Some(v) = self.rotation {
            ranges.rotation = v;
        }
        if let Some(v) = self.lensshift_v {
            ranges.lensshift_v = v;
        }
        if let Some(v) = self.lensshift_h {
            ranges.lensshift_h = v;
        }
        if let Some(v) = self.shear {
            ranges.shear = v;
        }
        ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        let cfg: KeystoneConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.resolve(), KeystoneParams::default());
    }

    #[test]
    fn overrides_apply_over_defaults() {
        let cfg: KeystoneConfig = serde_json::from_str(
            r#"{
                "outlier": { "seed": 7, "elimination_ratio": 40 },
                "fit": { "max_area_growth": 2.5 },
                "ranges": { "hard": true, "shear": 0.3 },
                "classify": { "min_line_length": 12 }
            }"#,
        )
        .unwrap();
        let params = cfg.resolve();
        assert_eq!(params.outlier.seed, 7);
        assert_eq!(params.outlier.elimination_ratio, 40.0);
        assert_eq!(params.outlier.runs, OutlierParams::default().runs);
        assert_eq!(params.fit.max_area_growth, 2.5);
        assert_eq!(params.fit.min_lines, 4);
        assert_eq!(params.ranges.rotation, 10.0);
        assert_eq!(params.ranges.shear, 0.3);
        assert_eq!(params.classifier.min_line_length, 12.0);
        assert_eq!(params.crop, CropParams::default());
    }
}
