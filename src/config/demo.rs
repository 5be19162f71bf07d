use super::stages::KeystoneConfig;
use crate::fit::FitAxis;
use crate::preprocess::Enhance;
use crate::types::ModelParameters;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct DemoConfig {
    /// Image the detection buffer is built from.
    pub input: PathBuf,
    /// JSON array of detector segments in buffer pixels.
    pub segments: PathBuf,
    /// Treat the input as linear raw data and lift it with a gamma curve.
    #[serde(default)]
    pub is_raw: bool,
    #[serde(default)]
    pub buffer: BufferConfig,
    #[serde(default)]
    pub enhance: Enhance,
    #[serde(default)]
    pub axis: AxisPreset,
    /// Starting parameters; the fit writes into a copy.
    #[serde(default)]
    pub params: ModelParameters,
    /// Diagonals before and after preceding transforms, to detect a quarter turn.
    #[serde(default)]
    pub orientation: Option<OrientationConfig>,
    #[serde(default)]
    pub stages: KeystoneConfig,
    pub output: DemoOutputConfig,
}

/// Placement of the detection buffer in the input image.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    pub x_off: f64,
    pub y_off: f64,
    pub scale: f64,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            x_off: 0.0,
            y_off: 0.0,
            scale: 1.0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OrientationConfig {
    pub input_diagonal: [f64; 2],
    pub output_diagonal: [f64; 2],
}

/// Named fit selections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisPreset {
    None,
    Vertically,
    Horizontally,
    #[default]
    Both,
    VerticallyNoRotation,
    HorizontallyNoRotation,
    BothNoRotation,
    BothShear,
    RotationVerticalLines,
    RotationHorizontalLines,
    RotationBothLines,
}

impl AxisPreset {
    pub fn to_axis(self) -> FitAxis {
        match self {
            AxisPreset::None => FitAxis::none(),
            AxisPreset::Vertically => FitAxis::vertically(),
            AxisPreset::Horizontally => FitAxis::horizontally(),
            AxisPreset::Both => FitAxis::both(),
            AxisPreset::VerticallyNoRotation => FitAxis::vertically_no_rotation(),
            AxisPreset::HorizontallyNoRotation => FitAxis::horizontally_no_rotation(),
            AxisPreset::BothNoRotation => FitAxis::both_no_rotation(),
            AxisPreset::BothShear => FitAxis::both_shear(),
            AxisPreset::RotationVerticalLines => FitAxis::rotation_vertical_lines(),
            AxisPreset::RotationHorizontalLines => FitAxis::rotation_horizontal_lines(),
            AxisPreset::RotationBothLines => FitAxis::rotation_both_lines(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DemoOutputConfig {
    pub dir: PathBuf,
    pub result_json: PathBuf,
    /// Optional dump of the (enhanced) detection buffer.
    #[serde(default)]
    pub buffer_image: Option<PathBuf>,
}

impl DemoOutputConfig {
    pub fn result_path(&self) -> PathBuf {
        resolve_path(&self.dir, &self.result_json)
    }

    pub fn buffer_path(&self) -> Option<PathBuf> {
        self.buffer_image
            .as_deref()
            .map(|p| resolve_path(&self.dir, p))
    }
}

pub fn load_config(path: &Path) -> Result<DemoConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
