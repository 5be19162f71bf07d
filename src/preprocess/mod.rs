//! Preparation of the detection buffer.
//!
//! - `color`: gamma lift for linear (raw) input and luma conversion.
//! - `detail`: bilateral-grid local contrast boost on Lab lightness.
//! - `edges`: Sobel gradient magnitude with border fill.
//!
//! Detail enhancement runs before the luma conversion when RGB data is at
//! hand, edge enhancement after it. Row loops run on the rayon pool when the
//! `parallel` feature is enabled.
mod color;
mod detail;
mod edges;

pub use color::{apply_gamma, greyscale, RAW_GAMMA};
pub use detail::{detail_enhance, detail_enhance_grey};
pub use edges::edge_enhance;

use crate::image::{ImageF32, RgbImageF32};
use serde::{Deserialize, Serialize};

/// Optional enhancement applied before segment detection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Enhance {
    #[default]
    None,
    Edges,
    Detail,
    DetailEdges,
}

impl Enhance {
    pub fn detail(self) -> bool {
        matches!(self, Enhance::Detail | Enhance::DetailEdges)
    }

    pub fn edges(self) -> bool {
        matches!(self, Enhance::Edges | Enhance::DetailEdges)
    }
}

/// Applies `enhance` to a detection buffer.
///
/// `rgb` is the colour source of `grey` when available; without it detail
/// enhancement works on the greyscale values directly.
pub fn prepare(grey: &ImageF32, rgb: Option<&RgbImageF32>, enhance: Enhance) -> ImageF32 {
    let base = match (enhance.detail(), rgb) {
        (false, _) => grey.clone(),
        (true, Some(rgb)) => greyscale(&detail_enhance(rgb)),
        (true, None) => detail_enhance_grey(grey),
    };
    if enhance.edges() {
        edge_enhance(&base)
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enhance_parses_from_config_names() {
        let e: Enhance = serde_json::from_str("\"detail_edges\"").unwrap();
        assert!(e.detail() && e.edges());
        assert!(!Enhance::Edges.detail());
        assert!(!Enhance::None.edges());
    }

    #[test]
    fn detail_prefers_the_rgb_source() {
        let mut rgb = RgbImageF32::new(16, 12);
        for (i, px) in rgb.data.chunks_exact_mut(3).enumerate() {
            px.fill(if i % 16 < 8 { 0.3 } else { 0.6 });
        }
        // stale greyscale that does not match the colour data
        let grey = ImageF32::new(16, 12);
        let from_rgb = prepare(&grey, Some(&rgb), Enhance::Detail);
        let from_grey = prepare(&grey, None, Enhance::Detail);
        assert!(from_rgb.get(12, 6) > 0.5);
        assert!(from_grey.data.iter().all(|v| v.abs() < 1e-6));
    }
}
