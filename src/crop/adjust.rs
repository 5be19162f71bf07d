use super::geometry::CropGeometry;
use crate::types::{CropBox, ModelParameters};

/// Smallest crop area accepted by a manual move, relative to the input area.
const MIN_AREA_FRACTION: f64 = 0.01;

/// Recentres the crop at `(new_x, new_y)`, given as fractions of the corrected
/// output, keeping the image aspect ratio.
///
/// Returns `None` when the move would leave less than 1 % of the image area,
/// in which case the current margins should stay.
pub fn adjust_crop(
    params: &ModelParameters,
    width: f64,
    height: f64,
    new_x: f64,
    new_y: f64,
) -> Option<CropBox> {
    let geo = CropGeometry::new(params, width, height)?;
    let alpha = geo.image_alpha();
    let p = [new_x * geo.out_width, new_y * geo.out_height];
    let d2 = geo.half_diagonal_sq(p, alpha);
    if CropGeometry::area(d2, alpha) < MIN_AREA_FRACTION * width * height {
        return None;
    }
    let crop = geo.margins(p, d2.sqrt(), alpha);
    crop.is_valid().then_some(crop)
}
