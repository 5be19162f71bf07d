use keystone::homography::{apply_homography_points, corner_bounds, homography, Direction};
use keystone::lines::{DetectionFrame, Line, LineSet, Orientation, RawSegment};
use keystone::types::ModelParameters;

/// Segment of `len` pixels starting at `p` and heading towards `vp`.
pub fn towards(vp: [f64; 2], p: [f64; 2], len: f64) -> ([f64; 2], [f64; 2]) {
    let dx = vp[0] - p[0];
    let dy = vp[1] - p[1];
    let n = (dx * dx + dy * dy).sqrt();
    (p, [p[0] + dx / n * len, p[1] + dy / n * len])
}

/// Selected vertical line towards `vp`.
pub fn vertical_towards(vp: [f64; 2], p: [f64; 2], len: f64) -> Line {
    let (p1, p2) = towards(vp, p, len);
    Line::new(p1, p2, 1.0, 1.0, Some(Orientation::Vertical)).expect("non-degenerate line")
}

pub fn line_set(lines: Vec<Line>, width: usize, height: usize) -> LineSet {
    LineSet::new(lines, DetectionFrame::new(width, height), 0)
}

/// Segments that become exactly vertical (`xs`) and horizontal (`ys`) after
/// correcting with `params`. Positions are fractions of the corrected bounds.
pub fn distorted_segments(
    params: &ModelParameters,
    width: usize,
    height: usize,
    xs: &[f64],
    ys: &[f64],
) -> Vec<RawSegment> {
    let (w, h) = (width as f64, height as f64);
    let forward = homography(params, w, h, Direction::Forward);
    let inverse = homography(params, w, h, Direction::Inverse);
    let b = corner_bounds(&forward, w, h).expect("finite corrected bounds");
    let at = |fx: f64, fy: f64| {
        [
            b.x_min + fx * (b.x_max - b.x_min),
            b.y_min + fy * (b.y_max - b.y_min),
        ]
    };

    let mut out = Vec::new();
    for &fx in xs {
        out.push([at(fx, 0.25), at(fx, 0.75)]);
    }
    for &fy in ys {
        out.push([at(0.25, fy), at(0.75, fy)]);
    }
    out.into_iter()
        .map(|pts| {
            let back = apply_homography_points(&inverse, &pts).expect("finite input points");
            RawSegment::new(back[0], back[1])
        })
        .collect()
}

/// Greyscale buffer with a vertical step edge, so buffers can differ in content.
pub fn step_image(width: usize, height: usize, edge_x: usize) -> keystone::image::ImageF32 {
    let mut img = keystone::image::ImageF32::new(width, height);
    for y in 0..height {
        for x in edge_x.min(width)..width {
            img.set(x, y, 1.0);
        }
    }
    img
}
