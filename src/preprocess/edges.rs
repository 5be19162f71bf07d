use crate::image::{ImageF32, ImageView};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

type Kernel3 = [[f32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[1.0, 0.0, -1.0], [2.0, 0.0, -2.0], [1.0, 0.0, -1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[1.0, 2.0, 1.0], [0.0, 0.0, 0.0], [-1.0, -2.0, -1.0]];

fn magnitude_row(img: &ImageF32, y: usize, out: &mut [f32]) {
    let w = img.w;
    let rows = [img.row(y - 1), img.row(y), img.row(y + 1)];
    for x in 1..w - 1 {
        let mut gx = 0.0;
        let mut gy = 0.0;
        for (ky, row) in rows.iter().enumerate() {
            for kx in 0..3 {
                let v = row[x + kx - 1];
                gx += v * SOBEL_KERNEL_X[ky][kx];
                gy += v * SOBEL_KERNEL_Y[ky][kx];
            }
        }
        out[x] = (gx * gx + gy * gy).sqrt();
    }
}

/// Sobel gradient magnitude.
///
/// The one-pixel frame, where the kernel does not fit, copies its inner
/// neighbour so the border does not produce pseudo lines.
pub fn edge_enhance(img: &ImageF32) -> ImageF32 {
    let (w, h) = (img.w, img.h);
    let mut out = ImageF32::new(w, h);
    if w < 3 || h < 3 {
        return out;
    }

    #[cfg(feature = "parallel")]
    out.data
        .par_chunks_mut(w)
        .enumerate()
        .filter(|(y, _)| *y > 0 && *y < h - 1)
        .for_each(|(y, row)| magnitude_row(img, y, row));
    #[cfg(not(feature = "parallel"))]
    out.data
        .chunks_mut(w)
        .enumerate()
        .filter(|(y, _)| *y > 0 && *y < h - 1)
        .for_each(|(y, row)| magnitude_row(img, y, row));

    for y in 1..h - 1 {
        let i = y * w;
        out.data[i] = out.data[i + 1];
        out.data[i + w - 1] = out.data[i + w - 2];
    }
    out.data.copy_within(w..2 * w, 0);
    out.data.copy_within((h - 2) * w..(h - 1) * w, (h - 1) * w);
    out
}
