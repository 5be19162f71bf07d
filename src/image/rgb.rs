//! Owned interleaved RGB f32 image, linear values nominally in `[0, 1]`.

#[derive(Clone, Debug, PartialEq)]
pub struct RgbImageF32 {
    pub w: usize,
    pub h: usize,
    /// `w * h * 3` interleaved samples
    pub data: Vec<f32>,
}

impl RgbImageF32 {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![0.0; w * h * 3],
        }
    }

    /// Wrap interleaved data; `None` if the length does not match.
    pub fn from_vec(w: usize, h: usize, data: Vec<f32>) -> Option<Self> {
        (data.len() == w * h * 3).then_some(Self { w, h, data })
    }

    /// Interleaved samples of row `y`.
    #[inline]
    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.w * 3;
        &self.data[start..start + self.w * 3]
    }
}
