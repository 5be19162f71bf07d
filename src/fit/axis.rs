use serde::{Deserialize, Serialize};

/// Which parameters to fit and which line directions to fit them against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitAxis {
    pub rotation: bool,
    pub lens_vertical: bool,
    pub lens_horizontal: bool,
    pub shear: bool,
    pub lines_vertical: bool,
    pub lines_horizontal: bool,
}

impl FitAxis {
    pub const fn none() -> Self {
        Self {
            rotation: false,
            lens_vertical: false,
            lens_horizontal: false,
            shear: false,
            lines_vertical: false,
            lines_horizontal: false,
        }
    }

    /// Rotation and vertical lens shift against vertical lines.
    pub const fn vertically() -> Self {
        Self {
            rotation: true,
            lens_vertical: true,
            lines_vertical: true,
            ..Self::none()
        }
    }

    /// Rotation and horizontal lens shift against horizontal lines.
    pub const fn horizontally() -> Self {
        Self {
            rotation: true,
            lens_horizontal: true,
            lines_horizontal: true,
            ..Self::none()
        }
    }

    /// Rotation and both lens shifts against all lines.
    pub const fn both() -> Self {
        Self {
            rotation: true,
            lens_vertical: true,
            lens_horizontal: true,
            lines_vertical: true,
            lines_horizontal: true,
            ..Self::none()
        }
    }

    pub const fn vertically_no_rotation() -> Self {
        Self {
            rotation: false,
            ..Self::vertically()
        }
    }

    pub const fn horizontally_no_rotation() -> Self {
        Self {
            rotation: false,
            ..Self::horizontally()
        }
    }

    pub const fn both_no_rotation() -> Self {
        Self {
            rotation: false,
            ..Self::both()
        }
    }

    /// Like [`FitAxis::both`] with shear.
    pub const fn both_shear() -> Self {
        Self {
            shear: true,
            ..Self::both()
        }
    }

    pub const fn rotation_vertical_lines() -> Self {
        Self {
            rotation: true,
            lines_vertical: true,
            ..Self::none()
        }
    }

    pub const fn rotation_horizontal_lines() -> Self {
        Self {
            rotation: true,
            lines_horizontal: true,
            ..Self::none()
        }
    }

    pub const fn rotation_both_lines() -> Self {
        Self {
            rotation: true,
            lines_vertical: true,
            lines_horizontal: true,
            ..Self::none()
        }
    }

    /// Nothing to fit.
    pub fn is_none(&self) -> bool {
        !(self.rotation || self.lens_vertical || self.lens_horizontal || self.shear)
    }

    /// Number of fitted variables.
    pub fn variable_count(&self) -> usize {
        [
            self.rotation,
            self.lens_vertical,
            self.lens_horizontal,
            self.shear,
        ]
        .iter()
        .filter(|&&b| b)
        .count()
    }

    /// Adapts a single-direction request to an image shown rotated by 90°.
    ///
    /// When exactly one lens shift is requested its direction and the line
    /// direction are swapped on flipped images; a request without any line
    /// direction then falls back to both.
    pub fn oriented(self, flipped: bool) -> Self {
        if self.lens_vertical == self.lens_horizontal {
            return self;
        }
        let mut axis = self;
        if flipped {
            std::mem::swap(&mut axis.lens_vertical, &mut axis.lens_horizontal);
            std::mem::swap(&mut axis.lines_vertical, &mut axis.lines_horizontal);
        }
        if !axis.lines_vertical && !axis.lines_horizontal {
            axis.lines_vertical = true;
            axis.lines_horizontal = true;
        }
        axis
    }
}
