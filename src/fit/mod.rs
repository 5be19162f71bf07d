//! Bounded fitting of the correction parameters.
//!
//! The optimizer searches rotation, lens shifts and shear (any subset, chosen
//! by a [`FitAxis`]) that make the selected structural lines axis aligned after
//! the correction. Variables are mapped from their soft ranges to the real
//! line with a logit so the unconstrained simplex never leaves the range.
//! A converged result is rejected when it inflates the image beyond a growth
//! limit.
mod axis;
mod bounds;
mod fitness;
mod optimizer;

pub use axis::FitAxis;
pub use bounds::{ilogit, logit, FitRanges, HARD_RANGES};
pub use fitness::{model_fitness, LineSelection};
pub use optimizer::{fit_parameters, FitOutcome, FitParams, FitReport};
