//! Structural lines used by the correction fit.
//!
//! Raw segments from a detector are classified into near-vertical and
//! near-horizontal lines, weighted by `length × width × precision`, and stored
//! with their normalized homogeneous coefficients in a [`LineSet`]. The set
//! records the frame it was detected in and the hash of the detection buffer so
//! that stale structure can be recognised after the input changes.
//!
//! - `line`: the [`Line`] type and its [`Orientation`].
//! - `classify`: border rejection, direction tests and weighting.
//! - `set`: per-direction accounting, selection edits and geometry hashing.
mod classify;
mod line;
mod set;

pub use classify::{classify_segments, ClassifierParams, RawSegment};
pub use line::{Line, Orientation};
pub use set::{DetectionFrame, LineSet};
