//! JSON configuration.
//!
//! - [`stages`]: optional per-stage overrides resolving into [`KeystoneParams`].
//! - [`demo`]: the `keystone_demo` tool configuration (inputs, outputs, run options).
//!
//! [`KeystoneParams`]: crate::params::KeystoneParams

pub mod demo;
pub mod stages;

pub use stages::{
    ClassifyConfig, CropConfig, FitConfig, KeystoneConfig, OutlierConfig, RangesConfig,
};
