//! Core optics for stereo measurement.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec2`, `Pt3`, ...),
//! - the per-sensor lens model [`LensIntrinsics`] with Brown-Conrady
//!   distortion and its fixed-budget inverse,
//! - best-effort intrinsics recovery from hardware calibration fields.
//!
//! Camera pipeline:
//! `pixel = K ∘ distortion ∘ projection(dir)`

/// Linear algebra type aliases and helpers.
pub mod math;
/// Lens intrinsics and distortion models.
pub mod models;
/// Intrinsics recovery from raw sensor calibration.
pub mod recovery;
/// Shared test fixtures.
pub mod test_utils;

pub use math::*;
pub use models::*;
pub use recovery::*;
