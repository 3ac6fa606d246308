//! Lens model building blocks.
//!
//! A sensor is described by two stages acting on a viewing direction:
//!
//! 1. `DistortionModel`: radial/tangential distortion in normalized space.
//! 2. `IntrinsicsModel`: normalized coordinates to pixels (K matrix).
//!
//! The combined mapping is
//! `pixel = intrinsics(distortion(x / z, y / z))`.
//!
//! [`LensIntrinsics`] bundles both stages for one physical sensor.

mod distortion;
mod intrinsics;

pub use distortion::*;
pub use intrinsics::*;
