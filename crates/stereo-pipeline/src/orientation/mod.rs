//! Orientation leveling gate.
//!
//! Two latched 3-axis inputs (gravity-like, magnetic-field-like) are fused
//! into pitch, roll and azimuth; the device counts as level while both pitch
//! and roll stay strictly inside a threshold.

mod gate;
mod rotation;
mod shared;

pub use gate::*;
pub use rotation::*;
pub use shared::*;
