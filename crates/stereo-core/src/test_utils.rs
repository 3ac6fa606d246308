//! Shared lens fixtures for tests across the workspace.
//!
//! Public so integration tests in other crates can use them; not intended
//! for production use.

use crate::{BrownConrady5, LensIntrinsics, Real, Vec2};

/// A 12 MP main (wide) lens with mild barrel distortion.
pub fn main_lens() -> LensIntrinsics {
    LensIntrinsics::new(2937.5, 2937.5, 2000.0, 1500.0).with_distortion(BrownConrady5 {
        k1: -0.2,
        k2: 0.0,
        k3: 0.0,
        p1: 0.0,
        p2: 0.0,
    })
}

/// Regular grid of pixels covering `[0, width) x [0, height)`.
pub fn pixel_grid(width: Real, height: Real, step: Real) -> Vec<Vec2> {
    let mut out = Vec::new();
    let mut y = 0.0;
    while y < height {
        let mut x = 0.0;
        while x < width {
            out.push(Vec2::new(x, y));
            x += step;
        }
        y += step;
    }
    out
}
