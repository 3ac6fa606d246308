//! Ground sample distance and surface area.
//!
//! All functions assume a locally planar surface perpendicular to the optical
//! axis at the given depth. Masks spanning strong depth gradients should use
//! [`surface_area_from_depths`] rather than a single representative depth.

use serde::{Deserialize, Serialize};
use stereo_core::Real;

use crate::is_degenerate_depth;

/// Physical edge length of one pixel at `depth_mm`, in millimetres.
pub fn ground_sample_distance(depth_mm: Real, f_px: Real) -> Real {
    depth_mm / f_px
}

/// Physical area covered by one pixel at `depth_mm`, in mm².
pub fn pixel_area_at_depth(depth_mm: Real, f_px: Real) -> Real {
    let scale = ground_sample_distance(depth_mm, f_px);
    scale * scale
}

/// Area of a mask of `mask_pixel_count` pixels at a uniform depth, in mm².
pub fn surface_area(mask_pixel_count: u64, depth_mm: Real, f_px: Real) -> Real {
    mask_pixel_count as Real * pixel_area_at_depth(depth_mm, f_px)
}

/// Area accumulated over per-pixel depths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaskArea {
    /// Summed area in mm².
    pub area_mm2: Real,
    /// Pixels that contributed to the area.
    pub valid_pixels: u64,
    /// Pixels skipped because their depth was the degenerate sentinel or not
    /// finite.
    pub skipped_pixels: u64,
}

/// Sum per-pixel areas, each at its own depth.
pub fn surface_area_from_depths<I>(depths_mm: I, f_px: Real) -> MaskArea
where
    I: IntoIterator<Item = Real>,
{
    let mut out = MaskArea {
        area_mm2: 0.0,
        valid_pixels: 0,
        skipped_pixels: 0,
    };
    for depth in depths_mm {
        if is_degenerate_depth(depth) || !depth.is_finite() {
            out.skipped_pixels += 1;
            continue;
        }
        out.area_mm2 += pixel_area_at_depth(depth, f_px);
        out.valid_pixels += 1;
    }
    out
}
