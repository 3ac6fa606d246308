//! Disparity-to-depth triangulation for a rectified-by-baseline stereo pair.
//!
//! Uses the similar-triangles relation `Z = f * B / d`.

use stereo_core::{LensIntrinsics, Pt3, Real, Vec2};

/// Disparities below this value are treated as zero (point at optical
/// infinity, or a failed match).
pub const MIN_DISPARITY_PX: Real = 0.1;

/// Depth returned for a degenerate disparity.
///
/// Zero is never a valid depth for a point in front of the camera.
pub const DEGENERATE_DEPTH_MM: Real = 0.0;

/// Whether `disparity_px` is too small (or NaN) to triangulate.
pub fn is_degenerate_disparity(disparity_px: Real) -> bool {
    disparity_px.is_nan() || disparity_px < MIN_DISPARITY_PX
}

/// Whether a depth value is the degenerate-disparity sentinel.
pub fn is_degenerate_depth(depth_mm: Real) -> bool {
    depth_mm == DEGENERATE_DEPTH_MM
}

/// Depth along the optical axis in millimetres.
///
/// `f_px` is the focal length of the reference camera in pixels and
/// `baseline_mm` the distance between the optical centres. Returns
/// [`DEGENERATE_DEPTH_MM`] when the disparity is below [`MIN_DISPARITY_PX`];
/// never divides by a near-zero value. Focal length and baseline are not
/// validated.
pub fn depth_from_disparity(f_px: Real, baseline_mm: Real, disparity_px: Real) -> Real {
    try_depth_from_disparity(f_px, baseline_mm, disparity_px).unwrap_or(DEGENERATE_DEPTH_MM)
}

/// Like [`depth_from_disparity`], with `None` in place of the sentinel.
pub fn try_depth_from_disparity(f_px: Real, baseline_mm: Real, disparity_px: Real) -> Option<Real> {
    if is_degenerate_disparity(disparity_px) {
        return None;
    }
    Some(f_px * baseline_mm / disparity_px)
}

/// Lift a corrected (undistorted) pixel of the reference camera to a 3D point
/// in its camera frame, in millimetres.
///
/// Returns `None` for the degenerate depth sentinel or any non-positive depth.
pub fn triangulate_pixel(
    intrinsics: &LensIntrinsics,
    corrected_px: &Vec2,
    depth_mm: Real,
) -> Option<Pt3> {
    intrinsics.unproject_undistorted(corrected_px, depth_mm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_matches_similar_triangles() {
        let z = depth_from_disparity(1000.0, 12.0, 60.0);
        assert!((z - 200.0).abs() < 1e-12);
    }

    #[test]
    fn near_zero_disparity_returns_sentinel() {
        let z = depth_from_disparity(1000.0, 12.0, 0.05);
        assert!(z.is_finite());
        assert!(is_degenerate_depth(z));
        assert!(try_depth_from_disparity(1000.0, 12.0, 0.05).is_none());
    }

    #[test]
    fn threshold_is_inclusive() {
        let z = depth_from_disparity(1000.0, 12.0, MIN_DISPARITY_PX);
        assert!((z - 120_000.0).abs() < 1e-6);
    }

    #[test]
    fn negative_and_nan_disparity_are_degenerate() {
        assert!(is_degenerate_depth(depth_from_disparity(1000.0, 12.0, -3.0)));
        assert!(is_degenerate_depth(depth_from_disparity(1000.0, 12.0, Real::NAN)));
    }

    #[test]
    fn pixel_at_principal_point_lies_on_axis() {
        let k = LensIntrinsics::new(2000.0, 2000.0, 960.0, 540.0);
        let p = triangulate_pixel(&k, &Vec2::new(960.0, 540.0), 150.0).unwrap();
        assert_eq!((p.x, p.y, p.z), (0.0, 0.0, 150.0));
        assert!(triangulate_pixel(&k, &Vec2::new(0.0, 0.0), DEGENERATE_DEPTH_MM).is_none());
    }
}
