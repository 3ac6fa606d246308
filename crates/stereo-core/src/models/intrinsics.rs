use nalgebra::{RealField, Vector2};
use serde::{Deserialize, Serialize};

use super::{BrownConrady5, DistortionModel, UndistortOptions};
use crate::{Pt3, Real, Vec2};

/// Intrinsics that map normalized image coordinates to pixel coordinates.
pub trait IntrinsicsModel<S: RealField + Copy> {
    /// Convert normalized coordinates (Z = 1 plane) into pixel coordinates.
    fn normalized_to_pixel(&self, n: &Vector2<S>) -> Vector2<S>;
    /// Convert pixel coordinates into normalized coordinates.
    fn pixel_to_normalized(&self, px: &Vector2<S>) -> Vector2<S>;
}

/// Optical model of one physical sensor: pinhole intrinsics plus optional
/// Brown-Conrady distortion.
///
/// Constructed once per sensor at discovery time and never mutated. Two
/// values compare equal iff every scalar and every distortion coefficient
/// compares equal.
///
/// `distortion == None` means an ideal, distortion-free lens.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LensIntrinsics {
    /// Focal length in pixels along X.
    pub fx: Real,
    /// Focal length in pixels along Y.
    pub fy: Real,
    /// Principal point X coordinate in pixels.
    pub cx: Real,
    /// Principal point Y coordinate in pixels.
    pub cy: Real,
    /// Brown-Conrady coefficients, absent for an ideal lens.
    #[serde(default)]
    pub distortion: Option<BrownConrady5<Real>>,
}

impl LensIntrinsics {
    /// Ideal (distortion-free) lens.
    pub fn new(fx: Real, fy: Real, cx: Real, cy: Real) -> Self {
        Self {
            fx,
            fy,
            cx,
            cy,
            distortion: None,
        }
    }

    /// Build from a coefficient slice in `[k1, k2, k3, p1, p2]` order.
    ///
    /// An empty slice yields an ideal lens.
    pub fn with_coefficients(fx: Real, fy: Real, cx: Real, cy: Real, coeffs: &[Real]) -> Self {
        let distortion = (!coeffs.is_empty()).then(|| BrownConrady5::from_coefficients(coeffs));
        Self {
            fx,
            fy,
            cx,
            cy,
            distortion,
        }
    }

    pub fn with_distortion(mut self, distortion: BrownConrady5<Real>) -> Self {
        self.distortion = Some(distortion);
        self
    }

    /// Distortion coefficients that actually need inverting.
    fn active_distortion(&self) -> Option<&BrownConrady5<Real>> {
        self.distortion.as_ref().filter(|d| !d.is_identity())
    }

    /// Apply lens distortion to an ideal pixel, producing the pixel the sensor
    /// would actually record.
    pub fn distort_pixel(&self, px: &Vec2) -> Vec2 {
        match self.active_distortion() {
            Some(d) => {
                let n = self.pixel_to_normalized(px);
                self.normalized_to_pixel(&d.distort(&n))
            }
            None => *px,
        }
    }

    /// Correct a raw (distorted) pixel with the default fixed iteration budget.
    ///
    /// Returns the input unchanged, without iterating, for an ideal lens.
    pub fn undistort_pixel(&self, px: &Vec2) -> Vec2 {
        self.undistort_pixel_with(px, &UndistortOptions::default())
    }

    /// Correct a raw (distorted) pixel with explicit undistortion options.
    pub fn undistort_pixel_with(&self, px: &Vec2, opts: &UndistortOptions) -> Vec2 {
        match self.active_distortion() {
            Some(d) => {
                let n = self.pixel_to_normalized(px);
                self.normalized_to_pixel(&d.undistort_with(&n, opts))
            }
            None => *px,
        }
    }

    /// Project a 3D point in camera coordinates to a distorted pixel.
    ///
    /// Returns `None` for points on or behind the image plane (`z <= 0`).
    pub fn project(&self, p_c: &Pt3) -> Option<Vec2> {
        if p_c.z <= 0.0 {
            return None;
        }
        let ideal = self.normalized_to_pixel(&Vec2::new(p_c.x / p_c.z, p_c.y / p_c.z));
        Some(self.distort_pixel(&ideal))
    }

    /// Lift an already corrected pixel to a 3D point at the given depth along
    /// the optical axis.
    ///
    /// Returns `None` if `depth <= 0`.
    pub fn unproject_undistorted(&self, uv: &Vec2, depth: Real) -> Option<Pt3> {
        if depth <= 0.0 {
            return None;
        }
        let n = self.pixel_to_normalized(uv);
        Some(Pt3::new(n.x * depth, n.y * depth, depth))
    }

    /// Unproject a raw (distorted) pixel and depth into a 3D point in camera
    /// coordinates.
    ///
    /// Returns `None` if `depth <= 0`.
    pub fn unproject(&self, uv: &Vec2, depth: Real) -> Option<Pt3> {
        self.unproject_undistorted(&self.undistort_pixel(uv), depth)
    }
}

impl IntrinsicsModel<Real> for LensIntrinsics {
    fn normalized_to_pixel(&self, n: &Vec2) -> Vec2 {
        Vec2::new(n.x * self.fx + self.cx, n.y * self.fy + self.cy)
    }

    fn pixel_to_normalized(&self, px: &Vec2) -> Vec2 {
        Vec2::new((px.x - self.cx) / self.fx, (px.y - self.cy) / self.fy)
    }
}
