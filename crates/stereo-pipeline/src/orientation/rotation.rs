//! Device attitude from a gravity-like and a magnetic-field-like vector.
//!
//! Device frame: X to the right, Y up along the screen, Z out of the screen.
//! World frame: X east, Y magnetic north, Z up.

use serde::{Deserialize, Serialize};
use stereo_core::{Mat3, Real, Vec3};

/// Below this norm of `magnetic × gravity` the two vectors are considered
/// (near) parallel or the device in free fall; no rotation is defined.
pub const MIN_CROSS_NORM: Real = 0.1;

/// Device-to-world rotation from the latest gravity and magnetic readings.
///
/// Rows are east, north and up expressed in device coordinates. Returns
/// `None` for degenerate input.
pub fn rotation_from_vectors(gravity: &Vec3, magnetic: &Vec3) -> Option<Mat3> {
    let east = magnetic.cross(gravity);
    let east_norm = east.norm();
    if east_norm.is_nan() || east_norm < MIN_CROSS_NORM {
        return None;
    }
    let east = east / east_norm;
    let up = gravity.normalize();
    let north = up.cross(&east);

    Some(Mat3::from_rows(&[
        east.transpose(),
        north.transpose(),
        up.transpose(),
    ]))
}

/// Device attitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationSample {
    /// Rotation about the X axis; positive when the top edge tilts toward
    /// the user.
    pub pitch_deg: Real,
    /// Rotation about the Y axis.
    pub roll_deg: Real,
    /// Heading relative to magnetic north, in `(-180, 180]`.
    pub azimuth_deg: Real,
}

impl OrientationSample {
    /// Extract azimuth, pitch and roll from a device-to-world rotation.
    pub fn from_rotation(r: &Mat3) -> Self {
        let azimuth = r[(0, 1)].atan2(r[(1, 1)]);
        let pitch = (-r[(2, 1)]).clamp(-1.0, 1.0).asin();
        let roll = (-r[(2, 0)]).atan2(r[(2, 2)]);
        Self {
            pitch_deg: pitch.to_degrees(),
            roll_deg: roll.to_degrees(),
            azimuth_deg: azimuth.to_degrees(),
        }
    }

    /// Attitude from the two raw vectors, `None` for degenerate input.
    pub fn from_vectors(gravity: &Vec3, magnetic: &Vec3) -> Option<Self> {
        rotation_from_vectors(gravity, magnetic).map(|r| Self::from_rotation(&r))
    }

    /// Level iff `|pitch| < threshold` and `|roll| < threshold`.
    pub fn is_level(&self, threshold_deg: Real) -> bool {
        self.pitch_deg.abs() < threshold_deg && self.roll_deg.abs() < threshold_deg
    }
}
