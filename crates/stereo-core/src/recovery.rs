//! Best-effort recovery of [`LensIntrinsics`] from hardware calibration fields.
//!
//! Consumer hardware exposes calibration inconsistently: some sensors report
//! factory intrinsics, others only their geometry, some nothing at all. The
//! recovery here is total; missing data degrades to an estimate, never to an
//! error.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{BrownConrady5, LensIntrinsics, Real};

/// Focal length assumed when the sensor reports none (mm).
pub const DEFAULT_FOCAL_LENGTH_MM: Real = 4.7;
/// Physical sensor width assumed when the sensor reports none (mm).
pub const DEFAULT_SENSOR_WIDTH_MM: Real = 6.4;
/// Pixel array width assumed when the sensor reports none.
pub const DEFAULT_IMAGE_WIDTH_PX: u32 = 4000;
/// Pixel array height assumed when the sensor reports none.
pub const DEFAULT_IMAGE_HEIGHT_PX: u32 = 3000;

/// Raw calibration fields as reported by the hardware layer for one sensor.
///
/// Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorCalibration {
    /// Factory calibration `[fx, fy, cx, cy, ...]`, optionally followed by
    /// distortion coefficients `[k1, k2, k3, p1, p2]`.
    pub intrinsic_calibration: Option<Vec<Real>>,
    /// Available focal lengths in millimetres; the first entry is used.
    pub focal_lengths_mm: Option<Vec<Real>>,
    /// Physical sensor size `[width, height]` in millimetres.
    pub physical_size_mm: Option<[Real; 2]>,
    /// Pixel array size `[width, height]`.
    pub pixel_array_size: Option<[u32; 2]>,
}

impl SensorCalibration {
    /// First reported focal length, if any and positive.
    pub fn focal_length_mm(&self) -> Option<Real> {
        self.focal_lengths_mm
            .as_ref()
            .and_then(|f| f.first().copied())
            .filter(|f| *f > 0.0)
    }
}

/// Where recovered intrinsics came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntrinsicsSource {
    /// Factory calibration reported by the sensor.
    Factory,
    /// Estimated from sensor geometry (possibly defaulted).
    Estimated,
}

/// Recover intrinsics, discarding the provenance.
pub fn recover_intrinsics(calib: &SensorCalibration) -> LensIntrinsics {
    recover_intrinsics_with_source(calib).0
}

/// Recover intrinsics and report whether they are factory data or an estimate.
///
/// - With at least four factory values, `[fx, fy, cx, cy]` are taken as-is.
///   Five or more further values become distortion coefficients, truncated to
///   `[k1, k2, k3, p1, p2]`; fewer leave the lens ideal.
/// - Otherwise `fx = fy = focal_mm / sensor_width_mm * width_px` with the
///   principal point at the image centre and zero distortion.
pub fn recover_intrinsics_with_source(
    calib: &SensorCalibration,
) -> (LensIntrinsics, IntrinsicsSource) {
    if let Some(factory) = calib
        .intrinsic_calibration
        .as_deref()
        .filter(|c| c.len() >= 4)
    {
        let extra = &factory[4..];
        let distortion = (extra.len() >= 5).then(|| BrownConrady5::from_coefficients(extra));
        let intrinsics = LensIntrinsics {
            fx: factory[0],
            fy: factory[1],
            cx: factory[2],
            cy: factory[3],
            distortion,
        };
        return (intrinsics, IntrinsicsSource::Factory);
    }

    (estimate_from_geometry(calib), IntrinsicsSource::Estimated)
}

fn estimate_from_geometry(calib: &SensorCalibration) -> LensIntrinsics {
    let focal_mm = calib.focal_length_mm().unwrap_or(DEFAULT_FOCAL_LENGTH_MM);
    let sensor_width_mm = calib
        .physical_size_mm
        .map(|s| s[0])
        .filter(|w| *w > 0.0)
        .unwrap_or(DEFAULT_SENSOR_WIDTH_MM);
    let [width, height] = calib
        .pixel_array_size
        .filter(|[w, h]| *w > 0 && *h > 0)
        .unwrap_or([DEFAULT_IMAGE_WIDTH_PX, DEFAULT_IMAGE_HEIGHT_PX]);

    let width = Real::from(width);
    let height = Real::from(height);
    let f_px = focal_mm / sensor_width_mm * width;

    debug!(
        "no factory calibration; estimated f={f_px:.1}px from {focal_mm}mm lens on {sensor_width_mm}mm sensor, {width}x{height}px"
    );

    LensIntrinsics {
        fx: f_px,
        fy: f_px,
        cx: width / 2.0,
        cy: height / 2.0,
        distortion: Some(BrownConrady5::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_missing_uses_defaults() {
        let (k, source) = recover_intrinsics_with_source(&SensorCalibration::default());
        assert_eq!(source, IntrinsicsSource::Estimated);
        assert_eq!(k.fx, k.fy);
        assert!((k.fx - 2937.5).abs() < 1e-9, "fx={}", k.fx);
        assert_eq!((k.cx, k.cy), (2000.0, 1500.0));
        assert_eq!(k.distortion.unwrap().coefficients(), [0.0; 5]);
    }

    #[test]
    fn factory_calibration_with_distortion() {
        let calib = SensorCalibration {
            intrinsic_calibration: Some(vec![
                3000.0, 3001.0, 2010.0, 1490.0, -0.1, 0.02, 0.0, 0.001, 0.002, 0.5,
            ]),
            ..Default::default()
        };
        let (k, source) = recover_intrinsics_with_source(&calib);
        assert_eq!(source, IntrinsicsSource::Factory);
        assert_eq!((k.fx, k.fy, k.cx, k.cy), (3000.0, 3001.0, 2010.0, 1490.0));
        assert_eq!(
            k.distortion.unwrap().coefficients(),
            [-0.1, 0.02, 0.0, 0.001, 0.002]
        );
    }

    #[test]
    fn factory_calibration_without_enough_coefficients() {
        let calib = SensorCalibration {
            intrinsic_calibration: Some(vec![3000.0, 3000.0, 2000.0, 1500.0, -0.1]),
            ..Default::default()
        };
        let k = recover_intrinsics(&calib);
        assert!(k.distortion.is_none());
    }

    #[test]
    fn short_factory_array_falls_back_to_geometry() {
        let calib = SensorCalibration {
            intrinsic_calibration: Some(vec![3000.0, 3000.0]),
            focal_lengths_mm: Some(vec![6.0]),
            physical_size_mm: Some([8.0, 6.0]),
            pixel_array_size: Some([4032, 3024]),
        };
        let (k, source) = recover_intrinsics_with_source(&calib);
        assert_eq!(source, IntrinsicsSource::Estimated);
        assert!((k.fx - 6.0 / 8.0 * 4032.0).abs() < 1e-9);
        assert_eq!((k.cx, k.cy), (2016.0, 1512.0));
    }

    #[test]
    fn zero_sensor_width_uses_default() {
        let calib = SensorCalibration {
            physical_size_mm: Some([0.0, 0.0]),
            ..Default::default()
        };
        let k = recover_intrinsics(&calib);
        assert!(k.fx.is_finite());
        assert!((k.fx - 2937.5).abs() < 1e-9);
    }

    #[test]
    fn zero_pixel_array_uses_default() {
        let calib = SensorCalibration {
            pixel_array_size: Some([0, 3000]),
            ..Default::default()
        };
        let k = recover_intrinsics(&calib);
        assert!((k.fx - 2937.5).abs() < 1e-9, "fx={}", k.fx);
        assert_eq!((k.cx, k.cy), (2000.0, 1500.0));
    }

    #[test]
    fn non_positive_focal_length_uses_default() {
        for focal in [0.0, -4.7] {
            let calib = SensorCalibration {
                focal_lengths_mm: Some(vec![focal]),
                ..Default::default()
            };
            assert_eq!(calib.focal_length_mm(), None);
            let k = recover_intrinsics(&calib);
            assert!((k.fx - 2937.5).abs() < 1e-9, "focal={focal} fx={}", k.fx);
        }
    }

    #[test]
    fn deserializes_partial_json() {
        let calib: SensorCalibration =
            serde_json::from_str(r#"{ "focal_lengths_mm": [2.2, 2.5] }"#).unwrap();
        assert_eq!(calib.focal_length_mm(), Some(2.2));
        assert!(calib.pixel_array_size.is_none());
    }
}
