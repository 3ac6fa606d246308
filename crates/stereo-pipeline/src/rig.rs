//! Two-sensor stereo rig: role assignment and per-point measurement.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};
use stereo_core::{
    recover_intrinsics_with_source, IntrinsicsSource, LensIntrinsics, Pt3, Real,
    SensorCalibration, UndistortOptions, Vec2, DEFAULT_FOCAL_LENGTH_MM,
};
use stereo_linear::{
    depth_from_disparity, is_degenerate_depth, pixel_area_at_depth, surface_area,
    surface_area_from_depths, triangulate_pixel, MaskArea,
};
use thiserror::Error;

use crate::config::PipelineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorRole {
    Main,
    UltraWide,
}

impl fmt::Display for SensorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorRole::Main => write!(f, "main"),
            SensorRole::UltraWide => write!(f, "ultrawide"),
        }
    }
}

/// One physical sensor behind the logical camera, as discovered by the
/// hardware layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDescriptor {
    pub id: String,
    #[serde(flatten)]
    pub calibration: SensorCalibration,
}

impl SensorDescriptor {
    fn focal_length_mm(&self) -> Real {
        self.calibration
            .focal_length_mm()
            .unwrap_or(DEFAULT_FOCAL_LENGTH_MM)
    }
}

#[derive(Debug, Error)]
pub enum RigError {
    #[error("no {role} sensor among {available} discovered sensors")]
    MissingSensor { role: SensorRole, available: usize },
}

/// Pick the main and ultrawide sensors by focal length.
///
/// The longest lens at or above `threshold_mm` is the main camera, the
/// shortest lens below it the ultrawide. Sensors without a reported focal
/// length are assumed to carry the default lens.
pub fn classify_sensors(
    sensors: &[SensorDescriptor],
    threshold_mm: Real,
) -> Result<(&SensorDescriptor, &SensorDescriptor), RigError> {
    let missing = |role| RigError::MissingSensor {
        role,
        available: sensors.len(),
    };

    let main = sensors
        .iter()
        .filter(|s| s.focal_length_mm() >= threshold_mm)
        .max_by(|a, b| a.focal_length_mm().total_cmp(&b.focal_length_mm()))
        .ok_or_else(|| missing(SensorRole::Main))?;
    let ultra = sensors
        .iter()
        .filter(|s| s.focal_length_mm() < threshold_mm)
        .min_by(|a, b| a.focal_length_mm().total_cmp(&b.focal_length_mm()))
        .ok_or_else(|| missing(SensorRole::UltraWide))?;

    debug!(
        "main sensor {} ({} mm), ultrawide sensor {} ({} mm)",
        main.id,
        main.focal_length_mm(),
        ultra.id,
        ultra.focal_length_mm()
    );
    Ok((main, ultra))
}

/// Result of measuring one matched point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointMeasurement {
    /// Pixel as recorded by the main sensor.
    pub raw_px: Vec2,
    /// Pixel after distortion correction.
    pub corrected_px: Vec2,
    pub disparity_px: Real,
    /// Depth in millimetres, `0.0` for a degenerate disparity.
    pub depth_mm: Real,
    pub degenerate: bool,
    /// Point in the main camera frame (mm); absent for a degenerate disparity.
    pub point_mm: Option<Pt3>,
}

/// Main and ultrawide lenses plus the fixed physical baseline between them.
///
/// Triangulation and area use the main sensor's focal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StereoRig {
    pub main: LensIntrinsics,
    pub ultra: LensIntrinsics,
    pub baseline_mm: Real,
    #[serde(default)]
    pub undistort: UndistortOptions,
}

impl StereoRig {
    pub fn new(main: LensIntrinsics, ultra: LensIntrinsics, baseline_mm: Real) -> Self {
        Self {
            main,
            ultra,
            baseline_mm,
            undistort: UndistortOptions::default(),
        }
    }

    /// Classify discovered sensors and recover both lenses.
    ///
    /// Also returns where each lens model came from (main, ultrawide).
    pub fn from_sensors(
        sensors: &[SensorDescriptor],
        config: &PipelineConfig,
    ) -> Result<(Self, [IntrinsicsSource; 2]), RigError> {
        let (main, ultra) = classify_sensors(sensors, config.main_focal_threshold_mm)?;
        let (main_k, main_src) = recover_intrinsics_with_source(&main.calibration);
        let (ultra_k, ultra_src) = recover_intrinsics_with_source(&ultra.calibration);

        let rig = Self {
            main: main_k,
            ultra: ultra_k,
            baseline_mm: config.baseline_mm,
            undistort: config.undistort,
        };
        Ok((rig, [main_src, ultra_src]))
    }

    /// Focal length (px) used for triangulation and area.
    pub fn focal_px(&self) -> Real {
        self.main.fx
    }

    pub fn depth_mm(&self, disparity_px: Real) -> Real {
        depth_from_disparity(self.focal_px(), self.baseline_mm, disparity_px)
    }

    pub fn pixel_area_mm2(&self, depth_mm: Real) -> Real {
        pixel_area_at_depth(depth_mm, self.focal_px())
    }

    pub fn surface_area_mm2(&self, mask_pixel_count: u64, depth_mm: Real) -> Real {
        surface_area(mask_pixel_count, depth_mm, self.focal_px())
    }

    pub fn surface_area_from_depths<I>(&self, depths_mm: I) -> MaskArea
    where
        I: IntoIterator<Item = Real>,
    {
        surface_area_from_depths(depths_mm, self.focal_px())
    }

    /// Correct a raw main-sensor pixel and triangulate it.
    pub fn measure_point(&self, raw_px: Vec2, disparity_px: Real) -> PointMeasurement {
        let corrected_px = self.main.undistort_pixel_with(&raw_px, &self.undistort);
        let depth_mm = self.depth_mm(disparity_px);
        let degenerate = is_degenerate_depth(depth_mm);
        let point_mm = if degenerate {
            None
        } else {
            triangulate_pixel(&self.main, &corrected_px, depth_mm)
        };
        PointMeasurement {
            raw_px,
            corrected_px,
            disparity_px,
            depth_mm,
            degenerate,
            point_mm,
        }
    }
}
