//! Batch measurement: recover the rig from sensor descriptors and measure
//! matched points and pixel masks.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use stereo_core::{IntrinsicsSource, LensIntrinsics, Real, Vec2};
use stereo_linear::ground_sample_distance;

use crate::config::PipelineConfig;
use crate::rig::{PointMeasurement, SensorDescriptor, StereoRig};

/// Matched point: raw main-sensor pixel plus its disparity against the
/// ultrawide sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointInput {
    pub pixel: [Real; 2],
    pub disparity_px: Real,
}

/// Pixel mask at a representative depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaskInput {
    pub pixel_count: u64,
    pub depth_mm: Real,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementInput {
    pub sensors: Vec<SensorDescriptor>,
    #[serde(default)]
    pub points: Vec<PointInput>,
    #[serde(default)]
    pub masks: Vec<MaskInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaskMeasurement {
    pub pixel_count: u64,
    pub depth_mm: Real,
    pub gsd_mm: Real,
    pub area_mm2: Real,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementReport {
    pub main_intrinsics: LensIntrinsics,
    pub main_source: IntrinsicsSource,
    pub ultra_intrinsics: LensIntrinsics,
    pub ultra_source: IntrinsicsSource,
    pub baseline_mm: Real,
    pub points: Vec<PointMeasurement>,
    pub masks: Vec<MaskMeasurement>,
}

pub fn run_measurement(
    input: &MeasurementInput,
    config: &PipelineConfig,
) -> Result<MeasurementReport> {
    config.validate().context("invalid pipeline config")?;
    let (rig, [main_source, ultra_source]) = StereoRig::from_sensors(&input.sensors, config)
        .context("failed to set up the stereo rig")?;

    let points: Vec<_> = input
        .points
        .iter()
        .map(|p| rig.measure_point(Vec2::new(p.pixel[0], p.pixel[1]), p.disparity_px))
        .collect();
    let degenerate = points.iter().filter(|p| p.degenerate).count();
    if degenerate > 0 {
        debug!("{degenerate} of {} points had degenerate disparity", points.len());
    }

    let masks = input
        .masks
        .iter()
        .map(|m| MaskMeasurement {
            pixel_count: m.pixel_count,
            depth_mm: m.depth_mm,
            gsd_mm: ground_sample_distance(m.depth_mm, rig.focal_px()),
            area_mm2: rig.surface_area_mm2(m.pixel_count, m.depth_mm),
        })
        .collect();

    Ok(MeasurementReport {
        main_intrinsics: rig.main,
        main_source,
        ultra_intrinsics: rig.ultra,
        ultra_source,
        baseline_mm: rig.baseline_mm,
        points,
        masks,
    })
}
