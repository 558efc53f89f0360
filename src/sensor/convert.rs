//! Reading conversion
//!
//! Scales raw register values to physical units and removes bias. The
//! scale factors match the MPU-6050 power-on ranges: ±2 g and ±250 °/s.

use super::calibration::CalibrationVector;
use super::{RawSample, X, Y, Z};

/// Accelerometer sensitivity at ±2 g
pub const ACCEL_LSB_PER_G: f32 = 16384.0;

/// Gyroscope sensitivity at ±250 °/s
pub const GYRO_LSB_PER_DPS: f32 = 131.0;

/// One sample in physical units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// Acceleration in g
    pub accel: [f32; 3],
    /// Angular rate in °/s
    pub gyro: [f32; 3],
}

/// Convert raw accelerometer registers to g
///
/// Z subtracts `accel_bias[2] - 1` so that a Z bias measured as deviation
/// from 1 g keeps the gravity reference centered at 1 g.
pub fn accel_g(raw: [i16; 3], calibration: &CalibrationVector) -> [f32; 3] {
    let bias = calibration.accel_bias;
    [
        f32::from(raw[X]) / ACCEL_LSB_PER_G - bias[X],
        f32::from(raw[Y]) / ACCEL_LSB_PER_G - bias[Y],
        f32::from(raw[Z]) / ACCEL_LSB_PER_G - (bias[Z] - 1.0),
    ]
}

/// Convert raw gyroscope registers to °/s
pub fn gyro_dps(raw: [i16; 3], calibration: &CalibrationVector) -> [f32; 3] {
    let bias = calibration.gyro_bias;
    [
        f32::from(raw[X]) / GYRO_LSB_PER_DPS - bias[X],
        f32::from(raw[Y]) / GYRO_LSB_PER_DPS - bias[Y],
        f32::from(raw[Z]) / GYRO_LSB_PER_DPS - bias[Z],
    ]
}

/// Convert a full sample
pub fn convert(sample: &RawSample, calibration: &CalibrationVector) -> Reading {
    Reading {
        accel: accel_g(sample.accel, calibration),
        gyro: gyro_dps(sample.gyro, calibration),
    }
}
