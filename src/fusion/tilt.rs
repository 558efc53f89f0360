//! Tilt from gravity
//!
//! With the body at rest the accelerometer measures gravity only, so its
//! direction gives roll and pitch. Yaw is unobservable from gravity.

use core::f32::consts::PI;

use libm::{asinf, atan2f, sqrtf};

use crate::sensor::{X, Y, Z};

/// Readings weaker than this (in g) carry no usable direction
pub const MIN_ACCEL_MAGNITUDE: f32 = 0.1;

const RAD_TO_DEG: f32 = 180.0 / PI;

/// Roll and pitch in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tilt {
    /// Rotation around X, positive right side down
    pub roll: f32,
    /// Rotation around Y, positive nose up
    pub pitch: f32,
}

/// Axis-decoupled tilt in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisRotation {
    pub around_x: f32,
    pub around_y: f32,
}

fn magnitude(accel: &[f32; 3]) -> f32 {
    sqrtf(accel[X] * accel[X] + accel[Y] * accel[Y] + accel[Z] * accel[Z])
}

fn usable(accel: &[f32; 3]) -> bool {
    let m = magnitude(accel);
    m.is_finite() && m >= MIN_ACCEL_MAGNITUDE
}

/// Roll and pitch from an accelerometer vector in g
///
/// `roll = atan2(y, z)`, `pitch = -asin(x)` on the normalized vector, so the
/// vector's length does not change the angles. Pitch is negated to match the
/// board's mounting. Returns `None` for vectors shorter than
/// [`MIN_ACCEL_MAGNITUDE`] g (free fall, zeroed reading).
pub fn roll_pitch(accel: &[f32; 3]) -> Option<Tilt> {
    if !usable(accel) {
        return None;
    }
    let m = magnitude(accel);
    let x = (accel[X] / m).clamp(-1.0, 1.0);
    let y = accel[Y] / m;
    let z = accel[Z] / m;

    Some(Tilt {
        roll: atan2f(y, z) * RAD_TO_DEG,
        pitch: -(asinf(x) * RAD_TO_DEG),
    })
}

/// Rotation around X and Y, each measured against the plane of the other two axes
///
/// Unlike [`roll_pitch`] neither angle depends on the sign of Z, which
/// suits applications that never turn upside down. Takes the vector in g
/// with the same [`MIN_ACCEL_MAGNITUDE`] cutoff.
pub fn axis_rotation(accel: &[f32; 3]) -> Option<AxisRotation> {
    if !usable(accel) {
        return None;
    }
    let (x, y, z) = (accel[X], accel[Y], accel[Z]);

    Some(AxisRotation {
        around_x: atan2f(y, sqrtf(x * x + z * z)) * RAD_TO_DEG,
        around_y: -(atan2f(x, sqrtf(y * y + z * z)) * RAD_TO_DEG),
    })
}
