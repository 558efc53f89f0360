//! Attitude estimation and control core
//!
//! Turns raw MPU-6050 samples into a stabilized roll/pitch/yaw estimate and
//! turns orientation errors into bounded PID corrections.
//!
//! # Pipeline
//!
//! ```text
//! InertialSource ──raw──▶ sensor::convert ──g, °/s──▶ fusion::tilt ─┐
//!                               │                                     ▼
//!                               └──────────────gyro─────▶ fusion::ComplementaryFilter
//!                                                                     │
//!                                                    OrientationState │
//!                                                                     ▼
//!                                                            control::Pid ──▶ actuation
//! ```
//!
//! # Modules
//!
//! - [`sensor`]: raw samples, calibration, reading conversion, bias estimation
//!   and the MPU-6050 driver
//! - [`fusion`]: tilt from gravity, angle wraparound, complementary filter
//! - [`control`]: PID controller and the roll/pitch level hold
//! - [`system`]: configuration, errors, shared state and events
//!
//! The library is `no_std`. Enable the `defmt` feature to get log output on
//! target; the `rp2350` feature builds the firmware binary.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod log;

pub mod control;
pub mod fusion;
pub mod sensor;
pub mod system;

pub use control::{AttitudeHold, Pid};
pub use fusion::complementary::{ComplementaryFilter, OrientationState};
pub use sensor::calibration::CalibrationVector;
pub use sensor::{Imu, InertialSource, RawSample};
pub use system::error::{Error, InvalidInput};
