//! Runtime configuration
//!
//! Defaults are tuned for the MPU-6050 at its power-on full-scale ranges
//! (±2 g, ±250 °/s) sampled at 100 Hz.

use crate::sensor::calibration::CalibrationVector;
use crate::sensor::mpu6050::DEFAULT_ADDRESS;

/// Default sample rate of the attitude loop
pub const DEFAULT_REFRESH_RATE_HZ: f32 = 100.0;

/// Default weight of the accelerometer/reference term in the complementary filter
///
/// Scale this with the refresh rate: at 100 Hz a 2% pull toward the
/// reference gives a time constant of roughly half a second.
pub const DEFAULT_COMPLEMENTARY_RATIO: f32 = 0.02;

/// Default number of samples averaged by the bias estimator
pub const DEFAULT_BIAS_SAMPLES: u32 = 500;

/// Sensor and filter configuration for one IMU
#[derive(Debug, Clone, Copy)]
pub struct AttitudeConfig {
    /// 7-bit I2C address of the sensor
    pub address: u8,
    /// Apply `calibration` when the device is constructed
    pub apply_calibration: bool,
    /// Bias corrections used when `apply_calibration` is set
    pub calibration: CalibrationVector,
    /// Rate the caller runs the attitude loop at
    pub refresh_rate_hz: f32,
    /// Complementary filter ratio in `[0, 1]`
    pub complementary_ratio: f32,
    /// Samples averaged when estimating bias at startup (0 disables it)
    pub bias_samples: u32,
}

impl Default for AttitudeConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            apply_calibration: false,
            calibration: CalibrationVector::ZERO,
            refresh_rate_hz: DEFAULT_REFRESH_RATE_HZ,
            complementary_ratio: DEFAULT_COMPLEMENTARY_RATIO,
            bias_samples: DEFAULT_BIAS_SAMPLES,
        }
    }
}

impl AttitudeConfig {
    /// Loop period in milliseconds, never below 1 ms
    pub fn sample_interval_ms(&self) -> u64 {
        let period = 1000.0 / self.refresh_rate_hz;
        if period.is_finite() && period >= 1.0 {
            period as u64
        } else {
            1
        }
    }
}

/// Gains, setpoint and integral clamp for one PID axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Initial setpoint
    pub desired_value: f64,
    /// Upper bound of the accumulated integral
    pub max_value: f64,
    /// Lower bound of the accumulated integral
    pub min_value: f64,
}

/// Level-hold tuning for the roll axis
pub const ROLL_HOLD: PidConfig = PidConfig {
    kp: 1.2,
    ki: 0.02,
    kd: 0.15,
    desired_value: 0.0,
    max_value: 400.0,
    min_value: -400.0,
};

/// Level-hold tuning for the pitch axis
pub const PITCH_HOLD: PidConfig = PidConfig {
    kp: 1.2,
    ki: 0.02,
    kd: 0.15,
    desired_value: 0.0,
    max_value: 400.0,
    min_value: -400.0,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_interval_follows_refresh_rate() {
        let config = AttitudeConfig::default();
        assert_eq!(config.sample_interval_ms(), 10);

        let config = AttitudeConfig {
            refresh_rate_hz: 250.0,
            ..Default::default()
        };
        assert_eq!(config.sample_interval_ms(), 4);
    }

    #[test]
    fn sample_interval_saturates_on_bad_rates() {
        for rate in [0.0, -5.0, f32::NAN, 5000.0] {
            let config = AttitudeConfig {
                refresh_rate_hz: rate,
                ..Default::default()
            };
            assert_eq!(config.sample_interval_ms(), 1);
        }
    }
}
