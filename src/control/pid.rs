//! PID controller
//!
//! One instance per controlled variable. The integral is the plain sum of
//! errors, clamped into `[min_value, max_value]` before the gain is applied,
//! so the clamp bounds the accumulated error and not the integral
//! contribution. The output itself is not clamped.
//!
//! Time is in milliseconds from a wrapping 32-bit tick counter. The
//! derivative is taken per second:
//!
//! ```text
//! derivative = (error - last_error) / ((time - previous_time) / 1000)
//! ```
//!
//! and is zero when no time has elapsed since the previous call.
//!
//! A non-finite error (NaN measurement or setpoint) yields a zero correction
//! and leaves the integral, error history and time untouched, so one bad
//! sample cannot poison the controller.

use crate::system::config::PidConfig;
use crate::system::error::InvalidInput;

/// Closed-loop controller for one variable
#[derive(Debug, Clone, PartialEq)]
pub struct Pid {
    kp: f64,
    ki: f64,
    kd: f64,
    integral_sum: f64,
    last_error: f64,
    desired_value: f64,
    previous_time_ms: u32,
    max_value: f64,
    min_value: f64,
}

impl Pid {
    /// Create a controller with empty integral and error history
    ///
    /// `time_ms` is the current tick; the first [`compute`](Self::compute)
    /// measures elapsed time from it. Fails if `min_value > max_value` or
    /// either bound is NaN.
    pub fn new(
        kp: f64,
        ki: f64,
        kd: f64,
        desired_value: f64,
        time_ms: u32,
        max_value: f64,
        min_value: f64,
    ) -> Result<Self, InvalidInput> {
        if min_value.is_nan() || max_value.is_nan() || min_value > max_value {
            return Err(InvalidInput::InvertedLimits);
        }
        Ok(Self {
            kp,
            ki,
            kd,
            integral_sum: 0.0,
            last_error: 0.0,
            desired_value,
            previous_time_ms: time_ms,
            max_value,
            min_value,
        })
    }

    pub fn from_config(config: &PidConfig, time_ms: u32) -> Result<Self, InvalidInput> {
        Self::new(
            config.kp,
            config.ki,
            config.kd,
            config.desired_value,
            time_ms,
            config.max_value,
            config.min_value,
        )
    }

    /// Correction for `measured_value` at `time_ms`
    pub fn compute(&mut self, measured_value: f64, time_ms: u32) -> f64 {
        let error = self.desired_value - measured_value;
        if !error.is_finite() {
            log_warn!("PID input not finite, sample skipped");
            return 0.0;
        }

        self.integral_sum = (self.integral_sum + error).clamp(self.min_value, self.max_value);

        let elapsed_ms = time_ms.wrapping_sub(self.previous_time_ms);
        let derivative = if elapsed_ms == 0 {
            0.0
        } else {
            (error - self.last_error) / (f64::from(elapsed_ms) / 1000.0)
        };
        self.last_error = error;
        self.previous_time_ms = time_ms;

        self.kp * error + self.ki * self.integral_sum + self.kd * derivative
    }

    /// Change the setpoint, used from the next [`compute`](Self::compute)
    pub fn set_desired_value(&mut self, value: f64) {
        self.desired_value = value;
    }

    pub fn desired_value(&self) -> f64 {
        self.desired_value
    }

    pub fn integral_sum(&self) -> f64 {
        self.integral_sum
    }

    pub fn last_error(&self) -> f64 {
        self.last_error
    }

    /// Drop the integral and error history, measuring time from `time_ms` again
    pub fn reset(&mut self, time_ms: u32) {
        self.integral_sum = 0.0;
        self.last_error = 0.0;
        self.previous_time_ms = time_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn proportional(desired: f64) -> Pid {
        Pid::new(1.0, 0.0, 0.0, desired, 0, 100.0, -100.0).unwrap()
    }

    #[test]
    fn proportional_only() {
        let mut pid = proportional(10.0);
        assert_eq!(pid.compute(7.0, 10), 3.0);
        assert_eq!(pid.compute(12.0, 20), -2.0);
    }

    #[test]
    fn inverted_limits_rejected() {
        assert_eq!(
            Pid::new(1.0, 1.0, 1.0, 0.0, 0, -1.0, 1.0).unwrap_err(),
            InvalidInput::InvertedLimits
        );
        assert!(Pid::new(1.0, 1.0, 1.0, 0.0, 0, f64::NAN, 0.0).is_err());
        assert!(Pid::new(1.0, 1.0, 1.0, 0.0, 0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn integral_sums_errors_then_clamps() {
        let mut pid = Pid::new(0.0, 2.0, 0.0, 10.0, 0, 25.0, -25.0).unwrap();
        assert_eq!(pid.compute(0.0, 10), 20.0);
        assert_eq!(pid.integral_sum(), 10.0);
        assert_eq!(pid.compute(0.0, 20), 40.0);
        // 30 clamps to 25, gain applied after the clamp
        assert_eq!(pid.compute(0.0, 30), 50.0);
        assert_eq!(pid.integral_sum(), 25.0);
        // Unwinds immediately once the error changes sign
        pid.compute(20.0, 40);
        assert_eq!(pid.integral_sum(), 15.0);
    }

    #[test]
    fn integral_stays_within_limits_for_any_error_sequence() {
        let mut pid = Pid::new(0.5, 0.1, 0.01, 0.0, 0, 3.0, -7.5).unwrap();
        let mut seed: u32 = 0x1234_5678;
        for step in 1..2_000u32 {
            // xorshift, errors in roughly [-500, 500]
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let measured = f64::from(seed % 1000) - 500.0;
            pid.compute(measured, step * 5);
            assert!(pid.integral_sum() <= 3.0 && pid.integral_sum() >= -7.5);
        }
    }

    #[test]
    fn derivative_is_per_second() {
        let mut pid = Pid::new(0.0, 0.0, 1.0, 0.0, 1_000, 10.0, -10.0).unwrap();
        // error 0 -> -2 over 500 ms
        assert_relative_eq!(pid.compute(2.0, 1_500), -4.0);
        // error -2 -> -1 over 250 ms
        assert_relative_eq!(pid.compute(1.0, 1_750), 4.0);
    }

    #[test]
    fn repeated_timestamp_has_zero_derivative() {
        let mut pid = Pid::new(1.0, 0.0, 5.0, 0.0, 100, 10.0, -10.0).unwrap();
        let output = pid.compute(3.0, 100);
        assert!(output.is_finite());
        assert_eq!(output, -3.0);
        assert_eq!(pid.last_error(), -3.0);
    }

    #[test]
    fn tick_wraparound_keeps_elapsed_time() {
        let mut pid = Pid::new(0.0, 0.0, 1.0, 0.0, u32::MAX - 99, 10.0, -10.0).unwrap();
        // 200 ms elapsed across the wrap
        assert_relative_eq!(pid.compute(1.0, 100), -5.0);
    }

    #[test]
    fn setpoint_change_applies_on_next_compute() {
        let mut pid = proportional(0.0);
        pid.set_desired_value(45.0);
        assert_eq!(pid.desired_value(), 45.0);
        assert_eq!(pid.compute(40.0, 10), 5.0);
    }

    #[test]
    fn output_is_not_clamped() {
        let mut pid = Pid::new(10.0, 0.0, 0.0, 1_000.0, 0, 1.0, -1.0).unwrap();
        assert_eq!(pid.compute(0.0, 10), 10_000.0);
    }

    #[test]
    fn reset_clears_history() {
        let mut pid = Pid::new(0.0, 1.0, 1.0, 5.0, 0, 50.0, -50.0).unwrap();
        pid.compute(0.0, 100);
        pid.reset(200);
        assert_eq!(pid.integral_sum(), 0.0);
        assert_eq!(pid.last_error(), 0.0);
        // error 5 from a clean history over 100 ms: I = 5, D = 50
        assert_relative_eq!(pid.compute(0.0, 300), 55.0);
    }

    #[test]
    fn built_from_config() {
        let pid = Pid::from_config(&crate::system::config::ROLL_HOLD, 0).unwrap();
        assert_eq!(pid.desired_value(), 0.0);
    }

    #[test]
    fn non_finite_measurement_is_skipped() {
        let mut pid = Pid::new(1.0, 1.0, 1.0, 0.0, 0, 5.0, -5.0).unwrap();
        pid.compute(2.0, 1_000);
        let integral = pid.integral_sum();

        assert_eq!(pid.compute(f64::NAN, 1_010), 0.0);
        assert_eq!(pid.compute(f64::INFINITY, 1_020), 0.0);
        assert_eq!(pid.integral_sum(), integral);
        assert_eq!(pid.last_error(), -2.0);

        // Derivative spans the skipped samples: error -2 -> -3 over 1 s
        let output = pid.compute(3.0, 2_000);
        assert_relative_eq!(output, -3.0 + -5.0 + -1.0);
        assert!(pid.integral_sum() >= -5.0 && pid.integral_sum() <= 5.0);
    }
}
