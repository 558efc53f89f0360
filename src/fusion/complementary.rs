//! Complementary filter
//!
//! Fuses integrated gyroscope rate (smooth, drifts) with an absolute
//! reference angle (noisy, drift free). `ratio` is the weight of the
//! reference; `1 - ratio` goes to the integrated gyro. Scale it with the
//! loop rate.
//!
//! # Axes
//!
//! Roll and pitch blend toward the accelerometer tilt:
//!
//! ```text
//! new = (1 - ratio) * (old + rate * dt) + ratio * reference
//! ```
//!
//! Yaw is dead reckoned and then pulled toward the heading reference by a
//! fraction of the shortest angular error:
//!
//! ```text
//! integrated = old + rate * dt
//! new        = integrated + ratio * angle_difference(integrated, reference)
//! ```
//!
//! The yaw form avoids the seam at ±180° that a plain blend would cut
//! across. Blending yaw the roll/pitch way is still available through
//! [`ComplementaryFilter::update`].
//!
//! # Timing
//!
//! Every update takes a caller-supplied millisecond timestamp. The first
//! update after construction or [`ComplementaryFilter::reset`] only latches
//! the timestamp, so a cold start never integrates a huge elapsed time.

use super::angle::{angle_difference, wrap_degrees};
use super::tilt::Tilt;
use crate::sensor::{X, Y, Z};
use crate::system::error::InvalidInput;

/// Orientation in degrees, each axis in (-180, 180]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OrientationState {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl OrientationState {
    pub const ZERO: Self = Self {
        roll: 0.0,
        pitch: 0.0,
        yaw: 0.0,
    };

    /// Same orientation with every axis wrapped into (-180, 180]
    pub fn wrapped(self) -> Self {
        Self {
            roll: wrap_degrees(self.roll),
            pitch: wrap_degrees(self.pitch),
            yaw: wrap_degrees(self.yaw),
        }
    }
}

/// Last update time; zero means no update has been seen yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct FilterClock {
    previous_time_ms: i64,
}

impl FilterClock {
    const UNSET: i64 = 0;

    /// Seconds since the previous tick, `None` when this tick only latches the clock
    ///
    /// Timestamps that go backwards count as zero elapsed time.
    fn tick(&mut self, now_ms: i64, advance: bool) -> Option<f32> {
        if self.previous_time_ms == Self::UNSET {
            self.previous_time_ms = now_ms;
            return None;
        }

        let elapsed_ms = now_ms.saturating_sub(self.previous_time_ms).max(0);
        if advance {
            self.previous_time_ms = now_ms;
        }
        Some(elapsed_ms as f32 / 1000.0)
    }
}

/// Three-axis complementary filter
#[derive(Debug, Clone)]
pub struct ComplementaryFilter {
    orientation: OrientationState,
    clock: FilterClock,
    ratio: f32,
}

impl ComplementaryFilter {
    /// Create a filter at zero orientation
    ///
    /// `ratio` must lie in `[0, 1]`.
    pub fn new(ratio: f32) -> Result<Self, InvalidInput> {
        Self::check_ratio(ratio)?;
        Ok(Self {
            orientation: OrientationState::ZERO,
            clock: FilterClock::default(),
            ratio,
        })
    }

    fn check_ratio(ratio: f32) -> Result<(), InvalidInput> {
        if (0.0..=1.0).contains(&ratio) {
            Ok(())
        } else {
            Err(InvalidInput::RatioOutOfRange)
        }
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn set_ratio(&mut self, ratio: f32) -> Result<(), InvalidInput> {
        Self::check_ratio(ratio)?;
        self.ratio = ratio;
        Ok(())
    }

    pub fn orientation(&self) -> OrientationState {
        self.orientation
    }

    /// Start from a known orientation instead of zero, e.g. the first tilt reading
    pub fn seed(&mut self, orientation: OrientationState) {
        self.orientation = orientation.wrapped();
    }

    /// Back to zero orientation; the next update only latches its timestamp
    pub fn reset(&mut self) {
        self.orientation = OrientationState::ZERO;
        self.clock = FilterClock::default();
        log_info!("Complementary filter reset");
    }

    /// Whether a timestamp has been latched
    pub fn is_initialized(&self) -> bool {
        self.clock.previous_time_ms != FilterClock::UNSET
    }

    /// Blend all three axes toward `reference`
    ///
    /// `gyro` is the rate in °/s around X, Y, Z.
    pub fn update(&mut self, gyro: &[f32; 3], reference: &OrientationState, now_ms: i64) -> OrientationState {
        if let Some(dt) = self.clock.tick(now_ms, true) {
            let o = &mut self.orientation;
            o.roll = blend(o.roll, gyro[X], dt, reference.roll, self.ratio);
            o.pitch = blend(o.pitch, gyro[Y], dt, reference.pitch, self.ratio);
            o.yaw = blend(o.yaw, gyro[Z], dt, reference.yaw, self.ratio);
        }
        self.orientation
    }

    /// Blend roll and pitch toward the accelerometer tilt
    ///
    /// With `set_timestamp` false the clock is left where it was, so a
    /// following [`update_yaw`](Self::update_yaw) for the same sample sees
    /// the same elapsed time.
    pub fn update_roll_pitch(
        &mut self,
        gyro: &[f32; 3],
        tilt: &Tilt,
        now_ms: i64,
        set_timestamp: bool,
    ) -> OrientationState {
        if let Some(dt) = self.clock.tick(now_ms, set_timestamp) {
            let o = &mut self.orientation;
            o.roll = blend(o.roll, gyro[X], dt, tilt.roll, self.ratio);
            o.pitch = blend(o.pitch, gyro[Y], dt, tilt.pitch, self.ratio);
        }
        self.orientation
    }

    /// Dead reckon yaw and nudge it toward an external heading
    ///
    /// `gyro_z` is the rate in °/s around Z, `heading` the reference yaw.
    pub fn update_yaw(&mut self, gyro_z: f32, heading: f32, now_ms: i64) -> OrientationState {
        if let Some(dt) = self.clock.tick(now_ms, true) {
            self.orientation.yaw = nudge(self.orientation.yaw, gyro_z, dt, heading, self.ratio);
        }
        self.orientation
    }

    /// Dead reckon yaw with no heading reference
    pub fn integrate_yaw(&mut self, gyro_z: f32, now_ms: i64) -> OrientationState {
        if let Some(dt) = self.clock.tick(now_ms, true) {
            self.orientation.yaw = wrap_degrees(self.orientation.yaw + gyro_z * dt);
        }
        self.orientation
    }

    /// Roll/pitch from tilt plus yaw, sharing one clock tick
    ///
    /// Yaw is nudged toward `heading` when one is available and dead
    /// reckoned otherwise.
    pub fn update_with_heading(
        &mut self,
        gyro: &[f32; 3],
        tilt: &Tilt,
        heading: Option<f32>,
        now_ms: i64,
    ) -> OrientationState {
        if let Some(dt) = self.clock.tick(now_ms, true) {
            let o = &mut self.orientation;
            o.roll = blend(o.roll, gyro[X], dt, tilt.roll, self.ratio);
            o.pitch = blend(o.pitch, gyro[Y], dt, tilt.pitch, self.ratio);
            o.yaw = match heading {
                Some(heading) => nudge(o.yaw, gyro[Z], dt, heading, self.ratio),
                None => wrap_degrees(o.yaw + gyro[Z] * dt),
            };
        }
        self.orientation
    }
}

fn blend(old: f32, rate: f32, dt: f32, reference: f32, ratio: f32) -> f32 {
    wrap_degrees((1.0 - ratio) * (old + rate * dt) + ratio * reference)
}

fn nudge(old: f32, rate: f32, dt: f32, reference: f32, ratio: f32) -> f32 {
    let integrated = old + rate * dt;
    wrap_degrees(integrated + ratio * angle_difference(integrated, reference))
}
