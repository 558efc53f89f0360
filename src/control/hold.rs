//! Roll and pitch level hold
//!
//! Pairs one [`Pid`] per tilt axis with the availability of the attitude
//! estimate. Without an estimate the hold disengages and produces nothing;
//! when an estimate comes back both controllers start over from a clean
//! history, so a gap never shows up as a derivative or integral spike.
//! Yaw is not held.

use super::pid::Pid;
use crate::fusion::complementary::OrientationState;
use crate::system::config::PidConfig;
use crate::system::error::InvalidInput;
use crate::system::event::{Axis, AxisCorrection};

#[derive(Debug, Clone)]
pub struct AttitudeHold {
    roll: Pid,
    pitch: Pid,
    engaged: bool,
}

impl AttitudeHold {
    /// Disengaged hold with the given tuning
    pub fn new(roll: &PidConfig, pitch: &PidConfig, time_ms: u32) -> Result<Self, InvalidInput> {
        Ok(Self {
            roll: Pid::from_config(roll, time_ms)?,
            pitch: Pid::from_config(pitch, time_ms)?,
            engaged: false,
        })
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Target roll and pitch in degrees
    pub fn set_level(&mut self, roll: f64, pitch: f64) {
        self.roll.set_desired_value(roll);
        self.pitch.set_desired_value(pitch);
    }

    /// Roll then pitch corrections for the latest estimate
    ///
    /// `None` in, `None` out: the hold disengages until an estimate is
    /// available again.
    pub fn update(&mut self, orientation: Option<OrientationState>, time_ms: u32) -> Option<[AxisCorrection; 2]> {
        let Some(orientation) = orientation else {
            if self.engaged {
                log_info!("Attitude hold disengaged: no estimate");
                self.engaged = false;
            }
            return None;
        };

        if !self.engaged {
            self.roll.reset(time_ms);
            self.pitch.reset(time_ms);
            self.engaged = true;
            log_info!("Attitude hold engaged");
        }

        Some([
            AxisCorrection {
                axis: Axis::Roll,
                value: self.roll.compute(f64::from(orientation.roll), time_ms),
                timestamp_ms: time_ms,
            },
            AxisCorrection {
                axis: Axis::Pitch,
                value: self.pitch.compute(f64::from(orientation.pitch), time_ms),
                timestamp_ms: time_ms,
            },
        ])
    }
}
