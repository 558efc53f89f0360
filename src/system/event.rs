//! System Events
//!
//! Outputs of the attitude core for the rest of the firmware. The actuation
//! path (motor drivers and the like) consumes `CorrectionComputed`.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::fusion::complementary::OrientationState;
use crate::sensor::bias::BiasEstimate;

/// Multi-producer, single-consumer event channel with capacity of 10
pub static EVENT_CHANNEL: Channel<CriticalSectionRawMutex, Events, 10> = Channel::new();

/// Sends an event to the system channel
pub async fn send(event: Events) {
    EVENT_CHANNEL.sender().send(event).await;
}

/// Sends an event without waiting, dropping it if the channel is full
///
/// Returns `false` when the event was dropped.
pub fn try_send(event: Events) -> bool {
    EVENT_CHANNEL.try_send(event).is_ok()
}

/// Receives the next event from the system channel
pub async fn wait() -> Events {
    EVENT_CHANNEL.receiver().receive().await
}

/// Controlled axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    Roll,
    Pitch,
}

/// Orientation estimate with the time it was taken
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OrientationMeasurement {
    pub orientation: OrientationState,
    pub timestamp_ms: i64,
}

/// PID output for one axis
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisCorrection {
    pub axis: Axis,
    /// Unbounded correction, only the integral term is clamped
    pub value: f64,
    pub timestamp_ms: u32,
}

/// System-wide events
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Events {
    /// Attitude loop produced a new estimate
    OrientationMeasured(OrientationMeasurement),
    /// A PID instance produced a correction
    CorrectionComputed(AxisCorrection),
    /// Startup bias estimation finished
    BiasEstimated(BiasEstimate),
    /// Identity check failed, nothing downstream will run
    ImuUnavailable,
}
