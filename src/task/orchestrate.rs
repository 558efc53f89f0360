//! Orchestrator Module
//!
//! Consumes the system events produced by the attitude tasks and reacts to
//! the ones that change what the firmware should be doing.

use defmt::{debug, info, warn};
use imu_attitude::system::event::{self, Events};

use super::imu_read;

/// Main orchestrator task
///
/// Starts IMU sampling once bring-up is done and stops reacting once the
/// sensor is reported unavailable.
#[embassy_executor::task]
pub async fn orchestrate() {
    info!("Orchestrator started");
    imu_read::start_imu_readings();

    loop {
        // wait for an event
        let event = event::wait().await;
        if !process_event(event) {
            break;
        }
    }

    warn!("Orchestrator stopped");
}

/// Processes one event, returns `false` when nothing further can happen
fn process_event(event: Events) -> bool {
    match event {
        Events::OrientationMeasured(measurement) => {
            debug!(
                "t={}ms roll={} pitch={} yaw={}",
                measurement.timestamp_ms,
                measurement.orientation.roll,
                measurement.orientation.pitch,
                measurement.orientation.yaw
            );
            true
        }
        Events::CorrectionComputed(correction) => {
            debug!("{} correction {}", correction.axis, correction.value);
            true
        }
        Events::BiasEstimated(bias) => {
            info!("Bias estimated: accel {} gyro {}", bias.accel, bias.gyro);
            true
        }
        Events::ImuUnavailable => {
            warn!("IMU unavailable, stopping readings");
            imu_read::stop_imu_readings();
            false
        }
    }
}
