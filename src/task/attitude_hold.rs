//! Attitude hold control loop
//!
//! Runs the roll/pitch level hold against the latest orientation estimate and
//! publishes the corrections as `CorrectionComputed` events. Nothing is
//! published while `ORIENTATION` is empty: before the IMU is up, while
//! readings are stopped, and after the IMU task gave up.

use defmt::{info, warn};
use embassy_time::{Duration, Instant, Ticker};
use imu_attitude::control::AttitudeHold;
use imu_attitude::system::config::{PITCH_HOLD, ROLL_HOLD};
use imu_attitude::system::event::{self, Events};
use imu_attitude::system::state::ORIENTATION;

/// Control loop period, matches the attitude estimate rate
const CONTROL_INTERVAL: Duration = Duration::from_millis(10);

/// Millisecond tick for the PID, wraps after ~49 days
fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}

#[embassy_executor::task]
pub async fn attitude_hold() {
    let mut hold = match AttitudeHold::new(&ROLL_HOLD, &PITCH_HOLD, now_ms()) {
        Ok(hold) => hold,
        Err(e) => {
            warn!("Invalid attitude hold gains, control loop not started: {}", e);
            return;
        }
    };
    info!("Attitude hold waiting for an estimate (roll {} / pitch {})", ROLL_HOLD.desired_value, PITCH_HOLD.desired_value);

    let mut ticker = Ticker::every(CONTROL_INTERVAL);
    loop {
        ticker.next().await;

        let Some(corrections) = hold.update(ORIENTATION.get(), now_ms()) else {
            continue;
        };
        for correction in corrections {
            // Actuators only care about the latest correction
            let _ = event::try_send(Events::CorrectionComputed(correction));
        }
    }
}
