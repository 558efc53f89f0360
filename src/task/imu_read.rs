//! IMU reading and attitude estimation using the MPU-6050 sensor.
//!
//! This module provides an asynchronous task that samples the MPU-6050 over
//! I2C and runs the complementary filter on every sample.
//!
//! # Architecture
//!
//! The task goes through three phases:
//! 1. Bring-up - identity check and power-up; a missing sensor parks the task
//! 2. Calibration - optional startup bias estimation with the board at rest
//! 3. Sampling - while started, 100 Hz reads fused into roll/pitch/yaw
//!
//! Settle times and bias sample spacing are awaited, so the other tasks keep
//! running during bring-up. Only the I2C transfers themselves block.
//!
//! `ORIENTATION` holds an estimate only while sampling is running; it is
//! cleared on stop and when the task gives up, which disengages the
//! attitude hold.
//!
//! # Orientation Reference Frame
//!
//! - **Roll/Pitch**: absolute, pulled toward the gravity direction
//! - **Yaw**: relative to startup unless a heading reference is posted to
//!   `HEADING_REFERENCE`, in which case it is nudged toward that heading
//!
//! # Usage
//!
//! ```rust
//! // Start IMU readings
//! imu_read::start_imu_readings();
//!
//! // Stop readings when done
//! imu_read::stop_imu_readings();
//! ```

use defmt::{info, warn};
use embassy_embedded_hal::shared_bus::blocking::i2c::I2cDevice;
use embassy_futures::select::{Either, select};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use embassy_time::{Duration, Instant, Ticker, Timer};
use imu_attitude::fusion::{ComplementaryFilter, OrientationState, Tilt, roll_pitch};
use imu_attitude::sensor::bias::{BiasAccumulator, BiasEstimate, SAMPLE_SPACING_MS};
use imu_attitude::sensor::mpu6050::{Mpu6050, POWER_SETTLE_MS};
use imu_attitude::sensor::{Imu, InertialSource};
use imu_attitude::system::config::AttitudeConfig;
use imu_attitude::system::error::Error;
use imu_attitude::system::event::{self, Events, OrientationMeasurement};
use imu_attitude::system::state::{HEADING_REFERENCE, ORIENTATION};
use embedded_hal::i2c::ErrorType;

use super::resources::{I2cBus, ImuDevice};

/// Consecutive failed reads before the task gives up
const MAX_CONSECUTIVE_FAILURES: u32 = 10;

/// Commands for IMU reading control
enum ImuCommand {
    /// Start IMU readings
    Start,
    /// Stop IMU readings
    Stop,
}

/// Control signal for IMU reading state
static IMU_CONTROL: Signal<CriticalSectionRawMutex, ImuCommand> = Signal::new();

/// Start continuous IMU readings
pub fn start_imu_readings() {
    IMU_CONTROL.signal(ImuCommand::Start);
}

/// Stop IMU readings
pub fn stop_imu_readings() {
    IMU_CONTROL.signal(ImuCommand::Stop);
}

/// Park the task forever once the sensor is unusable
async fn park() -> ! {
    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}

/// Bring the sensor up, awaiting the settle times instead of blocking the executor
async fn bring_up(i2c_bus: &'static I2cBus, address: u8) -> Result<Mpu6050<ImuDevice>, Error<<ImuDevice as ErrorType>::Error>> {
    let mut sensor = Mpu6050::probe(I2cDevice::new(i2c_bus), address)?;
    sensor.reset()?;
    Timer::after_millis(u64::from(POWER_SETTLE_MS)).await;
    sensor.wake()?;
    Timer::after_millis(u64::from(POWER_SETTLE_MS)).await;
    Ok(sensor)
}

/// Average `samples` uncorrected readings, yielding between them
async fn estimate_bias<S: InertialSource>(imu: &mut Imu<S>, samples: u32) -> Option<BiasEstimate> {
    let mut accumulator = BiasAccumulator::new();
    for _ in 0..samples {
        match imu.read_uncorrected() {
            Ok(reading) => accumulator.add(&reading),
            Err(_) => return None,
        }
        Timer::after_millis(u64::from(SAMPLE_SPACING_MS)).await;
    }
    accumulator.finish()
}

/// Embassy task that samples the IMU and runs the attitude filter
#[embassy_executor::task]
pub async fn inertial_measurement_read(i2c_bus: &'static I2cBus, config: AttitudeConfig) {
    info!("Initializing MPU6050...");
    let sensor = match bring_up(i2c_bus, config.address).await {
        Ok(sensor) => sensor,
        Err(Error::DeviceNotPresent { found }) => {
            warn!("No MPU6050 at {=u8:#x} (WHO_AM_I {=u8:#x})", config.address, found);
            event::send(Events::ImuUnavailable).await;
            park().await
        }
        Err(_) => {
            warn!("MPU6050 bus error during bring-up");
            event::send(Events::ImuUnavailable).await;
            park().await
        }
    };
    let mut imu = Imu::with_config(sensor, &config);

    if config.bias_samples > 0 {
        info!("Estimating bias over {} samples, keep the board still", config.bias_samples);
        match estimate_bias(&mut imu, config.bias_samples).await {
            Some(bias) => {
                imu.apply_calibration(bias.into_calibration());
                event::send(Events::BiasEstimated(bias)).await;
            }
            None => warn!("Bias estimation failed, keeping configured calibration"),
        }
    }

    let mut filter = match ComplementaryFilter::new(config.complementary_ratio) {
        Ok(filter) => filter,
        Err(e) => {
            warn!("Invalid filter configuration: {}", e);
            return;
        }
    };

    let sample_interval = Duration::from_millis(config.sample_interval_ms());
    info!(
        "Complementary filter ready: ratio {}, {} ms sample interval",
        config.complementary_ratio,
        sample_interval.as_millis()
    );

    'command: loop {
        // Wait for a command, consuming it
        match IMU_CONTROL.wait().await {
            ImuCommand::Start => {
                info!("Starting IMU reading");
                // Cold start: the first update after a stop only latches time
                filter.reset();
                let mut consecutive_failures = 0u32;
                let mut ticker = Ticker::every(sample_interval);

                loop {
                    match select(IMU_CONTROL.wait(), ticker.next()).await {
                        Either::First(ImuCommand::Stop) => {
                            ORIENTATION.set(None);
                            info!("IMU stopped. Waiting for next command.");
                            continue 'command;
                        }
                        Either::First(_) => continue,
                        Either::Second(_) => {
                            let reading = match imu.read() {
                                Ok(reading) => {
                                    consecutive_failures = 0;
                                    reading
                                }
                                Err(_) => {
                                    consecutive_failures += 1;
                                    warn!(
                                        "Failed to read IMU (failure {} of {})",
                                        consecutive_failures, MAX_CONSECUTIVE_FAILURES
                                    );
                                    if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                                        warn!("Max consecutive IMU failures reached - IMU task terminating");
                                        ORIENTATION.set(None);
                                        event::send(Events::ImuUnavailable).await;
                                        return;
                                    }
                                    continue;
                                }
                            };

                            let now_ms = Instant::now().as_millis() as i64;

                            // In free fall or on a zeroed read, hold the current tilt as reference
                            let tilt = roll_pitch(&reading.accel).unwrap_or_else(|| {
                                let current = filter.orientation();
                                Tilt {
                                    roll: current.roll,
                                    pitch: current.pitch,
                                }
                            });

                            if !filter.is_initialized() {
                                // Start from the measured tilt; this sample only latches time
                                filter.seed(OrientationState {
                                    roll: tilt.roll,
                                    pitch: tilt.pitch,
                                    yaw: 0.0,
                                });
                                filter.update_with_heading(&reading.gyro, &tilt, None, now_ms);
                                continue;
                            }

                            let heading = HEADING_REFERENCE.get();
                            let orientation = filter.update_with_heading(&reading.gyro, &tilt, heading, now_ms);

                            ORIENTATION.set(Some(orientation));
                            // Consumers that fall behind miss samples rather than stall the loop
                            let _ = event::try_send(Events::OrientationMeasured(OrientationMeasurement {
                                orientation,
                                timestamp_ms: now_ms,
                            }));
                        }
                    }
                }
            }
            ImuCommand::Stop => {
                info!("IMU stopped. Waiting for next command.");
                continue 'command;
            }
        }
    }
}
