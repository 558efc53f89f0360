//! Attitude estimation firmware entry point
//!
//! Brings up the shared I2C bus and spawns the estimation and control tasks.

#![no_std]
#![no_main]

use crate::task::{attitude_hold::attitude_hold, imu_read::inertial_measurement_read, orchestrate::orchestrate};
use embassy_executor::Spawner;
use embassy_rp::block::ImageDef;
use embassy_rp::config::Config;
use imu_attitude::system::config::AttitudeConfig;
use task::resources::{self, AssignedResources, ImuResources};
use {defmt_rtt as _, panic_probe as _};

/// Firmware image type for bootloader
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

/// Task implementations
mod task;

/// Firmware entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Config::default());

    // Split the resources into separate groups for each task
    let r = split_resources!(p);

    // The bus must exist before any task that talks to the IMU is spawned
    let i2c_bus = resources::init_i2c(r.imu);

    spawner.spawn(orchestrate()).unwrap();
    spawner.spawn(inertial_measurement_read(i2c_bus, AttitudeConfig::default())).unwrap();
    spawner.spawn(attitude_hold()).unwrap();
}
