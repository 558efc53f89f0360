//! Hardware Resource Management
//!
//! Assigns the board's pins and peripherals to tasks and owns the shared
//! I2C bus.
//!
//! # Resource Groups
//! - IMU: I2C0 with the MPU-6050 on GPIO 12/13
//!
//! # Shared Resources
//! The I2C bus is shared with other devices on the board (radio, GPS
//! module) and sits behind a critical-section mutex. Drivers get an
//! `I2cDevice` handle and lock the bus per transaction.

use core::cell::RefCell;

use assign_resources::assign_resources;
use embassy_embedded_hal::shared_bus::blocking::i2c::I2cDevice;
use embassy_rp::i2c::{Blocking, Config, I2c};
use embassy_rp::peripherals::{self, I2C0};
use embassy_rp::Peri;
use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use embassy_sync::once_lock::OnceLock;

/// I2C bus frequency (fast mode)
const I2C_FREQUENCY_HZ: u32 = 400_000;

/// Blocking I2C0 shared between drivers
pub type I2cBus = Mutex<CriticalSectionRawMutex, RefCell<I2c<'static, I2C0, Blocking>>>;

/// Handle a driver holds on the shared bus
pub type ImuDevice = I2cDevice<'static, CriticalSectionRawMutex, I2c<'static, I2C0, Blocking>>;

static I2C_BUS: OnceLock<I2cBus> = OnceLock::new();

/// Initializes the shared I2C bus
///
/// Called once from main before the tasks using the bus are spawned.
/// Later calls return the bus created by the first one.
pub fn init_i2c(r: ImuResources) -> &'static I2cBus {
    I2C_BUS.get_or_init(|| {
        let mut config = Config::default();
        config.frequency = I2C_FREQUENCY_HZ;
        let i2c = I2c::new_blocking(r.i2c, r.scl, r.sda, config);
        Mutex::new(RefCell::new(i2c))
    })
}

assign_resources! {
    /// MPU-6050 6-axis IMU
    imu: ImuResources {
        i2c: I2C0,
        scl: PIN_13,
        sda: PIN_12,
    },
}
