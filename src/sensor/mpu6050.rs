//! MPU-6050 I2C driver
//!
//! Minimal acquisition side of the MPU-6050: identity check, power-up and
//! raw sample reads. Ranges are left at their power-on defaults (±2 g,
//! ±250 °/s), which is what the conversion constants assume.
//!
//! A driver value only exists after the identity check passed, so nothing
//! downstream can run against an absent or wrong device.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::{InertialSource, RawSample};
use crate::system::error::Error;

/// 7-bit address with AD0 low
pub const DEFAULT_ADDRESS: u8 = 0x68;

/// 7-bit address with AD0 high
pub const ALTERNATE_ADDRESS: u8 = 0x69;

/// Register map subset
mod registers {
    pub const WHO_AM_I: u8 = 0x75;
    pub const WHO_AM_I_VALUE: u8 = 0x68;

    pub const PWR_MGMT_1: u8 = 0x6B;
    /// Reset all internal registers
    pub const PWR_DEVICE_RESET: u8 = 1 << 7;
    /// Temperature sensor off
    pub const PWR_TEMP_DIS: u8 = 1 << 3;
    /// CLKSEL = 0: internal 8 MHz oscillator
    pub const PWR_CLOCK_INTERNAL_8MHZ: u8 = 0b000;

    pub const ACCEL_XOUT_H: u8 = 0x3B;
    pub const GYRO_XOUT_H: u8 = 0x43;
}

/// Settle time after each power-management write
pub const POWER_SETTLE_MS: u32 = 100;

/// MPU-6050 on a blocking I2C bus
pub struct Mpu6050<I> {
    i2c: I,
    address: u8,
}

impl<I: I2c> Mpu6050<I> {
    /// Check the device identity and bring it out of sleep
    ///
    /// Fails with [`Error::DeviceNotPresent`] if WHO_AM_I does not read 0x68.
    /// No configuration is written in that case. Blocks on `delay` for
    /// twice [`POWER_SETTLE_MS`]; async callers run [`probe`](Self::probe),
    /// [`reset`](Self::reset) and [`wake`](Self::wake) themselves and wait
    /// in between.
    pub fn new(i2c: I, address: u8, delay: &mut impl DelayNs) -> Result<Self, Error<I::Error>> {
        let mut driver = Self::probe(i2c, address)?;
        driver.reset()?;
        delay.delay_ms(POWER_SETTLE_MS);
        driver.wake()?;
        delay.delay_ms(POWER_SETTLE_MS);
        Ok(driver)
    }

    /// Identity check only, the device is left as it was
    pub fn probe(i2c: I, address: u8) -> Result<Self, Error<I::Error>> {
        let mut driver = Self { i2c, address };

        let identity = driver.read_register(registers::WHO_AM_I)?;
        if identity != registers::WHO_AM_I_VALUE {
            log_warn!("MPU6050 initialization failed: WHO_AM_I read {}", identity);
            return Err(Error::DeviceNotPresent { found: identity });
        }
        log_info!("MPU6050 detected at address {}", address);
        Ok(driver)
    }

    /// Reset all registers; the device needs [`POWER_SETTLE_MS`] afterwards
    pub fn reset(&mut self) -> Result<(), Error<I::Error>> {
        self.write_register(
            registers::PWR_MGMT_1,
            registers::PWR_DEVICE_RESET | registers::PWR_TEMP_DIS | registers::PWR_CLOCK_INTERNAL_8MHZ,
        )
    }

    /// Clear SLEEP, running on the internal clock with the temperature sensor off
    pub fn wake(&mut self) -> Result<(), Error<I::Error>> {
        // Reset leaves the device asleep
        self.write_register(
            registers::PWR_MGMT_1,
            registers::PWR_TEMP_DIS | registers::PWR_CLOCK_INTERNAL_8MHZ,
        )?;
        log_info!("MPU6050 initialized");
        Ok(())
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give back the bus
    pub fn release(self) -> I {
        self.i2c
    }

    fn read_register(&mut self, register: u8) -> Result<u8, Error<I::Error>> {
        let mut value = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register], &mut value)
            .map_err(Error::Bus)?;
        Ok(value[0])
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Error<I::Error>> {
        self.i2c.write(self.address, &[register, value]).map_err(Error::Bus)
    }

    fn read_block(&mut self, register: u8) -> Result<[u8; 6], I::Error> {
        let mut block = [0u8; 6];
        self.i2c.write_read(self.address, &[register], &mut block)?;
        Ok(block)
    }
}

impl<I: I2c> InertialSource for Mpu6050<I> {
    type Error = I::Error;

    fn read_raw(&mut self) -> Result<RawSample, Self::Error> {
        let accel = self.read_block(registers::ACCEL_XOUT_H)?;
        let gyro = self.read_block(registers::GYRO_XOUT_H)?;
        Ok(RawSample::from_be_bytes(&accel, &gyro))
    }
}
