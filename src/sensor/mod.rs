//! Inertial sensor access
//!
//! The acquisition collaborator is anything implementing [`InertialSource`]:
//! it hands out one raw six-value sample per call and owns the bus. [`Imu`]
//! wraps a source together with its [`CalibrationVector`] and produces
//! readings in physical units.
//!
//! # Usage
//!
//! ```rust,ignore
//! let source = Mpu6050::new(i2c, DEFAULT_ADDRESS, &mut delay)?;
//! let mut imu = Imu::with_config(source, &AttitudeConfig::default());
//! let bias = imu.estimate_bias(500, &mut delay)?;
//! imu.apply_calibration(bias.into_calibration());
//! let reading = imu.read()?;
//! ```

pub mod bias;
pub mod calibration;
pub mod convert;
pub mod mpu6050;

use calibration::CalibrationVector;
use convert::Reading;

use crate::system::config::AttitudeConfig;
use crate::system::error::Error;

/// Axis indices into three-element vectors
pub const X: usize = 0;
pub const Y: usize = 1;
pub const Z: usize = 2;

/// Raw register values of one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    /// Accelerometer X, Y, Z
    pub accel: [i16; 3],
    /// Gyroscope X, Y, Z
    pub gyro: [i16; 3],
}

impl RawSample {
    /// Decode two register blocks of big-endian high/low byte pairs
    pub fn from_be_bytes(accel: &[u8; 6], gyro: &[u8; 6]) -> Self {
        Self {
            accel: axes_from_be(accel),
            gyro: axes_from_be(gyro),
        }
    }
}

fn axes_from_be(bytes: &[u8; 6]) -> [i16; 3] {
    [
        i16::from_be_bytes([bytes[0], bytes[1]]),
        i16::from_be_bytes([bytes[2], bytes[3]]),
        i16::from_be_bytes([bytes[4], bytes[5]]),
    ]
}

/// Provider of raw inertial samples
pub trait InertialSource {
    type Error;

    /// Read one accelerometer + gyroscope sample
    fn read_raw(&mut self) -> Result<RawSample, Self::Error>;
}

impl<T: InertialSource + ?Sized> InertialSource for &mut T {
    type Error = T::Error;

    fn read_raw(&mut self) -> Result<RawSample, Self::Error> {
        (**self).read_raw()
    }
}

/// Sensor instance: a sample source plus its calibration
pub struct Imu<S> {
    source: S,
    calibration: CalibrationVector,
}

impl<S: InertialSource> Imu<S> {
    /// Wrap a source with no calibration applied
    pub fn new(source: S) -> Self {
        Self {
            source,
            calibration: CalibrationVector::ZERO,
        }
    }

    /// Wrap a source, applying the configured calibration if enabled
    pub fn with_config(source: S, config: &AttitudeConfig) -> Self {
        let mut imu = Self::new(source);
        if config.apply_calibration {
            imu.apply_calibration(config.calibration);
        }
        imu
    }

    /// Replace the bias corrections used by every following read
    pub fn apply_calibration(&mut self, calibration: CalibrationVector) {
        let a = calibration.accel_bias;
        let g = calibration.gyro_bias;
        log_info!(
            "Calibration applied: accel {} {} {} g, gyro {} {} {} dps",
            a[X],
            a[Y],
            a[Z],
            g[X],
            g[Y],
            g[Z]
        );
        self.calibration = calibration;
    }

    pub fn calibration(&self) -> CalibrationVector {
        self.calibration
    }

    /// Acquire one sample and convert it
    pub fn read(&mut self) -> Result<Reading, Error<S::Error>> {
        let sample = self.source.read_raw().map_err(Error::Bus)?;
        Ok(convert::convert(&sample, &self.calibration))
    }

    /// Acquire one sample converted with [`CalibrationVector::ZERO`], ignoring the applied calibration
    ///
    /// This is what bias estimation averages.
    pub fn read_uncorrected(&mut self) -> Result<Reading, Error<S::Error>> {
        let sample = self.source.read_raw().map_err(Error::Bus)?;
        Ok(convert::convert(&sample, &CalibrationVector::ZERO))
    }

    /// Acceleration in g
    pub fn read_accel(&mut self) -> Result<[f32; 3], Error<S::Error>> {
        Ok(self.read()?.accel)
    }

    /// Angular rate in °/s
    pub fn read_gyro(&mut self) -> Result<[f32; 3], Error<S::Error>> {
        Ok(self.read()?.gyro)
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Give back the source, dropping the calibration
    pub fn release(self) -> S {
        self.source
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Source replaying a fixed list of samples, then repeating the last one
    pub(crate) struct ScriptedSource<'a> {
        pub samples: &'a [RawSample],
        pub reads: usize,
    }

    impl<'a> ScriptedSource<'a> {
        pub fn new(samples: &'a [RawSample]) -> Self {
            Self { samples, reads: 0 }
        }
    }

    impl InertialSource for ScriptedSource<'_> {
        type Error = ();

        fn read_raw(&mut self) -> Result<RawSample, ()> {
            let index = self.reads.min(self.samples.len() - 1);
            self.reads += 1;
            Ok(self.samples[index])
        }
    }

    struct FailingSource;

    impl InertialSource for FailingSource {
        type Error = &'static str;

        fn read_raw(&mut self) -> Result<RawSample, Self::Error> {
            Err("nack")
        }
    }

    #[test]
    fn decodes_big_endian_pairs() {
        let accel = [0x40, 0x00, 0xC0, 0x00, 0x00, 0x01];
        let gyro = [0x00, 0x83, 0xFF, 0x7D, 0x80, 0x00];
        let sample = RawSample::from_be_bytes(&accel, &gyro);
        assert_eq!(sample.accel, [16384, -16384, 1]);
        assert_eq!(sample.gyro, [131, -131, i16::MIN]);
    }

    #[test]
    fn config_calibration_only_applied_when_enabled() {
        let samples = [RawSample::default()];
        let calibration = CalibrationVector::new([0.1, 0.2, 0.3], [1.0, 2.0, 3.0]);

        let config = AttitudeConfig {
            calibration,
            ..Default::default()
        };
        let imu = Imu::with_config(ScriptedSource::new(&samples), &config);
        assert!(imu.calibration().is_zero());

        let config = AttitudeConfig {
            apply_calibration: true,
            calibration,
            ..Default::default()
        };
        let imu = Imu::with_config(ScriptedSource::new(&samples), &config);
        assert_eq!(imu.calibration(), calibration);
    }

    #[test]
    fn read_applies_calibration() {
        let samples = [RawSample {
            accel: [0, 0, 16384],
            gyro: [131, 0, 0],
        }];
        let mut imu = Imu::new(ScriptedSource::new(&samples));
        imu.apply_calibration(CalibrationVector::new([0.0, 0.0, 1.0], [1.0, 0.0, 0.0]));
        let reading = imu.read().unwrap();
        assert_eq!(reading.accel, [0.0, 0.0, 1.0]);
        assert_eq!(reading.gyro, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn single_sensor_reads_match_full_read() {
        let samples = [RawSample {
            accel: [8192, 0, 16384],
            gyro: [0, -262, 131],
        }];
        let calibration = CalibrationVector::new([0.5, 0.0, 0.0], [0.0, -2.0, 0.0]);
        let mut imu = Imu::new(ScriptedSource::new(&samples));
        imu.apply_calibration(calibration);

        assert_eq!(imu.read_accel().unwrap(), [0.0, 0.0, 2.0]);
        assert_eq!(imu.read_gyro().unwrap(), [0.0, 0.0, 1.0]);
        assert_eq!(imu.source_mut().reads, 2);
    }

    #[test]
    fn uncorrected_read_ignores_calibration() {
        let samples = [RawSample {
            accel: [8192, 0, 16384],
            gyro: [131, 0, 0],
        }];
        let mut imu = Imu::new(ScriptedSource::new(&samples));
        imu.apply_calibration(CalibrationVector::new([0.5, 0.0, 1.0], [1.0, 0.0, 0.0]));

        let reading = imu.read_uncorrected().unwrap();
        assert_eq!(reading.accel, [0.5, 0.0, 2.0]);
        assert_eq!(reading.gyro, [1.0, 0.0, 0.0]);
        assert_eq!(imu.read().unwrap().accel, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn bus_errors_are_wrapped() {
        let mut imu = Imu::new(FailingSource);
        assert_eq!(imu.read(), Err(Error::Bus("nack")));
    }
}
