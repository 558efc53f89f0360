//! Bias estimation
//!
//! Averages readings taken with the device at rest, level and still. The
//! averages are taken on uncorrected readings
//! ([`Imu::read_uncorrected`]), so the calibration in use is left alone
//! even if a read fails. The result is only reported; assigning it is up
//! to the caller.
//!
//! [`Imu::estimate_bias`] blocks on a [`DelayNs`] between samples. Async
//! callers feed a [`BiasAccumulator`] themselves and await between reads.

use embedded_hal::delay::DelayNs;

use super::calibration::CalibrationVector;
use super::convert::Reading;
use super::{Imu, InertialSource, X, Y, Z};
use crate::system::error::{Error, InvalidInput};

/// Spacing between samples, keeps the sample rate at or below 500 Hz
pub const SAMPLE_SPACING_MS: u32 = 2;

/// Mean deviation of each axis from its expected rest reading
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BiasEstimate {
    /// Accelerometer bias in g, Z relative to 1 g
    pub accel: [f32; 3],
    /// Gyroscope bias in °/s
    pub gyro: [f32; 3],
}

impl BiasEstimate {
    /// Calibration that cancels this bias
    pub fn into_calibration(self) -> CalibrationVector {
        CalibrationVector::new(self.accel, self.gyro)
    }
}

/// Running sums of converted readings
#[derive(Debug, Clone, Copy, Default)]
pub struct BiasAccumulator {
    accel_sum: [f32; 3],
    gyro_sum: [f32; 3],
    count: u32,
}

impl BiasAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, reading: &Reading) {
        for axis in [X, Y, Z] {
            self.accel_sum[axis] += reading.accel[axis];
            self.gyro_sum[axis] += reading.gyro[axis];
        }
        self.count += 1;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Per-axis means, with gravity removed from the accelerometer Z mean
    ///
    /// Returns `None` before the first sample.
    pub fn finish(&self) -> Option<BiasEstimate> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f32;
        let mut estimate = BiasEstimate {
            accel: self.accel_sum.map(|sum| sum / n),
            gyro: self.gyro_sum.map(|sum| sum / n),
        };
        estimate.accel[Z] -= 1.0;
        Some(estimate)
    }
}

impl<S: InertialSource> Imu<S> {
    /// Average `samples` readings of both sensors
    ///
    /// Rejects a zero sample count. Blocks for about
    /// `samples * SAMPLE_SPACING_MS` milliseconds.
    pub fn estimate_bias(&mut self, samples: u32, delay: &mut impl DelayNs) -> Result<BiasEstimate, Error<S::Error>> {
        let estimate = self.collect_bias(samples, delay)?;
        log_info!(
            "Accelerometer bias X,Y,Z: {}, {}, {}",
            estimate.accel[X],
            estimate.accel[Y],
            estimate.accel[Z]
        );
        log_info!(
            "Gyro bias X,Y,Z: {}, {}, {}",
            estimate.gyro[X],
            estimate.gyro[Y],
            estimate.gyro[Z]
        );
        Ok(estimate)
    }

    /// Accelerometer part of [`Imu::estimate_bias`]
    pub fn estimate_accel_bias(&mut self, samples: u32, delay: &mut impl DelayNs) -> Result<[f32; 3], Error<S::Error>> {
        let accel = self.collect_bias(samples, delay)?.accel;
        log_info!("Accelerometer bias X,Y,Z: {}, {}, {}", accel[X], accel[Y], accel[Z]);
        Ok(accel)
    }

    /// Gyroscope part of [`Imu::estimate_bias`]
    pub fn estimate_gyro_bias(&mut self, samples: u32, delay: &mut impl DelayNs) -> Result<[f32; 3], Error<S::Error>> {
        let gyro = self.collect_bias(samples, delay)?.gyro;
        log_info!("Gyro bias X,Y,Z: {}, {}, {}", gyro[X], gyro[Y], gyro[Z]);
        Ok(gyro)
    }

    fn collect_bias(&mut self, samples: u32, delay: &mut impl DelayNs) -> Result<BiasEstimate, Error<S::Error>> {
        if samples == 0 {
            return Err(InvalidInput::ZeroSampleCount.into());
        }

        let mut accumulator = BiasAccumulator::new();
        for _ in 0..samples {
            accumulator.add(&self.read_uncorrected()?);
            delay.delay_ms(SAMPLE_SPACING_MS);
        }

        log_debug!("Bias estimated over {} samples", accumulator.count());
        // samples > 0, so the accumulator is never empty here
        accumulator.finish().ok_or(Error::InvalidInput(InvalidInput::ZeroSampleCount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::tests::ScriptedSource;
    use crate::sensor::RawSample;
    use approx::assert_relative_eq;

    /// Delay that records requested time instead of sleeping
    #[derive(Default)]
    struct RecordingDelay {
        total_ns: u64,
    }

    impl DelayNs for RecordingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += u64::from(ns);
        }
    }

    #[test]
    fn z_bias_is_mean_minus_gravity() {
        let mut accumulator = BiasAccumulator::new();
        for z in [1.0, 1.2] {
            accumulator.add(&Reading {
                accel: [0.0, 0.0, z],
                gyro: [0.0; 3],
            });
        }
        let estimate = accumulator.finish().unwrap();
        assert_relative_eq!(estimate.accel[Z], 0.1, epsilon = 1e-6);
        assert_eq!(estimate.accel[X], 0.0);
    }

    #[test]
    fn empty_accumulator_has_no_estimate() {
        assert!(BiasAccumulator::new().finish().is_none());
    }

    #[test]
    fn zero_samples_rejected() {
        let samples = [RawSample::default()];
        let mut imu = Imu::new(ScriptedSource::new(&samples));
        let mut delay = RecordingDelay::default();
        assert_eq!(
            imu.estimate_bias(0, &mut delay),
            Err(Error::InvalidInput(InvalidInput::ZeroSampleCount))
        );
        assert_eq!(imu.source_mut().reads, 0);
    }

    #[test]
    fn averages_uncorrected_readings_and_restores_calibration() {
        let samples = [
            RawSample {
                accel: [164, -328, 0],
                gyro: [262, 0, -131],
            },
            RawSample {
                accel: [492, 328, 0],
                gyro: [0, 131, -131],
            },
        ];
        let calibration = CalibrationVector::new([0.5, 0.5, 0.5], [9.0, 9.0, 9.0]);
        let mut imu = Imu::new(ScriptedSource::new(&samples));
        imu.apply_calibration(calibration);

        let mut delay = RecordingDelay::default();
        let estimate = imu.estimate_bias(2, &mut delay).unwrap();

        // Raw Z of 0 reads as 1 g uncalibrated, so the Z bias is 0
        assert_relative_eq!(estimate.accel[X], 656.0 / 2.0 / 16384.0, epsilon = 1e-6);
        assert_relative_eq!(estimate.accel[Y], 0.0, epsilon = 1e-6);
        assert_relative_eq!(estimate.accel[Z], 0.0, epsilon = 1e-6);
        assert_relative_eq!(estimate.gyro[X], 1.0, epsilon = 1e-6);
        assert_relative_eq!(estimate.gyro[Y], 0.5, epsilon = 1e-6);
        assert_relative_eq!(estimate.gyro[Z], -1.0, epsilon = 1e-6);

        assert_eq!(imu.calibration(), calibration);
        assert!(delay.total_ns >= 2 * u64::from(SAMPLE_SPACING_MS) * 1_000_000);
    }

    #[test]
    fn calibration_restored_after_read_failure() {
        struct FlakySource {
            reads: u32,
        }

        impl InertialSource for FlakySource {
            type Error = u8;

            fn read_raw(&mut self) -> Result<RawSample, u8> {
                self.reads += 1;
                if self.reads == 3 {
                    Err(7)
                } else {
                    Ok(RawSample::default())
                }
            }
        }

        let calibration = CalibrationVector::new([0.1; 3], [0.2; 3]);
        let mut imu = Imu::new(FlakySource { reads: 0 });
        imu.apply_calibration(calibration);
        let mut delay = RecordingDelay::default();

        assert_eq!(imu.estimate_gyro_bias(10, &mut delay), Err(Error::Bus(7)));
        assert_eq!(imu.calibration(), calibration);
    }

    #[test]
    fn estimate_feeds_back_into_calibration() {
        let samples = [RawSample {
            accel: [1638, 0, 16384],
            gyro: [655, 0, 0],
        }];
        let mut imu = Imu::new(ScriptedSource::new(&samples));
        let mut delay = RecordingDelay::default();

        let bias = imu.estimate_bias(4, &mut delay).unwrap();
        imu.apply_calibration(bias.into_calibration());
        let reading = imu.read().unwrap();

        assert_relative_eq!(reading.accel[X], 0.0, epsilon = 1e-6);
        assert_relative_eq!(reading.accel[Z], 1.0, epsilon = 1e-6);
        assert_relative_eq!(reading.gyro[X], 0.0, epsilon = 1e-6);
    }

    const TILTED_WITH_OFFSETS: [RawSample; 2] = [
        RawSample {
            accel: [328, 0, 16384],
            gyro: [131, 262, -393],
        },
        RawSample {
            accel: [0, 164, 16384],
            gyro: [131, 0, -131],
        },
    ];

    #[test]
    fn accel_only_estimate_matches_combined_one() {
        let mut imu = Imu::new(ScriptedSource::new(&TILTED_WITH_OFFSETS));
        let mut delay = RecordingDelay::default();
        let accel = imu.estimate_accel_bias(2, &mut delay).unwrap();

        assert_relative_eq!(accel[X], 164.0 / 16384.0, epsilon = 1e-6);
        assert_relative_eq!(accel[Y], 82.0 / 16384.0, epsilon = 1e-6);
        // Raw 1 g reads as 2 g through the zero calibration, minus gravity
        assert_relative_eq!(accel[Z], 1.0, epsilon = 1e-6);

        let mut imu = Imu::new(ScriptedSource::new(&TILTED_WITH_OFFSETS));
        assert_eq!(imu.estimate_bias(2, &mut delay).unwrap().accel, accel);
    }

    #[test]
    fn gyro_only_estimate_averages_rates() {
        let mut imu = Imu::new(ScriptedSource::new(&TILTED_WITH_OFFSETS));
        imu.apply_calibration(CalibrationVector::new([0.3; 3], [5.0; 3]));
        let mut delay = RecordingDelay::default();
        let gyro = imu.estimate_gyro_bias(2, &mut delay).unwrap();

        assert_relative_eq!(gyro[X], 1.0, epsilon = 1e-6);
        assert_relative_eq!(gyro[Y], 1.0, epsilon = 1e-6);
        assert_relative_eq!(gyro[Z], -2.0, epsilon = 1e-6);
        assert_eq!(imu.source_mut().reads, 2);
    }

    #[test]
    fn accumulator_driven_externally_matches_estimate() {
        let mut imu = Imu::new(ScriptedSource::new(&TILTED_WITH_OFFSETS));
        let mut accumulator = BiasAccumulator::new();
        for _ in 0..2 {
            accumulator.add(&imu.read_uncorrected().unwrap());
        }
        let external = accumulator.finish().unwrap();

        let mut imu = Imu::new(ScriptedSource::new(&TILTED_WITH_OFFSETS));
        let blocking = imu.estimate_bias(2, &mut RecordingDelay::default()).unwrap();
        assert_eq!(external, blocking);
    }
}
