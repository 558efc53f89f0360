//! Per-axis bias corrections
//!
//! Biases are expressed in the converted units: g for the accelerometer,
//! °/s for the gyroscope. The accelerometer Z bias is the deviation from the
//! 1 g rest reading, which is how the bias estimator reports it.

/// Bias corrections subtracted on every conversion
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationVector {
    /// Accelerometer X, Y, Z bias in g
    pub accel_bias: [f32; 3],
    /// Gyroscope X, Y, Z bias in °/s
    pub gyro_bias: [f32; 3],
}

impl CalibrationVector {
    /// No correction, conversions return the scaled register values
    pub const ZERO: Self = Self {
        accel_bias: [0.0; 3],
        gyro_bias: [0.0; 3],
    };

    pub const fn new(accel_bias: [f32; 3], gyro_bias: [f32; 3]) -> Self {
        Self { accel_bias, gyro_bias }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}
