//! Error types
//!
//! The update paths (conversion, filtering, PID) never fail. Errors only
//! come out of construction, configuration and the acquisition bus.

use core::fmt;

/// Errors surfaced by sensor construction and acquisition
///
/// `E` is the bus error of the acquisition collaborator (for the MPU-6050
/// driver, the `embedded-hal` I2C error type).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// Bus transaction failed
    Bus(E),
    /// Identity register did not hold the expected value
    DeviceNotPresent {
        /// Value read back from the identity register
        found: u8,
    },
    /// Rejected argument or configuration
    InvalidInput(InvalidInput),
}

/// Arguments rejected up front instead of producing undefined arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InvalidInput {
    /// Bias estimation asked to average zero samples
    ZeroSampleCount,
    /// Complementary ratio outside `[0, 1]` or not a number
    RatioOutOfRange,
    /// Integral clamp with `min > max` or a NaN bound
    InvertedLimits,
}

impl<E> From<InvalidInput> for Error<E> {
    fn from(value: InvalidInput) -> Self {
        Error::InvalidInput(value)
    }
}

impl fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidInput::ZeroSampleCount => write!(f, "sample count must be at least 1"),
            InvalidInput::RatioOutOfRange => write!(f, "complementary ratio must lie in [0, 1]"),
            InvalidInput::InvertedLimits => write!(f, "integral limits must satisfy min <= max"),
        }
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bus(e) => write!(f, "bus error: {:?}", e),
            Error::DeviceNotPresent { found } => {
                write!(f, "device not present (identity register read {:#04x})", found)
            }
            Error::InvalidInput(reason) => write!(f, "invalid input: {}", reason),
        }
    }
}
