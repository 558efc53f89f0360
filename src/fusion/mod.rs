//! Orientation estimation
pub mod angle;
pub mod complementary;
pub mod tilt;

pub use angle::{angle_difference, wrap_degrees};
pub use complementary::{ComplementaryFilter, OrientationState};
pub use tilt::{AxisRotation, Tilt, axis_rotation, roll_pitch};
