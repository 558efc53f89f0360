pub mod attitude_hold;
pub mod imu_read;
pub mod orchestrate;
pub mod resources;
