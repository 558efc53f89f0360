pub mod hold;
pub mod pid;

pub use hold::AttitudeHold;
pub use pid::Pid;
