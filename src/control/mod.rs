//! Control module: PID regulation and wheel mixing
pub mod controllers;
pub mod pid;

pub use self::controllers::{DifferentialDriveController, MotorCommand, PidOutput};
pub use self::pid::{PidController, PidState};
