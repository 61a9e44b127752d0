//! Interface to the simulated robot
//!
//! The navigator never talks to the simulator directly. Whatever owns the
//! remote link (object handles, name resolution, retries) implements this
//! trait once and hands it to the controller.

use crate::common::types::Pose;
use crate::error::Result;
use crate::perception::SensorReading;

/// Pose, sonar and wheel access for one robot
pub trait RobotInterface: Send {
    /// Current pose snapshot; `PoseUnavailable` if the robot object is gone
    fn read_pose(&mut self) -> Result<Pose>;

    /// Current sonar sweep; errors are treated as "nothing detected"
    fn read_sensors(&mut self) -> Result<Vec<SensorReading>>;

    /// Command both wheels; `ActuationError` if the motor handles are invalid
    fn set_wheel_speeds(&mut self, left: f64, right: f64) -> Result<()>;
}

impl<T: RobotInterface + ?Sized> RobotInterface for Box<T> {
    fn read_pose(&mut self) -> Result<Pose> {
        (**self).read_pose()
    }

    fn read_sensors(&mut self) -> Result<Vec<SensorReading>> {
        (**self).read_sensors()
    }

    fn set_wheel_speeds(&mut self, left: f64, right: f64) -> Result<()> {
        (**self).set_wheel_speeds(left, right)
    }
}
