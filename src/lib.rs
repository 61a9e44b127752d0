//! Closed-loop goal navigation for a differential-drive robot.
//!
//! Each control tick reads a pose and a sonar sweep from a [`RobotInterface`],
//! runs a heading PID and a distance PID, lets obstacle overrides take over
//! when something is close, watches for stalls and commands the two wheels.

pub mod common;
pub mod config;
pub mod control;
pub mod error;
pub mod navigation;
pub mod perception;
pub mod robot;

pub use crate::common::types::{Point2D, Pose, TurnDirection};
pub use crate::config::NavigatorConfig;
pub use crate::control::MotorCommand;
pub use crate::error::{NavigationError, Result};
pub use crate::navigation::{NavigationController, NavigationRunner, NavigationStatus};
pub use crate::perception::{ObstacleSide, SensorReading};
pub use crate::robot::RobotInterface;
