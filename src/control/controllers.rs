//! Controllers for the robot

use super::pid::{PidController, PidState};
use crate::common::types::Point2D;
use crate::config::NavigatorConfig;

/// Wheel-rate pair sent to the motors, in rad/s
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotorCommand {
    pub left: f64,
    pub right: f64,
}

impl MotorCommand {
    /// Both wheels at rest
    pub const STOP: MotorCommand = MotorCommand {
        left: 0.0,
        right: 0.0,
    };

    pub fn new(left: f64, right: f64) -> Self {
        MotorCommand { left, right }
    }

    /// Saturate each wheel independently to +-max_speed
    pub fn clamped(self, max_speed: f64) -> Self {
        MotorCommand {
            left: self.left.clamp(-max_speed, max_speed),
            right: self.right.clamp(-max_speed, max_speed),
        }
    }

    /// Body twist (linear m/s, angular rad/s) produced by this command
    pub fn to_twist(&self, wheel_radius: f64, wheel_separation: f64) -> (f64, f64) {
        let linear = wheel_radius * (self.left + self.right) / 2.0;
        let angular = wheel_radius * (self.right - self.left) / wheel_separation;
        (linear, angular)
    }
}

/// Raw outputs of the two PID loops for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidOutput {
    pub velocity: f64,
    pub orientation: f64,
}

/// Goal-seeking controller for differential drive robots.
///
/// Runs a heading PID and a distance PID and mixes them into wheel rates.
/// Obstacle overrides are applied by the caller; this type only knows the
/// goal-seeking law and the speed limits.
#[derive(Debug, Clone)]
pub struct DifferentialDriveController {
    orientation_pid: PidController,
    velocity_pid: PidController,
    distance_norm: f64,
    heading_boost: f64,
    orientation_threshold: f64,
    max_wheel_speed: f64,
    scene_limit: f64,
    scene_limit_speed_factor: f64,
}

impl DifferentialDriveController {
    /// Create a new controller
    pub fn new(config: &NavigatorConfig) -> Self {
        DifferentialDriveController {
            orientation_pid: PidController::new(config.orientation_pid, config.integral_limit),
            velocity_pid: PidController::new(config.velocity_pid, config.integral_limit),
            distance_norm: config.distance_norm,
            heading_boost: config.heading_boost,
            orientation_threshold: config.orientation_threshold,
            max_wheel_speed: config.max_wheel_speed,
            scene_limit: config.scene_limit,
            scene_limit_speed_factor: config.scene_limit_speed_factor,
        }
    }

    /// Advance both PID loops by one tick
    pub fn compute_pid(&mut self, distance: f64, heading_error: f64) -> PidOutput {
        let orientation = self.orientation_pid.update(heading_error);
        // Normalized so far targets cannot request unbounded speed
        let velocity_error = (distance / self.distance_norm).min(1.0);
        let velocity = self.velocity_pid.update(velocity_error);
        PidOutput {
            velocity,
            orientation,
        }
    }

    /// Goal-seeking wheel mix, before clamping
    pub fn mix(&self, output: PidOutput, heading_error: f64) -> MotorCommand {
        let mut left = output.velocity - output.orientation;
        let mut right = output.velocity + output.orientation;

        // A weak correction on a real heading error would otherwise never turn the robot
        if heading_error.abs() > self.orientation_threshold && output.orientation.abs() < 0.1 {
            let boost = self.heading_boost * heading_error.signum();
            left -= boost;
            right += boost;
        }

        MotorCommand::new(left, right)
    }

    /// Active wheel speed cap for the given position
    pub fn speed_cap(&self, position: &Point2D) -> f64 {
        if position.x.abs() > self.scene_limit || position.y.abs() > self.scene_limit {
            self.max_wheel_speed * self.scene_limit_speed_factor
        } else {
            self.max_wheel_speed
        }
    }

    /// Clear both PID accumulators
    pub fn reset(&mut self) {
        self.orientation_pid.reset();
        self.velocity_pid.reset();
    }

    pub fn orientation_state(&self) -> PidState {
        self.orientation_pid.state()
    }

    pub fn velocity_state(&self) -> PidState {
        self.velocity_pid.state()
    }
}
