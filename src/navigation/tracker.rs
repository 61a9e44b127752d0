//! Pose/target tracking: distance and heading error each tick

use crate::common::normalize_angle;
use crate::common::types::{Point2D, Pose};

/// Geometric error between the robot and its target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingError {
    pub distance: f64,
    /// World-frame direction from robot to target
    pub bearing: f64,
    /// bearing - yaw, in (-pi, pi]
    pub heading_error: f64,
}

/// Error of `pose` relative to `target`
pub fn track(pose: &Pose, target: &Point2D) -> TrackingError {
    let delta = *target - pose.position;
    let bearing = delta.y.atan2(delta.x);
    TrackingError {
        distance: delta.norm(),
        bearing,
        heading_error: normalize_angle(bearing - pose.yaw),
    }
}
