//! Common utilities and types for the P3DX navigator

use std::f64::consts::PI;

/// Common types used across the codebase
pub mod types {
    use nalgebra::Point2;

    /// A 2D point in the ground frame
    pub type Point2D = Point2<f64>;

    /// Planar robot pose: position plus yaw in radians
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Pose {
        pub position: Point2D,
        pub yaw: f64,
    }

    impl Pose {
        /// Create a pose, normalizing the yaw into (-pi, pi]
        pub fn new(x: f64, y: f64, yaw: f64) -> Self {
            Pose {
                position: Point2D::new(x, y),
                yaw: super::normalize_angle(yaw),
            }
        }
    }

    /// Direction of an in-place rotation, seen from above
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum TurnDirection {
        Left,
        Right,
    }

    impl TurnDirection {
        /// Wheel rates (left, right) spinning the robot in place at `speed`
        pub fn spin(self, speed: f64) -> (f64, f64) {
            match self {
                TurnDirection::Left => (-speed, speed),
                TurnDirection::Right => (speed, -speed),
            }
        }
    }
}

/// Normalize an angle into (-pi, pi] by repeated 2*pi adjustment
pub fn normalize_angle(mut angle: f64) -> f64 {
    if !angle.is_finite() {
        return angle;
    }
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normalized_difference_stays_in_half_open_range() {
        let samples = [-7.5, -PI, -3.0, -0.2, 0.0, 0.4, 3.0, PI, 9.1, 25.0];
        for &h1 in &samples {
            for &h2 in &samples {
                let e = normalize_angle(h1 - h2);
                assert!(e > -PI && e <= PI, "{h1} - {h2} -> {e}");
            }
        }
    }

    #[test]
    fn minus_pi_maps_to_pi() {
        assert_relative_eq!(normalize_angle(-PI), PI);
    }

    #[test]
    fn pose_yaw_is_normalized() {
        let pose = types::Pose::new(1.0, 2.0, 2.0 * PI + 0.5);
        assert_relative_eq!(pose.yaw, 0.5, epsilon = 1e-12);
    }
}
