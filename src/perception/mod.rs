//! Perception module: sonar readings and obstacle classification
pub mod obstacles;
pub mod sensors;

pub use self::obstacles::{ObstacleAvoidance, ObstacleClassifier, ObstacleSide};
pub use self::sensors::{SensorReading, SensorZones};
