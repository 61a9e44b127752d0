//! Obstacle side classification and the avoidance override

use super::sensors::SensorReading;
use crate::common::types::TurnDirection;
use crate::config::{NavigatorConfig, SensorLayout};
use crate::control::MotorCommand;
use tracing::debug;

/// Where the closest threat sits relative to the chassis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ObstacleSide {
    #[default]
    None,
    Front,
    Left,
    Right,
}

/// Turns a sonar sweep into a single obstacle side
#[derive(Debug, Clone)]
pub struct ObstacleClassifier {
    layout: SensorLayout,
    threshold: f64,
}

impl ObstacleClassifier {
    /// Readings closer than `threshold` count as hits
    pub fn new(layout: SensorLayout, threshold: f64) -> Self {
        ObstacleClassifier { layout, threshold }
    }

    /// Front wins, then exactly one side; both sides at once count as front
    pub fn classify(&self, readings: &[SensorReading]) -> ObstacleSide {
        let mut front = false;
        let mut left = false;
        let mut right = false;

        for reading in readings {
            if !reading.detected || !(reading.range < self.threshold) {
                continue;
            }
            let zones = self.layout.zones(reading.index);
            front |= zones.front;
            left |= zones.left;
            right |= zones.right;
        }

        match (front, left, right) {
            (true, _, _) | (false, true, true) => ObstacleSide::Front,
            (false, true, false) => ObstacleSide::Left,
            (false, false, true) => ObstacleSide::Right,
            (false, false, false) => ObstacleSide::None,
        }
    }
}

/// Classifier plus the override policy that acts on its output.
///
/// Remembers which way it last turned so a front obstacle met while
/// already veering keeps the robot rotating the same way.
#[derive(Debug, Clone)]
pub struct ObstacleAvoidance {
    classifier: ObstacleClassifier,
    turn_speed: f64,
    committed_turn: Option<TurnDirection>,
}

impl ObstacleAvoidance {
    /// Create the policy with no committed turn
    pub fn new(config: &NavigatorConfig) -> Self {
        ObstacleAvoidance {
            classifier: ObstacleClassifier::new(config.sensors.clone(), config.obstacle_threshold),
            turn_speed: config.turn_speed,
            committed_turn: None,
        }
    }

    /// See [`ObstacleClassifier::classify`]
    pub fn classify(&self, readings: &[SensorReading]) -> ObstacleSide {
        self.classifier.classify(readings)
    }

    /// Command replacing goal seeking for this side, or None to keep the PID mix
    pub fn override_for(&mut self, side: ObstacleSide) -> Option<MotorCommand> {
        let w = self.turn_speed;
        let command = match side {
            ObstacleSide::None => {
                self.committed_turn = None;
                return None;
            }
            ObstacleSide::Front => {
                let direction = self.committed_turn.unwrap_or(TurnDirection::Right);
                self.committed_turn = Some(direction);
                let (left, right) = direction.spin(w);
                MotorCommand::new(left, right)
            }
            ObstacleSide::Left => {
                self.committed_turn = Some(TurnDirection::Right);
                MotorCommand::new(w, -w / 2.0)
            }
            ObstacleSide::Right => {
                self.committed_turn = Some(TurnDirection::Left);
                MotorCommand::new(-w / 2.0, w)
            }
        };
        debug!(?side, left = command.left, right = command.right, "obstacle override");
        Some(command)
    }

    pub fn committed_turn(&self) -> Option<TurnDirection> {
        self.committed_turn
    }

    /// Drop the committed turn
    pub fn reset(&mut self) {
        self.committed_turn = None;
    }
}
