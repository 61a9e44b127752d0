//! Stall detection and the randomized escape maneuver
//!
//! Two independent signals declare a stall:
//!
//! * no progress: the distance to target changes by less than `progress_epsilon`
//!   for more than `no_progress_ticks` consecutive ticks;
//! * differential: the heading error is large but the commanded wheel rates are
//!   nearly equal for more than `differential_stall_ticks` consecutive ticks.
//!
//! Either one starts an [`EscapeManeuver`]: stop, reverse, rotate in a random
//! direction, stop again. The maneuver is advanced by the control tick and runs
//! to completion before goal seeking resumes.

use crate::common::types::TurnDirection;
use crate::config::{EscapeConfig, NavigatorConfig};
use crate::control::MotorCommand;
use rand::Rng;
use std::time::Duration;

/// Which signal declared the stall
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallKind {
    NoProgress,
    Differential,
}

/// Counts consecutive stalled ticks for both stall signals
#[derive(Debug, Clone)]
pub struct StallDetector {
    progress_epsilon: f64,
    no_progress_ticks: u32,
    heading_threshold: f64,
    speed_tolerance: f64,
    differential_ticks: u32,
    previous_distance: Option<f64>,
    no_progress_count: u32,
    differential_count: u32,
}

impl StallDetector {
    /// Create a detector with both counters at zero
    pub fn new(config: &NavigatorConfig) -> Self {
        StallDetector {
            progress_epsilon: config.progress_epsilon,
            no_progress_ticks: config.no_progress_ticks,
            heading_threshold: config.differential_heading_threshold,
            speed_tolerance: config.differential_speed_tolerance,
            differential_ticks: config.differential_stall_ticks,
            previous_distance: None,
            no_progress_count: 0,
            differential_count: 0,
        }
    }

    /// Record this tick's distance; true once the no-progress count exceeds its limit
    pub fn observe_progress(&mut self, distance: f64) -> bool {
        let unchanged = self
            .previous_distance
            .is_some_and(|previous| (distance - previous).abs() < self.progress_epsilon);
        self.previous_distance = Some(distance);

        if !unchanged {
            self.no_progress_count = 0;
            return false;
        }
        self.no_progress_count += 1;
        if self.no_progress_count > self.no_progress_ticks {
            self.no_progress_count = 0;
            return true;
        }
        false
    }

    /// Record the clamped command; true once the robot has failed to turn for too long
    pub fn observe_command(&mut self, heading_error: f64, command: &MotorCommand) -> bool {
        let wants_turn = heading_error.abs() > self.heading_threshold;
        let not_turning = (command.left - command.right).abs() < self.speed_tolerance;
        if !(wants_turn && not_turning) {
            self.differential_count = 0;
            return false;
        }
        self.differential_count += 1;
        if self.differential_count > self.differential_ticks {
            self.differential_count = 0;
            return true;
        }
        false
    }

    /// Forget counters but keep the last distance, as after an escape
    pub fn clear_counters(&mut self) {
        self.no_progress_count = 0;
        self.differential_count = 0;
    }

    /// Forget everything, as for a new target
    pub fn reset(&mut self) {
        self.clear_counters();
        self.previous_distance = None;
    }

    pub fn no_progress_count(&self) -> u32 {
        self.no_progress_count
    }

    pub fn differential_count(&self) -> u32 {
        self.differential_count
    }

    pub fn previous_distance(&self) -> Option<f64> {
        self.previous_distance
    }
}

/// Recovery behaviors the planner can choose from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapePlan {
    ReverseThenRotate {
        direction: TurnDirection,
        duration: Duration,
    },
}

impl EscapePlan {
    /// Reverse-then-rotate with a coin-flip direction
    pub fn random<R: Rng + ?Sized>(rng: &mut R, rotate_for: Duration) -> Self {
        let direction = if rng.gen_bool(0.5) {
            TurnDirection::Left
        } else {
            TurnDirection::Right
        };
        EscapePlan::ReverseThenRotate {
            direction,
            duration: rotate_for,
        }
    }
}

/// Segment of the escape maneuver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapePhase {
    Stop,
    Reverse,
    Rotate,
    Settle,
}

/// A running escape maneuver, advanced one tick at a time
#[derive(Debug, Clone)]
pub struct EscapeManeuver {
    plan: EscapePlan,
    stop: Duration,
    reverse: Duration,
    settle: Duration,
    reverse_speed: f64,
    rotate_speed: f64,
    elapsed: Duration,
}

impl EscapeManeuver {
    /// Start `plan` from the beginning of its stop phase
    pub fn new(plan: EscapePlan, config: &EscapeConfig) -> Self {
        EscapeManeuver {
            plan,
            stop: Duration::from_millis(config.stop_ms),
            reverse: Duration::from_millis(config.reverse_ms),
            settle: Duration::from_millis(config.settle_ms),
            reverse_speed: config.reverse_speed.abs(),
            rotate_speed: config.rotate_speed.abs(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn plan(&self) -> EscapePlan {
        self.plan
    }

    /// Time spent in the maneuver so far
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Phase at the current elapsed time, or None once finished
    pub fn phase(&self) -> Option<EscapePhase> {
        let EscapePlan::ReverseThenRotate { duration, .. } = self.plan;
        let mut boundary = self.stop;
        if self.elapsed < boundary {
            return Some(EscapePhase::Stop);
        }
        boundary += self.reverse;
        if self.elapsed < boundary {
            return Some(EscapePhase::Reverse);
        }
        boundary += duration;
        if self.elapsed < boundary {
            return Some(EscapePhase::Rotate);
        }
        boundary += self.settle;
        if self.elapsed < boundary {
            return Some(EscapePhase::Settle);
        }
        None
    }

    /// Command for this tick, then advance by `dt`; None when the maneuver is over
    pub fn step(&mut self, dt: Duration) -> Option<MotorCommand> {
        let EscapePlan::ReverseThenRotate { direction, .. } = self.plan;
        let command = match self.phase()? {
            EscapePhase::Stop | EscapePhase::Settle => MotorCommand::STOP,
            EscapePhase::Reverse => MotorCommand::new(-self.reverse_speed, -self.reverse_speed),
            EscapePhase::Rotate => {
                let (left, right) = direction.spin(self.rotate_speed);
                MotorCommand::new(left, right)
            }
        };
        self.elapsed += dt;
        Some(command)
    }
}
