//! Goal navigation state machine
//!
//! `NavigationController` owns all per-run state and is advanced by an external
//! scheduler, one call to [`NavigationController::tick`] per control period.
//!
//! ```text
//! Idle --set_target--> Navigating <--> Escaping
//!                          |
//!                          +--> Arrived   (distance below threshold)
//! any non-terminal --stop--> Stopped
//! ```

use super::stall::{EscapeManeuver, EscapePlan, StallDetector, StallKind};
use super::tracker::track;
use crate::common::types::{Point2D, Pose, TurnDirection};
use crate::config::NavigatorConfig;
use crate::control::{DifferentialDriveController, MotorCommand, PidState};
use crate::error::Result;
use crate::perception::{ObstacleAvoidance, ObstacleSide, SensorReading};
use crate::robot::RobotInterface;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Observable navigation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationStatus {
    Idle,
    Navigating,
    Escaping,
    Arrived,
    Stopped,
}

impl NavigationStatus {
    /// Arrived or Stopped
    pub fn is_terminal(self) -> bool {
        matches!(self, NavigationStatus::Arrived | NavigationStatus::Stopped)
    }

    /// True while the control loop should keep ticking
    pub fn is_active(self) -> bool {
        matches!(self, NavigationStatus::Navigating | NavigationStatus::Escaping)
    }
}

/// Snapshot of the controller's accumulated state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerState {
    pub orientation: PidState,
    pub velocity: PidState,
    pub no_progress_count: u32,
    pub differential_count: u32,
    pub previous_distance: Option<f64>,
    pub obstacle_side: ObstacleSide,
    pub committed_turn: Option<TurnDirection>,
    pub pose_failures: u32,
}

/// Drives the robot toward one target at a time, advanced by [`tick`](Self::tick)
pub struct NavigationController<R = StdRng> {
    config: NavigatorConfig,
    status: NavigationStatus,
    target: Option<Point2D>,
    drive: DifferentialDriveController,
    avoidance: ObstacleAvoidance,
    stall: StallDetector,
    escape: Option<EscapeManeuver>,
    obstacle_side: ObstacleSide,
    last_distance: Option<f64>,
    pose_failures: u32,
    rng: R,
}

impl NavigationController<StdRng> {
    /// Create a controller with an entropy-seeded escape direction source
    pub fn new(config: NavigatorConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl<R: Rng> NavigationController<R> {
    /// Create a controller drawing escape directions from `rng`.
    ///
    /// Fails if `config` does not pass [`NavigatorConfig::validate`].
    pub fn with_rng(config: NavigatorConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(NavigationController {
            drive: DifferentialDriveController::new(&config),
            avoidance: ObstacleAvoidance::new(&config),
            stall: StallDetector::new(&config),
            config,
            status: NavigationStatus::Idle,
            target: None,
            escape: None,
            obstacle_side: ObstacleSide::None,
            last_distance: None,
            pose_failures: 0,
            rng,
        })
    }

    /// Start a fresh run toward `target`, discarding all accumulated error
    pub fn set_target(&mut self, target: Point2D) {
        self.target = Some(target);
        self.drive.reset();
        self.avoidance.reset();
        self.stall.reset();
        self.escape = None;
        self.obstacle_side = ObstacleSide::None;
        self.last_distance = None;
        self.pose_failures = 0;
        self.status = NavigationStatus::Navigating;
        info!(x = target.x, y = target.y, "navigation target set");
    }

    /// Cancel the run. Returns false if already terminal.
    pub fn stop(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.escape = None;
        self.status = NavigationStatus::Stopped;
        info!("navigation stopped");
        true
    }

    /// Cancel the run and command the wheels to zero
    pub fn cancel<B: RobotInterface + ?Sized>(&mut self, robot: &mut B) {
        self.stop();
        apply(robot, MotorCommand::STOP);
    }

    pub fn status(&self) -> NavigationStatus {
        self.status
    }

    /// Current target, kept after arrival or stop
    pub fn target(&self) -> Option<Point2D> {
        self.target
    }

    /// Distance to target from the most recent pose
    pub fn last_distance(&self) -> Option<f64> {
        self.last_distance
    }

    pub fn obstacle_side(&self) -> ObstacleSide {
        self.obstacle_side
    }

    /// The running escape maneuver, if any
    pub fn escape(&self) -> Option<&EscapeManeuver> {
        self.escape.as_ref()
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// Snapshot of PID, stall and avoidance state
    pub fn state(&self) -> ControllerState {
        ControllerState {
            orientation: self.drive.orientation_state(),
            velocity: self.drive.velocity_state(),
            no_progress_count: self.stall.no_progress_count(),
            differential_count: self.stall.differential_count(),
            previous_distance: self.stall.previous_distance(),
            obstacle_side: self.obstacle_side,
            committed_turn: self.avoidance.committed_turn(),
            pose_failures: self.pose_failures,
        }
    }

    /// Run one control period against the robot.
    ///
    /// Returns the command sent to the wheels, or None when nothing was sent
    /// (idle, or the pose read failed).
    pub fn tick<B: RobotInterface + ?Sized>(&mut self, robot: &mut B) -> Option<MotorCommand> {
        match self.status {
            NavigationStatus::Idle => return None,
            NavigationStatus::Arrived | NavigationStatus::Stopped => {
                apply(robot, MotorCommand::STOP);
                return Some(MotorCommand::STOP);
            }
            NavigationStatus::Escaping => {
                if let Some(command) = self.step_escape() {
                    apply(robot, command);
                    return Some(command);
                }
            }
            NavigationStatus::Navigating => {}
        }

        let pose = match robot.read_pose() {
            Ok(pose) => {
                self.pose_failures = 0;
                pose
            }
            Err(err) => {
                self.pose_failures += 1;
                warn!(failures = self.pose_failures, error = %err, "skipping tick");
                if self.pose_failures > self.config.max_pose_failures {
                    warn!("pose unavailable for too long, giving up");
                    self.cancel(robot);
                    return Some(MotorCommand::STOP);
                }
                return None;
            }
        };

        let readings = robot.read_sensors().unwrap_or_else(|err| {
            debug!(error = %err, "sensors unavailable, assuming clear");
            Vec::new()
        });

        let command = self.compute(&pose, &readings);
        apply(robot, command);
        Some(command)
    }

    /// Control law for one period, given this tick's pose and sonar sweep
    pub fn compute(&mut self, pose: &Pose, readings: &[SensorReading]) -> MotorCommand {
        if self.status == NavigationStatus::Escaping {
            if let Some(command) = self.step_escape() {
                return command;
            }
        }
        let target = match (self.status, self.target) {
            (NavigationStatus::Navigating, Some(target)) => target,
            _ => return MotorCommand::STOP,
        };

        let error = track(pose, &target);
        self.last_distance = Some(error.distance);

        if error.distance < self.config.distance_threshold {
            self.status = NavigationStatus::Arrived;
            info!(distance = error.distance, "target reached");
            return MotorCommand::STOP;
        }

        if self.stall.observe_progress(error.distance) {
            return self.begin_escape(StallKind::NoProgress);
        }

        let side = self.avoidance.classify(readings);
        self.obstacle_side = side;

        let pid = self.drive.compute_pid(error.distance, error.heading_error);
        let command = self
            .avoidance
            .override_for(side)
            .unwrap_or_else(|| self.drive.mix(pid, error.heading_error))
            .clamped(self.drive.speed_cap(&pose.position));

        if self.stall.observe_command(error.heading_error, &command) {
            return self.begin_escape(StallKind::Differential);
        }

        let (linear, angular) =
            command.to_twist(self.config.wheel_radius, self.config.wheel_separation);
        trace!(
            distance = error.distance,
            heading_error = error.heading_error,
            orientation_control = pid.orientation,
            velocity_control = pid.velocity,
            left = command.left,
            right = command.right,
            linear,
            angular,
            "control tick"
        );
        command
    }

    fn begin_escape(&mut self, kind: StallKind) -> MotorCommand {
        let rotate_for = Duration::from_millis(self.config.escape.rotate_ms);
        let plan = EscapePlan::random(&mut self.rng, rotate_for);
        info!(?kind, ?plan, "stall detected, starting escape maneuver");

        self.stall.clear_counters();
        self.escape = Some(EscapeManeuver::new(plan, &self.config.escape));
        self.status = NavigationStatus::Escaping;
        self.step_escape().unwrap_or(MotorCommand::STOP)
    }

    /// Next escape command; on completion hands control back to navigation
    fn step_escape(&mut self) -> Option<MotorCommand> {
        let dt = self.config.tick_period();
        if let Some(command) = self.escape.as_mut().and_then(|escape| escape.step(dt)) {
            return Some(command);
        }
        self.escape = None;
        self.status = NavigationStatus::Navigating;
        info!("escape maneuver complete, resuming navigation");
        None
    }
}

fn apply<B: RobotInterface + ?Sized>(robot: &mut B, command: MotorCommand) {
    if let Err(err) = robot.set_wheel_speeds(command.left, command.right) {
        warn!(error = %err, "wheel command rejected");
    }
}
