#![allow(dead_code)]

use p3dx_navigator::{MotorCommand, NavigationError, Pose, RobotInterface, SensorReading};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct Script {
    poses: VecDeque<Option<Pose>>,
    hold: Pose,
    sensors: Vec<SensorReading>,
    fail_sensors: bool,
    fail_actuation: bool,
    commands: Vec<MotorCommand>,
    pose_reads: usize,
}

/// Robot double replaying queued poses; the last good pose is held once the
/// queue runs dry. Clones share the same script, so a test can keep a handle
/// after moving the robot into a runner.
#[derive(Debug, Clone)]
pub struct ScriptedRobot {
    script: Arc<Mutex<Script>>,
}

impl ScriptedRobot {
    pub fn new(pose: Pose) -> Self {
        ScriptedRobot {
            script: Arc::new(Mutex::new(Script {
                poses: VecDeque::new(),
                hold: pose,
                sensors: Vec::new(),
                fail_sensors: false,
                fail_actuation: false,
                commands: Vec::new(),
                pose_reads: 0,
            })),
        }
    }

    pub fn push_pose(&self, pose: Pose) {
        self.script.lock().unwrap().poses.push_back(Some(pose));
    }

    pub fn push_pose_failures(&self, count: usize) {
        let mut script = self.script.lock().unwrap();
        for _ in 0..count {
            script.poses.push_back(None);
        }
    }

    pub fn set_sensors(&self, sensors: Vec<SensorReading>) {
        self.script.lock().unwrap().sensors = sensors;
    }

    pub fn fail_sensors(&self, fail: bool) {
        self.script.lock().unwrap().fail_sensors = fail;
    }

    pub fn fail_actuation(&self, fail: bool) {
        self.script.lock().unwrap().fail_actuation = fail;
    }

    pub fn commands(&self) -> Vec<MotorCommand> {
        self.script.lock().unwrap().commands.clone()
    }

    pub fn last_command(&self) -> Option<MotorCommand> {
        self.script.lock().unwrap().commands.last().copied()
    }

    pub fn pose_reads(&self) -> usize {
        self.script.lock().unwrap().pose_reads
    }
}

impl RobotInterface for ScriptedRobot {
    fn read_pose(&mut self) -> p3dx_navigator::Result<Pose> {
        let mut script = self.script.lock().unwrap();
        script.pose_reads += 1;
        match script.poses.pop_front() {
            Some(Some(pose)) => {
                script.hold = pose;
                Ok(pose)
            }
            Some(None) => Err(NavigationError::PoseUnavailable(
                "robot object missing".to_string(),
            )),
            None => Ok(script.hold),
        }
    }

    fn read_sensors(&mut self) -> p3dx_navigator::Result<Vec<SensorReading>> {
        let script = self.script.lock().unwrap();
        if script.fail_sensors {
            return Err(NavigationError::SensorUnavailable("no sonar handles".to_string()));
        }
        Ok(script.sensors.clone())
    }

    fn set_wheel_speeds(&mut self, left: f64, right: f64) -> p3dx_navigator::Result<()> {
        let mut script = self.script.lock().unwrap();
        if script.fail_actuation {
            return Err(NavigationError::ActuationError("invalid motor handle".to_string()));
        }
        script.commands.push(MotorCommand::new(left, right));
        Ok(())
    }
}
