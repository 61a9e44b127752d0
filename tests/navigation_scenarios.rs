mod common;

use approx::assert_relative_eq;
use common::ScriptedRobot;
use p3dx_navigator::navigation::EscapePlan;
use p3dx_navigator::{
    MotorCommand, NavigationController, NavigationStatus, NavigatorConfig, ObstacleSide, Point2D,
    Pose, SensorReading,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::f64::consts::FRAC_PI_2;

fn controller() -> NavigationController<StdRng> {
    NavigationController::with_rng(NavigatorConfig::default(), StdRng::seed_from_u64(42))
        .expect("default config is valid")
}

#[test]
fn facing_target_drives_straight() {
    let mut nav = controller();
    let mut robot = ScriptedRobot::new(Pose::new(0.0, 0.0, 0.0));
    nav.set_target(Point2D::new(2.0, 0.0));

    let command = nav.tick(&mut robot).expect("command sent");
    assert_relative_eq!(command.left, 0.61, epsilon = 1e-12);
    assert_relative_eq!(command.right, command.left);
    assert_eq!(robot.last_command(), Some(command));
    assert_relative_eq!(nav.last_distance().unwrap(), 2.0);
    assert_eq!(nav.status(), NavigationStatus::Navigating);
}

#[test]
fn target_on_the_left_turns_left_first() {
    let mut nav = controller();
    let robot_start = Pose::new(0.0, 0.0, 0.0);
    let mut robot = ScriptedRobot::new(robot_start);
    robot.push_pose(robot_start);
    robot.push_pose(Pose::new(0.0, 0.05, FRAC_PI_2));
    robot.push_pose(Pose::new(0.0, 0.1, FRAC_PI_2));
    nav.set_target(Point2D::new(0.0, 2.0));

    let first = nav.tick(&mut robot).unwrap();
    assert!(first.right > first.left);
    assert_relative_eq!(first.left, -0.8);
    assert_relative_eq!(first.right, 0.8);

    nav.tick(&mut robot);
    let facing = nav.tick(&mut robot).unwrap();
    assert!(facing.left > 0.0 && facing.right > 0.0);
}

#[test]
fn held_pose_triggers_escape_then_resumes() {
    let mut nav = controller();
    let mut robot = ScriptedRobot::new(Pose::new(0.0, 0.0, 0.0));
    nav.set_target(Point2D::new(2.0, 0.0));

    for _ in 0..11 {
        nav.tick(&mut robot);
        assert_eq!(nav.status(), NavigationStatus::Navigating);
    }
    let reads_before_escape = robot.pose_reads();

    let mut escape = vec![nav.tick(&mut robot).unwrap()];
    assert_eq!(nav.status(), NavigationStatus::Escaping);
    let Some(EscapePlan::ReverseThenRotate { .. }) = nav.escape().map(|e| e.plan()) else {
        panic!("escape maneuver should be running");
    };

    for _ in 0..29 {
        escape.push(nav.tick(&mut robot).unwrap());
        assert_eq!(nav.status(), NavigationStatus::Escaping);
    }
    // Escape does not consult the pose
    assert_eq!(robot.pose_reads(), reads_before_escape + 1);

    assert_eq!(escape[0], MotorCommand::STOP);
    assert!(escape[2..12]
        .iter()
        .all(|c| *c == MotorCommand::new(-0.5, -0.5)));
    for rotation in &escape[12..28] {
        assert_relative_eq!(rotation.left, -rotation.right);
        assert_relative_eq!(rotation.left.abs(), 0.5);
    }
    assert_eq!(escape[29], MotorCommand::STOP);

    nav.tick(&mut robot);
    assert_eq!(nav.status(), NavigationStatus::Navigating);
    assert!(nav.escape().is_none());
}

#[test]
fn arrival_stops_until_new_target() {
    let mut nav = controller();
    let mut robot = ScriptedRobot::new(Pose::new(1.5, 0.0, 0.0));
    robot.push_pose(Pose::new(1.5, 0.0, 0.0));
    robot.push_pose(Pose::new(1.95, 0.0, 0.0));
    nav.set_target(Point2D::new(2.0, 0.0));

    nav.tick(&mut robot);
    let command = nav.tick(&mut robot).unwrap();
    assert_eq!(nav.status(), NavigationStatus::Arrived);
    assert_eq!(command, MotorCommand::STOP);

    for _ in 0..5 {
        assert_eq!(nav.tick(&mut robot), Some(MotorCommand::STOP));
        assert_eq!(nav.status(), NavigationStatus::Arrived);
    }
    assert_eq!(robot.last_command(), Some(MotorCommand::STOP));

    nav.set_target(Point2D::new(0.0, 0.0));
    assert_eq!(nav.status(), NavigationStatus::Navigating);
    let resumed = nav.tick(&mut robot).unwrap();
    assert_ne!(resumed, MotorCommand::STOP);
}

#[test]
fn speeds_shrink_on_approach() {
    let mut nav = controller();
    let mut robot = ScriptedRobot::new(Pose::new(0.0, 0.0, 0.0));
    for k in 0..19 {
        robot.push_pose(Pose::new(0.1 * k as f64, 0.0, 0.0));
    }
    nav.set_target(Point2D::new(2.0, 0.0));

    let commands: Vec<_> = (0..19).map(|_| nav.tick(&mut robot).unwrap()).collect();
    for pair in commands.windows(2) {
        assert!(pair[1].left <= pair[0].left + 1e-12);
    }
    let last = commands.last().unwrap();
    assert!(last.left > 0.0 && last.left < 0.1);
    assert_relative_eq!(last.left, last.right);
}

#[test]
fn front_obstacle_overrides_goal_seeking() {
    let mut nav = controller();
    let mut robot = ScriptedRobot::new(Pose::new(0.0, 0.0, 0.0));
    robot.set_sensors(vec![SensorReading::hit(4, 0.3), SensorReading::clear(9)]);
    nav.set_target(Point2D::new(2.0, 0.0));

    let command = nav.tick(&mut robot).unwrap();
    assert_eq!(nav.obstacle_side(), ObstacleSide::Front);
    assert_eq!(command, MotorCommand::new(0.5, -0.5));
}

#[test]
fn sensor_failure_means_no_obstacle() {
    let mut nav = controller();
    let mut robot = ScriptedRobot::new(Pose::new(0.0, 0.0, 0.0));
    robot.set_sensors(vec![SensorReading::hit(4, 0.3)]);
    robot.fail_sensors(true);
    nav.set_target(Point2D::new(2.0, 0.0));

    let command = nav.tick(&mut robot).unwrap();
    assert_eq!(nav.obstacle_side(), ObstacleSide::None);
    assert_relative_eq!(command.left, 0.61, epsilon = 1e-12);
}

#[test]
fn pose_loss_stops_after_bound() {
    let mut nav = controller();
    let mut robot = ScriptedRobot::new(Pose::new(0.0, 0.0, 0.0));
    robot.push_pose_failures(11);
    nav.set_target(Point2D::new(2.0, 0.0));

    for failures in 1..=10 {
        assert_eq!(nav.tick(&mut robot), None);
        assert_eq!(nav.status(), NavigationStatus::Navigating);
        assert_eq!(nav.state().pose_failures, failures);
    }
    assert!(robot.commands().is_empty());

    assert_eq!(nav.tick(&mut robot), Some(MotorCommand::STOP));
    assert_eq!(nav.status(), NavigationStatus::Stopped);
    assert_eq!(robot.last_command(), Some(MotorCommand::STOP));
}

#[test]
fn pose_recovery_resets_failure_count() {
    let mut nav = controller();
    let mut robot = ScriptedRobot::new(Pose::new(0.0, 0.0, 0.0));
    robot.push_pose_failures(3);
    nav.set_target(Point2D::new(2.0, 0.0));

    for _ in 0..3 {
        nav.tick(&mut robot);
    }
    assert_eq!(nav.state().pose_failures, 3);
    assert!(nav.tick(&mut robot).is_some());
    assert_eq!(nav.state().pose_failures, 0);
}

#[test]
fn rejected_wheel_command_keeps_navigating() {
    let mut nav = controller();
    let mut robot = ScriptedRobot::new(Pose::new(0.0, 0.0, 0.0));
    robot.fail_actuation(true);
    nav.set_target(Point2D::new(2.0, 0.0));

    assert!(nav.tick(&mut robot).is_some());
    assert_eq!(nav.status(), NavigationStatus::Navigating);
    assert!(robot.commands().is_empty());

    robot.fail_actuation(false);
    robot.push_pose(Pose::new(0.1, 0.0, 0.0));
    nav.tick(&mut robot);
    assert_eq!(robot.commands().len(), 1);
}

#[test]
fn stop_during_escape_is_immediate() {
    let mut nav = controller();
    let mut robot = ScriptedRobot::new(Pose::new(0.0, 0.0, 0.0));
    nav.set_target(Point2D::new(2.0, 0.0));
    for _ in 0..14 {
        nav.tick(&mut robot);
    }
    assert_eq!(nav.status(), NavigationStatus::Escaping);

    nav.cancel(&mut robot);
    assert_eq!(nav.status(), NavigationStatus::Stopped);
    assert!(nav.escape().is_none());
    assert_eq!(robot.last_command(), Some(MotorCommand::STOP));
}

#[test]
fn scene_edge_limits_speed() {
    let mut nav = controller();
    let mut robot = ScriptedRobot::new(Pose::new(2.2, 0.0, 0.0));
    nav.set_target(Point2D::new(0.0, 0.0));

    let command = nav.tick(&mut robot).unwrap();
    assert!(command.left.abs() <= 0.24 + 1e-12);
    assert!(command.right.abs() <= 0.24 + 1e-12);
}
