use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use p3dx_navigator::{
    NavigationController, NavigationStatus, NavigatorConfig, Point2D, Pose, RobotInterface,
    SensorReading,
};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

/// Run the navigation controller against a frozen pose and print its commands
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// TOML config file; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Parameter override, e.g. --set orientation_kp=2.0
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Robot pose as x,y,yaw
    #[arg(long, default_value = "0,0,0", allow_hyphen_values = true)]
    pose: String,

    /// Target as x,y
    #[arg(long, allow_hyphen_values = true)]
    target: String,

    /// Sonar hit as index:range, repeatable
    #[arg(long = "hit", value_name = "INDEX:RANGE")]
    hits: Vec<String>,

    /// Number of control ticks to run
    #[arg(long, default_value_t = 1)]
    ticks: u32,
}

/// Robot that never moves; handy for inspecting the control law
struct FrozenRobot {
    pose: Pose,
    readings: Vec<SensorReading>,
}

impl RobotInterface for FrozenRobot {
    fn read_pose(&mut self) -> p3dx_navigator::Result<Pose> {
        Ok(self.pose)
    }

    fn read_sensors(&mut self) -> p3dx_navigator::Result<Vec<SensorReading>> {
        Ok(self.readings.clone())
    }

    fn set_wheel_speeds(&mut self, _left: f64, _right: f64) -> p3dx_navigator::Result<()> {
        Ok(())
    }
}

fn parse_floats(text: &str, expected: usize, what: &str) -> Result<Vec<f64>> {
    let values = text
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("invalid {}: '{}'", what, text))?;
    if values.len() != expected {
        bail!("{} needs {} comma-separated numbers, got '{}'", what, expected, text);
    }
    Ok(values)
}

fn parse_overrides(overrides: &[String]) -> Result<HashMap<String, f64>> {
    let mut params = HashMap::new();
    for entry in overrides {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("override '{}' is not KEY=VALUE", entry))?;
        let value = value
            .parse::<f64>()
            .with_context(|| format!("override '{}' has a non-numeric value", entry))?;
        params.insert(key.trim().to_string(), value);
    }
    Ok(params)
}

fn parse_hit(text: &str) -> Result<SensorReading> {
    let (index, range) = text
        .split_once(':')
        .ok_or_else(|| anyhow!("hit '{}' is not INDEX:RANGE", text))?;
    let index = index.parse().with_context(|| format!("bad sensor index in '{}'", text))?;
    let range = range.parse().with_context(|| format!("bad range in '{}'", text))?;
    Ok(SensorReading::hit(index, range))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => NavigatorConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => NavigatorConfig::default(),
    };
    let params = parse_overrides(&args.overrides)?;
    if !params.is_empty() {
        config.configure(&params)?;
    }

    let pose = parse_floats(&args.pose, 3, "pose")?;
    let target = parse_floats(&args.target, 2, "target")?;
    let readings = args
        .hits
        .iter()
        .map(|hit| parse_hit(hit))
        .collect::<Result<Vec<_>>>()?;

    let (wheel_radius, wheel_separation) = (config.wheel_radius, config.wheel_separation);
    let mut robot = FrozenRobot {
        pose: Pose::new(pose[0], pose[1], pose[2]),
        readings,
    };
    let mut controller = NavigationController::new(config)?;
    controller.set_target(Point2D::new(target[0], target[1]));

    for tick in 1..=args.ticks {
        let Some(command) = controller.tick(&mut robot) else {
            break;
        };
        let (linear, angular) = command.to_twist(wheel_radius, wheel_separation);
        info!(
            tick,
            status = ?controller.status(),
            obstacle = ?controller.obstacle_side(),
            distance = controller.last_distance().unwrap_or(f64::NAN),
            left = command.left,
            right = command.right,
            linear,
            angular,
            "command"
        );
        if controller.status() == NavigationStatus::Arrived {
            break;
        }
    }

    Ok(())
}
