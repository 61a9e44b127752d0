//! Navigator configuration
//!
//! All tunables of the controller live here. A config can be built from
//! defaults, loaded from a TOML file, and patched per parameter by name.

use crate::error::{NavigationError, Result};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Proportional, integral and derivative gains
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    /// Create a gain set
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        PidGains { kp, ki, kd }
    }

    fn is_finite(&self) -> bool {
        self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite()
    }
}

const ORIENTATION_GAINS: PidGains = PidGains::new(1.5, 0.01, 0.5);
const VELOCITY_GAINS: PidGains = PidGains::new(0.5, 0.01, 0.1);

/// A `[*_pid]` table as written in TOML; missing gains keep the loop's default
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct GainsTable {
    kp: Option<f64>,
    ki: Option<f64>,
    kd: Option<f64>,
}

impl GainsTable {
    fn or(self, fallback: PidGains) -> PidGains {
        PidGains {
            kp: self.kp.unwrap_or(fallback.kp),
            ki: self.ki.unwrap_or(fallback.ki),
            kd: self.kd.unwrap_or(fallback.kd),
        }
    }
}

fn orientation_gains<'de, D>(deserializer: D) -> std::result::Result<PidGains, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(GainsTable::deserialize(deserializer)?.or(ORIENTATION_GAINS))
}

fn velocity_gains<'de, D>(deserializer: D) -> std::result::Result<PidGains, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(GainsTable::deserialize(deserializer)?.or(VELOCITY_GAINS))
}

/// Which sonar indices belong to which detection zone.
///
/// The default reproduces the 16-sonar P3DX ring as calibrated in the
/// simulator scene. It is not derived from geometry; other rings need
/// their own table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorLayout {
    pub front: Vec<usize>,
    pub left: Vec<usize>,
    pub right: Vec<usize>,
}

impl Default for SensorLayout {
    fn default() -> Self {
        SensorLayout {
            front: (3..=7).collect(),
            left: (0..=4).chain(11..=15).collect(),
            right: (6..=9).collect(),
        }
    }
}

/// Timing and speeds of the stall escape maneuver
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EscapeConfig {
    pub stop_ms: u64,
    pub reverse_ms: u64,
    pub reverse_speed: f64,
    pub rotate_ms: u64,
    pub rotate_speed: f64,
    pub settle_ms: u64,
}

impl Default for EscapeConfig {
    fn default() -> Self {
        EscapeConfig {
            stop_ms: 100,
            reverse_ms: 500,
            reverse_speed: 0.5,
            rotate_ms: 800,
            rotate_speed: 0.5,
            settle_ms: 100,
        }
    }
}

/// Full navigator configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavigatorConfig {
    #[serde(deserialize_with = "orientation_gains")]
    pub orientation_pid: PidGains,
    #[serde(deserialize_with = "velocity_gains")]
    pub velocity_pid: PidGains,
    /// Symmetric clamp applied to both integral accumulators
    pub integral_limit: f64,
    /// Distance at which the velocity error saturates at 1.0
    pub distance_norm: f64,
    pub max_wheel_speed: f64,
    /// Wheel speed used by obstacle overrides
    pub turn_speed: f64,
    pub heading_boost: f64,
    pub distance_threshold: f64,
    pub orientation_threshold: f64,
    pub obstacle_threshold: f64,
    pub progress_epsilon: f64,
    pub no_progress_ticks: u32,
    pub differential_heading_threshold: f64,
    pub differential_speed_tolerance: f64,
    pub differential_stall_ticks: u32,
    pub tick_period_ms: u64,
    pub max_pose_failures: u32,
    /// Half extent of the scene; beyond it the speed cap is reduced
    pub scene_limit: f64,
    pub scene_limit_speed_factor: f64,
    pub wheel_radius: f64,
    pub wheel_separation: f64,
    pub escape: EscapeConfig,
    pub sensors: SensorLayout,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        NavigatorConfig {
            orientation_pid: ORIENTATION_GAINS,
            velocity_pid: VELOCITY_GAINS,
            integral_limit: 5.0,
            distance_norm: 2.0,
            max_wheel_speed: 0.8,
            turn_speed: 0.5,
            heading_boost: 0.2,
            distance_threshold: 0.1,
            orientation_threshold: 0.05,
            obstacle_threshold: 0.5,
            progress_epsilon: 0.01,
            no_progress_ticks: 10,
            differential_heading_threshold: 0.1,
            differential_speed_tolerance: 0.1,
            differential_stall_ticks: 20,
            tick_period_ms: 50,
            max_pose_failures: 10,
            scene_limit: 2.0,
            scene_limit_speed_factor: 0.3,
            wheel_radius: 0.0975,
            wheel_separation: 0.331,
            escape: EscapeConfig::default(),
            sensors: SensorLayout::default(),
        }
    }
}

impl NavigatorConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: NavigatorConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Control period as a `Duration`
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Override individual numeric parameters by name.
    ///
    /// All or nothing: on error `self` is left untouched.
    pub fn configure(&mut self, params: &HashMap<String, f64>) -> Result<()> {
        let mut next = self.clone();
        for (name, &value) in params {
            match name.as_str() {
                "orientation_kp" => next.orientation_pid.kp = value,
                "orientation_ki" => next.orientation_pid.ki = value,
                "orientation_kd" => next.orientation_pid.kd = value,
                "velocity_kp" => next.velocity_pid.kp = value,
                "velocity_ki" => next.velocity_pid.ki = value,
                "velocity_kd" => next.velocity_pid.kd = value,
                "integral_limit" => next.integral_limit = value,
                "distance_norm" => next.distance_norm = value,
                "max_wheel_speed" => next.max_wheel_speed = value,
                "turn_speed" => next.turn_speed = value,
                "heading_boost" => next.heading_boost = value,
                "distance_threshold" => next.distance_threshold = value,
                "orientation_threshold" => next.orientation_threshold = value,
                "obstacle_threshold" => next.obstacle_threshold = value,
                "progress_epsilon" => next.progress_epsilon = value,
                "no_progress_ticks" => next.no_progress_ticks = as_count(name, value)?,
                "differential_heading_threshold" => next.differential_heading_threshold = value,
                "differential_speed_tolerance" => next.differential_speed_tolerance = value,
                "differential_stall_ticks" => {
                    next.differential_stall_ticks = as_count(name, value)?
                }
                "tick_period_ms" => next.tick_period_ms = as_count(name, value)? as u64,
                "max_pose_failures" => next.max_pose_failures = as_count(name, value)?,
                "scene_limit" => next.scene_limit = value,
                "scene_limit_speed_factor" => next.scene_limit_speed_factor = value,
                _ => {
                    return Err(NavigationError::InvalidConfig(format!(
                        "unknown parameter '{}'",
                        name
                    )))
                }
            }
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Check that every parameter is in its legal range
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("integral_limit", self.integral_limit),
            ("distance_norm", self.distance_norm),
            ("max_wheel_speed", self.max_wheel_speed),
            ("turn_speed", self.turn_speed),
            ("distance_threshold", self.distance_threshold),
            ("obstacle_threshold", self.obstacle_threshold),
            ("progress_epsilon", self.progress_epsilon),
            ("scene_limit", self.scene_limit),
            ("wheel_radius", self.wheel_radius),
            ("wheel_separation", self.wheel_separation),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(invalid(format!("{} must be positive", name)));
            }
        }

        if self.turn_speed > self.max_wheel_speed {
            return Err(invalid("turn_speed must not exceed max_wheel_speed"));
        }
        if self.escape.reverse_speed > self.max_wheel_speed
            || self.escape.rotate_speed > self.max_wheel_speed
        {
            return Err(invalid("escape speeds must not exceed max_wheel_speed"));
        }
        if !(self.scene_limit_speed_factor > 0.0 && self.scene_limit_speed_factor <= 1.0) {
            return Err(invalid("scene_limit_speed_factor must be in (0, 1]"));
        }
        if self.heading_boost < 0.0 || self.orientation_threshold < 0.0 {
            return Err(invalid("heading_boost and orientation_threshold must be non-negative"));
        }
        if !self.orientation_pid.is_finite() || !self.velocity_pid.is_finite() {
            return Err(invalid("PID gains must be finite"));
        }
        if self.tick_period_ms == 0 {
            return Err(invalid("tick_period_ms must be positive"));
        }
        Ok(())
    }
}

fn as_count(name: &str, value: f64) -> Result<u32> {
    if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(invalid(format!("{} must be a non-negative integer", name)));
    }
    Ok(value as u32)
}

fn invalid(message: impl Into<String>) -> NavigationError {
    NavigationError::InvalidConfig(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = NavigatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_period(), Duration::from_millis(50));
        assert_eq!(config.sensors.front, vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let config = NavigatorConfig::from_toml_str(include_str!("../config/navigator.toml"))
            .expect("shipped config parses");
        assert_eq!(config, NavigatorConfig::default());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let text = r#"
max_wheel_speed = 1.2
no_progress_ticks = 15

[orientation_pid]
kp = 2.0
ki = 0.0
kd = 0.3

[escape]
rotate_ms = 1200
"#;
        let config = NavigatorConfig::from_toml_str(text).expect("valid config");
        assert_eq!(config.max_wheel_speed, 1.2);
        assert_eq!(config.no_progress_ticks, 15);
        assert_eq!(config.orientation_pid, PidGains::new(2.0, 0.0, 0.3));
        assert_eq!(config.velocity_pid, PidGains::new(0.5, 0.01, 0.1));
        assert_eq!(config.escape.rotate_ms, 1200);
        assert_eq!(config.escape.reverse_ms, 500);
    }

    #[test]
    fn partial_gain_table_keeps_other_gains() {
        let text = r#"
[orientation_pid]
kp = 2.0

[velocity_pid]
kd = 0.0
"#;
        let config = NavigatorConfig::from_toml_str(text).expect("valid config");
        assert_eq!(config.orientation_pid, PidGains::new(2.0, 0.01, 0.5));
        assert_eq!(config.velocity_pid, PidGains::new(0.5, 0.01, 0.0));
    }

    #[test]
    fn rejects_unknown_keys() {
        for text in [
            "obstacle_treshold = 0.9",
            "[escape]\nrotate_time = 5",
            "[orientation_pid]\nkf = 1.0",
            "[sensors]\nrear = [10]",
        ] {
            let err = NavigatorConfig::from_toml_str(text).unwrap_err();
            assert!(matches!(err, NavigationError::ConfigParse(_)), "{}", text);
        }
    }

    #[test]
    fn rejects_non_positive_threshold() {
        let err = NavigatorConfig::from_toml_str("obstacle_threshold = 0.0").unwrap_err();
        assert!(matches!(err, NavigationError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = NavigatorConfig::from_toml_str("max_wheel_speed = \"fast\"").unwrap_err();
        assert!(matches!(err, NavigationError::ConfigParse(_)));
    }

    #[test]
    fn configure_overrides_by_name() {
        let mut config = NavigatorConfig::default();
        let mut params = HashMap::new();
        params.insert("orientation_kp".to_string(), 2.5);
        params.insert("no_progress_ticks".to_string(), 4.0);
        config.configure(&params).expect("known parameters");
        assert_eq!(config.orientation_pid.kp, 2.5);
        assert_eq!(config.no_progress_ticks, 4);
    }

    #[test]
    fn configure_rejects_unknown_and_fractional() {
        let mut config = NavigatorConfig::default();
        let mut params = HashMap::new();
        params.insert("warp_factor".to_string(), 9.0);
        assert!(config.configure(&params).is_err());

        let mut params = HashMap::new();
        params.insert("max_pose_failures".to_string(), 2.5);
        assert!(config.configure(&params).is_err());
        assert_eq!(config, NavigatorConfig::default());
    }

    #[test]
    fn rejected_configure_leaves_config_unchanged() {
        let mut config = NavigatorConfig::default();
        let mut params = HashMap::new();
        params.insert("orientation_kp".to_string(), 3.0);
        params.insert("max_wheel_speed".to_string(), -1.0);
        assert!(config.configure(&params).is_err());
        assert_eq!(config, NavigatorConfig::default());

        let mut params = HashMap::new();
        params.insert("max_wheel_speed".to_string(), f64::NAN);
        assert!(config.configure(&params).is_err());
        assert_eq!(config.max_wheel_speed, 0.8);
    }
}
