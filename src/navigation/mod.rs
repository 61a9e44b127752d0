//! Navigation module: goal tracking, stall recovery and the control loop
pub mod controller;
pub mod runner;
pub mod stall;
pub mod tracker;

pub use self::controller::{ControllerState, NavigationController, NavigationStatus};
pub use self::runner::NavigationRunner;
pub use self::stall::{EscapeManeuver, EscapePhase, EscapePlan, StallDetector, StallKind};
pub use self::tracker::{track, TrackingError};
