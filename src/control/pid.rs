//! Discrete PID regulator with anti-windup clamp

use crate::config::PidGains;

/// Accumulated error state of one PID loop.
///
/// The loop runs once per control tick, so integral and derivative are
/// expressed per tick rather than per second.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidState {
    pub integral: f64,
    pub previous_error: f64,
}

/// A PID loop: gains plus its own accumulator
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    integral_limit: f64,
    state: PidState,
}

impl PidController {
    /// Create a loop whose integral is held within +-integral_limit
    pub fn new(gains: PidGains, integral_limit: f64) -> Self {
        PidController {
            gains,
            integral_limit: integral_limit.abs(),
            state: PidState::default(),
        }
    }

    /// Feed one error sample and return the control output
    pub fn update(&mut self, error: f64) -> f64 {
        self.state.integral =
            (self.state.integral + error).clamp(-self.integral_limit, self.integral_limit);
        let derivative = error - self.state.previous_error;
        self.state.previous_error = error;

        self.gains.kp * error + self.gains.ki * self.state.integral + self.gains.kd * derivative
    }

    /// Zero the integral and derivative history
    pub fn reset(&mut self) {
        self.state = PidState::default();
    }

    /// Current accumulator values
    pub fn state(&self) -> PidState {
        self.state
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }
}
