//! Global configuration constants and the serializable solver configuration.

use serde::{Deserialize, Serialize};

/// Default integration timestep (in seconds).
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;

/// Number of relaxation passes performed per step.
pub const DEFAULT_SOLVER_ITERATIONS: u32 = 10;

/// Default fraction of joint error left uncorrected after one second, `(1 - 0.1)^60`.
pub const DEFAULT_ERROR_BIAS: f32 = 0.001_797_010_3;

/// Joints are unbounded in force by default.
pub const DEFAULT_MAX_FORCE: f32 = f32::INFINITY;

/// Joints may correct error at any speed by default.
pub const DEFAULT_MAX_BIAS: f32 = f32::INFINITY;

/// Timesteps smaller than this are treated as zero by the bias helpers.
pub const DT_EPSILON: f32 = 1e-6;

/// Default damping applied to linear velocity (fraction lost per second).
pub const DEFAULT_LINEAR_DAMPING: f32 = 0.0;

/// Default damping applied to angular velocity (fraction lost per second).
pub const DEFAULT_ANGULAR_DAMPING: f32 = 0.0;

/// Islands idle for this long fall asleep. Infinite disables sleeping.
pub const DEFAULT_SLEEP_TIME_THRESHOLD: f32 = f32::INFINITY;

/// Speed below which a body counts as idle.
pub const DEFAULT_IDLE_SPEED_THRESHOLD: f32 = 0.05;

/// Step loop settings for a [`World`](crate::world::World).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub time_step: f32,
    pub iterations: u32,
    pub sleep_time_threshold: f32,
    pub idle_speed_threshold: f32,
    /// Runs relaxation passes per graph color on the rayon pool.
    pub parallel: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_step: DEFAULT_TIME_STEP,
            iterations: DEFAULT_SOLVER_ITERATIONS,
            sleep_time_threshold: DEFAULT_SLEEP_TIME_THRESHOLD,
            idle_speed_threshold: DEFAULT_IDLE_SPEED_THRESHOLD,
            parallel: false,
        }
    }
}
