use std::any::Any;

use super::body::Body;
use super::constraints::{ConstraintParams, Joint};
use crate::utils::math::{baumgarte_bias, fclamp};

/// Keeps the angular velocity of body B at a fixed ratio of body A's.
///
/// Solves `angle_b * ratio - angle_a - phase = 0`. `ratio` must be non-zero;
/// a zero ratio is not checked and produces non-finite impulses.
#[derive(Debug, Clone)]
pub struct GearJoint {
    phase: f32,
    ratio: f32,
    ratio_inv: f32,

    i_sum: f32,
    bias: f32,
    j_acc: f32,
}

impl GearJoint {
    pub fn new(phase: f32, ratio: f32) -> Self {
        Self {
            phase,
            ratio,
            ratio_inv: 1.0 / ratio,
            i_sum: 0.0,
            bias: 0.0,
            j_acc: 0.0,
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn ratio_inv(&self) -> f32 {
        self.ratio_inv
    }

    /// Effective inertia computed by the last `pre_step`.
    pub fn effective_inertia(&self) -> f32 {
        self.i_sum
    }

    /// Target correction velocity computed by the last `pre_step`.
    pub fn bias(&self) -> f32 {
        self.bias
    }

    /// Signed accumulated impulse carried into the next step's warm start.
    pub fn accumulated_impulse(&self) -> f32 {
        self.j_acc
    }

    // Mutators stay crate-private: the world wakes both bodies around them.
    // The accumulated impulse is kept across geometry changes.
    pub(crate) fn set_phase(&mut self, phase: f32) {
        self.phase = phase;
    }

    pub(crate) fn set_ratio(&mut self, ratio: f32) {
        self.ratio = ratio;
        self.ratio_inv = 1.0 / ratio;
    }

    fn apply(&self, a: &mut Body, b: &mut Body, j: f32) {
        a.angular_velocity -= j * a.inverse_inertia * self.ratio_inv;
        b.angular_velocity += j * b.inverse_inertia;
    }
}

impl Joint for GearJoint {
    fn type_name(&self) -> &'static str {
        "GearJoint"
    }

    fn pre_step(&mut self, params: &ConstraintParams, a: &Body, b: &Body, dt: f32) {
        self.i_sum = 1.0 / (a.inverse_inertia * self.ratio_inv + self.ratio * b.inverse_inertia);

        let error = b.angle * self.ratio - a.angle - self.phase;
        self.bias = baumgarte_bias(params.error_bias, dt, error, params.max_bias);
    }

    fn apply_cached_impulse(&self, a: &mut Body, b: &mut Body, dt_coef: f32) {
        self.apply(a, b, self.j_acc * dt_coef);
    }

    fn apply_impulse(&mut self, params: &ConstraintParams, a: &mut Body, b: &mut Body, dt: f32) {
        let wr = b.angular_velocity * self.ratio - a.angular_velocity;
        let j_max = params.max_force * dt;

        // Clamp the running total, then apply only what actually changed.
        let j = (self.bias - wr) * self.i_sum;
        let j_old = self.j_acc;
        self.j_acc = fclamp(j_old + j, -j_max, j_max);

        self.apply(a, b, self.j_acc - j_old);
    }

    fn impulse(&self) -> f32 {
        self.j_acc.abs()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
