use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::body::{Body, BodyHandle};
use super::gear_joint::GearJoint;
use crate::config::{DEFAULT_ERROR_BIAS, DEFAULT_MAX_BIAS, DEFAULT_MAX_FORCE};
use crate::utils::allocator::Handle;

pub type ConstraintHandle = Handle<Constraint>;

/// Tuning shared by every joint type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintParams {
    /// Largest force the joint may apply; impulses are capped at `max_force * dt`.
    pub max_force: f32,
    /// Largest speed at which positional error is corrected.
    pub max_bias: f32,
    /// Fraction of error left uncorrected after one second, in `(0, 1)`.
    pub error_bias: f32,
}

impl Default for ConstraintParams {
    fn default() -> Self {
        Self {
            max_force: DEFAULT_MAX_FORCE,
            max_bias: DEFAULT_MAX_BIAS,
            error_bias: DEFAULT_ERROR_BIAS,
        }
    }
}

/// Solver interface implemented by every joint type.
///
/// Each step the world calls [`pre_step`](Joint::pre_step) once,
/// [`apply_cached_impulse`](Joint::apply_cached_impulse) once, then
/// [`apply_impulse`](Joint::apply_impulse) once per relaxation pass. Joints
/// never own their bodies; the solver lends them for the duration of a call.
pub trait Joint: Send + Sync + 'static {
    /// Human readable type name used in diagnostics.
    fn type_name(&self) -> &'static str;

    /// Precomputes step-invariant terms. Must not modify body velocities.
    fn pre_step(&mut self, params: &ConstraintParams, a: &Body, b: &Body, dt: f32);

    /// Reapplies last step's accumulated impulse scaled by `dt_coef`.
    fn apply_cached_impulse(&self, a: &mut Body, b: &mut Body, dt_coef: f32);

    /// One Gauss-Seidel pass.
    fn apply_impulse(&mut self, params: &ConstraintParams, a: &mut Body, b: &mut Body, dt: f32);

    /// Magnitude of the accumulated impulse from the last step.
    fn impulse(&self) -> f32;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A joint attached to two bodies of a [`World`](crate::world::World).
pub struct Constraint {
    body_a: BodyHandle,
    body_b: BodyHandle,
    pub params: ConstraintParams,
    joint: Box<dyn Joint>,
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("type", &self.joint.type_name())
            .field("body_a", &self.body_a)
            .field("body_b", &self.body_b)
            .field("params", &self.params)
            .finish()
    }
}

impl Constraint {
    pub fn new<J: Joint>(body_a: BodyHandle, body_b: BodyHandle, joint: J) -> Self {
        Self {
            body_a,
            body_b,
            params: ConstraintParams::default(),
            joint: Box::new(joint),
        }
    }

    pub fn with_params(mut self, params: ConstraintParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_max_force(mut self, max_force: f32) -> Self {
        self.params.max_force = max_force;
        self
    }

    pub fn with_max_bias(mut self, max_bias: f32) -> Self {
        self.params.max_bias = max_bias;
        self
    }

    pub fn with_error_bias(mut self, error_bias: f32) -> Self {
        self.params.error_bias = error_bias;
        self
    }

    pub fn bodies(&self) -> (BodyHandle, BodyHandle) {
        (self.body_a, self.body_b)
    }

    pub fn body_a(&self) -> BodyHandle {
        self.body_a
    }

    pub fn body_b(&self) -> BodyHandle {
        self.body_b
    }

    pub fn joint(&self) -> &dyn Joint {
        self.joint.as_ref()
    }

    pub fn type_name(&self) -> &'static str {
        self.joint.type_name()
    }

    /// Magnitude of the impulse applied during the last step.
    pub fn impulse(&self) -> f32 {
        self.joint.impulse()
    }

    pub fn is<J: Joint>(&self) -> bool {
        self.joint.as_any().is::<J>()
    }

    pub fn downcast_ref<J: Joint>(&self) -> Option<&J> {
        self.joint.as_any().downcast_ref::<J>()
    }

    pub fn downcast_mut<J: Joint>(&mut self) -> Option<&mut J> {
        self.joint.as_any_mut().downcast_mut::<J>()
    }

    pub fn is_gear_joint(&self) -> bool {
        self.is::<GearJoint>()
    }

    pub fn as_gear_joint(&self) -> Option<&GearJoint> {
        self.downcast_ref::<GearJoint>()
    }

    pub fn as_gear_joint_mut(&mut self) -> Option<&mut GearJoint> {
        self.downcast_mut::<GearJoint>()
    }

    /// The gear joint behind this constraint.
    ///
    /// # Panics
    ///
    /// Panics if the constraint holds a different joint type.
    pub fn gear_joint(&self) -> &GearJoint {
        let found = self.type_name();
        match self.as_gear_joint() {
            Some(gear) => gear,
            None => panic!("constraint is not a gear joint (found {found})"),
        }
    }

    /// Mutable access to the gear joint behind this constraint.
    ///
    /// # Panics
    ///
    /// Panics if the constraint holds a different joint type.
    pub fn gear_joint_mut(&mut self) -> &mut GearJoint {
        let found = self.type_name();
        match self.as_gear_joint_mut() {
            Some(gear) => gear,
            None => panic!("constraint is not a gear joint (found {found})"),
        }
    }

    pub fn pre_step(&mut self, a: &Body, b: &Body, dt: f32) {
        self.joint.pre_step(&self.params, a, b, dt);
    }

    pub fn apply_cached_impulse(&self, a: &mut Body, b: &mut Body, dt_coef: f32) {
        self.joint.apply_cached_impulse(a, b, dt_coef);
    }

    pub fn apply_impulse(&mut self, a: &mut Body, b: &mut Body, dt: f32) {
        self.joint.apply_impulse(&self.params, a, b, dt);
    }
}
