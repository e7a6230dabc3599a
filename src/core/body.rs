use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_ANGULAR_DAMPING, DEFAULT_LINEAR_DAMPING};
use crate::utils::allocator::Handle;

pub type BodyHandle = Handle<Body>;

/// How a body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BodyType {
    /// Moved by forces and constraint impulses.
    #[default]
    Dynamic,
    /// Infinite mass, moved only by its own velocity.
    Kinematic,
    /// Infinite mass, never moves.
    Static,
}

/// Planar rigid body state read and written by constraints.
///
/// Joints only touch `angle`, `angular_velocity` and `inverse_inertia`; the
/// linear state is carried so the integrator can advance whole bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub body_type: BodyType,
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    pub force: Vec2,
    pub torque: f32,
    pub inverse_mass: f32,
    pub inverse_inertia: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    is_awake: bool,
    idle_time: f32,
}

impl Default for Body {
    fn default() -> Self {
        Self::dynamic(1.0, 1.0)
    }
}

impl Body {
    /// Dynamic body with the given mass and moment of inertia.
    ///
    /// A zero mass or moment yields a zero inverse on that axis.
    pub fn dynamic(mass: f32, moment: f32) -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
            inverse_mass: safe_inverse(mass),
            inverse_inertia: safe_inverse(moment),
            linear_damping: DEFAULT_LINEAR_DAMPING,
            angular_damping: DEFAULT_ANGULAR_DAMPING,
            is_awake: true,
            idle_time: 0.0,
        }
    }

    pub fn kinematic() -> Self {
        Self {
            body_type: BodyType::Kinematic,
            inverse_mass: 0.0,
            inverse_inertia: 0.0,
            ..Self::dynamic(0.0, 0.0)
        }
    }

    pub fn new_static() -> Self {
        Self {
            body_type: BodyType::Static,
            ..Self::kinematic()
        }
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: f32) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn is_static(&self) -> bool {
        self.body_type == BodyType::Static
    }

    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    pub fn is_awake(&self) -> bool {
        self.is_awake
    }

    pub fn idle_time(&self) -> f32 {
        self.idle_time
    }

    /// Wakes the body and restarts its idle timer.
    pub fn activate(&mut self) {
        if self.is_static() {
            return;
        }
        self.is_awake = true;
        self.idle_time = 0.0;
    }

    /// Only dynamic bodies sleep; kinematic and static bodies stay as they are.
    pub(crate) fn sleep(&mut self) {
        if !self.is_dynamic() {
            return;
        }
        self.is_awake = false;
        self.velocity = Vec2::ZERO;
        self.angular_velocity = 0.0;
    }

    pub(crate) fn set_idle_time(&mut self, idle_time: f32) {
        self.idle_time = idle_time;
    }

    pub fn set_mass(&mut self, mass: f32) {
        self.inverse_mass = safe_inverse(mass);
    }

    pub fn set_moment(&mut self, moment: f32) {
        self.inverse_inertia = safe_inverse(moment);
    }

    pub fn apply_torque(&mut self, torque: f32) {
        if !self.is_dynamic() {
            return;
        }
        self.torque += torque;
        self.activate();
    }

    pub fn apply_force(&mut self, force: Vec2) {
        if !self.is_dynamic() {
            return;
        }
        self.force += force;
        self.activate();
    }

    /// Changes angular velocity by `impulse * inverse_inertia`.
    pub fn apply_angular_impulse(&mut self, impulse: f32) {
        self.angular_velocity += impulse * self.inverse_inertia;
    }

    /// Kinetic energy, used by the sleep heuristics and diagnostics.
    pub fn kinetic_energy(&self) -> f32 {
        let linear = if self.inverse_mass > 0.0 {
            self.velocity.length_squared() / self.inverse_mass
        } else {
            0.0
        };
        let angular = if self.inverse_inertia > 0.0 {
            self.angular_velocity * self.angular_velocity / self.inverse_inertia
        } else {
            0.0
        };
        0.5 * (linear + angular)
    }
}

fn safe_inverse(value: f32) -> f32 {
    if value.abs() < f32::EPSILON || !value.is_finite() {
        0.0
    } else {
        1.0 / value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_bodies_ignore_activation() {
        let mut body = Body::new_static();
        body.activate();
        assert_eq!(body.inverse_inertia, 0.0);
        assert!(body.is_static());
    }

    #[test]
    fn infinite_moment_gives_zero_inverse() {
        let body = Body::dynamic(2.0, f32::INFINITY);
        assert_eq!(body.inverse_inertia, 0.0);
        assert_eq!(body.inverse_mass, 0.5);
    }

    #[test]
    fn sleeping_clears_velocity() {
        let mut body = Body::dynamic(1.0, 1.0).with_angular_velocity(3.0);
        body.sleep();
        assert!(!body.is_awake());
        assert_eq!(body.angular_velocity, 0.0);
        body.activate();
        assert!(body.is_awake());
    }

    #[test]
    fn kinematic_bodies_never_sleep() {
        let mut body = Body::kinematic().with_angular_velocity(2.0);
        body.sleep();
        assert!(body.is_awake());
        assert_eq!(body.angular_velocity, 2.0);
    }
}
