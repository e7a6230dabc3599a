use glam::Vec2;

use crate::core::body::Body;
use crate::utils::allocator::Arena;

/// Semi-implicit Euler integrator for planar bodies.
///
/// Velocities are advanced before the constraint solve and positions after it,
/// so joints always correct the velocities that will actually be integrated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Integrator;

impl Integrator {
    pub fn new() -> Self {
        Self
    }

    pub fn integrate_velocity(&self, body: &mut Body, dt: f32) {
        if !body.is_dynamic() || !body.is_awake() {
            return;
        }

        body.velocity += body.force * body.inverse_mass * dt;
        body.angular_velocity += body.torque * body.inverse_inertia * dt;

        body.velocity *= (1.0 - body.linear_damping * dt).max(0.0);
        body.angular_velocity *= (1.0 - body.angular_damping * dt).max(0.0);

        body.force = Vec2::ZERO;
        body.torque = 0.0;
    }

    pub fn integrate_position(&self, body: &mut Body, dt: f32) {
        if body.is_static() || !body.is_awake() {
            return;
        }

        body.position += body.velocity * dt;
        body.angle += body.angular_velocity * dt;
    }

    pub fn integrate_velocities(&self, bodies: &mut Arena<Body>, dt: f32) {
        for (_, body) in bodies.iter_mut() {
            self.integrate_velocity(body, dt);
        }
    }

    pub fn integrate_positions(&self, bodies: &mut Arena<Body>, dt: f32) {
        for (_, body) in bodies.iter_mut() {
            self.integrate_position(body, dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn torque_spins_up_dynamic_body() {
        let integrator = Integrator::new();
        let mut body = Body::dynamic(1.0, 2.0);
        body.apply_torque(4.0);

        integrator.integrate_velocity(&mut body, 0.5);
        assert_relative_eq!(body.angular_velocity, 1.0);
        assert_eq!(body.torque, 0.0);

        integrator.integrate_position(&mut body, 0.5);
        assert_relative_eq!(body.angle, 0.5);
    }

    #[test]
    fn kinematic_bodies_move_but_ignore_forces() {
        let integrator = Integrator::new();
        let mut body = Body::kinematic().with_angular_velocity(2.0);
        body.torque = 10.0;

        integrator.integrate_velocity(&mut body, 1.0);
        integrator.integrate_position(&mut body, 1.0);

        assert_eq!(body.angular_velocity, 2.0);
        assert_eq!(body.angle, 2.0);
    }

    #[test]
    fn static_bodies_never_move() {
        let integrator = Integrator::new();
        let mut body = Body::new_static().with_angular_velocity(1.0);
        integrator.integrate_position(&mut body, 1.0);
        assert_eq!(body.angle, 0.0);
    }
}
