//! Particle Constraints – a sequential-impulse joint solver for Rust.
//!
//! Joints implement the [`Joint`] trait (pre-step, warm start, relaxation
//! pass, impulse query) and are driven uniformly by a [`World`], which owns
//! the bodies in a generational arena and hands joints temporary access to
//! them each step. [`GearJoint`] is the reference joint: it locks the angular
//! velocities of two bodies to a fixed ratio and phase.
//!
//! ```
//! use particle_constraints::{Body, World};
//!
//! let mut world = World::new(1.0 / 60.0);
//! let driver = world.add_body(Body::dynamic(1.0, 1.0).with_angular_velocity(3.0));
//! let follower = world.add_body(Body::dynamic(1.0, 1.0));
//! let gear = world.add_gear_joint(driver, follower, 0.0, 2.0).unwrap();
//!
//! world.step(1.0 / 60.0);
//!
//! let a = world.body(driver).unwrap().angular_velocity;
//! let b = world.body(follower).unwrap().angular_velocity;
//! assert!((b * 2.0 - a).abs() < 1e-4);
//! assert_eq!(world.gear_ratio(gear).unwrap(), 2.0);
//! ```

pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod utils;
pub mod world;

pub use glam::Vec2;

pub use config::SolverConfig;
pub use crate::core::{
    body::{Body, BodyHandle, BodyType},
    constraints::{Constraint, ConstraintHandle, ConstraintParams, Joint},
    gear_joint::GearJoint,
};
pub use dynamics::{
    coloring::ConstraintGraph,
    integrator::Integrator,
    solver::{SequentialImpulseSolver, SolverStepMetrics},
};
pub use error::ConstraintError;
pub use utils::allocator::{Arena, Handle};
pub use world::World;
