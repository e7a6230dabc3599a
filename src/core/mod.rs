//! Core types: bodies, the joint interface, and the concrete joints.

pub mod body;
pub mod constraints;
pub mod gear_joint;

pub use body::{Body, BodyHandle, BodyType};
pub use constraints::{Constraint, ConstraintHandle, ConstraintParams, Joint};
pub use gear_joint::GearJoint;
