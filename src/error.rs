//! Recoverable errors raised when wiring constraints into a world.

use thiserror::Error;

use crate::core::{BodyHandle, ConstraintHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConstraintError {
    /// The handle does not name a live body.
    #[error("unknown body {0:?}")]
    UnknownBody(BodyHandle),

    /// The handle does not name a live constraint.
    #[error("unknown constraint {0:?}")]
    UnknownConstraint(ConstraintHandle),

    /// Both ends of the constraint are the same body.
    #[error("constraint attaches body {0:?} to itself")]
    SelfConstraint(BodyHandle),
}
