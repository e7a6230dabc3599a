//! Simulation dynamics: integration, islands, constraint graph coloring, and the impulse solver.

pub mod coloring;
pub mod integrator;
pub mod island;
pub mod solver;

pub use coloring::{ConstraintGraph, GraphColor, COLOR_OVERFLOW_INDEX, GRAPH_COLOR_COUNT};
pub use integrator::Integrator;
pub use island::{Island, IslandManager};
pub use solver::{SequentialImpulseSolver, SolverStepMetrics};
