use std::time::Duration;

use log::warn;

use crate::{
    config::DEFAULT_SOLVER_ITERATIONS,
    core::{
        body::Body,
        constraints::{Constraint, ConstraintHandle},
    },
    dynamics::coloring::ConstraintGraph,
    utils::{allocator::Arena, logging::ScopedTimer},
};

#[cfg(feature = "parallel")]
use crate::{core::body::BodyHandle, dynamics::coloring::COLOR_OVERFLOW_INDEX};

/// Per-step solver statistics.
#[derive(Debug, Default, Clone)]
pub struct SolverStepMetrics {
    pub constraints_solved: usize,
    pub iterations: u32,
    pub colors_used: usize,
    pub impulse_sum: f32,
    pub max_impulse: f32,
    pub pre_step_time: Duration,
    pub warm_start_time: Duration,
    pub relax_time: Duration,
}

impl SolverStepMetrics {
    pub fn record_constraint(&mut self, handle: ConstraintHandle, constraint: &Constraint) {
        let impulse = constraint.impulse();
        if !impulse.is_finite() {
            warn!(
                "constraint {handle:?} ({}) accumulated a non-finite impulse",
                constraint.type_name()
            );
        }
        self.constraints_solved += 1;
        self.impulse_sum += impulse;
        self.max_impulse = self.max_impulse.max(impulse);
    }

    pub fn total_time(&self) -> Duration {
        self.pre_step_time + self.warm_start_time + self.relax_time
    }
}

/// Sequential-impulse (projected Gauss-Seidel) solver over a set of active constraints.
#[derive(Debug, Clone)]
pub struct SequentialImpulseSolver {
    pub iterations: u32,
}

impl Default for SequentialImpulseSolver {
    fn default() -> Self {
        Self::new(DEFAULT_SOLVER_ITERATIONS)
    }
}

impl SequentialImpulseSolver {
    pub fn new(iterations: u32) -> Self {
        Self { iterations }
    }

    /// Runs one full solve: pre-step, warm start, then `iterations` relaxation passes.
    ///
    /// With a `graph`, passes run color by color (in parallel when the
    /// `parallel` feature is on); otherwise constraints are relaxed in `active` order.
    pub fn solve(
        &self,
        bodies: &mut Arena<Body>,
        constraints: &mut Arena<Constraint>,
        active: &[ConstraintHandle],
        graph: Option<&ConstraintGraph>,
        dt: f32,
        dt_coef: f32,
    ) -> SolverStepMetrics {
        let mut metrics = SolverStepMetrics {
            iterations: self.iterations,
            colors_used: graph.map_or(0, ConstraintGraph::active_color_count),
            ..Default::default()
        };

        {
            let _timer = ScopedTimer::recording("solver::pre_step", &mut metrics.pre_step_time);
            self.pre_step(bodies, constraints, active, dt);
        }
        {
            let _timer =
                ScopedTimer::recording("solver::warm_start", &mut metrics.warm_start_time);
            self.warm_start(bodies, constraints, active, dt_coef);
        }
        {
            let _timer = ScopedTimer::recording("solver::relax", &mut metrics.relax_time);
            for _ in 0..self.iterations {
                match graph {
                    #[cfg(feature = "parallel")]
                    Some(graph) => self.relax_colored_parallel(bodies, constraints, graph, dt),
                    #[cfg(not(feature = "parallel"))]
                    Some(graph) => self.relax_colored(bodies, constraints, graph, dt),
                    None => self.relax(bodies, constraints, active, dt),
                }
            }
        }

        for &handle in active {
            if let Some(constraint) = constraints.get(handle) {
                metrics.record_constraint(handle, constraint);
            }
        }
        metrics
    }

    pub fn pre_step(
        &self,
        bodies: &Arena<Body>,
        constraints: &mut Arena<Constraint>,
        active: &[ConstraintHandle],
        dt: f32,
    ) {
        for &handle in active {
            let Some(constraint) = constraints.get_mut(handle) else {
                continue;
            };
            let (id_a, id_b) = constraint.bodies();
            let (Some(a), Some(b)) = (bodies.get(id_a), bodies.get(id_b)) else {
                continue;
            };
            constraint.pre_step(a, b, dt);
        }
    }

    pub fn warm_start(
        &self,
        bodies: &mut Arena<Body>,
        constraints: &Arena<Constraint>,
        active: &[ConstraintHandle],
        dt_coef: f32,
    ) {
        for &handle in active {
            let Some(constraint) = constraints.get(handle) else {
                continue;
            };
            let (id_a, id_b) = constraint.bodies();
            if let Some((a, b)) = bodies.get2_mut(id_a, id_b) {
                constraint.apply_cached_impulse(a, b, dt_coef);
            }
        }
    }

    /// One relaxation pass in `active` order.
    pub fn relax(
        &self,
        bodies: &mut Arena<Body>,
        constraints: &mut Arena<Constraint>,
        active: &[ConstraintHandle],
        dt: f32,
    ) {
        for &handle in active {
            Self::relax_one(bodies, constraints, handle, dt);
        }
    }

    /// One relaxation pass, color by color, on the calling thread.
    pub fn relax_colored(
        &self,
        bodies: &mut Arena<Body>,
        constraints: &mut Arena<Constraint>,
        graph: &ConstraintGraph,
        dt: f32,
    ) {
        for color in graph.colors() {
            for &handle in &color.constraints {
                Self::relax_one(bodies, constraints, handle, dt);
            }
        }
    }

    /// One relaxation pass with each color solved on the rayon pool.
    ///
    /// Constraints of a color touch disjoint bodies, so each one is solved
    /// against copies of its two bodies and the new velocities are written
    /// back before the next color starts. The result matches
    /// [`relax_colored`](Self::relax_colored) exactly.
    #[cfg(feature = "parallel")]
    pub fn relax_colored_parallel(
        &self,
        bodies: &mut Arena<Body>,
        constraints: &mut Arena<Constraint>,
        graph: &ConstraintGraph,
        dt: f32,
    ) {
        use rayon::prelude::*;

        let mut slots: Vec<(usize, &mut Constraint)> = constraints
            .iter_mut()
            .filter_map(|(handle, constraint)| {
                graph.color_of(handle).map(|color| (color, constraint))
            })
            .collect();
        for color in 0..COLOR_OVERFLOW_INDEX {
            if graph.colors()[color].is_empty() {
                continue;
            }
            let snapshot: &Arena<Body> = &*bodies;
            let updates: Vec<[(BodyHandle, Body); 2]> = slots
                .par_iter_mut()
                .filter(|slot| slot.0 == color)
                .filter_map(|slot| {
                    let constraint = &mut *slot.1;
                    let (id_a, id_b) = constraint.bodies();
                    let mut a = snapshot.get(id_a)?.clone();
                    let mut b = snapshot.get(id_b)?.clone();
                    constraint.apply_impulse(&mut a, &mut b, dt);
                    Some([(id_a, a), (id_b, b)])
                })
                .collect();

            for (handle, solved) in updates.into_iter().flatten() {
                if let Some(body) = bodies.get_mut(handle) {
                    if !body.is_static() {
                        body.velocity = solved.velocity;
                        body.angular_velocity = solved.angular_velocity;
                    }
                }
            }
        }

        for slot in slots.iter_mut().filter(|slot| slot.0 == COLOR_OVERFLOW_INDEX) {
            let constraint = &mut *slot.1;
            let (id_a, id_b) = constraint.bodies();
            if let Some((a, b)) = bodies.get2_mut(id_a, id_b) {
                constraint.apply_impulse(a, b, dt);
            }
        }
    }

    fn relax_one(
        bodies: &mut Arena<Body>,
        constraints: &mut Arena<Constraint>,
        handle: ConstraintHandle,
        dt: f32,
    ) {
        let Some(constraint) = constraints.get_mut(handle) else {
            return;
        };
        let (id_a, id_b) = constraint.bodies();
        if let Some((a, b)) = bodies.get2_mut(id_a, id_b) {
            constraint.apply_impulse(a, b, dt);
        }
    }
}
