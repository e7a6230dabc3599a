use std::time::Duration;

use log::{debug, warn};

use crate::{
    config::{SolverConfig, DEFAULT_TIME_STEP},
    core::{
        body::{Body, BodyHandle},
        constraints::{Constraint, ConstraintHandle},
        gear_joint::GearJoint,
    },
    dynamics::{
        coloring::ConstraintGraph,
        integrator::Integrator,
        island::{Island, IslandManager},
        solver::{SequentialImpulseSolver, SolverStepMetrics},
    },
    error::ConstraintError,
    utils::{
        allocator::Arena,
        logging::{warn_if_step_budget_exceeded, ScopedTimer},
    },
};

/// Owns bodies and constraints and drives the per-step solver sequence.
///
/// Each fixed step runs: integrate velocities, pre-step every active
/// constraint, warm start, `iterations` relaxation passes, integrate
/// positions, update sleeping.
pub struct World {
    pub bodies: Arena<Body>,
    constraints: Arena<Constraint>,
    pub integrator: Integrator,
    pub solver: SequentialImpulseSolver,
    config: SolverConfig,
    time_accumulated: f32,
    prev_dt: f32,
    islands: IslandManager,
    graph: ConstraintGraph,
    active: Vec<ConstraintHandle>,
    metrics: SolverStepMetrics,
}

impl Default for World {
    fn default() -> Self {
        Self::with_config(SolverConfig::default())
    }
}

impl World {
    pub fn new(time_step: f32) -> Self {
        Self::with_config(SolverConfig {
            time_step,
            ..SolverConfig::default()
        })
    }

    pub fn with_config(mut config: SolverConfig) -> Self {
        if !(config.time_step.is_finite() && config.time_step > 0.0) {
            config.time_step = DEFAULT_TIME_STEP;
        }

        Self {
            bodies: Arena::new(),
            constraints: Arena::new(),
            integrator: Integrator::new(),
            solver: SequentialImpulseSolver::new(config.iterations),
            config,
            time_accumulated: 0.0,
            prev_dt: 0.0,
            islands: IslandManager::new(),
            graph: ConstraintGraph::new(),
            active: Vec::new(),
            metrics: SolverStepMetrics::default(),
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn time_step(&self) -> f32 {
        self.config.time_step
    }

    pub fn set_iterations(&mut self, iterations: u32) {
        self.config.iterations = iterations;
        self.solver.iterations = iterations;
    }

    /// Relaxes constraint colors on the rayon pool when the `parallel` feature is on,
    /// and color by color on the calling thread otherwise.
    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.config.parallel = enabled;
    }

    pub fn parallel_enabled(&self) -> bool {
        self.config.parallel
    }

    pub fn set_sleep_time_threshold(&mut self, seconds: f32) {
        self.config.sleep_time_threshold = seconds;
    }

    pub fn set_idle_speed_threshold(&mut self, speed: f32) {
        self.config.idle_speed_threshold = speed;
    }

    pub fn add_body(&mut self, body: Body) -> BodyHandle {
        self.bodies.insert(body)
    }

    /// Removes a body together with every constraint attached to it.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<Body> {
        if !self.bodies.contains(handle) {
            return None;
        }

        let attached: Vec<ConstraintHandle> = self
            .constraints
            .iter()
            .filter(|(_, c)| c.body_a() == handle || c.body_b() == handle)
            .map(|(h, _)| h)
            .collect();
        for constraint in attached {
            self.remove_constraint(constraint);
        }

        debug!("removed body {handle:?}");
        self.bodies.remove(handle)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn activate_body(&mut self, handle: BodyHandle) -> Result<(), ConstraintError> {
        let body = self
            .bodies
            .get_mut(handle)
            .ok_or(ConstraintError::UnknownBody(handle))?;
        body.activate();
        Ok(())
    }

    /// Inserts a constraint after checking that both bodies are live and distinct.
    ///
    /// Both bodies are woken.
    pub fn add_constraint(
        &mut self,
        constraint: Constraint,
    ) -> Result<ConstraintHandle, ConstraintError> {
        let (a, b) = constraint.bodies();
        if a == b {
            return Err(ConstraintError::SelfConstraint(a));
        }
        for body in [a, b] {
            if !self.bodies.contains(body) {
                return Err(ConstraintError::UnknownBody(body));
            }
        }

        let type_name = constraint.type_name();
        let handle = self.constraints.insert(constraint);
        self.wake_pair(a, b);
        debug!("added {type_name} {handle:?} between {a:?} and {b:?}");
        Ok(handle)
    }

    pub fn add_gear_joint(
        &mut self,
        body_a: BodyHandle,
        body_b: BodyHandle,
        phase: f32,
        ratio: f32,
    ) -> Result<ConstraintHandle, ConstraintError> {
        self.add_constraint(Constraint::new(body_a, body_b, GearJoint::new(phase, ratio)))
    }

    /// Removes a constraint and wakes the bodies it held.
    pub fn remove_constraint(&mut self, handle: ConstraintHandle) -> Option<Constraint> {
        let constraint = self.constraints.remove(handle)?;
        let (a, b) = constraint.bodies();
        self.wake_pair(a, b);
        debug!("removed {} {handle:?}", constraint.type_name());
        Some(constraint)
    }

    pub fn constraint(&self, handle: ConstraintHandle) -> Option<&Constraint> {
        self.constraints.get(handle)
    }

    pub fn constraint_mut(&mut self, handle: ConstraintHandle) -> Option<&mut Constraint> {
        self.constraints.get_mut(handle)
    }

    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintHandle, &Constraint)> + '_ {
        self.constraints.iter()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Wakes both bodies of a constraint.
    pub fn activate_constraint_bodies(
        &mut self,
        handle: ConstraintHandle,
    ) -> Result<(), ConstraintError> {
        let constraint = self
            .constraints
            .get(handle)
            .ok_or(ConstraintError::UnknownConstraint(handle))?;
        let (a, b) = constraint.bodies();
        self.wake_pair(a, b);
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if `handle` names a constraint that is not a gear joint.
    pub fn gear_phase(&self, handle: ConstraintHandle) -> Result<f32, ConstraintError> {
        Ok(self.live_constraint(handle)?.gear_joint().phase())
    }

    /// # Panics
    ///
    /// Panics if `handle` names a constraint that is not a gear joint.
    pub fn gear_ratio(&self, handle: ConstraintHandle) -> Result<f32, ConstraintError> {
        Ok(self.live_constraint(handle)?.gear_joint().ratio())
    }

    /// Changes the phase of a gear joint and wakes both of its bodies.
    ///
    /// The accumulated impulse is kept for the next warm start.
    ///
    /// # Panics
    ///
    /// Panics if `handle` names a constraint that is not a gear joint.
    pub fn set_gear_phase(
        &mut self,
        handle: ConstraintHandle,
        phase: f32,
    ) -> Result<(), ConstraintError> {
        // Type check before waking anything.
        self.live_constraint(handle)?.gear_joint();
        self.activate_constraint_bodies(handle)?;
        self.live_constraint_mut(handle)?
            .gear_joint_mut()
            .set_phase(phase);
        Ok(())
    }

    /// Changes the ratio of a gear joint, recomputing its inverse, and wakes both bodies.
    ///
    /// `ratio` must be non-zero. The accumulated impulse is kept for the next
    /// warm start.
    ///
    /// # Panics
    ///
    /// Panics if `handle` names a constraint that is not a gear joint.
    pub fn set_gear_ratio(
        &mut self,
        handle: ConstraintHandle,
        ratio: f32,
    ) -> Result<(), ConstraintError> {
        // Type check before waking anything.
        self.live_constraint(handle)?.gear_joint();
        self.activate_constraint_bodies(handle)?;
        self.live_constraint_mut(handle)?
            .gear_joint_mut()
            .set_ratio(ratio);
        Ok(())
    }

    /// Statistics from the most recent fixed step.
    pub fn metrics(&self) -> &SolverStepMetrics {
        &self.metrics
    }

    pub fn islands(&self) -> &[Island] {
        self.islands.islands()
    }

    /// Advances the simulation using a fixed timestep accumulator.
    ///
    /// Returns the number of fixed steps taken.
    pub fn step(&mut self, dt: f32) -> usize {
        self.time_accumulated += dt;

        let mut steps = 0;
        while self.time_accumulated >= self.config.time_step {
            self.time_accumulated -= self.config.time_step;
            self.step_fixed(self.config.time_step);
            steps += 1;
        }
        steps
    }

    /// Runs exactly one solver step of length `dt`.
    ///
    /// `dt` must be positive; a zero step produces non-finite biases and is not guarded here.
    pub fn step_fixed(&mut self, dt: f32) {
        let mut elapsed = Duration::ZERO;
        {
            let _timer = ScopedTimer::recording("world::step", &mut elapsed);

            let dt_coef = if self.prev_dt == 0.0 {
                0.0
            } else {
                dt / self.prev_dt
            };

            {
                let _timer = ScopedTimer::new("integrator::velocities");
                self.integrator.integrate_velocities(&mut self.bodies, dt);
            }

            self.collect_active_constraints();
            let graph = if self.config.parallel {
                self.graph
                    .build(&self.bodies, &self.constraints, &self.active);
                Some(&self.graph)
            } else {
                None
            };

            self.metrics = self.solver.solve(
                &mut self.bodies,
                &mut self.constraints,
                &self.active,
                graph,
                dt,
                dt_coef,
            );

            {
                let _timer = ScopedTimer::new("integrator::positions");
                self.integrator.integrate_positions(&mut self.bodies, dt);
            }

            if self.config.sleep_time_threshold.is_finite() {
                let _timer = ScopedTimer::new("sleeping::update");
                self.islands.build_islands(&self.bodies, &self.constraints);
                self.islands.update_sleeping(
                    &mut self.bodies,
                    dt,
                    self.config.idle_speed_threshold,
                    self.config.sleep_time_threshold,
                );
            }

            self.prev_dt = dt;
        }
        if dt.is_finite() && dt > 0.0 {
            warn_if_step_budget_exceeded(elapsed, Duration::from_secs_f32(dt));
        }
    }

    /// Gathers constraints with at least one awake dynamic body.
    ///
    /// A sleeping body jointed to an awake one is woken so the pair is solved together.
    fn collect_active_constraints(&mut self) {
        self.active.clear();

        let awake = |body: &Body| body.is_awake() && body.is_dynamic();
        for (handle, constraint) in self.constraints.iter() {
            let (a, b) = constraint.bodies();
            let (Some(body_a), Some(body_b)) = (self.bodies.get(a), self.bodies.get(b)) else {
                warn!(
                    "{} {handle:?} references a removed body; skipping",
                    constraint.type_name()
                );
                continue;
            };
            if awake(body_a) || awake(body_b) {
                self.active.push(handle);
            }
        }

        for &handle in &self.active {
            if let Some(constraint) = self.constraints.get(handle) {
                let (a, b) = constraint.bodies();
                for body in [a, b] {
                    if let Some(body) = self.bodies.get_mut(body) {
                        if !body.is_awake() {
                            body.activate();
                        }
                    }
                }
            }
        }
    }

    fn wake_pair(&mut self, a: BodyHandle, b: BodyHandle) {
        for handle in [a, b] {
            if let Some(body) = self.bodies.get_mut(handle) {
                body.activate();
            }
        }
    }

    fn live_constraint(&self, handle: ConstraintHandle) -> Result<&Constraint, ConstraintError> {
        self.constraints
            .get(handle)
            .ok_or(ConstraintError::UnknownConstraint(handle))
    }

    fn live_constraint_mut(
        &mut self,
        handle: ConstraintHandle,
    ) -> Result<&mut Constraint, ConstraintError> {
        self.constraints
            .get_mut(handle)
            .ok_or(ConstraintError::UnknownConstraint(handle))
    }
}
