use std::collections::{HashMap, HashSet};

use crate::{
    core::{
        body::{Body, BodyHandle},
        constraints::{Constraint, ConstraintHandle},
    },
    utils::allocator::Arena,
};

/// Bodies connected through constraints; sleeps and wakes as a unit.
#[derive(Debug, Clone)]
pub struct Island {
    pub bodies: Vec<BodyHandle>,
    pub constraints: Vec<ConstraintHandle>,
    pub is_awake: bool,
}

/// Builds islands each step and manages sleeping state.
///
/// Static bodies never join an island, so a shared anchor does not tie
/// otherwise independent mechanisms together.
#[derive(Debug, Default)]
pub struct IslandManager {
    islands: Vec<Island>,
    adjacency: HashMap<BodyHandle, Vec<BodyHandle>>,
}

impl IslandManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build_islands(&mut self, bodies: &Arena<Body>, constraints: &Arena<Constraint>) {
        self.islands.clear();
        self.adjacency.clear();

        let joins = |handle: BodyHandle| bodies.get(handle).is_some_and(|body| !body.is_static());

        for (_, constraint) in constraints.iter() {
            let (a, b) = constraint.bodies();
            if joins(a) && joins(b) {
                self.adjacency.entry(a).or_default().push(b);
                self.adjacency.entry(b).or_default().push(a);
            }
        }

        let mut visited = HashSet::new();
        for (handle, body) in bodies.iter() {
            if body.is_static() || visited.contains(&handle) {
                continue;
            }
            let members = self.depth_first_collect(handle, &mut visited);
            let member_set: HashSet<_> = members.iter().copied().collect();

            let island_constraints = constraints
                .iter()
                .filter(|(_, c)| member_set.contains(&c.body_a()) || member_set.contains(&c.body_b()))
                .map(|(h, _)| h)
                .collect();
            let is_awake = members
                .iter()
                .any(|h| bodies.get(*h).is_some_and(Body::is_awake));

            self.islands.push(Island {
                bodies: members,
                constraints: island_constraints,
                is_awake,
            });
        }
    }

    fn depth_first_collect(
        &self,
        start: BodyHandle,
        visited: &mut HashSet<BodyHandle>,
    ) -> Vec<BodyHandle> {
        let mut stack = vec![start];
        let mut result = Vec::new();

        while let Some(node) = stack.pop() {
            if visited.insert(node) {
                result.push(node);
                if let Some(neighbors) = self.adjacency.get(&node) {
                    stack.extend(neighbors.iter().copied());
                }
            }
        }

        result
    }

    /// Advances idle timers and puts islands to sleep once every member has
    /// stayed below `idle_speed` for `sleep_time`.
    ///
    /// An island with any recently active member is woken as a whole.
    pub fn update_sleeping(
        &mut self,
        bodies: &mut Arena<Body>,
        dt: f32,
        idle_speed: f32,
        sleep_time: f32,
    ) {
        for island in &mut self.islands {
            let mut all_idle = true;
            for handle in &island.bodies {
                let Some(body) = bodies.get_mut(*handle) else {
                    continue;
                };
                if body.is_awake() {
                    let idle = body.angular_velocity.abs() < idle_speed
                        && body.velocity.length() < idle_speed;
                    let idle_time = if idle { body.idle_time() + dt } else { 0.0 };
                    body.set_idle_time(idle_time);
                }
                all_idle &= body.idle_time() >= sleep_time;
            }

            if all_idle {
                if island.is_awake {
                    log::debug!("island of {} bodies fell asleep", island.bodies.len());
                }
                island.is_awake = false;
                for handle in &island.bodies {
                    if let Some(body) = bodies.get_mut(*handle) {
                        body.sleep();
                    }
                }
            } else {
                island.is_awake = true;
                for handle in &island.bodies {
                    if let Some(body) = bodies.get_mut(*handle) {
                        if !body.is_awake() {
                            body.activate();
                        }
                    }
                }
            }
        }
    }

    pub fn islands(&self) -> &[Island] {
        &self.islands
    }
}
