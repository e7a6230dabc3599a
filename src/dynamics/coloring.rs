use std::collections::{HashMap, HashSet};

use crate::{
    core::{
        body::{Body, BodyHandle},
        constraints::{Constraint, ConstraintHandle},
    },
    utils::allocator::Arena,
};

/// The maximum number of colors in the constraint graph.
/// Constraints that cannot find a color go to the overflow color, which is
/// solved on a single thread.
pub const GRAPH_COLOR_COUNT: usize = 12;

/// Index of the overflow color.
pub const COLOR_OVERFLOW_INDEX: usize = GRAPH_COLOR_COUNT - 1;

/// A batch of constraints that share no non-static body.
#[derive(Clone, Debug, Default)]
pub struct GraphColor {
    body_set: HashSet<BodyHandle>,
    pub constraints: Vec<ConstraintHandle>,
}

impl GraphColor {
    pub fn contains_body(&self, body: BodyHandle) -> bool {
        self.body_set.contains(&body)
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

/// Greedy coloring of the constraint graph.
///
/// Static bodies are never written by the solver, so they are left out of the
/// color body sets and may be shared freely. Kinematic bodies are colored
/// like dynamic ones.
#[derive(Clone, Debug)]
pub struct ConstraintGraph {
    colors: Vec<GraphColor>,
    color_of: HashMap<ConstraintHandle, usize>,
}

impl Default for ConstraintGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintGraph {
    pub fn new() -> Self {
        Self {
            colors: vec![GraphColor::default(); GRAPH_COLOR_COUNT],
            color_of: HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        for color in &mut self.colors {
            color.body_set.clear();
            color.constraints.clear();
        }
        self.color_of.clear();
    }

    /// Rebuilds the coloring for `active`, in order.
    pub fn build(
        &mut self,
        bodies: &Arena<Body>,
        constraints: &Arena<Constraint>,
        active: &[ConstraintHandle],
    ) {
        self.clear();
        let colored = |handle: BodyHandle| {
            bodies
                .get(handle)
                .filter(|body| !body.is_static())
                .map(|_| handle)
        };

        for &handle in active {
            let Some(constraint) = constraints.get(handle) else {
                continue;
            };
            let (a, b) = constraint.bodies();
            self.assign(handle, colored(a), colored(b));
        }
    }

    /// Places `constraint` into the first color holding neither body and returns its index.
    pub fn assign(
        &mut self,
        constraint: ConstraintHandle,
        body_a: Option<BodyHandle>,
        body_b: Option<BodyHandle>,
    ) -> usize {
        let free = |color: &GraphColor| {
            body_a.map_or(true, |a| !color.contains_body(a))
                && body_b.map_or(true, |b| !color.contains_body(b))
        };

        let index = self.colors[..COLOR_OVERFLOW_INDEX]
            .iter()
            .position(free)
            .unwrap_or(COLOR_OVERFLOW_INDEX);

        let color = &mut self.colors[index];
        if index != COLOR_OVERFLOW_INDEX {
            color.body_set.extend(body_a);
            color.body_set.extend(body_b);
        }
        color.constraints.push(constraint);
        self.color_of.insert(constraint, index);
        index
    }

    pub fn color_of(&self, constraint: ConstraintHandle) -> Option<usize> {
        self.color_of.get(&constraint).copied()
    }

    pub fn colors(&self) -> &[GraphColor] {
        &self.colors
    }

    pub fn overflow(&self) -> &GraphColor {
        &self.colors[COLOR_OVERFLOW_INDEX]
    }

    /// Number of non-empty colors, overflow included.
    pub fn active_color_count(&self) -> usize {
        self.colors.iter().filter(|color| !color.is_empty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::allocator::Handle;

    #[test]
    fn shared_body_forces_new_color() {
        let mut graph = ConstraintGraph::new();
        let (a, b, c) = (Handle::new(0, 0), Handle::new(1, 0), Handle::new(2, 0));

        assert_eq!(graph.assign(Handle::new(0, 0), Some(a), Some(b)), 0);
        assert_eq!(graph.assign(Handle::new(1, 0), Some(b), Some(c)), 1);
        assert_eq!(graph.assign(Handle::new(2, 0), Some(c), None), 0);
        assert_eq!(graph.active_color_count(), 2);
    }

    #[test]
    fn hub_body_spills_into_overflow() {
        let mut graph = ConstraintGraph::new();
        let hub = Handle::new(0, 0);
        for i in 0..GRAPH_COLOR_COUNT + 2 {
            graph.assign(Handle::new(i, 0), Some(hub), Some(Handle::new(i + 1, 0)));
        }
        assert_eq!(graph.overflow().constraints.len(), 3);
        assert_eq!(graph.color_of(Handle::new(0, 0)), Some(0));
    }
}
