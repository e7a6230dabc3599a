use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;

use particle_constraints::{
    Arena, Body, BodyHandle, Constraint, ConstraintGraph, ConstraintHandle, GearJoint, World,
};

const DT: f32 = 1.0 / 60.0;

/// A chain of gears where every inner body is shared by two joints, plus a
/// hub driving a few spokes.
fn gear_train(bodies: &mut Arena<Body>, constraints: &mut Arena<Constraint>) -> Vec<ConstraintHandle> {
    let chain: Vec<BodyHandle> = (0..8)
        .map(|i| bodies.insert(Body::dynamic(1.0, 1.0 + i as f32).with_angular_velocity(i as f32)))
        .collect();
    let hub = bodies.insert(Body::dynamic(2.0, 3.0).with_angular_velocity(-4.0));
    let anchor = bodies.insert(Body::new_static());

    let mut handles = Vec::new();
    for pair in chain.windows(2) {
        let joint = GearJoint::new(0.1, 1.5);
        handles.push(constraints.insert(Constraint::new(pair[0], pair[1], joint)));
    }
    for &spoke in chain.iter().step_by(2) {
        handles.push(constraints.insert(Constraint::new(hub, spoke, GearJoint::new(0.0, -2.0))));
    }
    for &body in &chain[..3] {
        handles.push(constraints.insert(Constraint::new(anchor, body, GearJoint::new(0.0, 1.0))));
    }
    handles
}

fn world_gear_chain(world: &mut World, len: usize) -> Vec<BodyHandle> {
    let bodies: Vec<BodyHandle> = (0..len)
        .map(|i| world.add_body(Body::dynamic(1.0, 1.0).with_angular_velocity(if i == 0 { 5.0 } else { 0.0 })))
        .collect();
    for pair in bodies.windows(2) {
        world.add_gear_joint(pair[0], pair[1], 0.0, 2.0).unwrap();
    }
    bodies
}

#[test]
fn test_world_is_sync_and_send() {
    fn assert_sync_send<T: Sync + Send>() {}
    assert_sync_send::<World>();
    assert_sync_send::<Constraint>();
}

#[test]
fn test_shared_world_across_threads() {
    let mut world = World::new(DT);
    world_gear_chain(&mut world, 4);
    let world = Arc::new(Mutex::new(world));

    let mut handles = vec![];
    for _ in 0..4 {
        let world_clone = Arc::clone(&world);
        let handle = thread::spawn(move || {
            let mut world = world_clone.lock().unwrap();
            world.step(DT);
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(world.lock().unwrap().metrics().constraints_solved, 3);
}

#[test]
fn test_colors_never_share_a_dynamic_body() {
    let mut bodies = Arena::new();
    let mut constraints = Arena::new();
    let active = gear_train(&mut bodies, &mut constraints);

    let mut graph = ConstraintGraph::new();
    graph.build(&bodies, &constraints, &active);

    let colored: usize = graph.colors().iter().map(|c| c.constraints.len()).sum();
    assert_eq!(colored, active.len());
    assert!(graph.overflow().is_empty());

    for color in graph.colors() {
        let mut seen = HashSet::new();
        for &handle in &color.constraints {
            let (a, b) = constraints.get(handle).unwrap().bodies();
            for body in [a, b] {
                if bodies.get(body).unwrap().is_static() {
                    continue;
                }
                assert!(seen.insert(body), "body {body:?} appears twice in one color");
            }
        }
    }
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_relaxation_matches_colored_relaxation() {
    use particle_constraints::SequentialImpulseSolver;

    let solver = SequentialImpulseSolver::default();

    let mut seq_bodies = Arena::new();
    let mut seq_constraints = Arena::new();
    let active = gear_train(&mut seq_bodies, &mut seq_constraints);

    let mut par_bodies = Arena::new();
    let mut par_constraints = Arena::new();
    gear_train(&mut par_bodies, &mut par_constraints);

    let mut graph = ConstraintGraph::new();
    graph.build(&seq_bodies, &seq_constraints, &active);

    solver.pre_step(&seq_bodies, &mut seq_constraints, &active, DT);
    solver.pre_step(&par_bodies, &mut par_constraints, &active, DT);
    for _ in 0..solver.iterations {
        solver.relax_colored(&mut seq_bodies, &mut seq_constraints, &graph, DT);
        solver.relax_colored_parallel(&mut par_bodies, &mut par_constraints, &graph, DT);
    }

    for ((_, seq), (_, par)) in seq_bodies.iter().zip(par_bodies.iter()) {
        assert_eq!(seq.angular_velocity, par.angular_velocity);
    }
    for &handle in &active {
        assert_eq!(
            seq_constraints.get(handle).unwrap().impulse(),
            par_constraints.get(handle).unwrap().impulse()
        );
    }
}

#[test]
fn test_parallel_world_matches_gear_relation() {
    for parallel in [false, true] {
        let mut world = World::new(DT);
        world.set_parallel_enabled(parallel);
        let chain = world_gear_chain(&mut world, 4);

        for _ in 0..120 {
            world.step(DT);
        }

        for pair in chain.windows(2) {
            let wa = world.body(pair[0]).unwrap().angular_velocity;
            let wb = world.body(pair[1]).unwrap().angular_velocity;
            assert!(
                (wb * 2.0 - wa).abs() < 1e-3,
                "parallel = {parallel}: {wa} and {wb} violate the ratio"
            );
        }
        if parallel {
            assert_eq!(world.metrics().colors_used, 2);
        }
    }
}
