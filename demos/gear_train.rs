use particle_constraints::*;

fn main() {
    let mut world = World::new(1.0 / 60.0);
    world.set_parallel_enabled(true);

    let motor = world.add_body(Body::dynamic(1.0, 1.0).with_angular_velocity(6.0));
    let idler = world.add_body(Body::dynamic(1.0, 0.5));
    let output = world.add_body(Body::dynamic(1.0, 4.0));

    world
        .add_gear_joint(motor, idler, 0.0, -1.0)
        .expect("motor and idler are live");
    let reduction = world
        .add_gear_joint(idler, output, 0.0, 3.0)
        .expect("idler and output are live");

    for second in 0..3 {
        world.step(1.0);
        let speeds: Vec<f32> = [motor, idler, output]
            .iter()
            .filter_map(|&handle| world.body(handle))
            .map(|body| body.angular_velocity)
            .collect();
        println!(
            "t = {}s: angular velocities {:?}, solver took {:?}",
            second + 1,
            speeds,
            world.metrics().total_time()
        );
    }

    world
        .set_gear_ratio(reduction, 6.0)
        .expect("reduction gear is live");
    world.step(1.0);
    if let Some(body) = world.body(output) {
        println!("Output speed after doubling the reduction: {}", body.angular_velocity);
    }
}
