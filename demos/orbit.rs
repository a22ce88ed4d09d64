//! Sun / planet / moon hierarchy animated on the CPU.
//!
//! Each frame only rotates the planet's orbit pivot; the moon's world position
//! is recomputed lazily the first time it is queried, and a clean observer
//! logs every recomputation.
//!
//! Run with `RUST_LOG=trace cargo run --example orbit` to watch the cleaning
//! traversal.

use std::f32::consts::TAU;

use glam::{Affine3A, Vec3};
use myth_scene::{NodeHandle, SceneGraph, TransformationOrder};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut graph: SceneGraph = SceneGraph::new();
    let scene = graph.create_scene();

    let sun = graph.create_child(scene, Affine3A::IDENTITY)?;
    let orbit = graph.create_child(sun, Affine3A::IDENTITY)?;
    let planet = graph.create_child(orbit, Affine3A::from_translation(Vec3::X * 10.0))?;
    let moon = graph.create_child(planet, Affine3A::from_translation(Vec3::X * 2.0))?;
    let camera = graph.create_child(scene, Affine3A::from_translation(Vec3::new(0.0, 5.0, 30.0)))?;

    graph.set_clean_observer(moon, |node: NodeHandle, absolute: &Affine3A| {
        log::debug!("{node:?} recomputed at {}", absolute.translation);
    })?;

    let steps = 12;
    for frame in 0..steps {
        graph.multiply_transformation(
            orbit,
            Affine3A::from_rotation_y(TAU / steps as f32),
            TransformationOrder::Global,
        )?;

        let world = graph.absolute_transformation(moon)?;
        let view = graph.transformation_relative_to(moon, camera)?;
        println!(
            "frame {frame:2}: moon world {:.2?}  in camera {:.2?}",
            world.translation, view.translation
        );
    }

    // Moving the moon onto the sun while keeping its world pose.
    graph.set_parent_keep_absolute(moon, Some(sun))?;
    let local = graph.local_transformation(moon)?;
    println!("moon local after reparent: {:.2?}", local.translation);

    graph.validate()?;
    Ok(())
}
