//! A field of spheres and boxes, with a camera turning slowly above them. Most of the field is
//! outside the view at any time; run with `RUST_LOG=debug` to watch the culler and the
//! resolution scaler work.

use lin_alg::f32::{Quaternion, Vec3};
use log::info;
use render_pacer::{
    Aabb, BoundingSphere, BoundingVolume, Entity, PacingSettings, ResolutionSettings, Scene,
    UP_VEC, run,
};

const GRID: i32 = 20;
const SPACING: f32 = 4.;
/// Radians per second.
const TURN_RATE: f32 = 0.3;

struct State {
    heading: f32,
    elapsed: f32,
}

fn make_scene() -> Scene {
    let mut entities = Vec::new();

    for i in -GRID..GRID {
        for j in -GRID..GRID {
            let position = Vec3::new(i as f32 * SPACING, 0., j as f32 * SPACING);
            let bounds = if (i + j) % 2 == 0 {
                BoundingVolume::Sphere(BoundingSphere::new(Vec3::new_zero(), 1.))
            } else {
                BoundingVolume::Box(Aabb::from_center(Vec3::new_zero(), 1.))
            };
            entities.push(Entity::new(entities.len(), position, 1., bounds));
        }
    }

    let mut scene = Scene {
        entities,
        background_color: (0.1, 0.1, 0.15),
        window_title: "Culling demo".to_owned(),
        ..Default::default()
    };
    scene.camera.position = Vec3::new(0., 6., 0.);
    scene.camera.far = 80.;
    scene.camera.update_proj_mat();

    scene
}

fn render_handler(state: &mut State, scene: &mut Scene, dt: f32) -> render_pacer::Result<()> {
    state.heading += TURN_RATE * dt;
    scene.camera.orientation = Quaternion::from_axis_angle(UP_VEC, state.heading);

    state.elapsed += dt;
    if state.elapsed > 2. {
        state.elapsed = 0.;
        info!(
            "{} of {} entities visible",
            scene.visible_count(),
            scene.entities.len()
        );
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let pacing = PacingSettings {
        target_fps: Some(60.),
        resolution: Some(ResolutionSettings {
            smoothing: Some(0.3),
            ..Default::default()
        }),
        ..Default::default()
    };

    let state = State {
        heading: 0.,
        elapsed: 0.,
    };

    if let Err(e) = run(state, make_scene(), pacing, render_handler) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
