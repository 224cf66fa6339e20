//! Frustum culling. Once per frame, hide entities whose bounding volume is entirely outside the
//! camera's view, and show the rest. Nothing is removed; only the visibility flag changes.

use log::trace;

use crate::{
    bounds::BoundingVolume,
    camera::Camera,
    driver::{FrameFlow, FrameStrategy, FrameTick},
    error::Result,
    frustum::Frustum,
    types::{Entity, Scene},
};

/// Something the culler can show or hide. The culler never changes anything else about it.
pub trait Cullable {
    /// World-space bounding volume. Must fully contain the object; a volume that's too large
    /// only costs draw calls, but one that's too small makes visible objects disappear.
    fn world_bounds(&self) -> BoundingVolume;

    fn set_visible(&mut self, visible: bool);
}

/// A frame context that has a camera, and a set of objects to cull against it.
pub trait CullTarget {
    type Object: Cullable;

    fn camera(&self) -> &Camera;

    fn cullables_mut(&mut self) -> &mut [Self::Object];
}

impl Cullable for Entity {
    fn world_bounds(&self) -> BoundingVolume {
        Entity::world_bounds(self)
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

impl CullTarget for Scene {
    type Object = Entity;

    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn cullables_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }
}

#[derive(Clone, Debug, Default)]
pub struct VisibilityCuller {
    /// Rewritten in place each frame.
    frustum: Frustum,
    visible: usize,
    culled: usize,
}

impl VisibilityCuller {
    pub fn new() -> Self {
        Self::default()
    }

    /// The frustum from the most recent pass.
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Number of objects left visible by the most recent pass.
    pub fn visible_count(&self) -> usize {
        self.visible
    }

    pub fn culled_count(&self) -> usize {
        self.culled
    }

    /// Update visibility flags on `objects` for `camera`'s current view. Returns the number
    /// of visible objects.
    pub fn cull<T: Cullable>(&mut self, camera: &Camera, objects: &mut [T]) -> usize {
        self.frustum.update(&camera.view_proj());

        self.visible = 0;
        for obj in objects.iter_mut() {
            let visible = self.frustum.intersects(&obj.world_bounds());
            obj.set_visible(visible);
            if visible {
                self.visible += 1;
            }
        }
        self.culled = objects.len() - self.visible;

        self.visible
    }
}

impl<C: CullTarget> FrameStrategy<C> for VisibilityCuller {
    fn name(&self) -> &str {
        "visibility culler"
    }

    fn on_frame(&mut self, ctx: &mut C, _tick: &FrameTick) -> Result<FrameFlow> {
        // The camera is cloned, since we need the objects mutably from the same context.
        let camera = ctx.camera().clone();
        self.cull(&camera, ctx.cullables_mut());

        trace!("Culling: {} visible, {} hidden", self.visible, self.culled);
        Ok(FrameFlow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use lin_alg::f32::{Quaternion, Vec3};

    use super::*;
    use crate::bounds::{Aabb, BoundingSphere};

    fn sphere_entity(id: usize, position: Vec3) -> Entity {
        Entity::new(
            id,
            position,
            1.,
            BoundingVolume::Sphere(BoundingSphere::new(Vec3::new_zero(), 0.5)),
        )
    }

    fn scene() -> Scene {
        let mut scene = Scene::default();
        let focal = scene.camera.focal_point();

        scene.entities = vec![
            sphere_entity(0, focal),
            sphere_entity(1, Vec3::new(0., 0., -20.)),
            sphere_entity(2, Vec3::new(500., 0., 10.)),
            Entity::new(
                3,
                Vec3::new(0., 0., 30.),
                2.,
                BoundingVolume::Box(Aabb::from_center(Vec3::new_zero(), 1.)),
            ),
        ];
        // Start everything in the wrong state.
        for e in &mut scene.entities {
            e.visible = e.id != 0;
        }
        scene
    }

    #[test]
    fn hides_outside_and_shows_inside() {
        let mut scene = scene();
        let mut culler = VisibilityCuller::new();
        let tick = FrameTick {
            timestamp: 0.,
            index: 0,
        };

        culler.on_frame(&mut scene, &tick).unwrap();

        let vis: Vec<_> = scene.entities.iter().map(|e| e.visible).collect();
        assert_eq!(vis, vec![true, false, false, true]);
        assert_eq!(culler.visible_count(), 2);
        assert_eq!(culler.culled_count(), 2);
        assert_eq!(scene.visible_count(), 2);
    }

    #[test]
    fn idempotent_with_unchanged_view() {
        let mut scene = scene();
        let mut culler = VisibilityCuller::new();

        let camera = scene.camera.clone();
        culler.cull(&camera, &mut scene.entities);
        let first: Vec<_> = scene.entities.iter().map(|e| e.visible).collect();

        culler.cull(&camera, &mut scene.entities);
        let second: Vec<_> = scene.entities.iter().map(|e| e.visible).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn only_visibility_changes() {
        let mut scene = scene();
        let before: Vec<_> = scene
            .entities
            .iter()
            .map(|e| (e.position.x, e.position.y, e.position.z, e.scale))
            .collect();

        VisibilityCuller::new().cull(&scene.camera.clone(), &mut scene.entities);

        let after: Vec<_> = scene
            .entities
            .iter()
            .map(|e| (e.position.x, e.position.y, e.position.z, e.scale))
            .collect();
        assert_eq!(before, after);
        assert_eq!(scene.entities.len(), 4);
    }

    #[test]
    fn turning_the_camera_reveals_hidden_objects() {
        let mut scene = scene();
        let mut culler = VisibilityCuller::new();

        let camera = scene.camera.clone();
        culler.cull(&camera, &mut scene.entities);
        assert!(!scene.entities[1].visible);

        // Turn around, to look down -Z.
        scene.camera.orientation =
            Quaternion::from_axis_angle(Vec3::new(0., 1., 0.), std::f32::consts::PI);

        let camera = scene.camera.clone();
        culler.cull(&camera, &mut scene.entities);
        assert!(scene.entities[1].visible);
        assert!(!scene.entities[0].visible);
    }
}
