//! View frustum extraction and intersection tests against bounding volumes.

use lin_alg::f32::{Mat4, Vec3, Vec4};

use crate::bounds::{Aabb, BoundingSphere, BoundingVolume};

const EPS_PLANE: f32 = 1e-12;

/// A plane in the form `normal · p + d = 0`, with the normal pointing into the frustum.
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Default for Plane {
    /// A degenerate plane; every point is on its inner side.
    fn default() -> Self {
        Self {
            normal: Vec3::new_zero(),
            d: 0.,
        }
    }
}

impl Plane {
    fn from_vec4(v: Vec4) -> Self {
        let normal = Vec3::new(v.x, v.y, v.z);
        let len = normal.magnitude();

        if len < EPS_PLANE {
            return Self::default();
        }

        Self {
            normal: normal / len,
            d: v.w / len,
        }
    }

    /// Signed distance; positive on the inside.
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }
}

/// Six planes, in the order left, right, bottom, top, near, far.
#[derive(Clone, Copy, Debug, Default)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    pub fn from_matrix(view_proj: &Mat4) -> Self {
        let mut result = Self::default();
        result.update(view_proj);
        result
    }

    /// Rewrite the planes in place from a combined projection-view matrix.
    pub fn update(&mut self, view_proj: &Mat4) {
        let (c0, c1, c2, c3) = view_proj.clone().to_cols();

        let row = |i: usize| {
            let pick = |c: &Vec4| match i {
                0 => c.x,
                1 => c.y,
                2 => c.z,
                _ => c.w,
            };
            Vec4::new(pick(&c0), pick(&c1), pick(&c2), pick(&c3))
        };

        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        let add = |a: &Vec4, b: &Vec4| Vec4::new(a.x + b.x, a.y + b.y, a.z + b.z, a.w + b.w);
        let sub = |a: &Vec4, b: &Vec4| Vec4::new(a.x - b.x, a.y - b.y, a.z - b.z, a.w - b.w);

        self.planes[0] = Plane::from_vec4(add(&r3, &r0));
        self.planes[1] = Plane::from_vec4(sub(&r3, &r0));
        self.planes[2] = Plane::from_vec4(add(&r3, &r1));
        self.planes[3] = Plane::from_vec4(sub(&r3, &r1));
        // -w <= z; this also contains the 0 <= z depth range.
        self.planes[4] = Plane::from_vec4(add(&r3, &r2));
        self.planes[5] = Plane::from_vec4(sub(&r3, &r2));
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.distance_to(point) >= 0.)
    }

    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.planes
            .iter()
            .all(|p| p.distance_to(sphere.center) >= -sphere.radius)
    }

    /// Tests the box corner furthest along each plane's normal.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|p| {
            let positive = Vec3::new(
                if p.normal.x >= 0. { aabb.max.x } else { aabb.min.x },
                if p.normal.y >= 0. { aabb.max.y } else { aabb.min.y },
                if p.normal.z >= 0. { aabb.max.z } else { aabb.min.z },
            );
            p.distance_to(positive) >= 0.
        })
    }

    pub fn intersects(&self, volume: &BoundingVolume) -> bool {
        match volume {
            BoundingVolume::Sphere(s) => self.intersects_sphere(s),
            BoundingVolume::Box(b) => self.intersects_aabb(b),
        }
    }
}
