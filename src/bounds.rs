//! Bounding volumes, used to approximate an entity's extent for fast frustum tests.

use lin_alg::f32::{Quaternion, Vec3};

fn min_vec(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z))
}

fn max_vec(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z))
}

#[derive(Clone, Copy, Debug)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius: radius.abs(),
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// The corners may be passed in either order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: min_vec(a, b),
            max: max_vec(a, b),
        }
    }

    /// A cube of side `2 * half_extent`, centered on `center`.
    pub fn from_center(center: Vec3, half_extent: f32) -> Self {
        let h = Vec3::new(half_extent, half_extent, half_extent);
        Self::new(center - h, center + h)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }
}

#[derive(Clone, Copy, Debug)]
pub enum BoundingVolume {
    Sphere(BoundingSphere),
    Box(Aabb),
}

impl Default for BoundingVolume {
    /// A unit sphere at the origin.
    fn default() -> Self {
        Self::Sphere(BoundingSphere::new(Vec3::new_zero(), 1.))
    }
}

impl BoundingVolume {
    /// Move a local-space volume into world space. Boxes are re-fit around their rotated
    /// corners, so the result stays axis-aligned, and never shrinks.
    pub fn transformed(&self, position: Vec3, orientation: Quaternion, scale: f32) -> Self {
        match self {
            Self::Sphere(s) => Self::Sphere(BoundingSphere::new(
                position + orientation.rotate_vec(s.center * scale),
                s.radius * scale,
            )),
            Self::Box(b) => {
                let mut corners = b
                    .corners()
                    .into_iter()
                    .map(|c| position + orientation.rotate_vec(c * scale));

                // `corners()` always yields 8 items.
                let first = corners.next().unwrap_or(position);
                let (min, max) = corners.fold((first, first), |(lo, hi), c| {
                    (min_vec(lo, c), max_vec(hi, c))
                });

                Self::Box(Aabb { min, max })
            }
        }
    }
}
