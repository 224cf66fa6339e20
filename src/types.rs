//! Scene data, and settings structs.

#[cfg(feature = "app_utils")]
use bincode::{Decode, Encode};
use lin_alg::f32::{Quaternion, Vec3};

use crate::{bounds::BoundingVolume, camera::Camera};

pub const UP_VEC: Vec3 = Vec3 {
    x: 0.,
    y: 1.,
    z: 0.,
};
pub const RIGHT_VEC: Vec3 = Vec3 {
    x: 1.,
    y: 0.,
    z: 0.,
};
pub const FWD_VEC: Vec3 = Vec3 {
    x: 0.,
    y: 0.,
    z: 1.,
};

/// Represents an entity in the world. Only what the frame strategies need: a transform, a
/// bounding volume, and a visibility flag.
#[derive(Clone, Debug)]
pub struct Entity {
    pub id: usize,
    /// Position in the world, relative to world origin
    pub position: Vec3,
    /// Rotation, relative to up.
    pub orientation: Quaternion,
    pub scale: f32, // 1.0 is original.
    /// In the entity's local space.
    pub bounds: BoundingVolume,
    /// Set by the visibility culler each frame. Hidden entities are skipped when drawing,
    /// but stay in the scene.
    pub visible: bool,
}

impl Default for Entity {
    fn default() -> Self {
        Self {
            id: 0,
            position: Vec3::new_zero(),
            orientation: Quaternion::new_identity(),
            scale: 1.,
            bounds: Default::default(),
            visible: true,
        }
    }
}

impl Entity {
    pub fn new(id: usize, position: Vec3, scale: f32, bounds: BoundingVolume) -> Self {
        Self {
            id,
            position,
            scale,
            bounds,
            ..Default::default()
        }
    }

    pub fn world_bounds(&self) -> BoundingVolume {
        self.bounds
            .transformed(self.position, self.orientation, self.scale)
    }
}

#[derive(Clone, Debug)]
pub struct Scene {
    pub entities: Vec<Entity>,
    pub camera: Camera,
    pub background_color: (f32, f32, f32),
    pub window_title: String,
    pub window_size: (f32, f32),
    pub icon_path: Option<String>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            camera: Default::default(),
            background_color: (0.7, 0.7, 0.7),
            window_title: "(Window title here)".to_owned(),
            window_size: (900., 600.),
            icon_path: None,
        }
    }
}

impl Scene {
    pub fn visible_count(&self) -> usize {
        self.entities.iter().filter(|e| e.visible).count()
    }
}

#[cfg_attr(feature = "app_utils", derive(Encode, Decode))]
#[derive(Clone, Debug, PartialEq)]
/// Bounds and thresholds for dynamic resolution. The scale factor multiplies the surface
/// resolution relative to the window's physical size.
pub struct ResolutionSettings {
    pub min: f32,
    pub max: f32,
    /// How much the scale changes per frame, when outside the threshold band.
    pub step: f32,
    /// Below this fps, scale down.
    pub low_fps: f32,
    /// Above this fps, scale up.
    pub high_fps: f32,
    pub start: f32,
    /// Exponential moving average factor applied to fps samples, in (0, 1]. `None` uses each
    /// sample as-is.
    pub smoothing: Option<f32>,
}

impl Default for ResolutionSettings {
    fn default() -> Self {
        Self {
            min: 0.5,
            max: 2.,
            step: 0.25,
            low_fps: 30.,
            high_fps: 50.,
            start: 1.,
            smoothing: None,
        }
    }
}

#[cfg_attr(feature = "app_utils", derive(Encode, Decode))]
#[derive(Clone, Debug, PartialEq)]
/// Which strategies the runner installs, and how they're configured.
pub struct PacingSettings {
    /// `None` runs at the display's refresh rate.
    pub target_fps: Option<f32>,
    /// `None` keeps the surface at its native resolution.
    pub resolution: Option<ResolutionSettings>,
    pub culling: bool,
    /// How often the fps counter publishes a new sample, in milliseconds.
    pub fps_window_ms: f32,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            target_fps: None,
            resolution: Some(Default::default()),
            culling: true,
            fps_window_ms: 1_000.,
        }
    }
}
