//! The frame context: application state passed explicitly into the driver and each strategy,
//! in place of global scene, camera, and renderer state.

use log::info;

use crate::{
    camera::Camera,
    culling::{CullTarget, VisibilityCuller},
    driver::FrameDriver,
    error::Result,
    limiter::FrameRateLimiter,
    resolution::{ResolutionScaler, SurfaceScale},
    stats::{FpsCounter, FpsMeter, FpsSample, FpsSource, FrameStats},
    types::{Entity, PacingSettings, Scene},
};

pub struct FrameContext {
    pub scene: Scene,
    pub fps: FpsCounter,
    pixel_ratio: f32,
    /// Set when the pixel ratio changes. The host reconfigures its surface, then clears it.
    surface_dirty: bool,
}

impl FrameContext {
    pub fn new(scene: Scene, fps: FpsCounter) -> Self {
        Self {
            scene,
            fps,
            pixel_ratio: 1.,
            surface_dirty: false,
        }
    }

    /// A context with an fps counter configured from `settings`.
    pub fn from_settings(scene: Scene, settings: &PacingSettings) -> Result<Self> {
        let fps = FpsCounter::new(settings.fps_window_ms as f64)?;
        Ok(Self::new(scene, fps))
    }

    /// Returns true once after each pixel ratio change.
    pub fn take_surface_dirty(&mut self) -> bool {
        std::mem::take(&mut self.surface_dirty)
    }
}

impl SurfaceScale for FrameContext {
    fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        if ratio != self.pixel_ratio {
            self.pixel_ratio = ratio;
            self.surface_dirty = true;
        }
    }
}

impl FpsSource for FrameContext {
    fn fps_sample(&self) -> Option<FpsSample> {
        self.fps.fps_sample()
    }
}

impl FrameStats for FrameContext {
    fn fps_counter_mut(&mut self) -> &mut FpsCounter {
        &mut self.fps
    }
}

impl CullTarget for FrameContext {
    type Object = Entity;

    fn camera(&self) -> &Camera {
        &self.scene.camera
    }

    fn cullables_mut(&mut self) -> &mut [Entity] {
        &mut self.scene.entities
    }
}

/// Build a stopped driver with the built-in strategies `settings` asks for, in this order:
/// frame-rate limiter, fps meter, visibility culler, resolution scaler. Application
/// strategies added afterwards run after these, on accepted frames only.
pub fn build_driver(settings: &PacingSettings) -> Result<FrameDriver<FrameContext>> {
    let mut driver = FrameDriver::new();

    if let Some(fps) = settings.target_fps {
        driver.add_strategy(FrameRateLimiter::new(fps as f64)?);
    }

    driver.add_strategy(FpsMeter);

    if settings.culling {
        driver.add_strategy(VisibilityCuller::new());
    }

    if let Some(res) = &settings.resolution {
        driver.add_strategy(ResolutionScaler::new(res.clone())?);
    }

    info!(
        "Frame driver: target fps {:?}, culling {}, dynamic resolution {}",
        settings.target_fps,
        settings.culling,
        settings.resolution.is_some()
    );

    Ok(driver)
}
