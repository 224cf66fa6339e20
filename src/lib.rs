//! Frame pacing for real-time rendering loops.
//!
//! This library runs an ordered set of per-frame strategies once per display refresh: a
//! frame-rate limiter, dynamic resolution scaling driven by measured fps, and frustum culling
//! against entity bounding volumes. Strategies are plain Rust types implementing
//! [`FrameStrategy`], and application code plugs in after the built-in ones.
//!
//! The core (driver, strategies, frustum math) has no dependency on a window or GPU, and can be
//! driven from any [`TickSource`], e.g. a scripted list of timestamps in tests. [`run`] hosts it
//! in a Winit window, with a [WGPU](https://wgpu.rs/) surface whose resolution follows the scaler.

#[cfg(feature = "app_utils")]
pub mod app_utils;
mod bounds;
mod camera;
mod context;
mod culling;
mod driver;
mod error;
mod frustum;
mod limiter;
mod resolution;
mod stats;
mod system;
mod types;
mod window;

pub use bounds::{Aabb, BoundingSphere, BoundingVolume};
pub use camera::Camera;
pub use context::{FrameContext, build_driver};
pub use culling::{CullTarget, Cullable, VisibilityCuller};
pub use driver::{
    DriverHandle, ErrorSink, FnStrategy, FrameDriver, FrameFlow, FrameStrategy, FrameTick,
    LogSink, TickOutcome, TickSource,
};
pub use error::{FrameError, Result};
pub use frustum::{Frustum, Plane};
pub use limiter::FrameRateLimiter;
pub use resolution::{ResolutionScaler, SurfaceScale};
pub use stats::{FpsCounter, FpsMeter, FpsSample, FpsSource, FrameStats};
pub use system::{run, scaled_size};
pub use types::{
    Entity, FWD_VEC, PacingSettings, RIGHT_VEC, ResolutionSettings, Scene, UP_VEC,
};
// Re-export winit, so the calling lib doesn't need it as a direct dependency.
pub use winit;
