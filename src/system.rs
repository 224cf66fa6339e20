//! GPU surface setup, and the `run` entry point that ties the frame driver to a Winit window.

use std::sync::Arc;

use log::{debug, info, warn};
use wgpu::{
    Color, CommandEncoderDescriptor, Device, DeviceDescriptor, Instance, LoadOp, Operations,
    PowerPreference, Queue, RenderPassColorAttachment, RenderPassDescriptor,
    RequestAdapterOptions, StoreOp, Surface, SurfaceConfiguration, SurfaceError,
    TextureViewDescriptor,
};
use winit::{
    dpi::PhysicalSize,
    event_loop::{ControlFlow, EventLoop},
    window::Window,
};

use crate::{
    context::{FrameContext, build_driver},
    driver::{FnStrategy, FrameFlow, FrameTick},
    error::{FrameError, Result},
    types::{PacingSettings, Scene},
    window::State,
};

/// The surface resolution for a window of `size` physical pixels at `pixel_ratio`. Each
/// dimension is at least 1, and at most `max_dim` (the device's texture size limit). When the
/// limit applies, the ratio is reduced for both dimensions, keeping the aspect ratio.
pub fn scaled_size(size: PhysicalSize<u32>, pixel_ratio: f32, max_dim: u32) -> (u32, u32) {
    let max_dim = max_dim.max(1);
    let largest = size.width.max(size.height).max(1) as f32;
    let ratio = pixel_ratio.min(max_dim as f32 / largest);

    let scale = |v: u32| ((v as f32 * ratio).round() as u32).clamp(1, max_dim);
    (scale(size.width), scale(size.height))
}

/// The device, queue, and surface for one window.
pub(crate) struct RenderState {
    pub surface: Surface<'static>,
    pub device: Device,
    pub queue: Queue,
    pub surface_cfg: SurfaceConfiguration,
    /// The window's physical size; the surface is this times the pixel ratio.
    pub size: PhysicalSize<u32>,
    pub window: Arc<Window>,
}

impl RenderState {
    pub(crate) fn new(window: Arc<Window>, pixel_ratio: f32) -> Result<Self> {
        let size = window.inner_size();

        let instance = Instance::default();
        let surface = instance
            .create_surface(Arc::clone(&window))
            .map_err(|e| FrameError::Surface(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&RequestAdapterOptions {
            power_preference: PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            ..RequestAdapterOptions::default()
        }))
        .map_err(|e| FrameError::Surface(e.to_string()))?;

        info!("Using graphics adapter: {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(&DeviceDescriptor {
            label: Some("Render device"),
            ..Default::default()
        }))
        .map_err(|e| FrameError::Surface(e.to_string()))?;

        let max_dim = device.limits().max_texture_dimension_2d;
        let (width, height) = scaled_size(size, pixel_ratio, max_dim);
        let surface_cfg = surface
            .get_default_config(&adapter, width, height)
            .ok_or_else(|| {
                FrameError::Surface("The surface isn't supported by the adapter".to_owned())
            })?;

        surface.configure(&device, &surface_cfg);

        Ok(Self {
            surface,
            device,
            queue,
            surface_cfg,
            size,
            window,
        })
    }

    /// Reconfigure the surface for a new window size, or a new pixel ratio.
    pub(crate) fn resize(&mut self, size: PhysicalSize<u32>, pixel_ratio: f32) {
        self.size = size;
        if size.width == 0 || size.height == 0 {
            return;
        }

        let max_dim = self.device.limits().max_texture_dimension_2d;
        let (width, height) = scaled_size(size, pixel_ratio, max_dim);
        if width == self.surface_cfg.width && height == self.surface_cfg.height {
            return;
        }

        debug!("Reconfiguring surface: {width}x{height} (pixel ratio {pixel_ratio:.2})");

        self.surface_cfg.width = width;
        self.surface_cfg.height = height;
        self.surface.configure(&self.device, &self.surface_cfg);
    }

    /// Clear the surface to the background color, and present it.
    pub(crate) fn render(&mut self, background: (f32, f32, f32)) {
        let output_frame = match self.surface.get_current_texture() {
            Ok(f) => f,
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                warn!("Surface lost or outdated; reconfiguring");
                self.surface.configure(&self.device, &self.surface_cfg);
                return;
            }
            // This occurs when minimized.
            Err(e) => {
                debug!("Unable to get the surface texture: {e}");
                return;
            }
        };

        let output_view = output_frame
            .texture
            .create_view(&TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render encoder"),
            });

        {
            let _rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("Render pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &output_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(Color {
                            r: background.0 as f64,
                            g: background.1 as f64,
                            b: background.2 as f64,
                            a: 1.0,
                        }),
                        store: StoreOp::Store,
                    },
                })],
                ..Default::default()
            });
        }

        self.queue.submit(Some(encoder.finish()));
        output_frame.present();
    }
}

/// Open a window, and run the frame driver on every display refresh until the window closes,
/// or the driver is stopped.
///
/// The driver runs the built-in strategies from `pacing`, then `render_handler` on each accepted
/// frame. `render_handler` receives the application state, the scene (with visibility flags
/// already updated), and the time since the previous accepted frame in seconds.
pub fn run<T, F>(user_state: T, scene: Scene, pacing: PacingSettings, render_handler: F) -> Result<()>
where
    T: 'static,
    F: FnMut(&mut T, &mut Scene, f32) -> Result<()> + 'static,
{
    let ctx = FrameContext::from_settings(scene, &pacing)?;
    let mut driver = build_driver(&pacing)?;

    let mut user_state = user_state;
    let mut render_handler = render_handler;
    driver.add_strategy(FnStrategy::new(
        "render handler",
        move |ctx: &mut FrameContext, _tick: &FrameTick| -> Result<FrameFlow> {
            let dt = ctx.fps.frame_time().unwrap_or_default() as f32 / 1_000.;
            render_handler(&mut user_state, &mut ctx.scene, dt)?;
            Ok(FrameFlow::Continue)
        },
    ));

    let event_loop = EventLoop::new().map_err(|e| FrameError::Window(e.to_string()))?;
    // Redraws are requested by the state after each tick.
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut state = State::new(ctx, driver);
    event_loop
        .run_app(&mut state)
        .map_err(|e| FrameError::Window(e.to_string()))?;

    match state.take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
