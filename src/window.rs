//! Handles window initialization and events, using Winit.

use std::{error::Error, path::Path, sync::Arc, time::Instant};

use log::{debug, info, warn};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    window::{Icon, WindowAttributes, WindowId},
};

use crate::{
    context::FrameContext,
    driver::{FrameDriver, TickOutcome},
    error::FrameError,
    resolution::SurfaceScale,
    system::RenderState,
};

fn load_icon(path: &Path) -> Result<Icon, Box<dyn Error>> {
    let (icon_rgba, icon_width, icon_height) = {
        let image = image::open(path)?.into_rgba8();
        let (width, height) = image.dimensions();
        let rgba = image.into_raw();
        (rgba, width, height)
    };
    Ok(Icon::from_rgba(icon_rgba, icon_width, icon_height)?)
}

/// What the host does after a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AfterTick {
    /// Present, and request the next redraw. Skipped and failed ticks present too: presenting
    /// blocks on vsync, and that is what paces redraws to the display.
    Present,
    Exit,
}

impl From<TickOutcome> for AfterTick {
    fn from(outcome: TickOutcome) -> Self {
        if outcome.keep_ticking() {
            Self::Present
        } else {
            Self::Exit
        }
    }
}

/// Reasons ticking is suspended. Each is set and cleared by its own window event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Pause {
    /// Zero-sized window.
    minimized: bool,
    occluded: bool,
}

impl Pause {
    fn is_paused(self) -> bool {
        self.minimized || self.occluded
    }
}

/// Owns the frame context and driver for the lifetime of the event loop. Each redraw is one
/// driver tick.
pub(crate) struct State {
    ctx: FrameContext,
    driver: FrameDriver<FrameContext>,
    render: Option<RenderState>,
    /// Tick timestamps are measured from this.
    clock: Instant,
    /// No ticks are dispatched while paused.
    pause: Pause,
    /// A fatal error from window or surface setup; returned from `run`.
    error: Option<FrameError>,
}

impl State {
    pub(crate) fn new(ctx: FrameContext, driver: FrameDriver<FrameContext>) -> Self {
        Self {
            ctx,
            driver,
            render: None,
            clock: Instant::now(),
            pause: Pause::default(),
            error: None,
        }
    }

    pub(crate) fn take_error(&mut self) -> Option<FrameError> {
        self.error.take()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: FrameError) {
        self.error = Some(err);
        self.driver.stop();
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(render) = self.render.as_mut() else {
            return;
        };

        if self.pause.is_paused() {
            return;
        }

        let timestamp = self.clock.elapsed().as_secs_f64() * 1_000.;
        let outcome = self.driver.tick(&mut self.ctx, timestamp);

        // The resolution scaler changed the pixel ratio during this tick.
        if self.ctx.take_surface_dirty() {
            render.resize(render.size, self.ctx.pixel_ratio());
        }

        match AfterTick::from(outcome) {
            AfterTick::Present => {
                render.render(self.ctx.scene.background_color);
                render.window.request_redraw();
            }
            AfterTick::Exit => {
                info!("Frame driver stopped; closing the window");
                event_loop.exit();
            }
        }
    }

    /// Apply a change to the pause reasons. When ticking resumes, the fps window is restarted,
    /// so the time spent paused doesn't register as a slow frame.
    fn update_pause(&mut self, change: impl FnOnce(&mut Pause)) {
        let was_paused = self.pause.is_paused();
        change(&mut self.pause);
        let paused = self.pause.is_paused();

        if paused == was_paused {
            return;
        }
        debug!("Frame driver {}", if paused { "paused" } else { "resumed" });
        self.ctx.fps.reset();

        if !paused {
            if let Some(render) = &self.render {
                render.window.request_redraw();
            }
        }
    }
}

impl ApplicationHandler for State {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Some platforms call this more than once.
        if self.render.is_some() {
            return;
        }

        let scene = &self.ctx.scene;
        let icon = match scene.icon_path {
            Some(ref p) => match load_icon(Path::new(p)) {
                Ok(icon) => Some(icon),
                Err(e) => {
                    warn!("Unable to load the window icon from {p}: {e}");
                    None
                }
            },
            // No path specified
            None => None,
        };

        let attributes = WindowAttributes::default()
            .with_title(&scene.window_title)
            // Physical size vs logical size has implications for pixel-scaled setups,
            // like some high-resolution but small-screen tablets and laptops.
            .with_inner_size(winit::dpi::LogicalSize::new(
                scene.window_size.0,
                scene.window_size.1,
            ))
            .with_window_icon(icon);

        let window = match event_loop.create_window(attributes) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                self.fail(event_loop, FrameError::Window(e.to_string()));
                return;
            }
        };

        let render = match RenderState::new(window, self.ctx.pixel_ratio()) {
            Ok(r) => r,
            Err(e) => {
                self.fail(event_loop, e);
                return;
            }
        };

        self.ctx
            .scene
            .camera
            .set_aspect(render.size.width, render.size.height);

        render.window.request_redraw();
        self.render = Some(render);

        self.clock = Instant::now();
        self.driver.start();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.render.is_none() {
            // This may occur prior to init.
            return;
        }

        match event {
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::CloseRequested => {
                self.driver.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                let zero = physical_size.width == 0 || physical_size.height == 0;
                self.update_pause(|p| p.minimized = zero);

                if !zero {
                    self.ctx
                        .scene
                        .camera
                        .set_aspect(physical_size.width, physical_size.height);

                    let ratio = self.ctx.pixel_ratio();
                    if let Some(render) = self.render.as_mut() {
                        render.resize(physical_size, ratio);
                    }
                }
            }
            WindowEvent::Occluded(occ) => self.update_pause(|p| p.occluded = occ),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                // A `Resized` event follows with the new physical size.
                debug!("Scale factor changed: {scale_factor}");
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        debug!(
            "Event loop exiting after {} ticks; {} of {} entities visible",
            self.driver.ticks(),
            self.ctx.scene.visible_count(),
            self.ctx.scene.entities.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_live_tick_presents() {
        for outcome in [
            TickOutcome::Rendered,
            TickOutcome::Skipped,
            TickOutcome::Failed,
        ] {
            assert_eq!(AfterTick::from(outcome), AfterTick::Present, "{outcome:?}");
        }
        assert_eq!(AfterTick::from(TickOutcome::Stopped), AfterTick::Exit);
    }

    #[test]
    fn pause_holds_while_any_reason_does() {
        let mut pause = Pause::default();
        assert!(!pause.is_paused());

        pause.occluded = true;
        // A resize to a real size doesn't resume an occluded window.
        pause.minimized = false;
        assert!(pause.is_paused());

        pause.minimized = true;
        pause.occluded = false;
        // Nor does un-occluding a minimized one.
        assert!(pause.is_paused());

        pause.minimized = false;
        assert!(!pause.is_paused());
    }
}
