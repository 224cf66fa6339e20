//! Frame-rate measurement. Counts accepted frames and publishes an fps sample once per window.

use log::trace;

use crate::{
    driver::{FrameFlow, FrameStrategy, FrameTick},
    error::{FrameError, Result},
};

/// One published frames-per-second measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FpsSample {
    pub fps: f32,
    /// Increments with each publication. Consumers use it to act once per measurement,
    /// rather than once per frame.
    pub seq: u64,
}

/// Anything that can report the most recent frames-per-second measurement.
pub trait FpsSource {
    /// `None` until a first measurement exists.
    fn fps_sample(&self) -> Option<FpsSample>;
}

/// Gives the `FpsMeter` strategy access to the counter in the frame context.
pub trait FrameStats {
    fn fps_counter_mut(&mut self) -> &mut FpsCounter;
}

#[derive(Clone, Debug)]
pub struct FpsCounter {
    window_ms: f64,
    window_start: Option<f64>,
    frames: u32,
    last_frame: Option<f64>,
    frame_time: Option<f64>,
    fps: Option<f32>,
    published: u64,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self {
            window_ms: 1_000.,
            window_start: None,
            frames: 0,
            last_frame: None,
            frame_time: None,
            fps: None,
            published: 0,
        }
    }
}

impl FpsCounter {
    pub fn new(window_ms: f64) -> Result<Self> {
        if !window_ms.is_finite() || window_ms <= 0. {
            return Err(FrameError::InvalidConfiguration(format!(
                "fps sample window must be positive and finite; got {window_ms} ms"
            )));
        }

        Ok(Self {
            window_ms,
            ..Default::default()
        })
    }

    /// Record a frame at `timestamp` (ms). Returns the new fps value when a window closes.
    pub fn record_frame(&mut self, timestamp: f64) -> Option<f32> {
        if let Some(last) = self.last_frame {
            self.frame_time = Some((timestamp - last).max(0.));
        }
        self.last_frame = Some(timestamp);

        // The first frame opens the window; frames are counted after it.
        let Some(start) = self.window_start else {
            self.window_start = Some(timestamp);
            return None;
        };

        self.frames += 1;

        let elapsed = timestamp - start;
        if elapsed < self.window_ms {
            return None;
        }

        let fps = (self.frames as f64 * 1_000. / elapsed) as f32;
        self.fps = Some(fps);
        self.published += 1;
        self.window_start = Some(timestamp);
        self.frames = 0;

        Some(fps)
    }

    /// The latest published measurement.
    pub fn fps(&self) -> Option<f32> {
        self.fps
    }

    /// Time between the last two recorded frames, in ms.
    pub fn frame_time(&self) -> Option<f64> {
        self.frame_time
    }

    /// Forget the current window, e.g. after the loop was paused. The last published fps
    /// value is kept.
    pub fn reset(&mut self) {
        self.window_start = None;
        self.frames = 0;
        self.last_frame = None;
        self.frame_time = None;
    }
}

impl FpsSource for FpsCounter {
    fn fps_sample(&self) -> Option<FpsSample> {
        self.fps.map(|fps| FpsSample {
            fps,
            seq: self.published,
        })
    }
}

/// Records every frame that reaches it into the context's `FpsCounter`. Place it after the
/// frame-rate limiter, so it measures delivered frames rather than display refreshes.
#[derive(Clone, Copy, Debug, Default)]
pub struct FpsMeter;

impl<C: FrameStats> FrameStrategy<C> for FpsMeter {
    fn name(&self) -> &str {
        "fps meter"
    }

    fn on_frame(&mut self, ctx: &mut C, tick: &FrameTick) -> Result<FrameFlow> {
        if let Some(fps) = ctx.fps_counter_mut().record_frame(tick.timestamp) {
            trace!("fps: {fps:.1}");
        }
        Ok(FrameFlow::Continue)
    }
}
