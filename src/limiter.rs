//! Frame pacing: only let a frame through once enough wall-clock time has passed since the
//! last accepted one.

use log::debug;

use crate::{
    driver::{FrameFlow, FrameStrategy, FrameTick},
    error::{FrameError, Result},
};

#[derive(Clone, Debug)]
pub struct FrameRateLimiter {
    /// Milliseconds.
    target_interval: f64,
    /// Milliseconds. `None` until the first frame is accepted.
    last_accepted: Option<f64>,
}

impl FrameRateLimiter {
    /// Limit to `target_fps` frames per second.
    pub fn new(target_fps: f64) -> Result<Self> {
        if !target_fps.is_finite() || target_fps <= 0. {
            return Err(FrameError::InvalidConfiguration(format!(
                "target frame rate must be positive and finite; got {target_fps}"
            )));
        }
        Self::from_interval(1_000. / target_fps)
    }

    /// Accept at most one frame per `target_interval` milliseconds.
    pub fn from_interval(target_interval: f64) -> Result<Self> {
        if !target_interval.is_finite() || target_interval <= 0. {
            return Err(FrameError::InvalidConfiguration(format!(
                "target frame interval must be positive and finite; got {target_interval} ms"
            )));
        }

        debug!("Frame rate limiter: {target_interval:.2} ms interval");

        Ok(Self {
            target_interval,
            last_accepted: None,
        })
    }

    pub fn target_interval(&self) -> f64 {
        self.target_interval
    }

    pub fn last_accepted(&self) -> Option<f64> {
        self.last_accepted
    }

    /// Returns true if the frame at `timestamp` should run. The accepted timestamp is snapped
    /// back onto the interval grid, so lateness on one frame doesn't accumulate into drift.
    pub fn accept(&mut self, timestamp: f64) -> bool {
        let Some(last) = self.last_accepted else {
            self.last_accepted = Some(timestamp);
            return true;
        };

        let elapsed = timestamp - last;
        if elapsed < self.target_interval {
            // This includes a timestamp that went backwards; `last_accepted` never decreases.
            return false;
        }

        self.last_accepted = Some(timestamp - elapsed % self.target_interval);
        true
    }
}

impl<C> FrameStrategy<C> for FrameRateLimiter {
    fn name(&self) -> &str {
        "frame rate limiter"
    }

    fn on_frame(&mut self, _ctx: &mut C, tick: &FrameTick) -> Result<FrameFlow> {
        Ok(if self.accept(tick.timestamp) {
            FrameFlow::Continue
        } else {
            FrameFlow::Skip
        })
    }
}
