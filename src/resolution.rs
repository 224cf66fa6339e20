//! Dynamic resolution: step the rendering surface's scale factor down when the frame rate is
//! low, and back up when there's headroom.

use log::debug;

use crate::{
    driver::{FrameFlow, FrameStrategy, FrameTick},
    error::{FrameError, Result},
    stats::FpsSource,
    types::ResolutionSettings,
};

/// A rendering surface with a settable pixel density, relative to its display size.
pub trait SurfaceScale {
    fn pixel_ratio(&self) -> f32;

    /// Writing this may reallocate the surface; the scaler only calls it when the value changes.
    fn set_pixel_ratio(&mut self, ratio: f32);
}

#[derive(Clone, Debug)]
pub struct ResolutionScaler {
    settings: ResolutionSettings,
    scale: f32,
    /// Only used when smoothing is enabled.
    fps_avg: Option<f32>,
    /// Sequence number of the last fps sample acted on.
    last_seq: Option<u64>,
}

fn invalid(msg: String) -> FrameError {
    FrameError::InvalidConfiguration(msg)
}

impl ResolutionScaler {
    pub fn new(settings: ResolutionSettings) -> Result<Self> {
        let s = &settings;

        if !(s.min.is_finite() && s.max.is_finite()) || s.min <= 0. {
            return Err(invalid(format!(
                "resolution scale bounds must be positive and finite; got [{}, {}]",
                s.min, s.max
            )));
        }
        if s.min > s.max {
            return Err(invalid(format!(
                "minimum resolution scale {} is above the maximum {}",
                s.min, s.max
            )));
        }
        if !s.step.is_finite() || s.step <= 0. {
            return Err(invalid(format!(
                "resolution step must be positive; got {}",
                s.step
            )));
        }
        if !(s.low_fps < s.high_fps) {
            return Err(invalid(format!(
                "low fps threshold {} must be below the high threshold {}",
                s.low_fps, s.high_fps
            )));
        }
        if !(s.start >= s.min && s.start <= s.max) {
            return Err(invalid(format!(
                "starting resolution scale {} is outside [{}, {}]",
                s.start, s.min, s.max
            )));
        }
        if let Some(alpha) = s.smoothing {
            if !(alpha > 0. && alpha <= 1.) {
                return Err(invalid(format!(
                    "fps smoothing factor must be in (0, 1]; got {alpha}"
                )));
            }
        }

        Ok(Self {
            scale: settings.start,
            settings,
            fps_avg: None,
            last_seq: None,
        })
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn settings(&self) -> &ResolutionSettings {
        &self.settings
    }

    /// Feed one fps sample, and return the resulting scale factor. Between the two thresholds
    /// the factor is left alone. Non-finite samples are ignored.
    pub fn update(&mut self, fps_sample: f32) -> f32 {
        if !fps_sample.is_finite() {
            return self.scale;
        }

        let fps = match self.settings.smoothing {
            Some(alpha) => {
                let avg = match self.fps_avg {
                    Some(prev) => alpha * fps_sample + (1. - alpha) * prev,
                    None => fps_sample,
                };
                self.fps_avg = Some(avg);
                avg
            }
            None => fps_sample,
        };

        let s = &self.settings;
        if fps < s.low_fps {
            self.scale = (self.scale - s.step).max(s.min);
        } else if fps > s.high_fps {
            self.scale = (self.scale + s.step).min(s.max);
        }

        self.scale
    }
}

impl<C: SurfaceScale + FpsSource> FrameStrategy<C> for ResolutionScaler {
    fn name(&self) -> &str {
        "resolution scaler"
    }

    fn on_frame(&mut self, ctx: &mut C, _tick: &FrameTick) -> Result<FrameFlow> {
        // Step once per published measurement; between publications the sample is stale.
        if let Some(sample) = ctx.fps_sample() {
            if self.last_seq != Some(sample.seq) {
                self.last_seq = Some(sample.seq);
                self.update(sample.fps);
            }
        }

        let current = ctx.pixel_ratio();
        if current != self.scale {
            debug!("Resolution scale: {current:.2} -> {:.2}", self.scale);
            ctx.set_pixel_ratio(self.scale);
        }

        Ok(FrameFlow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::FpsSample;

    fn settings(min: f32, max: f32, step: f32, start: f32) -> ResolutionSettings {
        ResolutionSettings {
            min,
            max,
            step,
            start,
            ..Default::default()
        }
    }

    #[test]
    fn steps_and_clamps() {
        let mut scaler = ResolutionScaler::new(settings(0.5, 2., 0.5, 1.)).unwrap();

        let scales: Vec<_> = [20., 20., 60., 60.]
            .into_iter()
            .map(|fps| scaler.update(fps))
            .collect();

        assert_eq!(scales, vec![0.5, 0.5, 1., 1.5]);
    }

    #[test]
    fn band_leaves_scale_alone() {
        let mut scaler = ResolutionScaler::new(settings(0.5, 2., 0.25, 1.)).unwrap();
        for fps in [30., 40., 50., f32::NAN] {
            assert_eq!(scaler.update(fps), 1.);
        }
    }

    #[test]
    fn never_leaves_bounds() {
        let mut scaler = ResolutionScaler::new(settings(0.6, 1.7, 0.3, 1.)).unwrap();

        // A deterministic pseudo-random walk over fps values.
        let mut x: u32 = 12_345;
        for _ in 0..1_000 {
            x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let fps = (x >> 16) as f32 % 120.;

            let scale = scaler.update(fps);
            assert!((0.6..=1.7).contains(&scale), "{scale} at fps {fps}");
        }
    }

    #[test]
    fn smoothing_damps_a_single_dip() {
        let mut scaler = ResolutionScaler::new(ResolutionSettings {
            smoothing: Some(0.1),
            ..Default::default()
        })
        .unwrap();

        scaler.update(40.);
        // One bad frame: the average is 37, still inside the band.
        assert_eq!(scaler.update(10.), 1.);
    }

    #[test]
    fn non_finite_samples_dont_poison_the_average() {
        let mut scaler = ResolutionScaler::new(ResolutionSettings {
            smoothing: Some(0.5),
            ..Default::default()
        })
        .unwrap();

        scaler.update(40.);
        assert_eq!(scaler.update(f32::NAN), 1.);
        assert_eq!(scaler.update(f32::INFINITY), 1.);

        // The average is still live: (40 + 10) / 2 = 25, below the low threshold.
        assert_eq!(scaler.update(10.), 0.75);
    }

    #[test]
    fn rejects_bad_settings() {
        let bad = [
            settings(2., 0.5, 0.5, 1.),
            settings(0., 2., 0.5, 1.),
            settings(0.5, 2., 0., 1.),
            settings(0.5, 2., 0.5, 3.),
            ResolutionSettings {
                low_fps: 60.,
                high_fps: 30.,
                ..Default::default()
            },
            ResolutionSettings {
                smoothing: Some(0.),
                ..Default::default()
            },
        ];

        for s in bad {
            assert!(
                matches!(
                    ResolutionScaler::new(s.clone()),
                    Err(FrameError::InvalidConfiguration(_))
                ),
                "{s:?}"
            );
        }
    }

    struct Surface {
        ratio: f32,
        writes: u32,
        sample: Option<FpsSample>,
    }

    impl Surface {
        /// Publish a new measurement.
        fn publish(&mut self, fps: f32) {
            let seq = self.sample.map_or(1, |s| s.seq + 1);
            self.sample = Some(FpsSample { fps, seq });
        }
    }

    impl SurfaceScale for Surface {
        fn pixel_ratio(&self) -> f32 {
            self.ratio
        }

        fn set_pixel_ratio(&mut self, ratio: f32) {
            self.ratio = ratio;
            self.writes += 1;
        }
    }

    impl FpsSource for Surface {
        fn fps_sample(&self) -> Option<FpsSample> {
            self.sample
        }
    }

    #[test]
    fn writes_surface_only_on_change() {
        let mut scaler = ResolutionScaler::new(settings(0.5, 2., 0.5, 1.)).unwrap();
        let mut surface = Surface {
            ratio: 1.,
            writes: 0,
            sample: None,
        };
        let tick = FrameTick {
            timestamp: 0.,
            index: 0,
        };

        // No sample yet, and the start value matches the surface.
        scaler.on_frame(&mut surface, &tick).unwrap();
        assert_eq!(surface.writes, 0);

        surface.publish(40.);
        scaler.on_frame(&mut surface, &tick).unwrap();
        assert_eq!(surface.writes, 0);

        surface.publish(20.);
        scaler.on_frame(&mut surface, &tick).unwrap();
        surface.publish(20.);
        scaler.on_frame(&mut surface, &tick).unwrap();
        assert_eq!(surface.ratio, 0.5);
        // The second low sample was clamped at the minimum; no second write.
        assert_eq!(surface.writes, 1);
    }

    #[test]
    fn one_sample_moves_the_scale_one_step() {
        let mut scaler = ResolutionScaler::new(ResolutionSettings::default()).unwrap();
        let mut surface = Surface {
            ratio: 1.,
            writes: 0,
            sample: None,
        };

        surface.publish(20.);
        // Many frames go by before the next measurement.
        for index in 0..60 {
            let tick = FrameTick {
                timestamp: index as f64 * 16.,
                index,
            };
            scaler.on_frame(&mut surface, &tick).unwrap();
        }
        assert_eq!(surface.ratio, 0.75);
        assert_eq!(surface.writes, 1);

        surface.publish(60.);
        let tick = FrameTick {
            timestamp: 1_000.,
            index: 60,
        };
        scaler.on_frame(&mut surface, &tick).unwrap();
        scaler.on_frame(&mut surface, &tick).unwrap();
        assert_eq!(surface.ratio, 1.);
    }
}
