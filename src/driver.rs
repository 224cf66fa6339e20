//! The frame driver: runs an ordered list of per-frame strategies once per display refresh.
//!
//! Scheduling is cooperative and single-threaded. Each strategy runs to completion before the
//! next one, and all of them complete before the host requests the next tick. A strategy can
//! end the current frame early by returning [`FrameFlow::Skip`] (e.g. the frame-rate limiter),
//! or by returning an error; errors go to the driver's [`ErrorSink`], and the next tick is a
//! fresh attempt.

use std::{cell::Cell, rc::Rc};

use log::{debug, error, info};

use crate::error::{FrameError, Result};

/// The data handed to each strategy for one display refresh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTick {
    /// Monotonic timestamp of this refresh, in milliseconds.
    pub timestamp: f64,
    /// Number of ticks dispatched before this one.
    pub index: u64,
}

/// Returned by a strategy to indicate whether the rest of this frame's strategies run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FrameFlow {
    #[default]
    Continue,
    /// Skip the remaining strategies for this tick.
    Skip,
}

/// What happened during a single tick. Hosts use this to decide whether to request another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Every strategy ran.
    Rendered,
    /// A strategy returned `FrameFlow::Skip`.
    Skipped,
    /// A strategy failed; the failure was reported to the error sink.
    Failed,
    /// The driver isn't running; nothing was invoked.
    Stopped,
}

impl TickOutcome {
    pub fn keep_ticking(self) -> bool {
        self != Self::Stopped
    }
}

/// A unit of per-frame work. `C` is the frame context the application passes in: the scene,
/// the rendering surface, the fps sampler etc. Strategies must not block.
pub trait FrameStrategy<C> {
    /// Used when reporting failures.
    fn name(&self) -> &str;

    fn on_frame(&mut self, ctx: &mut C, tick: &FrameTick) -> Result<FrameFlow>;
}

/// Wraps a closure as a strategy. This is how applications plug their own per-frame code
/// (e.g. animation, or issuing draw calls) in after the built-in strategies.
pub struct FnStrategy<F> {
    name: String,
    f: F,
}

impl<F> FnStrategy<F> {
    pub fn new(name: &str, f: F) -> Self {
        Self {
            name: name.to_owned(),
            f,
        }
    }
}

impl<C, F> FrameStrategy<C> for FnStrategy<F>
where
    F: FnMut(&mut C, &FrameTick) -> Result<FrameFlow>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_frame(&mut self, ctx: &mut C, tick: &FrameTick) -> Result<FrameFlow> {
        (self.f)(ctx, tick)
    }
}

/// Receives strategy failures. The driver keeps ticking after reporting.
pub trait ErrorSink {
    fn report(&mut self, err: &FrameError);
}

/// The default sink; writes failures to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl ErrorSink for LogSink {
    fn report(&mut self, err: &FrameError) {
        error!("{err}");
    }
}

impl<F: FnMut(&FrameError)> ErrorSink for F {
    fn report(&mut self, err: &FrameError) {
        self(err)
    }
}

/// Supplies one monotonically increasing timestamp (ms) per display refresh. `None` ends the
/// run. Any iterator of timestamps works; the winit host drives `FrameDriver::tick` directly
/// from redraw events instead.
pub trait TickSource {
    fn next_tick(&mut self) -> Option<f64>;
}

impl<I: Iterator<Item = f64>> TickSource for I {
    fn next_tick(&mut self) -> Option<f64> {
        self.next()
    }
}

/// A cloneable handle to the driver's running flag. Lets a strategy, or host code that doesn't
/// own the driver, stop it. Takes effect at the next tick boundary.
#[derive(Clone, Debug)]
pub struct DriverHandle {
    running: Rc<Cell<bool>>,
}

impl DriverHandle {
    pub fn stop(&self) {
        self.running.set(false);
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }
}

pub struct FrameDriver<C> {
    strategies: Vec<Box<dyn FrameStrategy<C>>>,
    running: Rc<Cell<bool>>,
    error_sink: Box<dyn ErrorSink>,
    ticks: u64,
}

impl<C> Default for FrameDriver<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> FrameDriver<C> {
    /// Create a stopped driver with no strategies, reporting failures to the log.
    pub fn new() -> Self {
        Self::with_error_sink(LogSink)
    }

    pub fn with_error_sink(sink: impl ErrorSink + 'static) -> Self {
        Self {
            strategies: Vec::new(),
            running: Rc::new(Cell::new(false)),
            error_sink: Box::new(sink),
            ticks: 0,
        }
    }

    /// Append a strategy. Strategies run in the order they're added.
    pub fn add_strategy(&mut self, strategy: impl FrameStrategy<C> + 'static) -> &mut Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    pub fn start(&mut self) {
        if !self.running.replace(true) {
            info!("Frame driver started with {} strategies", self.strategies.len());
        }
    }

    /// Prevent further ticks. A tick already in progress completes.
    pub fn stop(&mut self) {
        if self.running.replace(false) {
            info!("Frame driver stopped after {} ticks", self.ticks);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn handle(&self) -> DriverHandle {
        DriverHandle {
            running: Rc::clone(&self.running),
        }
    }

    /// Number of ticks dispatched to strategies so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one display refresh through the strategy chain.
    pub fn tick(&mut self, ctx: &mut C, timestamp: f64) -> TickOutcome {
        if !self.running.get() {
            return TickOutcome::Stopped;
        }

        let tick = FrameTick {
            timestamp,
            index: self.ticks,
        };
        self.ticks += 1;

        for strategy in &mut self.strategies {
            match strategy.on_frame(ctx, &tick) {
                Ok(FrameFlow::Continue) => (),
                Ok(FrameFlow::Skip) => return TickOutcome::Skipped,
                Err(e) => {
                    let err = match e {
                        FrameError::StrategyFailure { .. } => e,
                        other => FrameError::strategy(strategy.name(), other.to_string()),
                    };
                    self.error_sink.report(&err);
                    return TickOutcome::Failed;
                }
            }
        }

        TickOutcome::Rendered
    }

    /// Start the driver, and tick it from `source` until the source runs dry or the driver is
    /// stopped. Returns the number of ticks dispatched during this run.
    pub fn run(&mut self, ctx: &mut C, source: &mut impl TickSource) -> u64 {
        self.start();
        let start_ticks = self.ticks;

        while self.running.get() {
            let Some(timestamp) = source.next_tick() else {
                debug!("Tick source exhausted");
                break;
            };
            self.tick(ctx, timestamp);
        }

        self.ticks - start_ticks
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct Log {
        calls: Vec<(&'static str, u64)>,
    }

    fn recorder(name: &'static str) -> FnStrategy<impl FnMut(&mut Log, &FrameTick) -> Result<FrameFlow>> {
        FnStrategy::new(name, move |log: &mut Log, tick: &FrameTick| {
            log.calls.push((name, tick.index));
            Ok(FrameFlow::Continue)
        })
    }

    #[test]
    fn strategies_run_in_insertion_order() {
        let mut driver = FrameDriver::new();
        driver.add_strategy(recorder("a")).add_strategy(recorder("b"));
        driver.start();

        let mut log = Log::default();
        assert_eq!(driver.tick(&mut log, 0.), TickOutcome::Rendered);
        assert_eq!(driver.tick(&mut log, 16.), TickOutcome::Rendered);

        assert_eq!(log.calls, vec![("a", 0), ("b", 0), ("a", 1), ("b", 1)]);
    }

    #[test]
    fn stopped_driver_invokes_nothing() {
        let mut driver = FrameDriver::new();
        driver.add_strategy(recorder("a"));

        let mut log = Log::default();
        assert_eq!(driver.tick(&mut log, 0.), TickOutcome::Stopped);
        assert!(log.calls.is_empty());
        assert_eq!(driver.ticks(), 0);
    }

    #[test]
    fn skip_ends_the_chain_for_that_tick() {
        let mut driver = FrameDriver::new();
        driver
            .add_strategy(FnStrategy::new("gate", |_: &mut Log, tick: &FrameTick| {
                Ok(if tick.index % 2 == 0 {
                    FrameFlow::Continue
                } else {
                    FrameFlow::Skip
                })
            }))
            .add_strategy(recorder("work"));
        driver.start();

        let mut log = Log::default();
        let outcomes: Vec<_> = (0..4).map(|i| driver.tick(&mut log, i as f64)).collect();

        assert_eq!(
            outcomes,
            vec![
                TickOutcome::Rendered,
                TickOutcome::Skipped,
                TickOutcome::Rendered,
                TickOutcome::Skipped
            ]
        );
        assert_eq!(log.calls, vec![("work", 0), ("work", 2)]);
    }

    #[test]
    fn failure_is_reported_and_ticking_continues() {
        let reported = Rc::new(RefCell::new(Vec::new()));
        let sink = {
            let reported = Rc::clone(&reported);
            move |e: &FrameError| reported.borrow_mut().push(e.clone())
        };

        let mut driver = FrameDriver::with_error_sink(sink);
        driver
            .add_strategy(FnStrategy::new("flaky", |_: &mut Log, tick: &FrameTick| {
                if tick.index == 0 {
                    Err(FrameError::InvalidConfiguration("boom".to_owned()))
                } else {
                    Ok(FrameFlow::Continue)
                }
            }))
            .add_strategy(recorder("after"));
        driver.start();

        let mut log = Log::default();
        assert_eq!(driver.tick(&mut log, 0.), TickOutcome::Failed);
        assert_eq!(driver.tick(&mut log, 16.), TickOutcome::Rendered);

        // The failing tick skipped the strategy after it; the next tick ran it.
        assert_eq!(log.calls, vec![("after", 1)]);

        let reported = reported.borrow();
        assert_eq!(reported.len(), 1);
        match &reported[0] {
            FrameError::StrategyFailure { strategy, reason } => {
                assert_eq!(strategy, "flaky");
                assert!(reason.contains("boom"));
            }
            e => panic!("Unexpected error: {e:?}"),
        }
    }

    #[test]
    fn stop_during_a_tick_prevents_the_next_one() {
        let mut driver = FrameDriver::new();
        let handle = driver.handle();

        driver
            .add_strategy(FnStrategy::new("stopper", move |_: &mut Log, tick: &FrameTick| {
                if tick.index == 2 {
                    handle.stop();
                }
                Ok(FrameFlow::Continue)
            }))
            .add_strategy(recorder("after"));

        let mut log = Log::default();
        let mut source = (0..10).map(|i| i as f64 * 16.);
        let dispatched = driver.run(&mut log, &mut source);

        assert_eq!(dispatched, 3);
        assert!(!driver.is_running());
        // The in-flight tick completed, including strategies after the stop.
        assert_eq!(log.calls.last(), Some(&("after", 2)));
        assert_eq!(driver.tick(&mut log, 1_000.), TickOutcome::Stopped);
        assert!(!TickOutcome::Stopped.keep_ticking());
    }

    #[test]
    fn run_ends_when_source_is_exhausted() {
        let mut driver = FrameDriver::new();
        driver.add_strategy(recorder("a"));

        let mut log = Log::default();
        let dispatched = driver.run(&mut log, &mut [0., 16., 33.].into_iter());

        assert_eq!(dispatched, 3);
        assert!(driver.is_running());
    }
}
