//! Shared animation clock.
//!
//! Every running effect registers one handler on the [`Ticker`]; `drive`
//! advances all of them by the same delta. A handler returns
//! [`TickFlow::Done`] to deregister itself. Deltas are measured in ticks,
//! where one tick is 1/60 s of wall time.

use std::fmt;

/// Wall-clock seconds per tick.
pub const TICK_SECONDS: f32 = 1.0 / 60.0;

/// Whether a handler wants to keep receiving ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickFlow {
    Continue,
    Done,
}

/// A per-tick callback operating on a shared context `C`.
pub trait TickHandler<C> {
    fn tick(&mut self, ctx: &mut C, delta: f32) -> TickFlow;
}

impl<C, F> TickHandler<C> for F
where
    F: FnMut(&mut C, f32) -> TickFlow,
{
    fn tick(&mut self, ctx: &mut C, delta: f32) -> TickFlow {
        self(ctx, delta)
    }
}

/// Registration handle returned by [`Ticker::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickerHandle(u64);

/// Owns all registered tick handlers. Dropping or clearing the ticker stops
/// every animation tied to it.
pub struct Ticker<C> {
    handlers: Vec<(TickerHandle, Box<dyn TickHandler<C>>)>,
    next_handle: u64,
    elapsed: f32,
}

impl<C> Ticker<C> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            next_handle: 0,
            elapsed: 0.0,
        }
    }

    pub fn register(&mut self, handler: impl TickHandler<C> + 'static) -> TickerHandle {
        let handle = TickerHandle(self.next_handle);
        self.next_handle += 1;
        self.handlers.push((handle, Box::new(handler)));
        handle
    }

    /// Remove a handler without ticking it again. Returns false if it was
    /// already gone.
    pub fn deregister(&mut self, handle: TickerHandle) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(h, _)| *h != handle);
        self.handlers.len() != before
    }

    /// Advance every handler by `delta` ticks, in registration order.
    /// Returns how many handlers finished during this drive.
    pub fn drive(&mut self, ctx: &mut C, delta: f32) -> usize {
        self.elapsed += delta;
        let before = self.handlers.len();
        self.handlers
            .retain_mut(|(_, handler)| handler.tick(ctx, delta) == TickFlow::Continue);
        before - self.handlers.len()
    }

    /// Drop every handler.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Total ticks driven since creation.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl<C> Default for Ticker<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Ticker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticker")
            .field("handlers", &self.handlers.len())
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

/// Fixed timestep accumulator.
/// Turns variable frame times into a whole number of ticks.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    /// The fixed delta time per tick.
    dt: f32,
    /// Accumulated time from variable frame deltas.
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            accumulator: 0.0,
        }
    }

    /// Add frame time to the accumulator. Returns the number of fixed steps to run.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt;
        // Cap to prevent spiral of death (max 10 steps per frame)
        self.accumulator = self.accumulator.min(self.dt * 10.0);
        let steps = (self.accumulator / self.dt) as u32;
        self.accumulator -= steps as f32 * self.dt;
        steps
    }

    /// Interpolation alpha between ticks (0.0 to 1.0).
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.dt
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(TICK_SECONDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn countdown(ticks: u32) -> impl FnMut(&mut Vec<u32>, f32) -> TickFlow {
        let mut left = ticks;
        move |log: &mut Vec<u32>, _| {
            left -= 1;
            log.push(left);
            if left == 0 {
                TickFlow::Done
            } else {
                TickFlow::Continue
            }
        }
    }

    #[test]
    fn handlers_deregister_themselves_when_done() {
        let mut ticker = Ticker::new();
        let mut log = Vec::new();
        ticker.register(countdown(2));
        ticker.register(countdown(3));

        assert_eq!(ticker.drive(&mut log, 1.0), 0);
        assert_eq!(ticker.drive(&mut log, 1.0), 1);
        assert_eq!(ticker.len(), 1);
        assert_eq!(ticker.drive(&mut log, 1.0), 1);
        assert!(ticker.is_empty());
        assert_eq!(log, vec![1, 2, 0, 1, 0]);
    }

    #[test]
    fn deregister_stops_ticking() {
        let mut ticker = Ticker::new();
        let mut log = Vec::new();
        let h = ticker.register(countdown(5));
        ticker.drive(&mut log, 1.0);
        assert!(ticker.deregister(h));
        assert!(!ticker.deregister(h));
        ticker.drive(&mut log, 1.0);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn clear_drops_all_handlers() {
        let mut ticker: Ticker<Vec<u32>> = Ticker::new();
        ticker.register(countdown(5));
        ticker.register(countdown(5));
        ticker.clear();
        assert!(ticker.is_empty());
        ticker.drive(&mut Vec::new(), 2.5);
        assert_eq!(ticker.elapsed(), 2.5);
    }

    #[test]
    fn one_step_exact() {
        let mut ts = FixedTimestep::default();
        assert_eq!(ts.accumulate(TICK_SECONDS), 1);
    }

    #[test]
    fn accumulates_partial() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        assert_eq!(ts.accumulate(0.008), 0);
        assert_eq!(ts.accumulate(0.010), 1);
    }

    #[test]
    fn caps_at_ten_steps() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        assert_eq!(ts.accumulate(1.0), 10);
    }

    #[test]
    fn alpha_is_between_zero_and_one() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        ts.accumulate(0.008);
        let a = ts.alpha();
        assert!((0.0..=1.0).contains(&a), "alpha was {}", a);
    }
}
