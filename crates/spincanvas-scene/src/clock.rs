//! Frame clock with a pluggable monotonic time source

use std::cell::Cell;
use std::rc::Rc;

/// Monotonic time in seconds
pub trait TimeSource {
    fn now_secs(&self) -> f64;
}

/// Hand-driven time source for tests and headless runs
///
/// Clones share the same underlying time, so a probe kept by the caller can
/// advance the clock owned by a mounted canvas.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    now: Rc<Cell<f64>>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, secs: f64) {
        self.now.set(secs);
    }

    pub fn advance(&self, secs: f64) {
        self.now.set(self.now.get() + secs);
    }
}

impl TimeSource for ManualTime {
    fn now_secs(&self) -> f64 {
        self.now.get()
    }
}

/// Per-frame delta and elapsed time
///
/// The clock starts on the first call to [`Clock::delta`], which returns 0.
/// Later deltas are never negative even if the source steps backwards.
#[derive(Debug)]
pub struct Clock<T> {
    source: T,
    running: bool,
    last: f64,
    elapsed: f64,
}

impl<T: TimeSource> Clock<T> {
    pub fn new(source: T) -> Self {
        Self {
            source,
            running: false,
            last: 0.0,
            elapsed: 0.0,
        }
    }

    /// Restart the clock from the current time
    pub fn start(&mut self) {
        self.last = self.source.now_secs();
        self.elapsed = 0.0;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Seconds since the previous call
    pub fn delta(&mut self) -> f64 {
        if !self.running {
            self.start();
            return 0.0;
        }

        let now = self.source.now_secs();
        let delta = now - self.last;
        self.last = now;

        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        self.elapsed += delta;
        delta
    }

    /// Sum of all deltas since the clock started
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn source(&self) -> &T {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_delta_is_zero() {
        let time = ManualTime::new();
        time.set(12.5);
        let mut clock = Clock::new(time.clone());

        assert_eq!(clock.delta(), 0.0);
        assert!(clock.is_running());

        time.advance(0.25);
        assert!((clock.delta() - 0.25).abs() < 1e-12);
        assert!((clock.elapsed() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_backwards_time_clamps_to_zero() {
        let time = ManualTime::new();
        let mut clock = Clock::new(time.clone());
        clock.delta();

        time.advance(1.0);
        clock.delta();
        time.set(0.5);

        assert_eq!(clock.delta(), 0.0);
        assert!((clock.elapsed() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_restart_resets_elapsed() {
        let time = ManualTime::new();
        let mut clock = Clock::new(time.clone());
        clock.delta();
        time.advance(3.0);
        clock.delta();

        clock.start();
        assert_eq!(clock.elapsed(), 0.0);
        time.advance(0.5);
        assert!((clock.delta() - 0.5).abs() < 1e-12);
    }
}
