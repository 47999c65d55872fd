//! Timers for the blocking call bridge
//!
//! `Future::get` measures its timeout and paces its polling through a
//! [`TimerFactory`] injected into the router, so two routers on different
//! threads never share clock state and tests can run on a fake clock.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// A started stopwatch that can also block the calling thread
pub trait Timer {
    /// Time since the timer was created or last reset
    fn elapsed(&self) -> Duration;

    fn reset(&mut self);

    fn sleep(&self, duration: Duration);
}

/// Makes freshly started timers
pub trait TimerFactory {
    fn make_timer(&self) -> Box<dyn Timer>;
}

/// Wall-clock timers
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimers;

#[derive(Debug)]
struct SystemTimer {
    started: Instant,
}

impl Timer for SystemTimer {
    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn reset(&mut self) {
        self.started = Instant::now();
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl TimerFactory for SystemTimers {
    fn make_timer(&self) -> Box<dyn Timer> {
        Box::new(SystemTimer {
            started: Instant::now(),
        })
    }
}

/// Fake clock: sleeping advances shared time instantly
///
/// Clones share the same clock.
#[derive(Debug, Clone, Default)]
pub struct ManualTimers {
    now: Rc<Cell<Duration>>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total fake time elapsed since creation
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

#[derive(Debug)]
struct ManualTimer {
    clock: ManualTimers,
    started: Duration,
}

impl Timer for ManualTimer {
    fn elapsed(&self) -> Duration {
        self.clock.now().saturating_sub(self.started)
    }

    fn reset(&mut self) {
        self.started = self.clock.now();
    }

    fn sleep(&self, duration: Duration) {
        self.clock.advance(duration);
    }
}

impl TimerFactory for ManualTimers {
    fn make_timer(&self) -> Box<dyn Timer> {
        Box::new(ManualTimer {
            clock: self.clone(),
            started: self.now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_timers_share_a_clock() {
        let timers = ManualTimers::new();
        let mut a = timers.make_timer();
        let b = timers.make_timer();

        b.sleep(Duration::from_millis(30));
        assert_eq!(a.elapsed(), Duration::from_millis(30));
        assert_eq!(timers.now(), Duration::from_millis(30));

        a.reset();
        assert_eq!(a.elapsed(), Duration::ZERO);
        timers.advance(Duration::from_millis(5));
        assert_eq!(a.elapsed(), Duration::from_millis(5));
        assert_eq!(b.elapsed(), Duration::from_millis(35));
    }

    #[test]
    fn test_system_timer_measures_sleep() {
        let timer = SystemTimers.make_timer();
        timer.sleep(Duration::from_millis(2));
        assert!(timer.elapsed() >= Duration::from_millis(2));
    }
}
