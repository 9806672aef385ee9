use crate::foundation::core::TimeMs;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic time source. Readings are only meaningful relative to each other.
pub trait Clock {
    /// Current reading.
    fn now(&self) -> TimeMs;
}

/// Wall clock backed by [`Instant`].
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose zero is "now".
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> TimeMs {
        let ms = self.origin.elapsed().as_millis();
        TimeMs(u64::try_from(ms).unwrap_or(u64::MAX))
    }
}

/// Manually advanced clock for simulated playback and tests.
///
/// Clones share the same reading, so a test can keep one handle while the controller owns another.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    /// Create a clock reading `start`.
    pub fn new(start: TimeMs) -> Self {
        Self {
            now: Rc::new(Cell::new(start.0)),
        }
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: TimeMs) {
        self.now.set(self.now.get().saturating_add(delta.0));
    }

    /// Jump to `t`. Going backwards is ignored; the clock is monotonic.
    pub fn set(&self, t: TimeMs) {
        if t.0 > self.now.get() {
            self.now.set(t.0);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimeMs {
        TimeMs(self.now.get())
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> TimeMs {
        (**self).now()
    }
}
