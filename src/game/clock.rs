//! Monotonic time sources for the game loop.

use std::{cell::Cell, rc::Rc, time::Duration};

use web_time::Instant;

/// Monotonic time source.
pub trait Clock {
    /// Time passed since an arbitrary but fixed point.
    ///
    /// Must never decrease.
    fn now(&self) -> Duration;
}

/// Wall clock, works on the web too.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    /// Point all durations are measured from.
    start: Instant,
}

impl SystemClock {
    /// Start measuring from now.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one and hand the other to a [`crate::game::GameHost`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use kestrel::game::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::default();
/// let shared = clock.clone();
///
/// clock.advance(Duration::from_millis(16));
/// assert_eq!(shared.now(), Duration::from_millis(16));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    /// Current time, shared between clones.
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    /// Move the time forward.
    #[inline]
    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> Duration {
        self.now.get()
    }
}
