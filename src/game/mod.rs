//! Fixed and variable time step game loop.
//!
//! In fixed time step mode every update advances the game by exactly [`Timing::target_elapsed_time`], as many updates as fit in the measured time are run before a frame is drawn.
//! In variable time step mode a single update with the measured time is run per frame.

pub mod clock;
mod host;
pub mod time;

use std::time::Duration;

pub use host::GameHost;

use self::time::GameTime;
use crate::error::{Error, Result};

/// Slack when comparing the accumulated time against the target elapsed time.
///
/// Display refresh intervals are never exactly the target, without it a 60 Hz display alternates between frames with zero and two updates.
pub const FRAME_SNAP_TOLERANCE: Duration = Duration::from_micros(200);

/// Consecutive frames needing more than one update after which the loop is considered running slowly.
const RUNNING_SLOWLY_LAG: u32 = 5;

/// Game loop settings that can change while the game runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Update with a constant time step.
    pub is_fixed_time_step: bool,
    /// Duration of a single fixed update.
    pub target_elapsed_time: Duration,
    /// Upper bound of the time accounted for in a single tick.
    pub max_elapsed_time: Duration,
    /// Time slept every tick while the game is in the background.
    pub inactive_sleep_time: Duration,
}

impl Timing {
    /// Check the loop can run with these settings.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] when the target elapsed time is zero.
    /// - [`Error::InvalidArgument`] when the maximum elapsed time is below the target elapsed time.
    #[inline]
    pub fn validate(&self) -> Result<()> {
        if self.target_elapsed_time.is_zero() {
            return Err(Error::InvalidArgument(
                "target elapsed time must be greater than zero".to_owned(),
            ));
        }

        if self.max_elapsed_time < self.target_elapsed_time {
            return Err(Error::InvalidArgument(format!(
                "maximum elapsed time {:?} must not be less than the target elapsed time {:?}",
                self.max_elapsed_time, self.target_elapsed_time
            )));
        }

        Ok(())
    }
}

impl Default for Timing {
    #[inline]
    fn default() -> Self {
        Self {
            is_fixed_time_step: true,
            // 166667 ticks of 100 nanoseconds
            target_elapsed_time: Duration::from_nanos(16_666_700),
            max_elapsed_time: Duration::from_millis(500),
            inactive_sleep_time: Duration::from_millis(20),
        }
    }
}

/// Where the game is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    /// Created, the device and content don't exist yet.
    #[default]
    NotInitialized,
    /// Device created and content loaded, no frame ran yet.
    Initialized,
    /// At least one frame ran.
    Running,
    /// Exit was requested and the content is unloaded, can't be ticked anymore.
    Exited,
}

/// Time step bookkeeping of the game loop.
///
/// Doesn't call the game itself, [`GameHost`] drives it:
///
/// 1. [`Self::measure`] and [`Self::accumulate`] the time since the previous tick.
/// 2. Wait while [`Self::remaining_until_update`] returns a duration.
/// 3. [`Self::begin_frame`], then call update for every [`GameTime`] [`Self::next_update`] yields.
/// 4. Draw with the [`GameTime`] returned by [`Self::end_frame`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use kestrel::game::{GameLoop, Timing};
///
/// let timing = Timing {
///     target_elapsed_time: Duration::from_millis(10),
///     ..Timing::default()
/// };
/// let mut game_loop = GameLoop::new();
///
/// game_loop.accumulate(Duration::from_millis(25));
/// assert!(game_loop.remaining_until_update(&timing).is_none());
///
/// game_loop.begin_frame(&timing);
/// let mut updates = 0;
/// while game_loop.next_update(&timing).is_some() {
///     updates += 1;
/// }
/// let draw_time = game_loop.end_frame(&timing);
///
/// assert_eq!(updates, 2);
/// assert_eq!(draw_time.elapsed_game_time(), Duration::from_millis(20));
/// ```
#[derive(Debug, Default)]
pub struct GameLoop {
    /// Lifecycle.
    state: GameState,
    /// Clock reading of the previous tick.
    previous_time: Option<Duration>,
    /// Measured time not yet consumed by updates, in nanoseconds.
    ///
    /// Can go slightly negative through [`FRAME_SNAP_TOLERANCE`].
    accumulated: i64,
    /// Sum of all update steps.
    total_game_time: Duration,
    /// Frames in a row that needed more than one update.
    ///
    /// While running slowly it decays by one per frame with a single update instead of resetting.
    update_frame_lag: u32,
    /// Whether the lag crossed [`RUNNING_SLOWLY_LAG`].
    is_running_slowly: bool,
    /// Updates yielded since [`Self::begin_frame`].
    frame_updates: u32,
    /// Time of the single update of a variable time step frame.
    frame_elapsed: Duration,
    /// Whether the single variable time step update wasn't yielded yet.
    variable_update_pending: bool,
}

impl GameLoop {
    /// Create in the [`GameState::NotInitialized`] state.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifecycle.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> GameState {
        self.state
    }

    /// Sum of all update steps.
    #[inline]
    #[must_use]
    pub const fn total_game_time(&self) -> Duration {
        self.total_game_time
    }

    /// Whether the fixed time step loop can't keep up.
    #[inline]
    #[must_use]
    pub const fn is_running_slowly(&self) -> bool {
        self.is_running_slowly
    }

    /// Frames in a row that needed more than one update.
    #[inline]
    #[must_use]
    pub const fn update_frame_lag(&self) -> u32 {
        self.update_frame_lag
    }

    /// Measured time not yet consumed by updates.
    #[inline]
    #[must_use]
    pub fn accumulated_elapsed_time(&self) -> Duration {
        u64::try_from(self.accumulated).map_or(Duration::ZERO, Duration::from_nanos)
    }

    /// Time since the clock reading of the previous call.
    ///
    /// The first call returns zero.
    #[inline]
    pub fn measure(&mut self, now: Duration) -> Duration {
        let elapsed = self
            .previous_time
            .map_or(Duration::ZERO, |previous| now.saturating_sub(previous));
        self.previous_time = Some(now);

        elapsed
    }

    /// Add measured time.
    #[inline]
    pub fn accumulate(&mut self, elapsed: Duration) {
        self.accumulated = self.accumulated.saturating_add(nanoseconds(elapsed));
    }

    /// Forget the accumulated time and the previous clock reading.
    ///
    /// Used after a long blocking operation like loading, so the loop doesn't try to catch up.
    #[inline]
    pub fn reset_elapsed_time(&mut self) {
        self.accumulated = 0;
        self.previous_time = None;
        self.update_frame_lag = 0;
    }

    /// How long to wait before a frame can run.
    ///
    /// # Returns
    ///
    /// - `None` when enough time accumulated, always in variable time step mode.
    /// - Time missing for the next fixed update otherwise.
    #[inline]
    #[must_use]
    pub fn remaining_until_update(&self, timing: &Timing) -> Option<Duration> {
        if !timing.is_fixed_time_step {
            return None;
        }

        let missing = nanoseconds(timing.target_elapsed_time)
            .saturating_sub(nanoseconds(FRAME_SNAP_TOLERANCE))
            .saturating_sub(self.accumulated);

        u64::try_from(missing)
            .ok()
            .filter(|missing| *missing > 0)
            .map(Duration::from_nanos)
    }

    /// Start running the updates of a frame.
    ///
    /// Drops accumulated time above [`Timing::max_elapsed_time`].
    #[inline]
    pub fn begin_frame(&mut self, timing: &Timing) {
        let max_elapsed = nanoseconds(timing.max_elapsed_time);
        if self.accumulated > max_elapsed {
            log::debug!(
                "Dropping {}ns of elapsed time above the maximum",
                self.accumulated - max_elapsed
            );

            self.accumulated = max_elapsed;
        }

        self.frame_updates = 0;
        self.variable_update_pending = !timing.is_fixed_time_step;
        if self.variable_update_pending {
            self.frame_elapsed = self.accumulated_elapsed_time();
        }
    }

    /// Consume time for the next update of the frame.
    ///
    /// # Returns
    ///
    /// - The time for the update, or `None` when the frame has no more updates.
    #[inline]
    pub fn next_update(&mut self, timing: &Timing) -> Option<GameTime> {
        if timing.is_fixed_time_step {
            let target = nanoseconds(timing.target_elapsed_time);
            if self.accumulated.saturating_add(nanoseconds(FRAME_SNAP_TOLERANCE)) < target {
                return None;
            }

            self.accumulated = self.accumulated.saturating_sub(target);
            self.total_game_time += timing.target_elapsed_time;
            self.frame_updates += 1;

            Some(GameTime::new(
                self.total_game_time,
                timing.target_elapsed_time,
                self.is_running_slowly,
            ))
        } else {
            if !std::mem::take(&mut self.variable_update_pending) {
                return None;
            }

            self.accumulated = 0;
            self.total_game_time += self.frame_elapsed;
            self.frame_updates = 1;

            Some(GameTime::new(self.total_game_time, self.frame_elapsed, false))
        }
    }

    /// Finish the updates of a frame, tracking whether the game runs slowly.
    ///
    /// # Returns
    ///
    /// - The time for drawing the frame, covering every update of the frame.
    #[inline]
    pub fn end_frame(&mut self, timing: &Timing) -> GameTime {
        if !timing.is_fixed_time_step {
            self.update_frame_lag = 0;
            self.is_running_slowly = false;

            return GameTime::new(self.total_game_time, self.frame_elapsed, false);
        }

        if self.frame_updates > 1 {
            self.update_frame_lag = self.update_frame_lag.saturating_add(1);
        } else if self.is_running_slowly {
            // A frame with a single update means the game kept up
            self.update_frame_lag = self.update_frame_lag.saturating_sub(1);
        } else {
            // Only consecutive lagging frames count
            self.update_frame_lag = 0;
        }

        if self.is_running_slowly {
            if self.update_frame_lag == 0 {
                log::debug!("Game loop caught up");

                self.is_running_slowly = false;
            }
        } else if self.update_frame_lag >= RUNNING_SLOWLY_LAG {
            log::debug!(
                "Game loop is running slowly, {} frames in a row needed more than one update",
                self.update_frame_lag
            );

            self.is_running_slowly = true;
        }

        GameTime::new(
            self.total_game_time,
            timing.target_elapsed_time * self.frame_updates,
            self.is_running_slowly,
        )
    }

    /// Move to another lifecycle state.
    pub(crate) fn set_state(&mut self, state: GameState) {
        if self.state != state {
            log::debug!("Game state {:?} -> {state:?}", self.state);

            self.state = state;
        }
    }
}

/// Duration as signed nanoseconds, saturating.
fn nanoseconds(duration: Duration) -> i64 {
    i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{GameLoop, Timing};

    /// Run a frame with the elapsed time, returning the amount of updates and the draw elapsed time.
    fn frame(game_loop: &mut GameLoop, timing: &Timing, elapsed: Duration) -> (u32, Duration) {
        game_loop.accumulate(elapsed);
        if game_loop.remaining_until_update(timing).is_some() {
            return (0, Duration::ZERO);
        }

        game_loop.begin_frame(timing);
        let mut updates = 0;
        while game_loop.next_update(timing).is_some() {
            updates += 1;
        }

        (updates, game_loop.end_frame(timing).elapsed_game_time())
    }

    fn fixed(target_micros: u64) -> Timing {
        Timing {
            target_elapsed_time: Duration::from_micros(target_micros),
            ..Timing::default()
        }
    }

    #[test]
    fn three_steps_snap() {
        let timing = fixed(16_667);
        let mut game_loop = GameLoop::new();

        let (updates, elapsed) = frame(&mut game_loop, &timing, Duration::from_micros(50_000));

        assert_eq!(updates, 3);
        assert_eq!(elapsed, Duration::from_micros(50_001));
        assert_eq!(game_loop.total_game_time(), Duration::from_micros(50_001));
    }

    #[test]
    fn not_enough_time_waits() {
        let timing = fixed(16_667);
        let mut game_loop = GameLoop::new();
        game_loop.accumulate(Duration::from_millis(10));

        assert_eq!(
            game_loop.remaining_until_update(&timing),
            Some(Duration::from_micros(6_467))
        );
    }

    #[test]
    fn jittery_display_never_skips() {
        let timing = fixed(16_667);
        let mut game_loop = GameLoop::new();

        // Frames of a real display average out to the target but are never exactly it
        for frame_index in 0..120 {
            let frame_time = if frame_index % 2 == 0 { 16_500 } else { 16_834 };
            let (updates, _) = frame(&mut game_loop, &timing, Duration::from_micros(frame_time));
            assert_eq!(updates, 1);
        }
    }

    #[test]
    fn elapsed_is_clamped() {
        let timing = fixed(100_000);
        let mut game_loop = GameLoop::new();

        let (updates, _) = frame(&mut game_loop, &timing, Duration::from_secs(10));

        assert_eq!(updates, 5);
        assert_eq!(game_loop.accumulated_elapsed_time(), Duration::ZERO);
    }

    #[test]
    fn running_slowly_flag() {
        let timing = fixed(10_000);
        let mut game_loop = GameLoop::new();

        // Two updates per frame add one lag each
        for _ in 0..4 {
            frame(&mut game_loop, &timing, Duration::from_millis(20));
            assert!(!game_loop.is_running_slowly());
        }
        frame(&mut game_loop, &timing, Duration::from_millis(20));
        assert!(game_loop.is_running_slowly());

        // Single update frames pay the lag back
        for _ in 0..4 {
            frame(&mut game_loop, &timing, Duration::from_millis(10));
            assert!(game_loop.is_running_slowly());
        }
        frame(&mut game_loop, &timing, Duration::from_millis(10));
        assert_eq!(game_loop.update_frame_lag(), 0);
        assert!(!game_loop.is_running_slowly());
    }

    #[test]
    fn running_slowly_counts_frames_not_updates() {
        let timing = fixed(10_000);
        let mut game_loop = GameLoop::new();

        // Three updates per frame still only count as one lagging frame each
        for _ in 0..4 {
            let (updates, _) = frame(&mut game_loop, &timing, Duration::from_millis(30));
            assert_eq!(updates, 3);
            assert!(!game_loop.is_running_slowly());
        }
        assert_eq!(game_loop.update_frame_lag(), 4);

        frame(&mut game_loop, &timing, Duration::from_millis(30));
        assert!(game_loop.is_running_slowly());
    }

    #[test]
    fn interrupted_lag_starts_over() {
        let timing = fixed(10_000);
        let mut game_loop = GameLoop::new();

        for _ in 0..4 {
            frame(&mut game_loop, &timing, Duration::from_millis(20));
        }
        frame(&mut game_loop, &timing, Duration::from_millis(10));
        assert_eq!(game_loop.update_frame_lag(), 0);

        for _ in 0..4 {
            frame(&mut game_loop, &timing, Duration::from_millis(20));
        }
        assert!(!game_loop.is_running_slowly());
    }

    #[test]
    fn huge_elapsed_time_with_a_tiny_step() {
        let timing = Timing {
            target_elapsed_time: Duration::from_micros(100),
            max_elapsed_time: Duration::from_millis(1),
            ..Timing::default()
        };
        let mut game_loop = GameLoop::new();

        game_loop.accumulate(Duration::MAX);
        game_loop.accumulate(Duration::MAX);
        assert!(game_loop.remaining_until_update(&timing).is_none());

        game_loop.begin_frame(&timing);
        let mut updates = 0;
        while game_loop.next_update(&timing).is_some() {
            updates += 1;
        }
        game_loop.end_frame(&timing);

        // The step is below the snap tolerance, so the remainder can run two more updates
        assert_eq!(updates, 12);
        assert_eq!(
            game_loop.remaining_until_update(&timing),
            Some(Duration::from_micros(100))
        );
    }

    #[test]
    fn variable_step_updates_once() {
        let timing = Timing {
            is_fixed_time_step: false,
            ..Timing::default()
        };
        let mut game_loop = GameLoop::new();

        let (updates, elapsed) = frame(&mut game_loop, &timing, Duration::from_millis(3));
        assert_eq!(updates, 1);
        assert_eq!(elapsed, Duration::from_millis(3));

        let (updates, elapsed) = frame(&mut game_loop, &timing, Duration::from_millis(40));
        assert_eq!(updates, 1);
        assert_eq!(elapsed, Duration::from_millis(40));
        assert_eq!(game_loop.total_game_time(), Duration::from_millis(43));
    }

    #[test]
    fn measure_starts_at_zero() {
        let mut game_loop = GameLoop::new();

        assert_eq!(game_loop.measure(Duration::from_secs(5)), Duration::ZERO);
        assert_eq!(
            game_loop.measure(Duration::from_millis(5_016)),
            Duration::from_millis(16)
        );

        game_loop.reset_elapsed_time();
        assert_eq!(game_loop.measure(Duration::from_secs(9)), Duration::ZERO);
    }

    #[test]
    fn timing_validation() {
        assert!(Timing::default().validate().is_ok());
        assert!(fixed(0).validate().is_err());
        assert!(Timing {
            max_elapsed_time: Duration::from_millis(1),
            ..Timing::default()
        }
        .validate()
        .is_err());
    }
}
