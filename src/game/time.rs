//! Snapshot of the game clock handed to every update and draw.

use std::time::Duration;

/// Timing values for a single update or draw.
///
/// # Example
///
/// ```
/// use kestrel::{Context, Game, Result};
///
/// struct MyGame {
///     position: f32,
/// }
///
/// impl Game for MyGame {
///     fn update(&mut self, ctx: Context) -> Result<()> {
///         // Move 10 units per second, no matter how often update is called
///         self.position += 10.0 * ctx.game_time().elapsed_seconds();
///
///         Ok(())
///     }
///
///     fn draw(&mut self, ctx: Context) -> Result<()> {
///         Ok(())
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GameTime {
    /// Game time since the start of the loop.
    total_game_time: Duration,
    /// Game time since the previous update or draw.
    elapsed_game_time: Duration,
    /// Whether the fixed time step loop can't keep up.
    is_running_slowly: bool,
}

impl GameTime {
    /// Construct from the separate values.
    #[inline]
    #[must_use]
    pub const fn new(
        total_game_time: Duration,
        elapsed_game_time: Duration,
        is_running_slowly: bool,
    ) -> Self {
        Self {
            total_game_time,
            elapsed_game_time,
            is_running_slowly,
        }
    }

    /// Game time since the start of the loop.
    ///
    /// Only advances with updates, time the game was paused or clamped by the maximum elapsed time is not included.
    #[inline]
    #[must_use]
    pub const fn total_game_time(&self) -> Duration {
        self.total_game_time
    }

    /// Game time since the previous update or draw.
    ///
    /// In fixed time step mode this is the target elapsed time for updates, and the target elapsed time multiplied by the amount of updates for a draw.
    #[inline]
    #[must_use]
    pub const fn elapsed_game_time(&self) -> Duration {
        self.elapsed_game_time
    }

    /// [`Self::elapsed_game_time`] in seconds.
    #[inline]
    #[must_use]
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed_game_time.as_secs_f32()
    }

    /// Whether the game needed more than one update per frame for a while.
    ///
    /// Games can lower their quality when this is set.
    #[inline]
    #[must_use]
    pub const fn is_running_slowly(&self) -> bool {
        self.is_running_slowly
    }
}
