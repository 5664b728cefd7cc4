//! Drives a [`Game`] through the game loop.

use std::time::Duration;

use super::{
    clock::{Clock, SystemClock},
    GameLoop, GameState, Timing,
};
use crate::{
    backend::Backend,
    config::Config,
    context::Context,
    error::{Error, Result},
    Game,
};

/// Owns the game, its context and the game loop.
///
/// [`Game::run`] is enough for most games, the host is for platforms that own the event loop themselves and call [`Self::tick`] from it, and for tests.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use kestrel::{backend::headless::HeadlessBackend, game::GameHost, Config, Context, Game, Result};
///
/// #[derive(Default)]
/// struct MyGame {
///     updates: u32,
/// }
///
/// impl Game for MyGame {
///     fn update(&mut self, ctx: Context) -> Result<()> {
///         self.updates += 1;
///
///         Ok(())
///     }
///
///     fn draw(&mut self, ctx: Context) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// let mut host = GameHost::new(MyGame::default(), HeadlessBackend::new(), Config::default());
///
/// // Feed a tenth of a second, at 60 updates a second that's 6 updates
/// host.step(Duration::from_millis(100))?;
/// assert_eq!(host.game().updates, 6);
/// # Ok::<(), kestrel::Error>(())
/// ```
pub struct GameHost<G: Game> {
    /// User supplied game.
    game: G,
    /// Shared state handed to the game.
    ctx: Context,
    /// Time source of [`Self::tick`].
    clock: Box<dyn Clock>,
    /// Time step bookkeeping.
    game_loop: GameLoop,
}

impl<G: Game> GameHost<G> {
    /// Create the host, nothing is initialized yet.
    ///
    /// # Arguments
    ///
    /// * `game` - User supplied game.
    /// * `platform` - Platform the game runs on.
    /// * `config` - Game loop settings and preferred graphics settings.
    #[inline]
    #[must_use]
    pub fn new(game: G, platform: impl Backend + 'static, config: Config) -> Self {
        log::info!("Creating game '{}'", config.title);

        Self {
            game,
            ctx: Context::new(config, Box::new(platform)),
            clock: Box::new(SystemClock::new()),
            game_loop: GameLoop::new(),
        }
    }

    /// Measure time with a different clock in [`Self::tick`].
    #[inline]
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);

        self
    }

    /// Handle to the shared context.
    #[inline]
    #[must_use]
    pub fn context(&self) -> Context {
        self.ctx.clone()
    }

    /// User supplied game.
    #[inline]
    #[must_use]
    pub const fn game(&self) -> &G {
        &self.game
    }

    /// Mutable user supplied game.
    #[inline]
    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    /// Lifecycle.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> GameState {
        self.game_loop.state()
    }

    /// Time step bookkeeping.
    #[inline]
    #[must_use]
    pub const fn game_loop(&self) -> &GameLoop {
        &self.game_loop
    }

    /// Create the graphics device and load the content.
    ///
    /// Called automatically by the first tick, calling it again does nothing.
    ///
    /// # Errors
    ///
    /// - When the graphics device could not be created.
    /// - When [`Game::initialize`] or [`Game::load_content`] failed.
    /// - [`Error::GameExited`] when the game already exited.
    #[inline]
    pub fn initialize(&mut self) -> Result<()> {
        match self.game_loop.state() {
            GameState::NotInitialized => (),
            GameState::Exited => return Err(Error::GameExited),
            GameState::Initialized | GameState::Running => return Ok(()),
        }

        self.ctx.create_device()?;
        self.game.initialize(self.ctx.clone())?;
        self.game.load_content(self.ctx.clone())?;

        // Loading can take a while, don't try to catch up with it
        self.game_loop.reset_elapsed_time();
        self.game_loop.set_state(GameState::Initialized);

        Ok(())
    }

    /// Run a single frame with the time measured by the clock.
    ///
    /// In fixed time step mode this sleeps until at least one update is due.
    /// While the game is in the background it sleeps an extra [`Timing::inactive_sleep_time`].
    ///
    /// # Errors
    ///
    /// - When initializing, an update or the draw failed.
    /// - [`Error::GameExited`] when the game already exited.
    #[inline]
    pub fn tick(&mut self) -> Result<()> {
        self.initialize()?;

        let timing = self.ctx.timing();
        loop {
            if !self.ctx.is_active() && !timing.inactive_sleep_time.is_zero() {
                self.ctx.sleep(timing.inactive_sleep_time);
            }

            let elapsed = self.game_loop.measure(self.clock.now());
            self.game_loop.accumulate(elapsed);

            match self.game_loop.remaining_until_update(&timing) {
                Some(remaining) => self.ctx.sleep(remaining),
                None => break,
            }
        }

        self.run_frame(&timing)
    }

    /// Same as [`Self::tick`].
    ///
    /// # Errors
    ///
    /// - See [`Self::tick`].
    #[inline]
    pub fn run_one_frame(&mut self) -> Result<()> {
        self.tick()
    }

    /// Run a frame with an explicit elapsed time instead of the clock, never sleeps.
    ///
    /// In fixed time step mode nothing happens until at least one update worth of time was fed.
    ///
    /// # Errors
    ///
    /// - See [`Self::tick`].
    #[inline]
    pub fn step(&mut self, elapsed: Duration) -> Result<()> {
        self.initialize()?;

        let timing = self.ctx.timing();
        self.game_loop.accumulate(elapsed);
        if self.game_loop.remaining_until_update(&timing).is_some() {
            return Ok(());
        }

        self.run_frame(&timing)
    }

    /// Tick until the game exits.
    ///
    /// # Errors
    ///
    /// - See [`Self::tick`], the loop stops at the first error.
    #[inline]
    pub fn run(&mut self) -> Result<()> {
        self.initialize()?;

        while self.game_loop.state() != GameState::Exited {
            self.tick()?;
        }

        Ok(())
    }

    /// Stop the game after the current frame.
    #[inline]
    pub fn exit(&self) {
        self.ctx.exit();
    }

    /// Forget the time accumulated so far, so the loop doesn't try to catch up after a long pause.
    #[inline]
    pub fn reset_elapsed_time(&mut self) {
        self.game_loop.reset_elapsed_time();
    }

    /// Run the updates and the draw of a frame.
    fn run_frame(&mut self, timing: &Timing) -> Result<()> {
        profiling::scope!("Tick");

        self.game_loop.set_state(GameState::Running);
        self.ctx.handle_orientation_changed()?;

        self.game_loop.begin_frame(timing);
        while !self.ctx.is_exit_requested() {
            let Some(game_time) = self.game_loop.next_update(timing) else {
                break;
            };

            self.ctx.set_game_time(game_time);
            if self.ctx.before_update() {
                profiling::scope!("Update");

                self.game.update(self.ctx.clone())?;
            }
        }

        let draw_time = self.game_loop.end_frame(timing);
        self.ctx.set_game_time(draw_time);
        if self.ctx.take_suppress_draw() {
            log::trace!("Draw suppressed");
        } else {
            self.draw()?;
        }

        if self.ctx.is_exit_requested() {
            self.shutdown();
        }

        Ok(())
    }

    /// Draw a frame if the platform and the device allow it.
    fn draw(&mut self) -> Result<()> {
        if !self.ctx.before_draw() {
            return Ok(());
        }

        profiling::scope!("Draw");

        if self.game.begin_draw(self.ctx.clone()) {
            self.game.draw(self.ctx.clone())?;
            self.game.end_draw(self.ctx.clone())?;
        }

        Ok(())
    }

    /// Unload everything after an exit request.
    fn shutdown(&mut self) {
        self.game.on_exiting(self.ctx.clone());
        self.game.unload_content(self.ctx.clone());
        self.ctx.shutdown();

        self.game_loop.set_state(GameState::Exited);
        log::info!("Game exited after {:?} of game time", self.game_loop.total_game_time());
    }
}

impl<G: Game + std::fmt::Debug> std::fmt::Debug for GameHost<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameHost")
            .field("game", &self.game)
            .field("game_loop", &self.game_loop)
            .finish_non_exhaustive()
    }
}
