//! Main interface with the game.

use std::{cell::RefCell, rc::Rc, time::Duration};

use crate::{
    backend::Backend,
    config::Config,
    error::{Error, Result},
    game::{time::GameTime, Timing},
    graphics::{GraphicsDevice, GraphicsDeviceManager},
};

/// Context containing most functionality for interfacing with the game loop and the graphics device.
///
/// Exposed in every [`crate::Game`] callback.
///
/// [`Context`] is cheap to clone due to being a `Rc<RefCell<..>>` under the hood.
/// Closures passed to its methods must not use the context themselves, the inner state is borrowed while they run.
#[derive(Clone)]
pub struct Context {
    /// Implementation of all non-primitive parts.
    inner: Rc<RefCell<ContextInner>>,
}

/// Game loop methods.
impl Context {
    /// Timing of the current update or draw.
    ///
    /// # Example
    ///
    /// ```
    /// use kestrel::{Context, Game, Result};
    ///
    /// struct MyGame;
    ///
    /// impl Game for MyGame {
    ///     fn update(&mut self, ctx: Context) -> Result<()> {
    ///         // Skip expensive work when the loop can't keep up
    ///         if !ctx.game_time().is_running_slowly() {
    ///             // ..
    ///         }
    ///
    ///         Ok(())
    ///     }
    ///
    ///     fn draw(&mut self, ctx: Context) -> Result<()> {
    ///         Ok(())
    ///     }
    /// }
    /// ```
    #[inline]
    #[must_use]
    pub fn game_time(&self) -> GameTime {
        self.read(|ctx| ctx.game_time)
    }

    /// Name of the game.
    #[inline]
    #[must_use]
    pub fn title(&self) -> String {
        self.read(|ctx| ctx.config.title.clone())
    }

    /// Skip the draw of the current frame.
    ///
    /// Only affects a single frame, call it again in the next update to skip more.
    #[inline]
    pub fn suppress_draw(&self) {
        self.write(|ctx| ctx.suppress_draw = true);
    }

    /// Stop the game after the current frame.
    ///
    /// Remaining updates of the frame are skipped, the frame is still drawn.
    #[inline]
    pub fn exit(&self) {
        self.write(|ctx| {
            if !ctx.exit_requested {
                log::info!("Exit requested");
            }

            ctx.exit_requested = true;
        });
    }

    /// Whether [`Self::exit`] was called.
    #[inline]
    #[must_use]
    pub fn is_exit_requested(&self) -> bool {
        self.read(|ctx| ctx.exit_requested)
    }

    /// Whether the game is in the foreground.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.read(|ctx| ctx.platform.is_active())
    }

    /// Current game loop settings.
    #[inline]
    #[must_use]
    pub fn timing(&self) -> Timing {
        self.read(|ctx| ctx.timing)
    }

    /// Whether updates use a constant time step.
    #[inline]
    #[must_use]
    pub fn is_fixed_time_step(&self) -> bool {
        self.read(|ctx| ctx.timing.is_fixed_time_step)
    }

    /// Switch between a fixed and a variable time step, takes effect on the next tick.
    #[inline]
    pub fn set_fixed_time_step(&self, is_fixed_time_step: bool) {
        self.write(|ctx| ctx.timing.is_fixed_time_step = is_fixed_time_step);
    }

    /// Duration of a single fixed update.
    #[inline]
    #[must_use]
    pub fn target_elapsed_time(&self) -> Duration {
        self.read(|ctx| ctx.timing.target_elapsed_time)
    }

    /// Set the duration of a single fixed update, takes effect on the next tick.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] when zero or above the maximum elapsed time.
    #[inline]
    pub fn set_target_elapsed_time(&self, target_elapsed_time: Duration) -> Result<()> {
        self.update_timing(|timing| timing.target_elapsed_time = target_elapsed_time)
    }

    /// Upper bound of the time accounted for in a single tick.
    #[inline]
    #[must_use]
    pub fn max_elapsed_time(&self) -> Duration {
        self.read(|ctx| ctx.timing.max_elapsed_time)
    }

    /// Set the upper bound of the time accounted for in a single tick.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] when below the target elapsed time.
    #[inline]
    pub fn set_max_elapsed_time(&self, max_elapsed_time: Duration) -> Result<()> {
        self.update_timing(|timing| timing.max_elapsed_time = max_elapsed_time)
    }

    /// Time slept every tick while the game is in the background.
    #[inline]
    #[must_use]
    pub fn inactive_sleep_time(&self) -> Duration {
        self.read(|ctx| ctx.timing.inactive_sleep_time)
    }

    /// Set the time slept every tick while the game is in the background.
    #[inline]
    pub fn set_inactive_sleep_time(&self, inactive_sleep_time: Duration) {
        self.write(|ctx| ctx.timing.inactive_sleep_time = inactive_sleep_time);
    }

    /// Change the timing, keeping the old one when the new one is invalid.
    fn update_timing(&self, change: impl FnOnce(&mut Timing)) -> Result<()> {
        self.write(|ctx| {
            let mut timing = ctx.timing;
            change(&mut timing);
            timing.validate()?;

            ctx.timing = timing;

            Ok(())
        })
    }
}

/// Graphics methods.
impl Context {
    /// Access the device manager, for changing preferences or registering event handlers.
    ///
    /// # Example
    ///
    /// ```
    /// use kestrel::{Context, Game, Result};
    ///
    /// struct MyGame;
    ///
    /// impl Game for MyGame {
    ///     fn initialize(&mut self, ctx: Context) -> Result<()> {
    ///         // Switch to a portrait back buffer
    ///         ctx.graphics(|graphics| {
    ///             graphics.set_preferred_back_buffer_width(480);
    ///             graphics.set_preferred_back_buffer_height(800);
    ///         });
    ///
    ///         ctx.apply_changes()
    ///     }
    ///
    ///     fn update(&mut self, ctx: Context) -> Result<()> {
    ///         Ok(())
    ///     }
    ///
    ///     fn draw(&mut self, ctx: Context) -> Result<()> {
    ///         Ok(())
    ///     }
    /// }
    /// ```
    #[inline]
    pub fn graphics<R>(&self, reader: impl FnOnce(&mut GraphicsDeviceManager) -> R) -> R {
        self.write(|ctx| reader(&mut ctx.graphics))
    }

    /// Access the graphics device.
    ///
    /// # Errors
    ///
    /// - [`Error::NoGraphicsDevice`] when the device wasn't created yet.
    /// - Any error returned by `writer`.
    ///
    /// # Example
    ///
    /// ```
    /// use kestrel::{graphics::Color, Context, Game, Result};
    ///
    /// struct MyGame;
    ///
    /// impl Game for MyGame {
    ///     fn update(&mut self, ctx: Context) -> Result<()> {
    ///         Ok(())
    ///     }
    ///
    ///     fn draw(&mut self, ctx: Context) -> Result<()> {
    ///         ctx.device(|device| device.clear(Color::CORNFLOWER_BLUE))
    ///     }
    /// }
    /// ```
    #[inline]
    pub fn device<R>(&self, writer: impl FnOnce(&mut GraphicsDevice) -> Result<R>) -> Result<R> {
        self.write(|ctx| writer(ctx.graphics.device_mut()?))
    }

    /// Apply the changed graphics preferences.
    ///
    /// # Errors
    ///
    /// - See [`GraphicsDeviceManager::apply_changes`].
    #[inline]
    pub fn apply_changes(&self) -> Result<()> {
        self.write(|ctx| ctx.graphics.apply_changes(ctx.platform.as_mut()))
    }

    /// Switch between full screen and windowed mode.
    ///
    /// # Errors
    ///
    /// - See [`GraphicsDeviceManager::toggle_full_screen`].
    #[inline]
    pub fn toggle_full_screen(&self) -> Result<()> {
        self.write(|ctx| ctx.graphics.toggle_full_screen(ctx.platform.as_mut()))
    }

    /// Prepare drawing a frame.
    ///
    /// # Returns
    ///
    /// - `false` when there's no usable device.
    #[inline]
    #[must_use]
    pub fn begin_draw(&self) -> bool {
        self.write(|ctx| ctx.graphics.begin_draw())
    }

    /// Present the drawn frame.
    ///
    /// # Errors
    ///
    /// - When presenting failed.
    #[inline]
    pub fn end_draw(&self) -> Result<()> {
        self.write(|ctx| ctx.graphics.end_draw())
    }
}

/// Internal methods used by the game host.
impl Context {
    /// Create the context.
    pub(crate) fn new(config: Config, platform: Box<dyn Backend>) -> Self {
        let inner = Rc::new(RefCell::new(ContextInner::new(config, platform)));

        Self { inner }
    }

    /// Create the graphics device.
    pub(crate) fn create_device(&self) -> Result<()> {
        self.write(|ctx| ctx.graphics.create_device(ctx.platform.as_mut()))
    }

    /// Follow display rotations.
    pub(crate) fn handle_orientation_changed(&self) -> Result<()> {
        self.write(|ctx| {
            ctx.graphics
                .handle_orientation_changed(ctx.platform.as_mut())
        })
    }

    /// Set the time of the next update or draw.
    pub(crate) fn set_game_time(&self, game_time: GameTime) {
        self.write(|ctx| ctx.game_time = game_time);
    }

    /// Whether the draw of this frame is skipped, resetting the request.
    pub(crate) fn take_suppress_draw(&self) -> bool {
        self.write(|ctx| std::mem::take(&mut ctx.suppress_draw))
    }

    /// Block the game loop.
    pub(crate) fn sleep(&self, duration: Duration) {
        self.write(|ctx| ctx.platform.sleep(duration));
    }

    /// Whether the platform allows the next update.
    pub(crate) fn before_update(&self) -> bool {
        self.write(|ctx| ctx.platform.before_update())
    }

    /// Whether the platform allows drawing.
    pub(crate) fn before_draw(&self) -> bool {
        self.write(|ctx| ctx.platform.before_draw())
    }

    /// Dispose the graphics and tell the platform the game exited.
    pub(crate) fn shutdown(&self) {
        self.write(|ctx| {
            ctx.graphics.dispose();
            ctx.platform.exit();
        });
    }

    /// Get a read-only reference to the inner struct.
    ///
    /// # Panics
    ///
    /// - When the inner struct is already borrowed mutably, which only happens when the context is used inside one of its own closures.
    #[inline]
    fn read<R>(&self, reader: impl FnOnce(&ContextInner) -> R) -> R {
        reader(&self.inner.borrow())
    }

    /// Get a mutable reference to the inner struct.
    ///
    /// # Panics
    ///
    /// - When the inner struct is already borrowed, which only happens when the context is used inside one of its own closures.
    #[inline]
    fn write<R>(&self, writer: impl FnOnce(&mut ContextInner) -> R) -> R {
        writer(&mut self.inner.borrow_mut())
    }
}

/// Internal wrapped implementation for [`Context`].
struct ContextInner {
    /// User supplied game configuration.
    config: Config,
    /// Platform the game runs on.
    platform: Box<dyn Backend>,
    /// Device manager.
    graphics: GraphicsDeviceManager,
    /// Game loop settings.
    timing: Timing,
    /// Time of the current update or draw.
    game_time: GameTime,
    /// Skip the draw of the current frame.
    suppress_draw: bool,
    /// Stop after the current frame.
    exit_requested: bool,
}

impl ContextInner {
    /// Initialize the inner context.
    fn new(config: Config, platform: Box<dyn Backend>) -> Self {
        let mut timing = config.timing();
        if let Err(err) = timing.validate() {
            log::warn!("Invalid timing configuration, using the defaults: {err}");

            timing = Timing::default();
        }

        let graphics = GraphicsDeviceManager::new(config.graphics.clone());

        Self {
            config,
            platform,
            graphics,
            timing,
            game_time: GameTime::default(),
            suppress_draw: false,
            exit_requested: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Context;
    use crate::{backend::headless::HeadlessBackend, config::Config, error::Error};

    fn context() -> Context {
        Context::new(Config::default(), Box::new(HeadlessBackend::new()))
    }

    #[test]
    fn suppress_draw_is_single_shot() {
        let ctx = context();

        ctx.suppress_draw();

        assert!(ctx.take_suppress_draw());
        assert!(!ctx.take_suppress_draw());
    }

    #[test]
    fn invalid_timing_is_rejected() {
        let ctx = context();
        let before = ctx.timing();

        assert!(matches!(
            ctx.set_target_elapsed_time(Duration::ZERO),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            ctx.set_max_elapsed_time(Duration::from_millis(1)),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(ctx.timing(), before);

        ctx.set_target_elapsed_time(Duration::from_millis(10)).unwrap();
        assert_eq!(ctx.target_elapsed_time(), Duration::from_millis(10));
    }

    #[test]
    fn device_access_needs_a_device() {
        let ctx = context();

        assert!(matches!(ctx.device(|_| Ok(())), Err(Error::NoGraphicsDevice)));

        ctx.create_device().unwrap();
        let width = ctx
            .device(|device| Ok(device.presentation_parameters().back_buffer_width))
            .unwrap();
        assert_eq!(width, 800);
    }

    #[test]
    fn shutdown_disposes_graphics() {
        let ctx = context();
        ctx.create_device().unwrap();

        ctx.shutdown();

        assert!(ctx.graphics(|graphics| graphics.is_disposed()));
        assert!(!ctx.begin_draw());
    }
}
