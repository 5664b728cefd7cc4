#![forbid(unsafe_code)]

//! XNA style core for games: render state objects, a graphics device manager and a fixed time step game loop.
//!
//! # Features
//!
//! - Immutable-after-bind render state objects for blending, depth stencil, rasterization and texture sampling, with the familiar XNA presets.
//! - Redundant state changes are never sent to the graphics backend, only the fields that changed since the last draw are applied.
//! - Device creation, reset and recreation through a [`graphics::GraphicsDeviceManager`] with the XNA events, including display orientation handling for mobile platforms.
//! - Fixed and variable time step game loop with catch-up, a running slowly flag and frame snapping.
//! - Headless backend recording every driver call, for servers and tests.
//! - A [`wgpu`](https://wgpu.rs) translation backend producing pipeline state descriptors.
//!
//! # Goals
//!
//! - Behave like XNA where games can observe it, so ported game code keeps working.
//! - Fail loudly: changing a locked state object or asking the backend for something it can't do is an error, never silently ignored.
//! - Proper web support, nothing blocks or spawns threads on `wasm32`.
//!
//! # Non-Goals
//!
//! - Shaders, effects, textures and vertex buffers, the core only manages the state they're used with.
//! - Windowing and input, a platform provides them through [`backend::Backend`].
//!
//! # Usage
//!
//! There is a single trait [`Game`] with two required functions, [`Game::update`] and [`Game::draw`], that need to be implemented for a game state object.
//!
//! ```
//! use kestrel::{backend::headless::HeadlessBackend, graphics::Color, Config, Context, Game, Result};
//!
//! /// Object holding all game state.
//! struct MyGame {
//!     /// Amount of updates so far.
//!     updates: u32,
//! }
//!
//! impl Game for MyGame {
//!     fn update(&mut self, ctx: Context) -> Result<()> {
//!         self.updates += 1;
//!
//!         // Stop after ten seconds of game time
//!         if ctx.game_time().total_game_time().as_secs() >= 10 {
//!             ctx.exit();
//!         }
//!
//!         Ok(())
//!     }
//!
//!     fn draw(&mut self, ctx: Context) -> Result<()> {
//!         ctx.device(|device| device.clear(Color::CORNFLOWER_BLUE))
//!     }
//! }
//!
//! # fn try_main() -> Result<()> {
//! // In main
//!
//! let game = MyGame { updates: 0 };
//!
//! // Run the game until exit is requested
//! game.run(HeadlessBackend::new(), Config::default().with_title("My Game"))
//! # }
//! ```
//!
//! # Render state
//!
//! State objects start out mutable, are locked for good once bound to a device, and the built-in presets are locked from the start:
//!
//! ```
//! use kestrel::{
//!     backend::headless::HeadlessBackend,
//!     graphics::{BlendState, GraphicsDeviceManager, PrimitiveType},
//! };
//!
//! let mut platform = HeadlessBackend::new();
//! let mut graphics = GraphicsDeviceManager::default();
//! graphics.create_device(&mut platform)?;
//! let device = graphics.device_mut()?;
//!
//! // Copy a preset and change the copy
//! let mut additive = BlendState::ADDITIVE.clone();
//! additive.set_alpha_source_blend(kestrel::graphics::Blend::One)?;
//!
//! device.set_blend_state(&mut additive)?;
//! device.draw_primitives(PrimitiveType::TriangleList, 0, 1)?;
//!
//! // Bound to the device now
//! assert!(additive.set_alpha_source_blend(kestrel::graphics::Blend::Zero).is_err());
//! # Ok::<(), kestrel::Error>(())
//! ```

pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod game;
pub mod graphics;

pub use config::Config;
pub use context::Context;
pub use error::{Error, Result};
pub use game::{time::GameTime, GameHost};

/// Main entrypoint containing game state for running the game.
///
/// This is the main interface with the game loop.
///
/// See [`Context`] for all functions interfacing with the game loop and the graphics device from the callbacks.
pub trait Game: Sized {
    /// A single update in the game loop.
    ///
    /// In fixed time step mode it's called as often as needed to catch up with the measured time, every call advancing the game by the target elapsed time.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Game context, used to obtain the game time and to exit.
    ///
    /// # Errors
    ///
    /// - Any error stops the loop and is returned from [`GameHost::tick`].
    ///
    /// # Example
    ///
    /// ```
    /// use kestrel::{Context, Game, Result};
    ///
    /// struct MyGame {
    ///     lives: u32,
    /// }
    ///
    /// impl Game for MyGame {
    ///     fn update(&mut self, ctx: Context) -> Result<()> {
    ///         // Stop the game when there are no lives left
    ///         if self.lives == 0 {
    ///             ctx.exit();
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
    fn update(&mut self, ctx: Context) -> Result<()>;

    /// Draw a single frame.
    ///
    /// Called once per tick after the updates, unless the draw was suppressed with [`Context::suppress_draw`] or [`Game::begin_draw`] returned `false`.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Game context, used to access the graphics device.
    ///
    /// # Errors
    ///
    /// - Any error stops the loop and is returned from [`GameHost::tick`].
    fn draw(&mut self, ctx: Context) -> Result<()>;

    /// Optionally implement this method to run it once at startup.
    ///
    /// Runs after the graphics device is created, before [`Game::load_content`].
    ///
    /// # Errors
    ///
    /// - Any error aborts the startup.
    #[inline(always)]
    #[allow(unused_variables)]
    fn initialize(&mut self, ctx: Context) -> Result<()> {
        Ok(())
    }

    /// Optionally implement this method to load content once at startup.
    ///
    /// # Errors
    ///
    /// - Any error aborts the startup.
    #[inline(always)]
    #[allow(unused_variables)]
    fn load_content(&mut self, ctx: Context) -> Result<()> {
        Ok(())
    }

    /// Called before [`Game::draw`].
    ///
    /// # Returns
    ///
    /// - `false` to skip drawing the frame, by default when there's no usable graphics device.
    #[inline]
    fn begin_draw(&mut self, ctx: Context) -> bool {
        ctx.begin_draw()
    }

    /// Called after [`Game::draw`], presents the frame by default.
    ///
    /// # Errors
    ///
    /// - When presenting failed.
    #[inline]
    fn end_draw(&mut self, ctx: Context) -> Result<()> {
        ctx.end_draw()
    }

    /// Optionally implement this method to release content when the game exits.
    #[inline(always)]
    #[allow(unused_variables)]
    fn unload_content(&mut self, ctx: Context) {}

    /// Optionally implement this method to be notified when the game exits, called before [`Game::unload_content`].
    #[inline(always)]
    #[allow(unused_variables)]
    fn on_exiting(&mut self, ctx: Context) {}

    /// Run the game until exit is requested.
    ///
    /// <div class="warning">
    ///
    /// Don't implement/override this method.
    ///
    /// </div>
    ///
    /// # Arguments
    ///
    /// * `platform` - Platform the game runs on.
    /// * `config` - Game loop settings and preferred graphics settings.
    ///
    /// # Errors
    ///
    /// - When the graphics device could not be created.
    /// - When any callback returned an error.
    #[inline(always)]
    fn run(self, platform: impl backend::Backend + 'static, config: Config) -> Result<()> {
        GameHost::new(self, platform, config).run()
    }
}
