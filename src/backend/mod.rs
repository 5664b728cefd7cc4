//! How the game interfaces with the platform it runs on.
//!
//! A platform provides the window, tells whether the game is in the foreground, knows the display orientation and creates the [`DeviceBackend`] for a graphics device.
//! The [`crate::graphics::GraphicsDeviceManager`] and the [`crate::game::GameHost`] only ever talk to it through [`Backend`].

pub mod headless;

use std::time::Duration;

use raw_window_handle::RawWindowHandle;

use crate::{
    error::Result,
    graphics::{
        backend::DeviceBackend, DisplayOrientation, GraphicsAdapter, GraphicsProfile,
        PresentationParameters,
    },
};

/// Platform strategy used by the device manager and the game loop.
///
/// Only [`Backend::default_adapter`] and [`Backend::create_device`] are required, every other method has a default that fits a desktop platform without orientation support.
pub trait Backend {
    /// Adapter new devices are created on, before the preparing device settings handlers had their say.
    fn default_adapter(&self) -> GraphicsAdapter;

    /// Create the native part of a graphics device.
    ///
    /// Called by [`crate::graphics::GraphicsDevice::new`] after the profile is validated and the multisample count is clamped.
    ///
    /// # Arguments
    ///
    /// * `adapter` - Negotiated adapter.
    /// * `graphics_profile` - Negotiated profile, always supported by `adapter`.
    /// * `presentation_parameters` - Validated back buffer configuration.
    ///
    /// # Errors
    ///
    /// - When the native device or swapchain could not be created.
    fn create_device(
        &mut self,
        adapter: &GraphicsAdapter,
        graphics_profile: GraphicsProfile,
        presentation_parameters: &PresentationParameters,
    ) -> Result<Box<dyn DeviceBackend>>;

    /// Native window the back buffer is presented to.
    ///
    /// `None` on headless platforms.
    #[inline(always)]
    fn window_handle(&self) -> Option<RawWindowHandle> {
        None
    }

    /// Whether the platform rotates the display, mobile platforms do.
    #[inline(always)]
    fn supports_orientation(&self) -> bool {
        false
    }

    /// Orientation the display currently has.
    #[inline(always)]
    fn current_orientation(&self) -> DisplayOrientation {
        DisplayOrientation::DEFAULT
    }

    /// Restrict the orientations the OS is allowed to rotate to.
    ///
    /// Only called when [`Backend::supports_orientation`] is `true`, `orientations` is never [`DisplayOrientation::DEFAULT`].
    #[inline(always)]
    #[allow(unused_variables)]
    fn set_supported_orientations(&mut self, orientations: DisplayOrientation) {}

    /// Switch the OS level full screen mode, hiding or showing the status bar and window decorations.
    ///
    /// Called even when no graphics device exists yet.
    #[inline(always)]
    #[allow(unused_variables)]
    fn set_os_full_screen(&mut self, full_screen: bool) {}

    /// Whether the game is in the foreground.
    ///
    /// Inactive games sleep for [`crate::game::Timing::inactive_sleep_time`] every tick.
    #[inline(always)]
    fn is_active(&self) -> bool {
        true
    }

    /// Block the game loop.
    ///
    /// Does nothing on the web, where blocking the main thread isn't possible.
    #[inline]
    #[allow(unused_variables)]
    fn sleep(&mut self, duration: Duration) {
        #[cfg(not(target_arch = "wasm32"))]
        std::thread::sleep(duration);
    }

    /// Called before every single update.
    ///
    /// # Returns
    ///
    /// - `false` to skip the update.
    #[inline(always)]
    fn before_update(&mut self) -> bool {
        true
    }

    /// Called before every draw.
    ///
    /// # Returns
    ///
    /// - `false` to skip the draw, for example when the window is minimized.
    #[inline(always)]
    fn before_draw(&mut self) -> bool {
        true
    }

    /// Called once when the game exited, after the content is unloaded.
    #[inline(always)]
    fn exit(&mut self) {}
}
