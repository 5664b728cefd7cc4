//! Creating, reconfiguring and disposing the graphics device of a game.

use std::fmt;

use super::{
    adapter::GraphicsAdapter,
    device::GraphicsDevice,
    presentation::{
        DisplayOrientation, GraphicsDeviceInformation, PreparingDeviceSettingsEventArgs,
        PresentInterval, PresentationParameters,
    },
    DepthFormat, GraphicsProfile, SurfaceFormat,
};
use crate::{
    backend::Backend,
    config::GraphicsConfig,
    error::{Error, Result},
};

/// Samples per pixel requested when multisampling is preferred, the adapter may lower it.
pub const PREFERRED_MULTI_SAMPLE_COUNT: u32 = 4;

/// Handler of the preparing device settings event, an error aborts device creation.
type PreparingHandler = Box<dyn FnMut(&mut PreparingDeviceSettingsEventArgs<'_>) -> Result<()>>;

/// Handler of the device lifecycle events.
type DeviceHandler = Box<dyn FnMut(&GraphicsDevice)>;

/// Handler of the presentation changed event.
type PresentationHandler = Box<dyn FnMut(&PresentationParameters)>;

/// Owns the graphics device and turns the preferred settings into one.
///
/// Nothing is created until [`Self::create_device`] or [`Self::apply_changes`] is called, changing a preference has no effect until then.
///
/// # Events
///
/// | Event | Raised |
/// | --- | --- |
/// | [`Self::on_preparing_device_settings`] | once per create or apply, before the negotiated settings are used |
/// | [`Self::on_device_created`] | after a device was created |
/// | [`Self::on_device_resetting`] | before the device is reconfigured in place |
/// | [`Self::on_device_reset`] | after the device was reconfigured in place |
/// | [`Self::on_device_disposing`] | before the device is disposed, also when it's replaced |
/// | [`Self::on_presentation_changed`] | after the presentation parameters of the device changed |
///
/// Handlers run while the manager is borrowed, they must not call back into it.
///
/// # Example
///
/// ```
/// use kestrel::{backend::headless::HeadlessBackend, graphics::GraphicsDeviceManager};
///
/// let mut platform = HeadlessBackend::new();
/// let mut graphics = GraphicsDeviceManager::default();
///
/// // Prefer a 720p back buffer and create the device with it
/// graphics.set_preferred_back_buffer_width(1280);
/// graphics.set_preferred_back_buffer_height(720);
/// graphics.apply_changes(&mut platform)?;
///
/// let device = graphics.graphics_device().unwrap();
/// assert_eq!(device.presentation_parameters().back_buffer_width, 1280);
/// # Ok::<(), kestrel::Error>(())
/// ```
pub struct GraphicsDeviceManager {
    /// Current device, if created.
    device: Option<GraphicsDevice>,
    /// Preferred settings.
    preferences: GraphicsConfig,
    /// Whether [`Self::begin_draw`] succeeded without a matching [`Self::end_draw`].
    draw_begun: bool,
    /// Whether [`Self::dispose`] was called.
    disposed: bool,
    /// Preparing device settings handlers.
    preparing_device_settings: Vec<PreparingHandler>,
    /// Device created handlers.
    device_created: Vec<DeviceHandler>,
    /// Device resetting handlers.
    device_resetting: Vec<DeviceHandler>,
    /// Device reset handlers.
    device_reset: Vec<DeviceHandler>,
    /// Device disposing handlers.
    device_disposing: Vec<DeviceHandler>,
    /// Presentation changed handlers.
    presentation_changed: Vec<PresentationHandler>,
}

/// Device creation and reconfiguration.
impl GraphicsDeviceManager {
    /// Create without a device.
    ///
    /// # Arguments
    ///
    /// * `preferences` - Initial preferred settings.
    #[inline]
    #[must_use]
    pub fn new(preferences: GraphicsConfig) -> Self {
        Self {
            device: None,
            preferences,
            draw_begun: false,
            disposed: false,
            preparing_device_settings: Vec::new(),
            device_created: Vec::new(),
            device_resetting: Vec::new(),
            device_reset: Vec::new(),
            device_disposing: Vec::new(),
            presentation_changed: Vec::new(),
        }
    }

    /// Create the device from the preferred settings.
    ///
    /// Does nothing when a device already exists, use [`Self::apply_changes`] to reconfigure it.
    ///
    /// # Arguments
    ///
    /// * `platform` - Provides the adapter, the window and the native device.
    ///
    /// # Errors
    ///
    /// - [`Error::NullDeviceSettings`] when a preparing device settings handler cleared a member.
    /// - [`Error::NotSupported`] when the negotiated adapter doesn't support the negotiated profile.
    /// - When a preparing device settings handler returned an error.
    /// - When the platform failed to create the device.
    /// - [`Error::ObjectDisposed`] when the manager is disposed.
    pub fn create_device<B>(&mut self, platform: &mut B) -> Result<()>
    where
        B: Backend + ?Sized,
    {
        self.ensure_not_disposed()?;
        if self.device.is_some() {
            return Ok(());
        }

        let (adapter, graphics_profile, presentation_parameters) =
            self.prepare_device_information(platform)?.into_parts()?;
        self.create_device_with(platform, adapter, graphics_profile, presentation_parameters)?;

        self.apply_orientation(platform)
    }

    /// Apply every changed preference.
    ///
    /// Without a device this creates one.
    /// When the negotiated profile differs from the profile of the current device, the device is disposed and a new one is created, otherwise the existing device is reset in place.
    ///
    /// # Arguments
    ///
    /// * `platform` - Provides the adapter, the window and the native device.
    ///
    /// # Errors
    ///
    /// - [`Error::NullDeviceSettings`] when a preparing device settings handler cleared a member.
    /// - [`Error::NotSupported`] when the negotiated adapter doesn't support the negotiated profile.
    /// - [`Error::InvalidArgument`] when the preferred back buffer size is empty.
    /// - When a preparing device settings handler returned an error.
    /// - When the platform failed to create or reset the device.
    /// - [`Error::ObjectDisposed`] when the manager is disposed.
    pub fn apply_changes<B>(&mut self, platform: &mut B) -> Result<()>
    where
        B: Backend + ?Sized,
    {
        self.ensure_not_disposed()?;
        let Some(current_profile) = self.device.as_ref().map(GraphicsDevice::graphics_profile) else {
            return self.create_device(platform);
        };

        let (adapter, graphics_profile, presentation_parameters) =
            self.prepare_device_information(platform)?.into_parts()?;

        if graphics_profile == current_profile {
            if let Some(device) = self.device.as_mut() {
                emit(&mut self.device_resetting, device);
                device.reset(presentation_parameters)?;
                emit(&mut self.device_reset, device);

                for handler in &mut self.presentation_changed {
                    handler(device.presentation_parameters());
                }
            }
        } else {
            log::info!("Graphics profile changed from {current_profile:?} to {graphics_profile:?}, recreating the device");

            // A profile can't be changed in place
            self.dispose_device();
            self.create_device_with(platform, adapter, graphics_profile, presentation_parameters)?;
        }

        self.apply_orientation(platform)
    }

    /// Switch between full screen and windowed mode.
    ///
    /// The OS level full screen flag is updated immediately, even when there's no device yet.
    ///
    /// # Errors
    ///
    /// - Same as [`Self::apply_changes`].
    #[inline]
    pub fn toggle_full_screen<B>(&mut self, platform: &mut B) -> Result<()>
    where
        B: Backend + ?Sized,
    {
        self.ensure_not_disposed()?;

        self.preferences.is_full_screen = !self.preferences.is_full_screen;
        platform.set_os_full_screen(self.preferences.is_full_screen);
        log::debug!("Full screen toggled to {}", self.preferences.is_full_screen);

        self.apply_changes(platform)
    }

    /// Match the back buffer of the device to the current display orientation.
    ///
    /// Called by the game loop every tick, does nothing on platforms without orientation support or when the orientation didn't change.
    /// Swapping the back buffer resets the device and raises the same events as [`Self::apply_changes`].
    ///
    /// # Errors
    ///
    /// - When the device failed to reset.
    #[inline]
    pub fn handle_orientation_changed<B>(&mut self, platform: &mut B) -> Result<()>
    where
        B: Backend + ?Sized,
    {
        if !platform.supports_orientation() {
            return Ok(());
        }

        let current = platform.current_orientation();
        let Some(device) = self.device.as_mut() else {
            return Ok(());
        };
        if device.is_disposed() || device.presentation_parameters().display_orientation == current {
            return Ok(());
        }

        let mut presentation_parameters = device.presentation_parameters().clone();
        if !presentation_parameters.orient(current) {
            // Only the flag changed
            device.set_display_orientation(current)?;

            return Ok(());
        }

        log::debug!(
            "Orientation changed to {current:?}, back buffer is now {}x{}",
            presentation_parameters.back_buffer_width,
            presentation_parameters.back_buffer_height
        );

        emit(&mut self.device_resetting, device);
        device.reset(presentation_parameters)?;
        emit(&mut self.device_reset, device);

        for handler in &mut self.presentation_changed {
            handler(device.presentation_parameters());
        }

        Ok(())
    }

    /// Prepare drawing a frame.
    ///
    /// # Returns
    ///
    /// - `false` when there's no usable device, the frame shouldn't be drawn then.
    #[inline]
    pub fn begin_draw(&mut self) -> bool {
        self.draw_begun = self
            .device
            .as_ref()
            .is_some_and(|device| !device.is_disposed());

        self.draw_begun
    }

    /// Finish drawing a frame by presenting it.
    ///
    /// Does nothing when [`Self::begin_draw`] wasn't successful.
    ///
    /// # Errors
    ///
    /// - When presenting failed.
    #[inline]
    pub fn end_draw(&mut self) -> Result<()> {
        if !std::mem::take(&mut self.draw_begun) {
            return Ok(());
        }

        match self.device.as_mut() {
            Some(device) => device.present(),
            None => Ok(()),
        }
    }

    /// Dispose the device, raising the disposing event first.
    ///
    /// Calling it again does nothing.
    #[inline]
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }

        self.dispose_device();
        self.disposed = true;
    }

    /// Whether [`Self::dispose`] was called.
    #[inline]
    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Current device, `None` before it's created.
    #[inline]
    #[must_use]
    pub const fn graphics_device(&self) -> Option<&GraphicsDevice> {
        self.device.as_ref()
    }

    /// Mutable current device, `None` before it's created.
    #[inline]
    pub fn graphics_device_mut(&mut self) -> Option<&mut GraphicsDevice> {
        self.device.as_mut()
    }

    /// Mutable current device.
    ///
    /// # Errors
    ///
    /// - [`Error::NoGraphicsDevice`] when no device was created yet.
    #[inline]
    pub fn device_mut(&mut self) -> Result<&mut GraphicsDevice> {
        self.device.as_mut().ok_or(Error::NoGraphicsDevice)
    }

    /// Build the settings for a device from the preferences and let the handlers change them.
    fn prepare_device_information<B>(&mut self, platform: &B) -> Result<GraphicsDeviceInformation>
    where
        B: Backend + ?Sized,
    {
        let adapter = platform.default_adapter();

        let mut graphics_profile = self.preferences.graphics_profile;
        if !adapter.is_profile_supported(graphics_profile) {
            log::warn!(
                "Adapter '{}' doesn't support the {graphics_profile:?} profile, falling back to {:?}",
                adapter.description(),
                GraphicsProfile::Reach
            );

            graphics_profile = GraphicsProfile::Reach;
        }

        let mut presentation_parameters = PresentationParameters {
            back_buffer_width: self.preferences.preferred_back_buffer_width,
            back_buffer_height: self.preferences.preferred_back_buffer_height,
            back_buffer_format: self.preferences.preferred_back_buffer_format,
            depth_stencil_format: self.preferences.preferred_depth_stencil_format,
            is_full_screen: self.preferences.is_full_screen,
            multi_sample_count: if self.preferences.prefer_multi_sampling {
                PREFERRED_MULTI_SAMPLE_COUNT
            } else {
                0
            },
            display_orientation: DisplayOrientation::DEFAULT,
            device_window_handle: platform.window_handle(),
            presentation_interval: if self.preferences.synchronize_with_vertical_retrace {
                PresentInterval::One
            } else {
                PresentInterval::Immediate
            },
            hardware_mode_switch: self.preferences.hardware_mode_switch,
        };
        if platform.supports_orientation() {
            presentation_parameters.orient(platform.current_orientation());
        }

        let mut graphics_device_information = GraphicsDeviceInformation {
            adapter: Some(adapter),
            graphics_profile,
            presentation_parameters: Some(presentation_parameters),
        };

        for handler in &mut self.preparing_device_settings {
            handler(&mut PreparingDeviceSettingsEventArgs {
                graphics_device_information: &mut graphics_device_information,
            })?;
        }

        Ok(graphics_device_information)
    }

    /// Create a new device from negotiated settings and raise the created event.
    fn create_device_with<B>(
        &mut self,
        platform: &mut B,
        adapter: GraphicsAdapter,
        graphics_profile: GraphicsProfile,
        presentation_parameters: PresentationParameters,
    ) -> Result<()>
    where
        B: Backend + ?Sized,
    {
        let device = GraphicsDevice::new(platform, adapter, graphics_profile, presentation_parameters)?
            .with_half_pixel_offset(self.preferences.prefer_half_pixel_offset);
        emit(&mut self.device_created, &device);
        self.device = Some(device);

        Ok(())
    }

    /// Tell the platform which orientations are allowed and rotate the back buffer if needed.
    fn apply_orientation<B>(&mut self, platform: &mut B) -> Result<()>
    where
        B: Backend + ?Sized,
    {
        if !platform.supports_orientation() {
            return Ok(());
        }

        let supported = self.preferences.supported_orientations.effective(
            self.preferences.preferred_back_buffer_width,
            self.preferences.preferred_back_buffer_height,
        );
        platform.set_supported_orientations(supported);

        self.handle_orientation_changed(platform)
    }

    /// Dispose the current device, raising the disposing event first.
    fn dispose_device(&mut self) {
        self.draw_begun = false;

        if let Some(mut device) = self.device.take() {
            emit(&mut self.device_disposing, &device);
            device.dispose();
        }
    }

    /// Fail if disposed.
    fn ensure_not_disposed(&self) -> Result<()> {
        if self.disposed {
            Err(Error::ObjectDisposed("GraphicsDeviceManager"))
        } else {
            Ok(())
        }
    }
}

/// Preferred settings.
///
/// Changes only take effect on the next [`GraphicsDeviceManager::apply_changes`].
impl GraphicsDeviceManager {
    /// Every preferred setting.
    #[inline]
    #[must_use]
    pub const fn preferences(&self) -> &GraphicsConfig {
        &self.preferences
    }

    /// Preferred horizontal back buffer pixels.
    #[inline]
    #[must_use]
    pub const fn preferred_back_buffer_width(&self) -> u32 {
        self.preferences.preferred_back_buffer_width
    }

    /// Set the preferred horizontal back buffer pixels.
    #[inline]
    pub fn set_preferred_back_buffer_width(&mut self, width: u32) {
        self.preferences.preferred_back_buffer_width = width;
    }

    /// Preferred vertical back buffer pixels.
    #[inline]
    #[must_use]
    pub const fn preferred_back_buffer_height(&self) -> u32 {
        self.preferences.preferred_back_buffer_height
    }

    /// Set the preferred vertical back buffer pixels.
    #[inline]
    pub fn set_preferred_back_buffer_height(&mut self, height: u32) {
        self.preferences.preferred_back_buffer_height = height;
    }

    /// Preferred back buffer pixel format.
    #[inline]
    #[must_use]
    pub const fn preferred_back_buffer_format(&self) -> SurfaceFormat {
        self.preferences.preferred_back_buffer_format
    }

    /// Set the preferred back buffer pixel format.
    #[inline]
    pub fn set_preferred_back_buffer_format(&mut self, format: SurfaceFormat) {
        self.preferences.preferred_back_buffer_format = format;
    }

    /// Preferred depth buffer format.
    #[inline]
    #[must_use]
    pub const fn preferred_depth_stencil_format(&self) -> DepthFormat {
        self.preferences.preferred_depth_stencil_format
    }

    /// Set the preferred depth buffer format.
    #[inline]
    pub fn set_preferred_depth_stencil_format(&mut self, format: DepthFormat) {
        self.preferences.preferred_depth_stencil_format = format;
    }

    /// Whether multisampled anti-aliasing is requested.
    #[inline]
    #[must_use]
    pub const fn prefer_multi_sampling(&self) -> bool {
        self.preferences.prefer_multi_sampling
    }

    /// Request multisampled anti-aliasing.
    #[inline]
    pub fn set_prefer_multi_sampling(&mut self, prefer_multi_sampling: bool) {
        self.preferences.prefer_multi_sampling = prefer_multi_sampling;
    }

    /// Whether presenting waits for the vertical retrace.
    #[inline]
    #[must_use]
    pub const fn synchronize_with_vertical_retrace(&self) -> bool {
        self.preferences.synchronize_with_vertical_retrace
    }

    /// Set whether presenting waits for the vertical retrace.
    #[inline]
    pub fn set_synchronize_with_vertical_retrace(&mut self, vsync: bool) {
        self.preferences.synchronize_with_vertical_retrace = vsync;
    }

    /// Whether full screen is preferred.
    #[inline]
    #[must_use]
    pub const fn is_full_screen(&self) -> bool {
        self.preferences.is_full_screen
    }

    /// Prefer full screen, see [`Self::toggle_full_screen`] for switching immediately.
    #[inline]
    pub fn set_is_full_screen(&mut self, is_full_screen: bool) {
        self.preferences.is_full_screen = is_full_screen;
    }

    /// Whether the display mode is changed in full screen.
    #[inline]
    #[must_use]
    pub const fn hardware_mode_switch(&self) -> bool {
        self.preferences.hardware_mode_switch
    }

    /// Set whether the display mode is changed in full screen.
    #[inline]
    pub fn set_hardware_mode_switch(&mut self, hardware_mode_switch: bool) {
        self.preferences.hardware_mode_switch = hardware_mode_switch;
    }

    /// Requested feature level.
    #[inline]
    #[must_use]
    pub const fn graphics_profile(&self) -> GraphicsProfile {
        self.preferences.graphics_profile
    }

    /// Request a feature level, a different one than the current device has recreates it.
    #[inline]
    pub fn set_graphics_profile(&mut self, graphics_profile: GraphicsProfile) {
        self.preferences.graphics_profile = graphics_profile;
    }

    /// Orientations the game can be played in.
    #[inline]
    #[must_use]
    pub const fn supported_orientations(&self) -> DisplayOrientation {
        self.preferences.supported_orientations
    }

    /// Set the orientations the game can be played in.
    #[inline]
    pub fn set_supported_orientations(&mut self, orientations: DisplayOrientation) {
        self.preferences.supported_orientations = orientations;
    }

    /// Whether pixel centers are offset by half a pixel.
    #[inline]
    #[must_use]
    pub const fn prefer_half_pixel_offset(&self) -> bool {
        self.preferences.prefer_half_pixel_offset
    }

    /// Offset pixel centers by half a pixel.
    ///
    /// # Errors
    ///
    /// - [`Error::HalfPixelOffsetAfterDeviceCreated`] when the device already exists.
    #[inline]
    pub fn set_prefer_half_pixel_offset(&mut self, prefer_half_pixel_offset: bool) -> Result<()> {
        if self.device.is_some() {
            return Err(Error::HalfPixelOffsetAfterDeviceCreated);
        }

        self.preferences.prefer_half_pixel_offset = prefer_half_pixel_offset;

        Ok(())
    }
}

/// Events.
impl GraphicsDeviceManager {
    /// Register a handler that can change the negotiated settings before a device is created or reset.
    ///
    /// Returning an error aborts the operation and propagates the error unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use kestrel::{backend::headless::HeadlessBackend, graphics::{GraphicsDeviceManager, GraphicsProfile}};
    ///
    /// let mut graphics = GraphicsDeviceManager::default();
    /// graphics.on_preparing_device_settings(|args| {
    ///     // Always run with the reduced feature set
    ///     args.graphics_device_information.graphics_profile = GraphicsProfile::Reach;
    ///
    ///     Ok(())
    /// });
    /// graphics.create_device(&mut HeadlessBackend::new())?;
    ///
    /// assert_eq!(graphics.graphics_device().unwrap().graphics_profile(), GraphicsProfile::Reach);
    /// # Ok::<(), kestrel::Error>(())
    /// ```
    #[inline]
    pub fn on_preparing_device_settings(
        &mut self,
        handler: impl FnMut(&mut PreparingDeviceSettingsEventArgs<'_>) -> Result<()> + 'static,
    ) {
        self.preparing_device_settings.push(Box::new(handler));
    }

    /// Register a handler called after a device is created.
    #[inline]
    pub fn on_device_created(&mut self, handler: impl FnMut(&GraphicsDevice) + 'static) {
        self.device_created.push(Box::new(handler));
    }

    /// Register a handler called before the device is reset in place.
    #[inline]
    pub fn on_device_resetting(&mut self, handler: impl FnMut(&GraphicsDevice) + 'static) {
        self.device_resetting.push(Box::new(handler));
    }

    /// Register a handler called after the device was reset in place.
    #[inline]
    pub fn on_device_reset(&mut self, handler: impl FnMut(&GraphicsDevice) + 'static) {
        self.device_reset.push(Box::new(handler));
    }

    /// Register a handler called before the device is disposed.
    #[inline]
    pub fn on_device_disposing(&mut self, handler: impl FnMut(&GraphicsDevice) + 'static) {
        self.device_disposing.push(Box::new(handler));
    }

    /// Register a handler called after the presentation parameters of the device changed.
    #[inline]
    pub fn on_presentation_changed(
        &mut self,
        handler: impl FnMut(&PresentationParameters) + 'static,
    ) {
        self.presentation_changed.push(Box::new(handler));
    }
}

impl Default for GraphicsDeviceManager {
    #[inline]
    fn default() -> Self {
        Self::new(GraphicsConfig::default())
    }
}

impl Drop for GraphicsDeviceManager {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for GraphicsDeviceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphicsDeviceManager")
            .field("device", &self.device)
            .field("preferences", &self.preferences)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

/// Call every handler of a device event.
fn emit(handlers: &mut [DeviceHandler], device: &GraphicsDevice) {
    for handler in handlers {
        handler(device);
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::GraphicsDeviceManager;
    use crate::{
        backend::headless::HeadlessBackend,
        config::GraphicsConfig,
        error::Error,
        graphics::{
            backend::recording::BackendCall, GraphicsAdapter, GraphicsProfile, PresentInterval,
        },
    };

    /// Record the names of the lifecycle events in order.
    fn record_events(graphics: &mut GraphicsDeviceManager) -> Rc<RefCell<Vec<&'static str>>> {
        let events = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&events);
        graphics.on_preparing_device_settings(move |_| {
            log.borrow_mut().push("preparing");
            Ok(())
        });
        let log = Rc::clone(&events);
        graphics.on_device_created(move |_| log.borrow_mut().push("created"));
        let log = Rc::clone(&events);
        graphics.on_device_resetting(move |_| log.borrow_mut().push("resetting"));
        let log = Rc::clone(&events);
        graphics.on_device_reset(move |_| log.borrow_mut().push("reset"));
        let log = Rc::clone(&events);
        graphics.on_device_disposing(move |_| log.borrow_mut().push("disposing"));

        events
    }

    #[test]
    fn preferred_defaults() {
        let mut platform = HeadlessBackend::new();
        let mut graphics = GraphicsDeviceManager::default();
        graphics.create_device(&mut platform).unwrap();

        let parameters = graphics.graphics_device().unwrap().presentation_parameters();
        assert_eq!((parameters.back_buffer_width, parameters.back_buffer_height), (800, 480));
        assert_eq!(parameters.multi_sample_count, 0);
        assert_eq!(parameters.presentation_interval, PresentInterval::One);
        assert!(!parameters.is_full_screen);
    }

    #[test]
    fn create_twice_is_a_no_op() {
        let mut platform = HeadlessBackend::new();
        let mut graphics = GraphicsDeviceManager::default();
        let events = record_events(&mut graphics);

        graphics.create_device(&mut platform).unwrap();
        graphics.create_device(&mut platform).unwrap();

        assert_eq!(platform.devices_created(), 1);
        assert_eq!(*events.borrow(), ["preparing", "created"]);
    }

    #[test]
    fn apply_without_profile_change_resets() {
        let mut platform = HeadlessBackend::new();
        let mut graphics = GraphicsDeviceManager::default();
        graphics.create_device(&mut platform).unwrap();
        let events = record_events(&mut graphics);
        let id = graphics.graphics_device().unwrap().id();

        graphics.set_preferred_back_buffer_width(1024);
        graphics.apply_changes(&mut platform).unwrap();

        let device = graphics.graphics_device().unwrap();
        assert_eq!(device.id(), id);
        assert_eq!(device.presentation_parameters().back_buffer_width, 1024);
        assert_eq!(platform.devices_created(), 1);
        assert_eq!(*events.borrow(), ["preparing", "resetting", "reset"]);
    }

    #[test]
    fn profile_change_recreates() {
        let mut platform = HeadlessBackend::new();
        let mut graphics = GraphicsDeviceManager::default();
        graphics.create_device(&mut platform).unwrap();
        let events = record_events(&mut graphics);
        let id = graphics.graphics_device().unwrap().id();

        graphics.set_graphics_profile(GraphicsProfile::Reach);
        graphics.apply_changes(&mut platform).unwrap();

        let device = graphics.graphics_device().unwrap();
        assert_ne!(device.id(), id);
        assert_eq!(device.graphics_profile(), GraphicsProfile::Reach);
        assert_eq!(platform.devices_created(), 2);
        assert_eq!(*events.borrow(), ["preparing", "disposing", "created"]);
    }

    #[test]
    fn unsupported_preferred_profile_falls_back() {
        let mut platform = HeadlessBackend::new()
            .with_adapter(GraphicsAdapter::new("Old GPU").with_max_profile(GraphicsProfile::Reach));
        let mut graphics = GraphicsDeviceManager::default();

        graphics.create_device(&mut platform).unwrap();

        assert_eq!(
            graphics.graphics_device().unwrap().graphics_profile(),
            GraphicsProfile::Reach
        );
    }

    #[test]
    fn handler_forcing_unsupported_profile_fails() {
        let mut platform = HeadlessBackend::new()
            .with_adapter(GraphicsAdapter::new("Old GPU").with_max_profile(GraphicsProfile::Reach));
        let mut graphics = GraphicsDeviceManager::default();
        graphics.on_preparing_device_settings(|args| {
            args.graphics_device_information.graphics_profile = GraphicsProfile::HiDef;
            Ok(())
        });

        assert!(matches!(
            graphics.create_device(&mut platform),
            Err(Error::NotSupported(_))
        ));
        assert!(graphics.graphics_device().is_none());
    }

    #[test]
    fn cleared_member_is_rejected() {
        let mut platform = HeadlessBackend::new();
        let mut graphics = GraphicsDeviceManager::default();
        graphics.on_preparing_device_settings(|args| {
            args.graphics_device_information.presentation_parameters = None;
            Ok(())
        });

        assert!(matches!(
            graphics.create_device(&mut platform),
            Err(Error::NullDeviceSettings {
                member: "presentation_parameters"
            })
        ));
        assert_eq!(platform.devices_created(), 0);
    }

    #[test]
    fn multi_sampling_is_clamped() {
        let mut platform = HeadlessBackend::new()
            .with_adapter(GraphicsAdapter::new("Mobile GPU").with_max_multi_sample_count(2));
        let mut graphics =
            GraphicsDeviceManager::new(GraphicsConfig::default().with_multi_sampling(true));

        graphics.create_device(&mut platform).unwrap();

        assert_eq!(
            graphics
                .graphics_device()
                .unwrap()
                .presentation_parameters()
                .multi_sample_count,
            2
        );
    }

    #[test]
    fn half_pixel_offset_only_before_creation() {
        let mut platform = HeadlessBackend::new();
        let mut graphics = GraphicsDeviceManager::default();

        graphics.set_prefer_half_pixel_offset(true).unwrap();
        graphics.create_device(&mut platform).unwrap();

        assert!(matches!(
            graphics.set_prefer_half_pixel_offset(false),
            Err(Error::HalfPixelOffsetAfterDeviceCreated)
        ));
        assert!(graphics.prefer_half_pixel_offset());
    }

    #[test]
    fn draw_needs_a_device() {
        let mut platform = HeadlessBackend::new();
        let mut graphics = GraphicsDeviceManager::default();

        assert!(!graphics.begin_draw());
        graphics.end_draw().unwrap();

        graphics.create_device(&mut platform).unwrap();
        let log = platform.last_call_log().unwrap();
        assert!(graphics.begin_draw());
        graphics.end_draw().unwrap();

        assert_eq!(log.calls().last(), Some(&BackendCall::Present));
    }

    #[test]
    fn dispose_raises_event_once() {
        let mut platform = HeadlessBackend::new();
        let mut graphics = GraphicsDeviceManager::default();
        graphics.create_device(&mut platform).unwrap();
        let events = record_events(&mut graphics);

        graphics.dispose();
        graphics.dispose();

        assert_eq!(*events.borrow(), ["disposing"]);
        assert!(graphics.graphics_device().is_none());
        assert!(matches!(
            graphics.apply_changes(&mut platform),
            Err(Error::ObjectDisposed(_))
        ));
    }
}
