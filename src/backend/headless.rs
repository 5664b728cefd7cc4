//! Windowless platform.
//!
//! Devices created by it record their calls instead of drawing, which makes it suitable for servers, tools and automated tests of game logic.

use super::Backend;
use crate::{
    error::Result,
    graphics::{
        backend::{
            recording::{CallLog, RecordingBackend},
            Capabilities, DeviceBackend,
        },
        GraphicsAdapter, GraphicsProfile, PresentationParameters,
    },
};

/// Platform without a window that creates [`RecordingBackend`] devices.
///
/// # Example
///
/// ```
/// use kestrel::{backend::headless::HeadlessBackend, graphics::GraphicsDeviceManager};
///
/// let mut platform = HeadlessBackend::new();
/// let mut graphics = GraphicsDeviceManager::default();
/// graphics.create_device(&mut platform)?;
///
/// assert_eq!(platform.devices_created(), 1);
/// # Ok::<(), kestrel::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    /// Adapter reported to the device manager.
    adapter: GraphicsAdapter,
    /// What created devices claim to support.
    capabilities: Capabilities,
    /// Amount of devices created so far.
    devices_created: usize,
    /// Calls of the most recently created device.
    last_log: Option<CallLog>,
}

impl HeadlessBackend {
    /// Create with the default adapter and every capability.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a different adapter.
    #[inline]
    #[must_use]
    pub fn with_adapter(mut self, adapter: GraphicsAdapter) -> Self {
        self.adapter = adapter;

        self
    }

    /// Let created devices report different capabilities.
    #[inline]
    #[must_use]
    pub const fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;

        self
    }

    /// Amount of devices created so far.
    #[inline]
    #[must_use]
    pub const fn devices_created(&self) -> usize {
        self.devices_created
    }

    /// Calls recorded by the most recently created device.
    #[inline]
    #[must_use]
    pub fn last_call_log(&self) -> Option<CallLog> {
        self.last_log.clone()
    }
}

impl Backend for HeadlessBackend {
    #[inline]
    fn default_adapter(&self) -> GraphicsAdapter {
        self.adapter.clone()
    }

    #[inline]
    fn create_device(
        &mut self,
        _adapter: &GraphicsAdapter,
        _graphics_profile: GraphicsProfile,
        _presentation_parameters: &PresentationParameters,
    ) -> Result<Box<dyn DeviceBackend>> {
        let backend = RecordingBackend::with_capabilities(self.capabilities);
        self.last_log = Some(backend.log());
        self.devices_created += 1;

        Ok(Box::new(backend))
    }
}
