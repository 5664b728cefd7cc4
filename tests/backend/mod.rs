//! Platform for running tests which doesn't actually interface with any OS functionality.

// Not every test uses every helper
#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc, time::Duration};

use kestrel::{
    backend::Backend,
    game::clock::ManualClock,
    graphics::{
        backend::{
            recording::{CallLog, RecordingBackend},
            Capabilities, DeviceBackend,
        },
        DisplayOrientation, GraphicsAdapter, GraphicsProfile, PresentationParameters,
    },
    Result,
};

/// Everything the platform was asked to do, shared between clones.
#[derive(Debug)]
pub struct PlatformState {
    /// Adapter handed to the device manager.
    pub adapter: GraphicsAdapter,
    /// Capabilities of created devices.
    pub capabilities: Capabilities,
    /// Whether the display rotates.
    pub orientation_supported: bool,
    /// Current display orientation.
    pub orientation: DisplayOrientation,
    /// Whether the game is in the foreground.
    pub active: bool,
    /// Every OS full screen switch.
    pub full_screen_calls: Vec<bool>,
    /// Every supported orientations update.
    pub supported_orientation_calls: Vec<DisplayOrientation>,
    /// Every sleep.
    pub sleeps: Vec<Duration>,
    /// Call logs of every created device, in creation order.
    pub logs: Vec<CallLog>,
    /// Whether exit was called.
    pub exited: bool,
}

/// Test platform.
///
/// Sleeping advances the clock instead of blocking.
#[derive(Debug, Clone)]
pub struct TestBackend {
    /// Shared state.
    state: Rc<RefCell<PlatformState>>,
    /// Time source advanced by sleeping.
    clock: ManualClock,
}

impl TestBackend {
    /// Desktop like platform without orientation support.
    pub fn new() -> Self {
        // Show the crate logs of failing tests
        let _ = env_logger::builder().is_test(true).try_init();

        Self {
            state: Rc::new(RefCell::new(PlatformState {
                adapter: GraphicsAdapter::default(),
                capabilities: Capabilities::FULL,
                orientation_supported: false,
                orientation: DisplayOrientation::LANDSCAPE_LEFT,
                active: true,
                full_screen_calls: Vec::new(),
                supported_orientation_calls: Vec::new(),
                sleeps: Vec::new(),
                logs: Vec::new(),
                exited: false,
            })),
            clock: ManualClock::default(),
        }
    }

    /// Phone like platform that rotates.
    pub fn mobile() -> Self {
        let platform = Self::new();
        platform.state_mut().orientation_supported = true;

        platform
    }

    /// Clock advanced by sleeping.
    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }

    /// Read the shared state.
    pub fn state(&self) -> std::cell::Ref<'_, PlatformState> {
        self.state.borrow()
    }

    /// Change the shared state.
    pub fn state_mut(&self) -> std::cell::RefMut<'_, PlatformState> {
        self.state.borrow_mut()
    }

    /// Call log of the most recently created device.
    pub fn last_log(&self) -> CallLog {
        self.state()
            .logs
            .last()
            .cloned()
            .expect("no device was created")
    }

    /// Rotate the display.
    pub fn rotate(&self, orientation: DisplayOrientation) {
        self.state_mut().orientation = orientation;
    }
}

impl Backend for TestBackend {
    fn default_adapter(&self) -> GraphicsAdapter {
        self.state().adapter.clone()
    }

    fn create_device(
        &mut self,
        _adapter: &GraphicsAdapter,
        _graphics_profile: GraphicsProfile,
        _presentation_parameters: &PresentationParameters,
    ) -> Result<Box<dyn DeviceBackend>> {
        let backend = RecordingBackend::with_capabilities(self.state().capabilities);
        self.state_mut().logs.push(backend.log());

        Ok(Box::new(backend))
    }

    fn supports_orientation(&self) -> bool {
        self.state().orientation_supported
    }

    fn current_orientation(&self) -> DisplayOrientation {
        self.state().orientation
    }

    fn set_supported_orientations(&mut self, orientations: DisplayOrientation) {
        self.state_mut().supported_orientation_calls.push(orientations);
    }

    fn set_os_full_screen(&mut self, full_screen: bool) {
        self.state_mut().full_screen_calls.push(full_screen);
    }

    fn is_active(&self) -> bool {
        self.state().active
    }

    fn sleep(&mut self, duration: Duration) {
        self.state_mut().sleeps.push(duration);
        self.clock.advance(duration);
    }

    fn exit(&mut self) {
        self.state_mut().exited = true;
    }
}
