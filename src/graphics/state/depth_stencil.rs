//! Depth and stencil testing.

use super::{StateLifecycle, StateObject};
use crate::{
    error::Result,
    graphics::{
        backend::{StateBackend, StencilFace},
        device::GraphicsDevice,
        resource::ResourceKind,
        CompareFunction,
    },
};

/// What happens with the stencil buffer value after a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOperation {
    /// Leave it.
    #[default]
    Keep,
    /// Set it to zero.
    Zero,
    /// Set it to the reference value.
    Replace,
    /// Increment, wrapping around.
    Increment,
    /// Decrement, wrapping around.
    Decrement,
    /// Increment, clamping at the maximum.
    IncrementSaturation,
    /// Decrement, clamping at zero.
    DecrementSaturation,
    /// Flip every bit.
    Invert,
}

/// Default stencil read and write mask, all bits of a signed 32 bit integer.
const DEFAULT_STENCIL_MASK: u32 = 0x7FFF_FFFF;

/// Depth and stencil test configuration.
///
/// The regular stencil fields apply to clockwise faces, or to both when [`DepthStencilState::two_sided_stencil_mode`] is disabled.
#[derive(Debug)]
pub struct DepthStencilState {
    /// Lock state.
    lifecycle: StateLifecycle,
    /// Depth test.
    depth_buffer_enable: bool,
    /// Depth writes.
    depth_buffer_write_enable: bool,
    /// Depth comparison.
    depth_buffer_function: CompareFunction,
    /// Stencil test.
    stencil_enable: bool,
    /// Clockwise stencil comparison.
    stencil_function: CompareFunction,
    /// Clockwise stencil operation when both tests pass.
    stencil_pass: StencilOperation,
    /// Clockwise stencil operation when the stencil test fails.
    stencil_fail: StencilOperation,
    /// Clockwise stencil operation when the depth test fails.
    stencil_depth_buffer_fail: StencilOperation,
    /// Use the counter clockwise fields for counter clockwise faces.
    two_sided_stencil_mode: bool,
    /// Counter clockwise stencil comparison.
    counter_clockwise_stencil_function: CompareFunction,
    /// Counter clockwise stencil operation when both tests pass.
    counter_clockwise_stencil_pass: StencilOperation,
    /// Counter clockwise stencil operation when the stencil test fails.
    counter_clockwise_stencil_fail: StencilOperation,
    /// Counter clockwise stencil operation when the depth test fails.
    counter_clockwise_stencil_depth_buffer_fail: StencilOperation,
    /// Stencil reference value.
    reference_stencil: i32,
    /// Stencil read mask.
    stencil_mask: u32,
    /// Stencil write mask.
    stencil_write_mask: u32,
}

impl DepthStencilState {
    /// Depth test and writes enabled.
    pub const DEFAULT: Self = Self::preset("DepthStencilState.Default", true, true);
    /// Depth test without writing.
    pub const DEPTH_READ: Self = Self::preset("DepthStencilState.DepthRead", true, false);
    /// No depth test and no writes.
    pub const NONE: Self = Self::preset("DepthStencilState.None", false, false);

    /// Used while clearing, stencil writes only reach the buffer when the test is enabled.
    pub(crate) const CLEAR: Self = Self {
        stencil_enable: true,
        ..Self::preset("DepthStencilState.Clear", true, true)
    };

    /// Create a mutable state with depth testing and writing enabled.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lifecycle: StateLifecycle::Mutable,
            depth_buffer_enable: true,
            depth_buffer_write_enable: true,
            depth_buffer_function: CompareFunction::LessEqual,
            stencil_enable: false,
            stencil_function: CompareFunction::Always,
            stencil_pass: StencilOperation::Keep,
            stencil_fail: StencilOperation::Keep,
            stencil_depth_buffer_fail: StencilOperation::Keep,
            two_sided_stencil_mode: false,
            counter_clockwise_stencil_function: CompareFunction::Always,
            counter_clockwise_stencil_pass: StencilOperation::Keep,
            counter_clockwise_stencil_fail: StencilOperation::Keep,
            counter_clockwise_stencil_depth_buffer_fail: StencilOperation::Keep,
            reference_stencil: 0,
            stencil_mask: DEFAULT_STENCIL_MASK,
            stencil_write_mask: DEFAULT_STENCIL_MASK,
        }
    }

    /// Construct a locked built-in.
    const fn preset(name: &'static str, depth: bool, write: bool) -> Self {
        Self {
            lifecycle: StateLifecycle::Preset(name),
            depth_buffer_enable: depth,
            depth_buffer_write_enable: write,
            ..Self::new()
        }
    }

    /// Where this state is in its lifecycle.
    #[inline]
    #[must_use]
    pub const fn lifecycle(&self) -> StateLifecycle {
        self.lifecycle
    }

    /// Bind to `device`, locking every setter for good.
    ///
    /// # Errors
    ///
    /// - When this is a preset or bound to another device, see [`super::StateLifecycle`].
    #[inline]
    pub fn bind_to_graphics_device(&mut self, device: &mut GraphicsDevice) -> Result<bool> {
        device.bind_state(self)
    }

    /// Whether the depth test is enabled.
    #[inline]
    #[must_use]
    pub const fn depth_buffer_enable(&self) -> bool {
        self.depth_buffer_enable
    }

    /// Whether passing fragments write their depth.
    #[inline]
    #[must_use]
    pub const fn depth_buffer_write_enable(&self) -> bool {
        self.depth_buffer_write_enable
    }

    /// Depth comparison.
    #[inline]
    #[must_use]
    pub const fn depth_buffer_function(&self) -> CompareFunction {
        self.depth_buffer_function
    }

    /// Whether the stencil test is enabled.
    #[inline]
    #[must_use]
    pub const fn stencil_enable(&self) -> bool {
        self.stencil_enable
    }

    /// Clockwise stencil comparison.
    #[inline]
    #[must_use]
    pub const fn stencil_function(&self) -> CompareFunction {
        self.stencil_function
    }

    /// Clockwise operation when both tests pass.
    #[inline]
    #[must_use]
    pub const fn stencil_pass(&self) -> StencilOperation {
        self.stencil_pass
    }

    /// Clockwise operation when the stencil test fails.
    #[inline]
    #[must_use]
    pub const fn stencil_fail(&self) -> StencilOperation {
        self.stencil_fail
    }

    /// Clockwise operation when the depth test fails.
    #[inline]
    #[must_use]
    pub const fn stencil_depth_buffer_fail(&self) -> StencilOperation {
        self.stencil_depth_buffer_fail
    }

    /// Whether counter clockwise faces use their own stencil settings.
    #[inline]
    #[must_use]
    pub const fn two_sided_stencil_mode(&self) -> bool {
        self.two_sided_stencil_mode
    }

    /// Counter clockwise stencil comparison.
    #[inline]
    #[must_use]
    pub const fn counter_clockwise_stencil_function(&self) -> CompareFunction {
        self.counter_clockwise_stencil_function
    }

    /// Counter clockwise operation when both tests pass.
    #[inline]
    #[must_use]
    pub const fn counter_clockwise_stencil_pass(&self) -> StencilOperation {
        self.counter_clockwise_stencil_pass
    }

    /// Counter clockwise operation when the stencil test fails.
    #[inline]
    #[must_use]
    pub const fn counter_clockwise_stencil_fail(&self) -> StencilOperation {
        self.counter_clockwise_stencil_fail
    }

    /// Counter clockwise operation when the depth test fails.
    #[inline]
    #[must_use]
    pub const fn counter_clockwise_stencil_depth_buffer_fail(&self) -> StencilOperation {
        self.counter_clockwise_stencil_depth_buffer_fail
    }

    /// Value the stencil buffer is compared with.
    #[inline]
    #[must_use]
    pub const fn reference_stencil(&self) -> i32 {
        self.reference_stencil
    }

    /// Mask applied to both sides of the stencil comparison.
    #[inline]
    #[must_use]
    pub const fn stencil_mask(&self) -> u32 {
        self.stencil_mask
    }

    /// Bits of the stencil buffer that can be written.
    #[inline]
    #[must_use]
    pub const fn stencil_write_mask(&self) -> u32 {
        self.stencil_write_mask
    }

    /// Enable or disable the depth test.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_depth_buffer_enable(&mut self, value: bool) -> Result<()> {
        self.edit()?.depth_buffer_enable = value;

        Ok(())
    }

    /// Enable or disable depth writes.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_depth_buffer_write_enable(&mut self, value: bool) -> Result<()> {
        self.edit()?.depth_buffer_write_enable = value;

        Ok(())
    }

    /// Set the depth comparison.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_depth_buffer_function(&mut self, value: CompareFunction) -> Result<()> {
        self.edit()?.depth_buffer_function = value;

        Ok(())
    }

    /// Enable or disable the stencil test.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_stencil_enable(&mut self, value: bool) -> Result<()> {
        self.edit()?.stencil_enable = value;

        Ok(())
    }

    /// Set the clockwise stencil comparison.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_stencil_function(&mut self, value: CompareFunction) -> Result<()> {
        self.edit()?.stencil_function = value;

        Ok(())
    }

    /// Set the clockwise operation when both tests pass.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_stencil_pass(&mut self, value: StencilOperation) -> Result<()> {
        self.edit()?.stencil_pass = value;

        Ok(())
    }

    /// Set the clockwise operation when the stencil test fails.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_stencil_fail(&mut self, value: StencilOperation) -> Result<()> {
        self.edit()?.stencil_fail = value;

        Ok(())
    }

    /// Set the clockwise operation when the depth test fails.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_stencil_depth_buffer_fail(&mut self, value: StencilOperation) -> Result<()> {
        self.edit()?.stencil_depth_buffer_fail = value;

        Ok(())
    }

    /// Let counter clockwise faces use their own stencil settings.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_two_sided_stencil_mode(&mut self, value: bool) -> Result<()> {
        self.edit()?.two_sided_stencil_mode = value;

        Ok(())
    }

    /// Set the counter clockwise stencil comparison.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_counter_clockwise_stencil_function(&mut self, value: CompareFunction) -> Result<()> {
        self.edit()?.counter_clockwise_stencil_function = value;

        Ok(())
    }

    /// Set the counter clockwise operation when both tests pass.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_counter_clockwise_stencil_pass(&mut self, value: StencilOperation) -> Result<()> {
        self.edit()?.counter_clockwise_stencil_pass = value;

        Ok(())
    }

    /// Set the counter clockwise operation when the stencil test fails.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_counter_clockwise_stencil_fail(&mut self, value: StencilOperation) -> Result<()> {
        self.edit()?.counter_clockwise_stencil_fail = value;

        Ok(())
    }

    /// Set the counter clockwise operation when the depth test fails.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_counter_clockwise_stencil_depth_buffer_fail(
        &mut self,
        value: StencilOperation,
    ) -> Result<()> {
        self.edit()?.counter_clockwise_stencil_depth_buffer_fail = value;

        Ok(())
    }

    /// Set the stencil reference value.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_reference_stencil(&mut self, value: i32) -> Result<()> {
        self.edit()?.reference_stencil = value;

        Ok(())
    }

    /// Set the stencil read mask.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_stencil_mask(&mut self, value: u32) -> Result<()> {
        self.edit()?.stencil_mask = value;

        Ok(())
    }

    /// Set the stencil write mask.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_stencil_write_mask(&mut self, value: u32) -> Result<()> {
        self.edit()?.stencil_write_mask = value;

        Ok(())
    }

    /// Self, if setters are still allowed.
    fn edit(&mut self) -> Result<&mut Self> {
        self.lifecycle.ensure_mutable(Self::KIND)?;

        Ok(self)
    }

    /// Issue the backend calls for every field that differs from the shadow cache.
    pub(crate) fn apply<B: StateBackend + ?Sized>(
        &self,
        backend: &mut B,
        cache: &mut DepthStencilCache,
        force: bool,
    ) {
        // Nothing was applied yet, the backend values are unknown
        let force = force || cache.last.is_none();
        let last = cache.last.get_or_insert_with(Self::new);

        if force || self.depth_buffer_enable != last.depth_buffer_enable {
            backend.set_depth_test_enabled(self.depth_buffer_enable);
            last.depth_buffer_enable = self.depth_buffer_enable;
        }

        if force || self.depth_buffer_write_enable != last.depth_buffer_write_enable {
            backend.set_depth_write_enabled(self.depth_buffer_write_enable);
            last.depth_buffer_write_enable = self.depth_buffer_write_enable;
        }

        if force || self.depth_buffer_function != last.depth_buffer_function {
            backend.set_depth_function(self.depth_buffer_function);
            last.depth_buffer_function = self.depth_buffer_function;
        }

        if force || self.stencil_enable != last.stencil_enable {
            backend.set_stencil_test_enabled(self.stencil_enable);
            last.stencil_enable = self.stencil_enable;
        }

        // The faces the previous calls targeted differ between the modes
        let force_faces = force || self.two_sided_stencil_mode != last.two_sided_stencil_mode;

        if self.two_sided_stencil_mode {
            if force_faces
                || self.stencil_function != last.stencil_function
                || self.reference_stencil != last.reference_stencil
                || self.stencil_mask != last.stencil_mask
            {
                backend.set_stencil_function(
                    StencilFace::Front,
                    self.stencil_function,
                    self.reference_stencil,
                    self.stencil_mask,
                );
            }

            if force_faces
                || self.counter_clockwise_stencil_function != last.counter_clockwise_stencil_function
                || self.reference_stencil != last.reference_stencil
                || self.stencil_mask != last.stencil_mask
            {
                backend.set_stencil_function(
                    StencilFace::Back,
                    self.counter_clockwise_stencil_function,
                    self.reference_stencil,
                    self.stencil_mask,
                );
            }

            if force_faces
                || self.stencil_fail != last.stencil_fail
                || self.stencil_depth_buffer_fail != last.stencil_depth_buffer_fail
                || self.stencil_pass != last.stencil_pass
            {
                backend.set_stencil_operation(
                    StencilFace::Front,
                    self.stencil_fail,
                    self.stencil_depth_buffer_fail,
                    self.stencil_pass,
                );
            }

            if force_faces
                || self.counter_clockwise_stencil_fail != last.counter_clockwise_stencil_fail
                || self.counter_clockwise_stencil_depth_buffer_fail
                    != last.counter_clockwise_stencil_depth_buffer_fail
                || self.counter_clockwise_stencil_pass != last.counter_clockwise_stencil_pass
            {
                backend.set_stencil_operation(
                    StencilFace::Back,
                    self.counter_clockwise_stencil_fail,
                    self.counter_clockwise_stencil_depth_buffer_fail,
                    self.counter_clockwise_stencil_pass,
                );
            }

            last.counter_clockwise_stencil_function = self.counter_clockwise_stencil_function;
            last.counter_clockwise_stencil_fail = self.counter_clockwise_stencil_fail;
            last.counter_clockwise_stencil_depth_buffer_fail =
                self.counter_clockwise_stencil_depth_buffer_fail;
            last.counter_clockwise_stencil_pass = self.counter_clockwise_stencil_pass;
        } else {
            if force_faces
                || self.stencil_function != last.stencil_function
                || self.reference_stencil != last.reference_stencil
                || self.stencil_mask != last.stencil_mask
            {
                backend.set_stencil_function(
                    StencilFace::FrontAndBack,
                    self.stencil_function,
                    self.reference_stencil,
                    self.stencil_mask,
                );
            }

            if force_faces
                || self.stencil_fail != last.stencil_fail
                || self.stencil_depth_buffer_fail != last.stencil_depth_buffer_fail
                || self.stencil_pass != last.stencil_pass
            {
                backend.set_stencil_operation(
                    StencilFace::FrontAndBack,
                    self.stencil_fail,
                    self.stencil_depth_buffer_fail,
                    self.stencil_pass,
                );
            }
        }

        last.two_sided_stencil_mode = self.two_sided_stencil_mode;
        last.stencil_function = self.stencil_function;
        last.reference_stencil = self.reference_stencil;
        last.stencil_mask = self.stencil_mask;
        last.stencil_fail = self.stencil_fail;
        last.stencil_depth_buffer_fail = self.stencil_depth_buffer_fail;
        last.stencil_pass = self.stencil_pass;

        if force || self.stencil_write_mask != last.stencil_write_mask {
            backend.set_stencil_write_mask(self.stencil_write_mask);
            last.stencil_write_mask = self.stencil_write_mask;
        }
    }
}

impl Default for DepthStencilState {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for DepthStencilState {
    /// Detached mutable copy, also for presets and bound states.
    #[inline]
    fn clone(&self) -> Self {
        Self {
            lifecycle: StateLifecycle::Mutable,
            ..self.snapshot()
        }
    }
}

impl StateObject for DepthStencilState {
    const KIND: ResourceKind = ResourceKind::DepthStencilState;

    fn lifecycle(&self) -> StateLifecycle {
        self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut StateLifecycle {
        &mut self.lifecycle
    }

    fn snapshot(&self) -> Self {
        Self { ..*self }
    }
}

/// Last applied depth stencil state of a context.
#[derive(Debug, Default)]
pub(crate) struct DepthStencilCache {
    /// Values as the backend has them, `None` before the first apply.
    last: Option<DepthStencilState>,
}
