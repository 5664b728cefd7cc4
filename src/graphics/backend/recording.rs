//! Headless backend that records every call instead of talking to a GPU.
//!
//! Useful for servers, tools and for asserting which driver calls the state diffing produces.

use std::{cell::RefCell, rc::Rc};

use super::{BlendFactors, BlendTarget, Capabilities, DeviceBackend, StateBackend, StencilFace, TextureAxis};
use crate::{
    error::Result,
    graphics::{
        state::{
            blend::{BlendFunction, ColorWriteChannels},
            depth_stencil::StencilOperation,
            rasterizer::{CullMode, FillMode},
            sampler::{TextureAddressMode, TextureFilter},
        },
        ClearOptions, Color, CompareFunction, PresentationParameters, PrimitiveType,
    },
};

/// A single recorded backend call.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum BackendCall {
    /// [`StateBackend::set_blend_enabled`].
    BlendEnabled(BlendTarget, bool),
    /// [`StateBackend::set_blend_color`].
    BlendColor(Color),
    /// [`StateBackend::set_blend_equation`].
    BlendEquation(BlendTarget, BlendFunction, BlendFunction),
    /// [`StateBackend::set_blend_function`].
    BlendFunction(BlendTarget, BlendFactors),
    /// [`StateBackend::set_color_write_mask`].
    ColorWriteMask(BlendTarget, ColorWriteChannels),
    /// [`StateBackend::set_sample_mask`].
    SampleMask(u32),
    /// [`StateBackend::set_depth_test_enabled`].
    DepthTestEnabled(bool),
    /// [`StateBackend::set_depth_write_enabled`].
    DepthWriteEnabled(bool),
    /// [`StateBackend::set_depth_function`].
    DepthFunction(CompareFunction),
    /// [`StateBackend::set_stencil_test_enabled`].
    StencilTestEnabled(bool),
    /// [`StateBackend::set_stencil_function`].
    StencilFunction {
        /// Face.
        face: StencilFace,
        /// Comparison.
        function: CompareFunction,
        /// Reference value.
        reference: i32,
        /// Read mask.
        mask: u32,
    },
    /// [`StateBackend::set_stencil_operation`].
    StencilOperation {
        /// Face.
        face: StencilFace,
        /// Stencil test failed.
        fail: StencilOperation,
        /// Depth test failed.
        depth_fail: StencilOperation,
        /// Both passed.
        pass: StencilOperation,
    },
    /// [`StateBackend::set_stencil_write_mask`].
    StencilWriteMask(u32),
    /// [`StateBackend::set_cull_mode`].
    CullMode(CullMode),
    /// [`StateBackend::set_fill_mode`].
    FillMode(FillMode),
    /// [`StateBackend::set_scissor_test_enabled`].
    ScissorTestEnabled(bool),
    /// [`StateBackend::set_depth_bias`].
    DepthBias {
        /// Scaled constant bias.
        constant: f32,
        /// Slope scaled bias.
        slope_scale: f32,
    },
    /// [`StateBackend::set_depth_clip_enabled`].
    DepthClipEnabled(bool),
    /// [`StateBackend::set_multisample_enabled`].
    MultisampleEnabled(bool),
    /// [`StateBackend::set_sampler_filter`].
    SamplerFilter {
        /// Sampler slot.
        slot: usize,
        /// Filter.
        filter: TextureFilter,
        /// Clamped anisotropy.
        max_anisotropy: u16,
    },
    /// [`StateBackend::set_sampler_address`].
    SamplerAddress {
        /// Sampler slot.
        slot: usize,
        /// Coordinate.
        axis: TextureAxis,
        /// Address mode.
        mode: TextureAddressMode,
    },
    /// [`StateBackend::set_sampler_border_color`].
    SamplerBorderColor {
        /// Sampler slot.
        slot: usize,
        /// Border color.
        color: Color,
    },
    /// [`StateBackend::set_sampler_level_of_detail`].
    SamplerLevelOfDetail {
        /// Sampler slot.
        slot: usize,
        /// Most detailed mip level.
        max_mip_level: u32,
        /// Mip bias.
        mip_bias: f32,
    },
    /// [`StateBackend::set_sampler_comparison`].
    SamplerComparison {
        /// Sampler slot.
        slot: usize,
        /// Comparison, `None` when disabled.
        function: Option<CompareFunction>,
    },
    /// [`DeviceBackend::reset`].
    Reset(PresentationParameters),
    /// [`DeviceBackend::present`].
    Present,
    /// [`DeviceBackend::clear`].
    Clear {
        /// Buffers to clear.
        options: ClearOptions,
        /// Clear color.
        color: Color,
        /// Clear depth.
        depth: f32,
        /// Clear stencil.
        stencil: i32,
    },
    /// [`DeviceBackend::draw_primitives`].
    DrawPrimitives {
        /// Topology.
        primitive_type: PrimitiveType,
        /// First vertex.
        vertex_start: usize,
        /// Amount of primitives.
        primitive_count: usize,
    },
    /// [`DeviceBackend::dispose`].
    Dispose,
}

impl BackendCall {
    /// Whether this call changes render or sampler state.
    #[inline]
    #[must_use]
    pub const fn is_state_call(&self) -> bool {
        !matches!(
            self,
            Self::Reset(_)
                | Self::Present
                | Self::Clear { .. }
                | Self::DrawPrimitives { .. }
                | Self::Dispose
        )
    }
}

/// Shared handle to the calls recorded by a [`RecordingBackend`].
///
/// Keeps working after the backend has been moved into a device.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<BackendCall>>>);

impl CallLog {
    /// Copy of every call recorded so far.
    #[inline]
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.0.borrow().clone()
    }

    /// Take every call recorded so far, leaving the log empty.
    #[inline]
    #[must_use]
    pub fn take(&self) -> Vec<BackendCall> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    /// Forget all recorded calls.
    #[inline]
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Amount of recorded calls.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Whether nothing was recorded.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Amount of recorded calls matching the predicate.
    #[inline]
    pub fn count(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.0.borrow().iter().filter(|&call| predicate(call)).count()
    }

    /// Amount of recorded render or sampler state calls.
    #[inline]
    #[must_use]
    pub fn state_calls(&self) -> usize {
        self.count(BackendCall::is_state_call)
    }

    /// Append a call.
    fn push(&self, call: BackendCall) {
        self.0.borrow_mut().push(call);
    }
}

/// Device backend that records calls into a [`CallLog`].
#[derive(Debug, Default)]
pub struct RecordingBackend {
    /// Recorded calls.
    log: CallLog,
    /// Reported capabilities.
    capabilities: Capabilities,
}

impl RecordingBackend {
    /// Create a backend reporting full capabilities.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend reporting the given capabilities.
    #[inline]
    #[must_use]
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            ..Self::default()
        }
    }

    /// Handle to the recorded calls.
    #[inline]
    #[must_use]
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl StateBackend for RecordingBackend {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn set_blend_enabled(&mut self, target: BlendTarget, enabled: bool) {
        self.log.push(BackendCall::BlendEnabled(target, enabled));
    }

    fn set_blend_color(&mut self, color: Color) {
        self.log.push(BackendCall::BlendColor(color));
    }

    fn set_blend_equation(&mut self, target: BlendTarget, color: BlendFunction, alpha: BlendFunction) {
        self.log.push(BackendCall::BlendEquation(target, color, alpha));
    }

    fn set_blend_function(&mut self, target: BlendTarget, factors: BlendFactors) {
        self.log.push(BackendCall::BlendFunction(target, factors));
    }

    fn set_color_write_mask(&mut self, target: BlendTarget, channels: ColorWriteChannels) {
        self.log.push(BackendCall::ColorWriteMask(target, channels));
    }

    fn set_sample_mask(&mut self, mask: u32) {
        self.log.push(BackendCall::SampleMask(mask));
    }

    fn set_depth_test_enabled(&mut self, enabled: bool) {
        self.log.push(BackendCall::DepthTestEnabled(enabled));
    }

    fn set_depth_write_enabled(&mut self, enabled: bool) {
        self.log.push(BackendCall::DepthWriteEnabled(enabled));
    }

    fn set_depth_function(&mut self, function: CompareFunction) {
        self.log.push(BackendCall::DepthFunction(function));
    }

    fn set_stencil_test_enabled(&mut self, enabled: bool) {
        self.log.push(BackendCall::StencilTestEnabled(enabled));
    }

    fn set_stencil_function(
        &mut self,
        face: StencilFace,
        function: CompareFunction,
        reference: i32,
        mask: u32,
    ) {
        self.log.push(BackendCall::StencilFunction {
            face,
            function,
            reference,
            mask,
        });
    }

    fn set_stencil_operation(
        &mut self,
        face: StencilFace,
        fail: StencilOperation,
        depth_fail: StencilOperation,
        pass: StencilOperation,
    ) {
        self.log.push(BackendCall::StencilOperation {
            face,
            fail,
            depth_fail,
            pass,
        });
    }

    fn set_stencil_write_mask(&mut self, mask: u32) {
        self.log.push(BackendCall::StencilWriteMask(mask));
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        self.log.push(BackendCall::CullMode(mode));
    }

    fn set_fill_mode(&mut self, mode: FillMode) {
        self.log.push(BackendCall::FillMode(mode));
    }

    fn set_scissor_test_enabled(&mut self, enabled: bool) {
        self.log.push(BackendCall::ScissorTestEnabled(enabled));
    }

    fn set_depth_bias(&mut self, constant: f32, slope_scale: f32) {
        self.log.push(BackendCall::DepthBias {
            constant,
            slope_scale,
        });
    }

    fn set_depth_clip_enabled(&mut self, enabled: bool) {
        self.log.push(BackendCall::DepthClipEnabled(enabled));
    }

    fn set_multisample_enabled(&mut self, enabled: bool) {
        self.log.push(BackendCall::MultisampleEnabled(enabled));
    }

    fn set_sampler_filter(&mut self, slot: usize, filter: TextureFilter, max_anisotropy: u16) {
        self.log.push(BackendCall::SamplerFilter {
            slot,
            filter,
            max_anisotropy,
        });
    }

    fn set_sampler_address(&mut self, slot: usize, axis: TextureAxis, mode: TextureAddressMode) {
        self.log.push(BackendCall::SamplerAddress { slot, axis, mode });
    }

    fn set_sampler_border_color(&mut self, slot: usize, color: Color) {
        self.log.push(BackendCall::SamplerBorderColor { slot, color });
    }

    fn set_sampler_level_of_detail(&mut self, slot: usize, max_mip_level: u32, mip_bias: f32) {
        self.log.push(BackendCall::SamplerLevelOfDetail {
            slot,
            max_mip_level,
            mip_bias,
        });
    }

    fn set_sampler_comparison(&mut self, slot: usize, function: Option<CompareFunction>) {
        self.log.push(BackendCall::SamplerComparison { slot, function });
    }
}

impl DeviceBackend for RecordingBackend {
    fn reset(&mut self, parameters: &PresentationParameters) -> Result<()> {
        self.log.push(BackendCall::Reset(parameters.clone()));

        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.log.push(BackendCall::Present);

        Ok(())
    }

    fn clear(&mut self, options: ClearOptions, color: Color, depth: f32, stencil: i32) -> Result<()> {
        self.log.push(BackendCall::Clear {
            options,
            color,
            depth,
            stencil,
        });

        Ok(())
    }

    fn draw_primitives(
        &mut self,
        primitive_type: PrimitiveType,
        vertex_start: usize,
        primitive_count: usize,
    ) -> Result<()> {
        self.log.push(BackendCall::DrawPrimitives {
            primitive_type,
            vertex_start,
            primitive_count,
        });

        Ok(())
    }

    fn dispose(&mut self) {
        self.log.push(BackendCall::Dispose);
    }
}
