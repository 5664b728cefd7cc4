//! Contracts between the generic state core and the concrete graphics APIs.
//!
//! [`StateBackend`] is the per-field, GL-shaped call surface the diffing in [`crate::graphics::context`] talks to.
//! [`DeviceBackend`] adds the device level operations a platform has to provide.

pub mod recording;
pub mod wgpu;

use crate::{
    error::Result,
    graphics::{
        state::{
            blend::{Blend, BlendFunction, ColorWriteChannels},
            depth_stencil::StencilOperation,
            rasterizer::{CullMode, FillMode},
            sampler::{TextureAddressMode, TextureFilter},
        },
        ClearOptions, Color, CompareFunction, PresentationParameters, PrimitiveType,
        MAX_SAMPLER_SLOTS,
    },
};

/// Which render targets a blend call affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendTarget {
    /// Every render target at once.
    All,
    /// A single render target.
    Index(usize),
}

/// Face a stencil call applies to.
///
/// Front is clockwise, matching the XNA winding convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilFace {
    /// Clockwise faces.
    Front,
    /// Counter clockwise faces.
    Back,
    /// Both faces.
    FrontAndBack,
}

/// Texture coordinate a sampler address mode applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureAxis {
    /// Horizontal.
    U,
    /// Vertical.
    V,
    /// Depth.
    W,
}

/// Source and destination factors of a single blend function call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendFactors {
    /// Color source factor.
    pub color_source: Blend,
    /// Color destination factor.
    pub color_destination: Blend,
    /// Alpha source factor.
    pub alpha_source: Blend,
    /// Alpha destination factor.
    pub alpha_destination: Blend,
}

/// What the backend can express.
///
/// Requests outside of this are rejected with [`crate::Error::NotSupported`] at apply time, never silently downgraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    /// Separate blend state per render target.
    pub independent_blend: bool,
    /// [`FillMode::WireFrame`].
    pub wireframe: bool,
    /// Disabling depth clipping.
    pub depth_clamp: bool,
    /// [`TextureAddressMode::Border`].
    pub border_address_mode: bool,
    /// Samplers with a comparison function.
    pub comparison_samplers: bool,
    /// Highest anisotropy, requested values are clamped to this.
    pub max_anisotropy: u16,
    /// Amount of sampler slots.
    pub max_sampler_slots: usize,
}

impl Capabilities {
    /// Everything supported.
    pub const FULL: Self = Self {
        independent_blend: true,
        wireframe: true,
        depth_clamp: true,
        border_address_mode: true,
        comparison_samplers: true,
        max_anisotropy: 16,
        max_sampler_slots: MAX_SAMPLER_SLOTS,
    };

    /// Lowest common denominator, roughly OpenGL ES 2 / WebGL 1.
    pub const MINIMAL: Self = Self {
        independent_blend: false,
        wireframe: false,
        depth_clamp: false,
        border_address_mode: false,
        comparison_samplers: false,
        max_anisotropy: 1,
        max_sampler_slots: 8,
    };
}

impl Default for Capabilities {
    #[inline]
    fn default() -> Self {
        Self::FULL
    }
}

/// Individual render state calls.
///
/// Each method maps to one driver call of an immediate mode API, the caller only invokes them when the value changed or when a full apply is forced.
pub trait StateBackend {
    /// What the backend supports.
    fn capabilities(&self) -> Capabilities;

    /// Enable or disable blending.
    fn set_blend_enabled(&mut self, target: BlendTarget, enabled: bool);

    /// Constant color used by [`Blend::BlendFactor`].
    fn set_blend_color(&mut self, color: Color);

    /// Separate color and alpha blend equations.
    fn set_blend_equation(&mut self, target: BlendTarget, color: BlendFunction, alpha: BlendFunction);

    /// Separate color and alpha blend factors.
    fn set_blend_function(&mut self, target: BlendTarget, factors: BlendFactors);

    /// Which channels are written.
    fn set_color_write_mask(&mut self, target: BlendTarget, channels: ColorWriteChannels);

    /// Multisample coverage mask.
    fn set_sample_mask(&mut self, mask: u32);

    /// Enable or disable the depth test.
    fn set_depth_test_enabled(&mut self, enabled: bool);

    /// Enable or disable depth writes.
    fn set_depth_write_enabled(&mut self, enabled: bool);

    /// Depth comparison.
    fn set_depth_function(&mut self, function: CompareFunction);

    /// Enable or disable the stencil test.
    fn set_stencil_test_enabled(&mut self, enabled: bool);

    /// Stencil comparison, reference value and read mask.
    fn set_stencil_function(
        &mut self,
        face: StencilFace,
        function: CompareFunction,
        reference: i32,
        mask: u32,
    );

    /// Stencil operations on fail, depth fail and pass.
    fn set_stencil_operation(
        &mut self,
        face: StencilFace,
        fail: StencilOperation,
        depth_fail: StencilOperation,
        pass: StencilOperation,
    );

    /// Stencil write mask.
    fn set_stencil_write_mask(&mut self, mask: u32);

    /// Face culling.
    fn set_cull_mode(&mut self, mode: CullMode);

    /// Polygon fill.
    fn set_fill_mode(&mut self, mode: FillMode);

    /// Enable or disable the scissor test.
    fn set_scissor_test_enabled(&mut self, enabled: bool);

    /// Polygon offset, the constant is already scaled to depth buffer units.
    ///
    /// Both zero means disabled.
    fn set_depth_bias(&mut self, constant: f32, slope_scale: f32);

    /// Enable or disable depth clipping.
    fn set_depth_clip_enabled(&mut self, enabled: bool);

    /// Enable or disable multisample rasterization.
    fn set_multisample_enabled(&mut self, enabled: bool);

    /// Minification, magnification and mip filter of a sampler slot.
    ///
    /// `max_anisotropy` is already clamped to [`Capabilities::max_anisotropy`] and is `1` for non anisotropic filters.
    fn set_sampler_filter(&mut self, slot: usize, filter: TextureFilter, max_anisotropy: u16);

    /// Address mode of one texture coordinate of a sampler slot.
    fn set_sampler_address(&mut self, slot: usize, axis: TextureAxis, mode: TextureAddressMode);

    /// Border color of a sampler slot.
    fn set_sampler_border_color(&mut self, slot: usize, color: Color);

    /// Mip level range and bias of a sampler slot.
    fn set_sampler_level_of_detail(&mut self, slot: usize, max_mip_level: u32, mip_bias: f32);

    /// Comparison function of a sampler slot, `None` for a regular sampler.
    fn set_sampler_comparison(&mut self, slot: usize, function: Option<CompareFunction>);
}

/// A created device on a concrete graphics API.
///
/// Constructed by [`crate::backend::Backend::create_device`].
pub trait DeviceBackend: StateBackend {
    /// Resize or reconfigure the swapchain in place.
    ///
    /// # Errors
    ///
    /// - When the API can't reconfigure the swapchain.
    fn reset(&mut self, parameters: &PresentationParameters) -> Result<()>;

    /// Show the back buffer.
    ///
    /// # Errors
    ///
    /// - When presenting failed, for example because the surface was lost.
    fn present(&mut self) -> Result<()>;

    /// Clear the current render target.
    ///
    /// # Errors
    ///
    /// - When the API rejected the call.
    fn clear(&mut self, options: ClearOptions, color: Color, depth: f32, stencil: i32) -> Result<()>;

    /// Draw non-indexed primitives with the currently applied state.
    ///
    /// # Errors
    ///
    /// - When the API rejected the call.
    fn draw_primitives(
        &mut self,
        primitive_type: PrimitiveType,
        vertex_start: usize,
        primitive_count: usize,
    ) -> Result<()>;

    /// Release all native objects, called once when the owning device is disposed.
    #[inline]
    fn dispose(&mut self) {}
}
