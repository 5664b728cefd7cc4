//! Backend folding the per-field state calls into [`wgpu`] pipeline state.
//!
//! `wgpu` has no immediate mode state, everything lives in immutable render pipelines and samplers.
//! [`WgpuBackend`] keeps the current value of every field and records each clear and draw together with the complete pipeline state, a renderer owning the [`wgpu::Device`] turns the recorded [`FrameCommand`]s into render passes and caches its pipelines keyed on [`PipelineState`].

use std::ops::Range;

use super::{
    BlendFactors, BlendTarget, Capabilities, DeviceBackend, StateBackend, StencilFace, TextureAxis,
};
use crate::{
    error::{Error, Result},
    graphics::{
        state::{
            blend::{Blend, BlendFunction, ColorWriteChannels},
            depth_stencil::StencilOperation,
            rasterizer::{CullMode, FillMode},
            sampler::{TextureAddressMode, TextureFilter},
        },
        ClearOptions, Color, CompareFunction, DepthFormat, PresentationParameters, PrimitiveType,
        SurfaceFormat, MAX_RENDER_TARGETS, MAX_SAMPLER_SLOTS,
    },
};

/// Immutable part of a render pipeline, hashable so pipelines can be cached on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineState {
    /// Blending of every render target.
    pub color_targets: [wgpu::ColorTargetState; MAX_RENDER_TARGETS],
    /// Depth and stencil testing, `None` without a depth buffer.
    pub depth_stencil: Option<wgpu::DepthStencilState>,
    /// Rasterization.
    pub primitive: wgpu::PrimitiveState,
    /// Multisampling.
    pub multisample: wgpu::MultisampleState,
}

/// Recorded work of a single frame.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum FrameCommand {
    /// Clear the render target, `None` values are loaded instead of cleared.
    Clear {
        /// Clear color.
        color: Option<wgpu::Color>,
        /// Clear depth.
        depth: Option<f32>,
        /// Clear stencil value.
        stencil: Option<u32>,
    },
    /// Draw non-indexed vertices.
    Draw {
        /// Pipeline to draw with.
        pipeline: PipelineState,
        /// Samplers of every slot the backend exposes.
        samplers: Vec<wgpu::SamplerDescriptor<'static>>,
        /// Constant used by the constant blend factors.
        blend_constant: wgpu::Color,
        /// Stencil reference value.
        stencil_reference: u32,
        /// Whether the scissor rectangle applies.
        scissor_enabled: bool,
        /// Vertices to draw.
        vertices: Range<u32>,
    },
    /// Present the frame.
    Present,
}

/// Current value of every stencil face field.
#[derive(Debug, Clone, Copy)]
struct StencilFaceValues {
    /// Comparison.
    function: CompareFunction,
    /// Operation when the stencil test fails.
    fail: StencilOperation,
    /// Operation when the depth test fails.
    depth_fail: StencilOperation,
    /// Operation when both pass.
    pass: StencilOperation,
}

impl Default for StencilFaceValues {
    fn default() -> Self {
        Self {
            function: CompareFunction::Always,
            fail: StencilOperation::Keep,
            depth_fail: StencilOperation::Keep,
            pass: StencilOperation::Keep,
        }
    }
}

/// Current value of every sampler field of a slot.
#[derive(Debug, Clone, Copy)]
struct SamplerValues {
    /// Filter.
    filter: TextureFilter,
    /// Clamped anisotropy.
    max_anisotropy: u16,
    /// Address mode per axis.
    address: [TextureAddressMode; 3],
    /// Border color.
    border_color: Color,
    /// Largest mip level used.
    max_mip_level: u32,
    /// Comparison, `None` for regular samplers.
    comparison: Option<CompareFunction>,
}

impl Default for SamplerValues {
    fn default() -> Self {
        Self {
            filter: TextureFilter::Linear,
            max_anisotropy: 1,
            address: [TextureAddressMode::Wrap; 3],
            border_color: Color::WHITE,
            max_mip_level: 0,
            comparison: None,
        }
    }
}

/// Device backend for [`wgpu`].
#[derive(Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct WgpuBackend {
    /// What the adapter can do.
    capabilities: Capabilities,
    /// Back buffer format.
    color_format: wgpu::TextureFormat,
    /// Depth buffer format.
    depth_format: Option<wgpu::TextureFormat>,
    /// Samples per pixel of the back buffer.
    sample_count: u32,
    /// Blending per render target, `None` when disabled.
    blend: [Option<wgpu::BlendState>; MAX_RENDER_TARGETS],
    /// Blending per render target while disabled, restored when enabled again.
    blend_values: [wgpu::BlendState; MAX_RENDER_TARGETS],
    /// Color writes per render target.
    write_masks: [wgpu::ColorWrites; MAX_RENDER_TARGETS],
    /// Constant blend color.
    blend_constant: wgpu::Color,
    /// Multisample coverage mask.
    sample_mask: u32,
    /// Depth test.
    depth_test: bool,
    /// Depth writes.
    depth_write: bool,
    /// Depth comparison.
    depth_function: CompareFunction,
    /// Stencil test.
    stencil_test: bool,
    /// Clockwise faces.
    stencil_front: StencilFaceValues,
    /// Counter clockwise faces.
    stencil_back: StencilFaceValues,
    /// Stencil reference value.
    stencil_reference: i32,
    /// Stencil read mask.
    stencil_read_mask: u32,
    /// Stencil write mask.
    stencil_write_mask: u32,
    /// Face culling.
    cull_mode: CullMode,
    /// Polygon fill.
    fill_mode: FillMode,
    /// Scissor test.
    scissor_test: bool,
    /// Scaled constant depth bias.
    depth_bias: f32,
    /// Slope scaled depth bias.
    slope_scale_depth_bias: f32,
    /// Depth clipping.
    depth_clip: bool,
    /// Every sampler slot.
    samplers: [SamplerValues; MAX_SAMPLER_SLOTS],
    /// Work of the current frame.
    commands: Vec<FrameCommand>,
}

impl WgpuBackend {
    /// Create for an adapter with the given features.
    ///
    /// # Arguments
    ///
    /// * `features` - Features the [`wgpu::Device`] was created with.
    /// * `downlevel` - Downlevel flags of the adapter.
    /// * `limits` - Limits the [`wgpu::Device`] was created with.
    /// * `presentation_parameters` - Back buffer configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::NotSupported`] when the back buffer format has no `wgpu` equivalent.
    #[inline]
    pub fn new(
        features: wgpu::Features,
        downlevel: wgpu::DownlevelFlags,
        limits: &wgpu::Limits,
        presentation_parameters: &PresentationParameters,
    ) -> Result<Self> {
        let capabilities = capabilities(features, downlevel, limits);
        log::debug!("wgpu backend capabilities: {capabilities:?}");

        Ok(Self {
            capabilities,
            color_format: texture_format(presentation_parameters.back_buffer_format)?,
            depth_format: depth_format(presentation_parameters.depth_stencil_format),
            sample_count: presentation_parameters.multi_sample_count.max(1),
            blend: [None; MAX_RENDER_TARGETS],
            blend_values: [wgpu::BlendState::REPLACE; MAX_RENDER_TARGETS],
            write_masks: [wgpu::ColorWrites::ALL; MAX_RENDER_TARGETS],
            blend_constant: wgpu::Color::WHITE,
            sample_mask: u32::MAX,
            depth_test: true,
            depth_write: true,
            depth_function: CompareFunction::LessEqual,
            stencil_test: false,
            stencil_front: StencilFaceValues::default(),
            stencil_back: StencilFaceValues::default(),
            stencil_reference: 0,
            stencil_read_mask: u32::MAX,
            stencil_write_mask: u32::MAX,
            cull_mode: CullMode::CullCounterClockwiseFace,
            fill_mode: FillMode::Solid,
            scissor_test: false,
            depth_bias: 0.0,
            slope_scale_depth_bias: 0.0,
            depth_clip: true,
            samplers: [SamplerValues::default(); MAX_SAMPLER_SLOTS],
            commands: Vec::new(),
        })
    }

    /// Pipeline state for drawing the given primitives with the current state.
    #[inline]
    #[must_use]
    pub fn pipeline_state(&self, primitive_type: PrimitiveType) -> PipelineState {
        PipelineState {
            color_targets: std::array::from_fn(|index| wgpu::ColorTargetState {
                format: self.color_format,
                blend: self.blend[index],
                write_mask: self.write_masks[index],
            }),
            depth_stencil: self.depth_stencil_state(),
            primitive: self.primitive_state(primitive_type),
            multisample: wgpu::MultisampleState {
                count: self.sample_count,
                mask: u64::from(self.sample_mask),
                alpha_to_coverage_enabled: false,
            },
        }
    }

    /// Sampler of a slot.
    #[inline]
    #[must_use]
    pub fn sampler_descriptor(&self, slot: usize) -> Option<wgpu::SamplerDescriptor<'static>> {
        let values = self.samplers.get(slot)?;
        let [address_u, address_v, address_w] = values.address.map(address_mode);
        let uses_border = values.address.contains(&TextureAddressMode::Border);

        Some(wgpu::SamplerDescriptor {
            label: Some("Sampler State"),
            address_mode_u: address_u,
            address_mode_v: address_v,
            address_mode_w: address_w,
            mag_filter: filter_mode(values.filter.mag_linear()),
            min_filter: filter_mode(values.filter.min_linear()),
            mipmap_filter: filter_mode(values.filter.mip_linear()),
            // The largest mip level used is the closest one to the base level
            lod_min_clamp: values.max_mip_level as f32,
            lod_max_clamp: 32.0,
            compare: values.comparison.map(compare_function),
            anisotropy_clamp: values.max_anisotropy,
            border_color: uses_border.then(|| border_color(values.border_color)),
        })
    }

    /// Take the recorded work of the frame.
    #[inline]
    pub fn take_commands(&mut self) -> Vec<FrameCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Depth and stencil testing, `None` without a depth buffer.
    fn depth_stencil_state(&self) -> Option<wgpu::DepthStencilState> {
        let format = self.depth_format?;

        let stencil = if self.stencil_test {
            wgpu::StencilState {
                front: stencil_face_state(self.stencil_front),
                back: stencil_face_state(self.stencil_back),
                read_mask: self.stencil_read_mask,
                write_mask: self.stencil_write_mask,
            }
        } else {
            wgpu::StencilState::default()
        };

        Some(wgpu::DepthStencilState {
            format,
            depth_write_enabled: self.depth_test && self.depth_write,
            depth_compare: if self.depth_test {
                compare_function(self.depth_function)
            } else {
                wgpu::CompareFunction::Always
            },
            stencil,
            bias: wgpu::DepthBiasState {
                #[allow(clippy::cast_possible_truncation)]
                constant: self.depth_bias.round() as i32,
                slope_scale: self.slope_scale_depth_bias,
                clamp: 0.0,
            },
        })
    }

    /// Rasterization.
    fn primitive_state(&self, primitive_type: PrimitiveType) -> wgpu::PrimitiveState {
        wgpu::PrimitiveState {
            topology: primitive_topology(primitive_type),
            strip_index_format: None,
            // Clockwise is the front face
            front_face: wgpu::FrontFace::Cw,
            cull_mode: match self.cull_mode {
                CullMode::None => None,
                CullMode::CullClockwiseFace => Some(wgpu::Face::Front),
                CullMode::CullCounterClockwiseFace => Some(wgpu::Face::Back),
            },
            unclipped_depth: !self.depth_clip,
            polygon_mode: match self.fill_mode {
                FillMode::Solid => wgpu::PolygonMode::Fill,
                FillMode::WireFrame => wgpu::PolygonMode::Line,
            },
            conservative: false,
        }
    }

    /// Render target indices a blend call affects.
    fn targets(target: BlendTarget) -> Range<usize> {
        match target {
            BlendTarget::All => 0..MAX_RENDER_TARGETS,
            BlendTarget::Index(index) => index.min(MAX_RENDER_TARGETS)..(index + 1).min(MAX_RENDER_TARGETS),
        }
    }

    /// Stencil faces a stencil call affects.
    fn stencil_faces(&mut self, face: StencilFace) -> impl Iterator<Item = &mut StencilFaceValues> {
        let (front, back) = match face {
            StencilFace::Front => (true, false),
            StencilFace::Back => (false, true),
            StencilFace::FrontAndBack => (true, true),
        };

        [(front, &mut self.stencil_front), (back, &mut self.stencil_back)]
            .into_iter()
            .filter_map(|(selected, values)| selected.then_some(values))
    }

    /// Sampler values of a slot, out of range slots are ignored.
    fn sampler_mut(&mut self, slot: usize) -> Option<&mut SamplerValues> {
        let values = self.samplers.get_mut(slot);
        if values.is_none() {
            log::warn!("Ignoring state of sampler slot {slot}, there are only {MAX_SAMPLER_SLOTS}");
        }

        values
    }
}

impl StateBackend for WgpuBackend {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn set_blend_enabled(&mut self, target: BlendTarget, enabled: bool) {
        for index in Self::targets(target) {
            self.blend[index] = enabled.then_some(self.blend_values[index]);
        }
    }

    fn set_blend_color(&mut self, color: Color) {
        let [r, g, b, a] = color.to_vector4().map(f64::from);
        self.blend_constant = wgpu::Color { r, g, b, a };
    }

    fn set_blend_equation(&mut self, target: BlendTarget, color: BlendFunction, alpha: BlendFunction) {
        for index in Self::targets(target) {
            self.blend_values[index].color.operation = blend_operation(color);
            self.blend_values[index].alpha.operation = blend_operation(alpha);
            if let Some(blend) = &mut self.blend[index] {
                *blend = self.blend_values[index];
            }
        }
    }

    fn set_blend_function(&mut self, target: BlendTarget, factors: BlendFactors) {
        for index in Self::targets(target) {
            let values = &mut self.blend_values[index];
            values.color.src_factor = blend_factor(factors.color_source);
            values.color.dst_factor = blend_factor(factors.color_destination);
            values.alpha.src_factor = blend_factor(factors.alpha_source);
            values.alpha.dst_factor = blend_factor(factors.alpha_destination);

            if let Some(blend) = &mut self.blend[index] {
                *blend = *values;
            }
        }
    }

    fn set_color_write_mask(&mut self, target: BlendTarget, channels: ColorWriteChannels) {
        for index in Self::targets(target) {
            self.write_masks[index] = color_writes(channels);
        }
    }

    fn set_sample_mask(&mut self, mask: u32) {
        self.sample_mask = mask;
    }

    fn set_depth_test_enabled(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    fn set_depth_write_enabled(&mut self, enabled: bool) {
        self.depth_write = enabled;
    }

    fn set_depth_function(&mut self, function: CompareFunction) {
        self.depth_function = function;
    }

    fn set_stencil_test_enabled(&mut self, enabled: bool) {
        self.stencil_test = enabled;
    }

    fn set_stencil_function(
        &mut self,
        face: StencilFace,
        function: CompareFunction,
        reference: i32,
        mask: u32,
    ) {
        for values in self.stencil_faces(face) {
            values.function = function;
        }

        // wgpu has a single reference and read mask for both faces
        self.stencil_reference = reference;
        self.stencil_read_mask = mask;
    }

    fn set_stencil_operation(
        &mut self,
        face: StencilFace,
        fail: StencilOperation,
        depth_fail: StencilOperation,
        pass: StencilOperation,
    ) {
        for values in self.stencil_faces(face) {
            values.fail = fail;
            values.depth_fail = depth_fail;
            values.pass = pass;
        }
    }

    fn set_stencil_write_mask(&mut self, mask: u32) {
        self.stencil_write_mask = mask;
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        self.cull_mode = mode;
    }

    fn set_fill_mode(&mut self, mode: FillMode) {
        self.fill_mode = mode;
    }

    fn set_scissor_test_enabled(&mut self, enabled: bool) {
        self.scissor_test = enabled;
    }

    fn set_depth_bias(&mut self, constant: f32, slope_scale: f32) {
        self.depth_bias = constant;
        self.slope_scale_depth_bias = slope_scale;
    }

    fn set_depth_clip_enabled(&mut self, enabled: bool) {
        self.depth_clip = enabled;
    }

    fn set_multisample_enabled(&mut self, enabled: bool) {
        // The sample count is part of the render target
        log::trace!("Multisample rasterization {enabled} follows the render target sample count");
    }

    fn set_sampler_filter(&mut self, slot: usize, filter: TextureFilter, max_anisotropy: u16) {
        if let Some(values) = self.sampler_mut(slot) {
            values.filter = filter;
            values.max_anisotropy = max_anisotropy;
        }
    }

    fn set_sampler_address(&mut self, slot: usize, axis: TextureAxis, mode: TextureAddressMode) {
        if let Some(values) = self.sampler_mut(slot) {
            let index = match axis {
                TextureAxis::U => 0,
                TextureAxis::V => 1,
                TextureAxis::W => 2,
            };
            values.address[index] = mode;
        }
    }

    fn set_sampler_border_color(&mut self, slot: usize, color: Color) {
        if let Some(values) = self.sampler_mut(slot) {
            values.border_color = color;
        }
    }

    fn set_sampler_level_of_detail(&mut self, slot: usize, max_mip_level: u32, mip_bias: f32) {
        if mip_bias.abs() > f32::EPSILON {
            log::debug!("wgpu samplers have no mip bias, ignoring {mip_bias} of slot {slot}");
        }

        if let Some(values) = self.sampler_mut(slot) {
            values.max_mip_level = max_mip_level;
        }
    }

    fn set_sampler_comparison(&mut self, slot: usize, function: Option<CompareFunction>) {
        if let Some(values) = self.sampler_mut(slot) {
            values.comparison = function;
        }
    }
}

impl DeviceBackend for WgpuBackend {
    fn reset(&mut self, parameters: &PresentationParameters) -> Result<()> {
        self.color_format = texture_format(parameters.back_buffer_format)?;
        self.depth_format = depth_format(parameters.depth_stencil_format);
        self.sample_count = parameters.multi_sample_count.max(1);

        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.commands.push(FrameCommand::Present);

        Ok(())
    }

    fn clear(&mut self, options: ClearOptions, color: Color, depth: f32, stencil: i32) -> Result<()> {
        let color = options.contains(ClearOptions::TARGET).then(|| {
            let [r, g, b, a] = color.to_vector4().map(f64::from);

            wgpu::Color { r, g, b, a }
        });
        let depth = options.contains(ClearOptions::DEPTH_BUFFER).then_some(depth);
        // The stencil buffer is unsigned, the bits are kept as is
        let stencil = options
            .contains(ClearOptions::STENCIL)
            .then_some(u32::from_ne_bytes(stencil.to_ne_bytes()));

        self.commands.push(FrameCommand::Clear {
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
        let vertex_count = primitive_type.vertex_count(primitive_count);
        let start = u32::try_from(vertex_start)
            .map_err(|err| Error::InvalidArgument(format!("vertex start {vertex_start}: {err}")))?;
        let end = vertex_start
            .checked_add(vertex_count)
            .and_then(|end| u32::try_from(end).ok())
            .ok_or_else(|| Error::InvalidArgument(format!("{vertex_count} vertices from {vertex_start} overflow")))?;

        let samplers = (0..self.capabilities.max_sampler_slots)
            .filter_map(|slot| self.sampler_descriptor(slot))
            .collect();

        self.commands.push(FrameCommand::Draw {
            pipeline: self.pipeline_state(primitive_type),
            samplers,
            blend_constant: self.blend_constant,
            stencil_reference: u32::from_ne_bytes(self.stencil_reference.to_ne_bytes()),
            scissor_enabled: self.scissor_test,
            vertices: start..end,
        });

        Ok(())
    }

    fn dispose(&mut self) {
        self.commands.clear();
    }
}

/// What an adapter with these features can express.
fn capabilities(
    features: wgpu::Features,
    downlevel: wgpu::DownlevelFlags,
    limits: &wgpu::Limits,
) -> Capabilities {
    Capabilities {
        independent_blend: downlevel.contains(wgpu::DownlevelFlags::INDEPENDENT_BLEND),
        wireframe: features.contains(wgpu::Features::POLYGON_MODE_LINE),
        depth_clamp: features.contains(wgpu::Features::DEPTH_CLIP_CONTROL),
        border_address_mode: features.contains(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER),
        comparison_samplers: downlevel.contains(wgpu::DownlevelFlags::COMPARISON_SAMPLERS),
        max_anisotropy: if downlevel.contains(wgpu::DownlevelFlags::ANISOTROPIC_FILTERING) {
            16
        } else {
            1
        },
        max_sampler_slots: usize::try_from(limits.max_samplers_per_shader_stage)
            .map_or(MAX_SAMPLER_SLOTS, |slots| slots.min(MAX_SAMPLER_SLOTS)),
    }
}

/// Back buffer format.
fn texture_format(format: SurfaceFormat) -> Result<wgpu::TextureFormat> {
    match format {
        SurfaceFormat::Color => Ok(wgpu::TextureFormat::Rgba8Unorm),
        SurfaceFormat::Bgra32 => Ok(wgpu::TextureFormat::Bgra8Unorm),
        SurfaceFormat::Rgba1010102 => Ok(wgpu::TextureFormat::Rgb10a2Unorm),
        SurfaceFormat::HalfVector4 => Ok(wgpu::TextureFormat::Rgba16Float),
        SurfaceFormat::Vector4 => Ok(wgpu::TextureFormat::Rgba32Float),
        SurfaceFormat::Bgr565 | SurfaceFormat::Bgra4444 => Err(Error::NotSupported(format!(
            "wgpu has no {format:?} render target format"
        ))),
    }
}

/// Depth buffer format.
const fn depth_format(format: DepthFormat) -> Option<wgpu::TextureFormat> {
    match format {
        DepthFormat::None => None,
        DepthFormat::Depth16 => Some(wgpu::TextureFormat::Depth16Unorm),
        DepthFormat::Depth24 => Some(wgpu::TextureFormat::Depth24Plus),
        DepthFormat::Depth24Stencil8 => Some(wgpu::TextureFormat::Depth24PlusStencil8),
    }
}

/// Blend factor.
const fn blend_factor(blend: Blend) -> wgpu::BlendFactor {
    match blend {
        Blend::One => wgpu::BlendFactor::One,
        Blend::Zero => wgpu::BlendFactor::Zero,
        Blend::SourceColor => wgpu::BlendFactor::Src,
        Blend::InverseSourceColor => wgpu::BlendFactor::OneMinusSrc,
        Blend::SourceAlpha => wgpu::BlendFactor::SrcAlpha,
        Blend::InverseSourceAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        Blend::DestinationColor => wgpu::BlendFactor::Dst,
        Blend::InverseDestinationColor => wgpu::BlendFactor::OneMinusDst,
        Blend::DestinationAlpha => wgpu::BlendFactor::DstAlpha,
        Blend::InverseDestinationAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
        Blend::BlendFactor => wgpu::BlendFactor::Constant,
        Blend::InverseBlendFactor => wgpu::BlendFactor::OneMinusConstant,
        Blend::SourceAlphaSaturation => wgpu::BlendFactor::SrcAlphaSaturated,
    }
}

/// Blend operation.
const fn blend_operation(function: BlendFunction) -> wgpu::BlendOperation {
    match function {
        BlendFunction::Add => wgpu::BlendOperation::Add,
        BlendFunction::Subtract => wgpu::BlendOperation::Subtract,
        BlendFunction::ReverseSubtract => wgpu::BlendOperation::ReverseSubtract,
        BlendFunction::Min => wgpu::BlendOperation::Min,
        BlendFunction::Max => wgpu::BlendOperation::Max,
    }
}

/// Color write mask, the bits line up.
fn color_writes(channels: ColorWriteChannels) -> wgpu::ColorWrites {
    wgpu::ColorWrites::from_bits_truncate(u32::from(channels.bits()))
}

/// Comparison.
const fn compare_function(function: CompareFunction) -> wgpu::CompareFunction {
    match function {
        CompareFunction::Always => wgpu::CompareFunction::Always,
        CompareFunction::Never => wgpu::CompareFunction::Never,
        CompareFunction::Less => wgpu::CompareFunction::Less,
        CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunction::Equal => wgpu::CompareFunction::Equal,
        CompareFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        CompareFunction::Greater => wgpu::CompareFunction::Greater,
        CompareFunction::NotEqual => wgpu::CompareFunction::NotEqual,
    }
}

/// Stencil operation.
const fn stencil_operation(operation: StencilOperation) -> wgpu::StencilOperation {
    match operation {
        StencilOperation::Keep => wgpu::StencilOperation::Keep,
        StencilOperation::Zero => wgpu::StencilOperation::Zero,
        StencilOperation::Replace => wgpu::StencilOperation::Replace,
        StencilOperation::Increment => wgpu::StencilOperation::IncrementWrap,
        StencilOperation::Decrement => wgpu::StencilOperation::DecrementWrap,
        StencilOperation::IncrementSaturation => wgpu::StencilOperation::IncrementClamp,
        StencilOperation::DecrementSaturation => wgpu::StencilOperation::DecrementClamp,
        StencilOperation::Invert => wgpu::StencilOperation::Invert,
    }
}

/// Stencil face.
const fn stencil_face_state(values: StencilFaceValues) -> wgpu::StencilFaceState {
    wgpu::StencilFaceState {
        compare: compare_function(values.function),
        fail_op: stencil_operation(values.fail),
        depth_fail_op: stencil_operation(values.depth_fail),
        pass_op: stencil_operation(values.pass),
    }
}

/// Texture address mode.
const fn address_mode(mode: TextureAddressMode) -> wgpu::AddressMode {
    match mode {
        TextureAddressMode::Wrap => wgpu::AddressMode::Repeat,
        TextureAddressMode::Clamp => wgpu::AddressMode::ClampToEdge,
        TextureAddressMode::Mirror => wgpu::AddressMode::MirrorRepeat,
        TextureAddressMode::Border => wgpu::AddressMode::ClampToBorder,
    }
}

/// Linear or nearest filtering.
const fn filter_mode(linear: bool) -> wgpu::FilterMode {
    if linear {
        wgpu::FilterMode::Linear
    } else {
        wgpu::FilterMode::Nearest
    }
}

/// Border color, `wgpu` only knows a few fixed ones so the closest is picked.
fn border_color(color: Color) -> wgpu::SamplerBorderColor {
    if color == Color::WHITE {
        wgpu::SamplerBorderColor::OpaqueWhite
    } else if color == Color::BLACK {
        wgpu::SamplerBorderColor::OpaqueBlack
    } else if color == Color::TRANSPARENT_BLACK {
        wgpu::SamplerBorderColor::TransparentBlack
    } else {
        log::warn!("wgpu has no {color:?} border color, using the closest fixed one");

        if color.a < 0x80 {
            wgpu::SamplerBorderColor::TransparentBlack
        } else if u16::from(color.r) + u16::from(color.g) + u16::from(color.b) >= 3 * 0x80 {
            wgpu::SamplerBorderColor::OpaqueWhite
        } else {
            wgpu::SamplerBorderColor::OpaqueBlack
        }
    }
}

/// Primitive topology.
const fn primitive_topology(primitive_type: PrimitiveType) -> wgpu::PrimitiveTopology {
    match primitive_type {
        PrimitiveType::TriangleList => wgpu::PrimitiveTopology::TriangleList,
        PrimitiveType::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        PrimitiveType::LineList => wgpu::PrimitiveTopology::LineList,
        PrimitiveType::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        PrimitiveType::PointList => wgpu::PrimitiveTopology::PointList,
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameCommand, WgpuBackend};
    use crate::{
        error::Error,
        graphics::{
            backend::DeviceBackend,
            cache::StateCache,
            state::{
                blend::BlendState, depth_stencil::DepthStencilState, rasterizer::RasterizerState,
                sampler::SamplerState,
            },
            ClearOptions, Color, DepthFormat, PresentationParameters, PrimitiveType, SurfaceFormat,
        },
    };

    fn backend() -> WgpuBackend {
        WgpuBackend::new(
            wgpu::Features::POLYGON_MODE_LINE | wgpu::Features::DEPTH_CLIP_CONTROL,
            wgpu::DownlevelFlags::all(),
            &wgpu::Limits::default(),
            &PresentationParameters::default(),
        )
        .unwrap()
    }

    #[test]
    fn capabilities_follow_features() {
        let backend = backend();
        let capabilities = crate::graphics::backend::StateBackend::capabilities(&backend);

        assert!(capabilities.wireframe);
        assert!(capabilities.depth_clamp);
        assert!(!capabilities.border_address_mode);
        assert!(capabilities.independent_blend);
        assert_eq!(capabilities.max_anisotropy, 16);
    }

    #[test]
    fn unsupported_back_buffer_format() {
        let parameters = PresentationParameters {
            back_buffer_format: SurfaceFormat::Bgr565,
            ..PresentationParameters::default()
        };

        assert!(matches!(
            WgpuBackend::new(
                wgpu::Features::empty(),
                wgpu::DownlevelFlags::empty(),
                &wgpu::Limits::downlevel_webgl2_defaults(),
                &parameters
            ),
            Err(Error::NotSupported(_))
        ));
    }

    #[test]
    fn applied_presets_fold_into_pipeline() {
        let mut backend = backend();
        let capabilities = crate::graphics::backend::StateBackend::capabilities(&backend);
        let mut cache = StateCache::default();

        BlendState::ALPHA_BLEND
            .apply(&mut backend, &capabilities, &mut cache.blend, true)
            .unwrap();
        DepthStencilState::DEPTH_READ.apply(&mut backend, &mut cache.depth_stencil, true);
        RasterizerState::CULL_NONE
            .apply(&mut backend, &capabilities, &mut cache.rasterizer, DepthFormat::Depth24, true)
            .unwrap();
        SamplerState::POINT_CLAMP
            .apply(&mut backend, &capabilities, 0, &mut cache.samplers[0], true)
            .unwrap();

        let pipeline = backend.pipeline_state(PrimitiveType::TriangleList);
        assert_eq!(
            pipeline.color_targets[0].blend,
            Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING)
        );
        assert_eq!(pipeline.primitive.cull_mode, None);

        let depth_stencil = pipeline.depth_stencil.unwrap();
        assert!(!depth_stencil.depth_write_enabled);
        assert_eq!(depth_stencil.depth_compare, wgpu::CompareFunction::LessEqual);

        let sampler = backend.sampler_descriptor(0).unwrap();
        assert_eq!(sampler.min_filter, wgpu::FilterMode::Nearest);
        assert_eq!(sampler.address_mode_u, wgpu::AddressMode::ClampToEdge);
    }

    #[test]
    fn clear_and_draw_are_recorded() {
        let mut backend = backend();

        backend
            .clear(ClearOptions::TARGET, Color::BLACK, 1.0, 0)
            .unwrap();
        backend
            .draw_primitives(PrimitiveType::TriangleStrip, 4, 2)
            .unwrap();
        backend.present().unwrap();

        let commands = backend.take_commands();
        assert_eq!(commands.len(), 3);
        assert!(matches!(
            commands[0],
            FrameCommand::Clear {
                color: Some(_),
                depth: None,
                stencil: None
            }
        ));
        assert!(matches!(
            &commands[1],
            FrameCommand::Draw { vertices, .. } if *vertices == (4..8)
        ));
        assert_eq!(commands[2], FrameCommand::Present);
        assert!(backend.take_commands().is_empty());
    }
}
