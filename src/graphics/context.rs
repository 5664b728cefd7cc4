//! Current render state of a device and the diffing against what the backend already has.

use super::{
    backend::{Capabilities, DeviceBackend},
    cache::StateCache,
    state::{
        blend::BlendState, depth_stencil::DepthStencilState, rasterizer::RasterizerState,
        sampler::SamplerState, StateObject,
    },
    ClearOptions, Color, DepthFormat, PrimitiveType, MAX_SAMPLER_SLOTS,
};
use crate::error::{Error, Result};

/// A flag per category, for changes since the last apply and for bypassing the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DirtyStates {
    /// Blend state.
    blend: bool,
    /// Depth stencil state.
    depth_stencil: bool,
    /// Rasterizer state.
    rasterizer: bool,
    /// One bit per sampler slot.
    samplers: u16,
}

impl DirtyStates {
    /// Everything dirty.
    const ALL: Self = Self {
        blend: true,
        depth_stencil: true,
        rasterizer: true,
        samplers: u16::MAX,
    };

    /// Whether the sampler in `slot` is flagged.
    const fn sampler(self, slot: usize) -> bool {
        self.samplers & (1 << slot) != 0
    }

    /// Whether any category is flagged.
    const fn any(self) -> bool {
        self.blend || self.depth_stencil || self.rasterizer || self.samplers != 0
    }
}

/// Render state of a single device.
///
/// Holds value copies of the states last set on the device, they are safe to copy because bound states and presets can't change anymore.
/// Applying only hands categories that changed to the backend and, inside a category, only the fields that differ from the shadow cache.
pub struct GraphicsContext {
    /// Receives the actual calls.
    backend: Box<dyn DeviceBackend>,
    /// What the backend supports.
    capabilities: Capabilities,
    /// Format of the back buffer depth, scales the depth bias.
    depth_format: DepthFormat,
    /// Current blend state.
    blend_state: BlendState,
    /// Current depth stencil state.
    depth_stencil_state: DepthStencilState,
    /// Current rasterizer state.
    rasterizer_state: RasterizerState,
    /// Current sampler states.
    sampler_states: [SamplerState; MAX_SAMPLER_SLOTS],
    /// Changed since the last apply.
    dirty: DirtyStates,
    /// What the backend has.
    cache: StateCache,
    /// Categories ignoring the cache on their next apply.
    force: DirtyStates,
}

impl GraphicsContext {
    /// Wrap a freshly created backend, the first apply will set every field.
    #[inline]
    #[must_use]
    pub fn new(backend: Box<dyn DeviceBackend>, depth_format: DepthFormat) -> Self {
        let capabilities = backend.capabilities();

        Self {
            backend,
            capabilities,
            depth_format,
            blend_state: BlendState::OPAQUE,
            depth_stencil_state: DepthStencilState::DEFAULT,
            rasterizer_state: RasterizerState::CULL_COUNTER_CLOCKWISE,
            sampler_states: std::array::from_fn(|_| SamplerState::LINEAR_WRAP),
            dirty: DirtyStates::ALL,
            cache: StateCache::default(),
            force: DirtyStates::ALL,
        }
    }

    /// What the backend supports.
    #[inline]
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Backend receiving the calls.
    #[inline]
    #[must_use]
    pub fn backend(&self) -> &dyn DeviceBackend {
        self.backend.as_ref()
    }

    /// Mutable backend receiving the calls.
    ///
    /// Changing state directly on the backend desynchronizes the cache, call [`Self::invalidate_cache`] afterwards.
    #[inline]
    pub fn backend_mut(&mut self) -> &mut dyn DeviceBackend {
        self.backend.as_mut()
    }

    /// Current blend state.
    #[inline]
    #[must_use]
    pub const fn blend_state(&self) -> &BlendState {
        &self.blend_state
    }

    /// Current depth stencil state.
    #[inline]
    #[must_use]
    pub const fn depth_stencil_state(&self) -> &DepthStencilState {
        &self.depth_stencil_state
    }

    /// Current rasterizer state.
    #[inline]
    #[must_use]
    pub const fn rasterizer_state(&self) -> &RasterizerState {
        &self.rasterizer_state
    }

    /// Current sampler state of a slot.
    #[inline]
    #[must_use]
    pub fn sampler_state(&self, slot: usize) -> Option<&SamplerState> {
        self.sampler_states.get(slot)
    }

    /// Amount of sampler slots usable on this backend.
    #[inline]
    #[must_use]
    pub fn sampler_slots(&self) -> usize {
        self.capabilities.max_sampler_slots.min(MAX_SAMPLER_SLOTS)
    }

    /// Whether the next apply ignores the cache for any category.
    #[inline]
    #[must_use]
    pub const fn is_cache_invalid(&self) -> bool {
        self.force.any()
    }

    /// Forget what the backend has, the next apply sets every field of every category.
    ///
    /// Needed after the backend lost its state, for example after a context loss.
    #[inline]
    pub fn invalidate_cache(&mut self) {
        log::debug!("Render state cache invalidated");

        self.force = DirtyStates::ALL;
    }

    /// Make `state` the current blend state.
    pub(crate) fn set_blend_state(&mut self, state: &BlendState) {
        self.blend_state = state.snapshot();
        self.dirty.blend = true;
    }

    /// Make `state` the current depth stencil state.
    pub(crate) fn set_depth_stencil_state(&mut self, state: &DepthStencilState) {
        self.depth_stencil_state = state.snapshot();
        self.dirty.depth_stencil = true;
    }

    /// Make `state` the current rasterizer state.
    pub(crate) fn set_rasterizer_state(&mut self, state: &RasterizerState) {
        self.rasterizer_state = state.snapshot();
        self.dirty.rasterizer = true;
    }

    /// Make `state` the current sampler state of `slot`.
    pub(crate) fn set_sampler_state(&mut self, slot: usize, state: &SamplerState) -> Result<()> {
        self.ensure_sampler_slot(slot)?;

        self.sampler_states[slot] = state.snapshot();
        self.dirty.samplers |= 1 << slot;

        Ok(())
    }

    /// Fail when `slot` can't be used on this backend.
    pub(crate) fn ensure_sampler_slot(&self, slot: usize) -> Result<()> {
        if slot < self.sampler_slots() {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "sampler slot {slot} out of range, the backend has {} slots",
                self.sampler_slots()
            )))
        }
    }

    /// Hand every changed category to the backend.
    ///
    /// # Errors
    ///
    /// - [`Error::NotSupported`] when a current state needs something the backend can't do, the category stays dirty.
    pub fn apply_state(&mut self) -> Result<()> {
        profiling::scope!("Apply render state");

        self.apply_output_state()?;
        self.apply_sampler_states()
    }

    /// Apply the categories that affect writing to the render target, which are the only ones a clear needs.
    fn apply_output_state(&mut self) -> Result<()> {
        if self.force.blend || self.dirty.blend {
            self.blend_state.apply(
                self.backend.as_mut(),
                &self.capabilities,
                &mut self.cache.blend,
                self.force.blend,
            )?;
            self.dirty.blend = false;
            self.force.blend = false;
        }

        if self.force.depth_stencil || self.dirty.depth_stencil {
            self.depth_stencil_state.apply(
                self.backend.as_mut(),
                &mut self.cache.depth_stencil,
                self.force.depth_stencil,
            );
            self.dirty.depth_stencil = false;
            self.force.depth_stencil = false;
        }

        if self.force.rasterizer || self.dirty.rasterizer {
            self.rasterizer_state.apply(
                self.backend.as_mut(),
                &self.capabilities,
                &mut self.cache.rasterizer,
                self.depth_format,
                self.force.rasterizer,
            )?;
            self.dirty.rasterizer = false;
            self.force.rasterizer = false;
        }

        Ok(())
    }

    /// Apply the sampler of every slot the backend has.
    fn apply_sampler_states(&mut self) -> Result<()> {
        let slots = self.sampler_slots();

        for (slot, (state, cache)) in self
            .sampler_states
            .iter()
            .zip(self.cache.samplers.iter_mut())
            .take(slots)
            .enumerate()
        {
            let force = self.force.sampler(slot);
            if force || self.dirty.sampler(slot) {
                state.apply(self.backend.as_mut(), &self.capabilities, slot, cache, force)?;
                self.dirty.samplers &= !(1 << slot);
                self.force.samplers &= !(1 << slot);
            }
        }

        // Slots above the backend maximum are never applied
        self.force.samplers = 0;

        Ok(())
    }

    /// Apply the current state and draw.
    ///
    /// # Errors
    ///
    /// - When applying the state or drawing failed.
    pub(crate) fn draw_primitives(
        &mut self,
        primitive_type: PrimitiveType,
        vertex_start: usize,
        primitive_count: usize,
    ) -> Result<()> {
        self.apply_state()?;

        self.backend
            .draw_primitives(primitive_type, vertex_start, primitive_count)
    }

    /// Clear the render target with the masks of the clear presets, the current states are restored afterwards.
    ///
    /// # Errors
    ///
    /// - When applying the clear state or clearing failed.
    pub(crate) fn clear(
        &mut self,
        options: ClearOptions,
        color: Color,
        depth: f32,
        stencil: i32,
    ) -> Result<()> {
        // Write masks and the scissor test also limit clears on immediate mode APIs
        let blend_state = std::mem::replace(&mut self.blend_state, BlendState::OPAQUE);
        let depth_stencil_state =
            std::mem::replace(&mut self.depth_stencil_state, DepthStencilState::CLEAR);
        let rasterizer_state =
            std::mem::replace(&mut self.rasterizer_state, RasterizerState::CULL_NONE);
        self.dirty.blend = true;
        self.dirty.depth_stencil = true;
        self.dirty.rasterizer = true;

        // Clears don't sample, an unsupported sampler must not fail them
        let result = self
            .apply_output_state()
            .and_then(|()| self.backend.clear(options, color, depth, stencil));

        // Restore even when clearing failed
        self.blend_state = blend_state;
        self.depth_stencil_state = depth_stencil_state;
        self.rasterizer_state = rasterizer_state;
        self.dirty.blend = true;
        self.dirty.depth_stencil = true;
        self.dirty.rasterizer = true;

        result
    }

    /// The backend was reconfigured, everything has to be set again.
    pub(crate) fn reset(&mut self, depth_format: DepthFormat) {
        self.depth_format = depth_format;
        self.capabilities = self.backend.capabilities();
        self.dirty = DirtyStates::ALL;
        self.force = DirtyStates::ALL;
    }
}

impl std::fmt::Debug for GraphicsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsContext")
            .field("capabilities", &self.capabilities)
            .field("depth_format", &self.depth_format)
            .field("dirty", &self.dirty)
            .field("force", &self.force)
            .finish_non_exhaustive()
    }
}
