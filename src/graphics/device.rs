//! A created graphics device.

use super::{
    adapter::GraphicsAdapter,
    context::GraphicsContext,
    presentation::{DisplayOrientation, PresentationParameters},
    resource::{DeviceId, ResourceRegistry},
    state::{
        blend::BlendState, depth_stencil::DepthStencilState, rasterizer::RasterizerState,
        sampler::SamplerState, StateObject,
    },
    ClearOptions, Color, GraphicsProfile, PrimitiveType,
};
use crate::{
    backend::Backend,
    error::{Error, Result},
};

/// Device on a single adapter with a fixed profile.
///
/// Owns the backend, the render state currently set and every state object bound to it.
#[derive(Debug)]
pub struct GraphicsDevice {
    /// Unique for the lifetime of the process.
    id: DeviceId,
    /// Adapter the device was created on.
    adapter: GraphicsAdapter,
    /// Feature level, a different one needs a new device.
    graphics_profile: GraphicsProfile,
    /// Current back buffer configuration.
    presentation_parameters: PresentationParameters,
    /// Bound state objects.
    resources: ResourceRegistry,
    /// Current state and the backend.
    context: GraphicsContext,
    /// Offset pixel centers by half a pixel, fixed at creation.
    use_half_pixel_offset: bool,
    /// Whether [`Self::dispose`] was called.
    disposed: bool,
}

impl GraphicsDevice {
    /// Create a device through the platform.
    ///
    /// The multisample count of the presentation parameters is clamped to what the adapter supports.
    ///
    /// # Errors
    ///
    /// - [`Error::NotSupported`] when the adapter doesn't support `graphics_profile`.
    /// - [`Error::InvalidArgument`] when the presentation parameters are invalid.
    /// - When the platform failed to create the backend.
    pub fn new<B>(
        platform: &mut B,
        adapter: GraphicsAdapter,
        graphics_profile: GraphicsProfile,
        mut presentation_parameters: PresentationParameters,
    ) -> Result<Self>
    where
        B: Backend + ?Sized,
    {
        if !adapter.is_profile_supported(graphics_profile) {
            return Err(Error::NotSupported(format!(
                "adapter '{}' doesn't support the {graphics_profile:?} profile",
                adapter.description()
            )));
        }

        presentation_parameters.multi_sample_count =
            adapter.clamp_multi_sample_count(presentation_parameters.multi_sample_count);
        presentation_parameters.validate()?;

        let backend = platform.create_device(&adapter, graphics_profile, &presentation_parameters)?;
        let context = GraphicsContext::new(backend, presentation_parameters.depth_stencil_format);

        let id = DeviceId::next();
        log::info!(
            "Created {id} with the {graphics_profile:?} profile on '{}', back buffer {}x{}",
            adapter.description(),
            presentation_parameters.back_buffer_width,
            presentation_parameters.back_buffer_height
        );

        Ok(Self {
            id,
            adapter,
            graphics_profile,
            presentation_parameters,
            resources: ResourceRegistry::default(),
            context,
            use_half_pixel_offset: false,
            disposed: false,
        })
    }

    /// Offset pixel centers by half a pixel, like Direct3D 9 did.
    ///
    /// Only possible while creating the device, the device manager sets it from its preference.
    #[inline]
    #[must_use]
    pub fn with_half_pixel_offset(mut self, use_half_pixel_offset: bool) -> Self {
        self.use_half_pixel_offset = use_half_pixel_offset;

        self
    }

    /// Unique identifier.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> DeviceId {
        self.id
    }

    /// Adapter the device was created on.
    #[inline]
    #[must_use]
    pub const fn adapter(&self) -> &GraphicsAdapter {
        &self.adapter
    }

    /// Feature level.
    #[inline]
    #[must_use]
    pub const fn graphics_profile(&self) -> GraphicsProfile {
        self.graphics_profile
    }

    /// Current back buffer configuration.
    #[inline]
    #[must_use]
    pub const fn presentation_parameters(&self) -> &PresentationParameters {
        &self.presentation_parameters
    }

    /// State objects bound to this device.
    #[inline]
    #[must_use]
    pub const fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    /// Current state and the backend.
    #[inline]
    #[must_use]
    pub const fn context(&self) -> &GraphicsContext {
        &self.context
    }

    /// Mutable current state and the backend.
    #[inline]
    pub fn context_mut(&mut self) -> &mut GraphicsContext {
        &mut self.context
    }

    /// Whether pixel centers are offset by half a pixel.
    #[inline]
    #[must_use]
    pub const fn use_half_pixel_offset(&self) -> bool {
        self.use_half_pixel_offset
    }

    /// Clip space offset a vertex shader adds to its positions, multiplied by `w`.
    ///
    /// # Returns
    ///
    /// - Half a pixel to the right and down for the current back buffer when [`Self::use_half_pixel_offset`] is set.
    /// - Zero otherwise.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn half_pixel_offset(&self) -> [f32; 2] {
        if !self.use_half_pixel_offset {
            return [0.0, 0.0];
        }

        // Clip space spans two units, so half a pixel is one over the size
        [
            1.0 / self.presentation_parameters.back_buffer_width as f32,
            -1.0 / self.presentation_parameters.back_buffer_height as f32,
        ]
    }

    /// Whether [`Self::dispose`] was called.
    #[inline]
    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Current blend state.
    #[inline]
    #[must_use]
    pub const fn blend_state(&self) -> &BlendState {
        self.context.blend_state()
    }

    /// Current depth stencil state.
    #[inline]
    #[must_use]
    pub const fn depth_stencil_state(&self) -> &DepthStencilState {
        self.context.depth_stencil_state()
    }

    /// Current rasterizer state.
    #[inline]
    #[must_use]
    pub const fn rasterizer_state(&self) -> &RasterizerState {
        self.context.rasterizer_state()
    }

    /// Current sampler state of a slot.
    #[inline]
    #[must_use]
    pub fn sampler_state(&self, slot: usize) -> Option<&SamplerState> {
        self.context.sampler_state(slot)
    }

    /// Use `state` for the following draws.
    ///
    /// Binds `state` to this device unless it's a preset, so it can't be changed anymore afterwards.
    ///
    /// # Errors
    ///
    /// - [`Error::BoundToOtherDevice`] when `state` belongs to another device.
    /// - [`Error::ObjectDisposed`] when the device is disposed.
    #[inline]
    pub fn set_blend_state(&mut self, state: &mut BlendState) -> Result<()> {
        self.use_state(state)?;
        self.context.set_blend_state(state);

        Ok(())
    }

    /// Use `state` for the following draws.
    ///
    /// Binds `state` to this device unless it's a preset, so it can't be changed anymore afterwards.
    ///
    /// # Errors
    ///
    /// - [`Error::BoundToOtherDevice`] when `state` belongs to another device.
    /// - [`Error::ObjectDisposed`] when the device is disposed.
    #[inline]
    pub fn set_depth_stencil_state(&mut self, state: &mut DepthStencilState) -> Result<()> {
        self.use_state(state)?;
        self.context.set_depth_stencil_state(state);

        Ok(())
    }

    /// Use `state` for the following draws.
    ///
    /// Binds `state` to this device unless it's a preset, so it can't be changed anymore afterwards.
    ///
    /// # Errors
    ///
    /// - [`Error::BoundToOtherDevice`] when `state` belongs to another device.
    /// - [`Error::ObjectDisposed`] when the device is disposed.
    #[inline]
    pub fn set_rasterizer_state(&mut self, state: &mut RasterizerState) -> Result<()> {
        self.use_state(state)?;
        self.context.set_rasterizer_state(state);

        Ok(())
    }

    /// Use `state` for texture sampling in `slot` for the following draws.
    ///
    /// Binds `state` to this device unless it's a preset, so it can't be changed anymore afterwards.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] when the backend has no such slot, `state` isn't bound then.
    /// - [`Error::BoundToOtherDevice`] when `state` belongs to another device.
    /// - [`Error::ObjectDisposed`] when the device is disposed.
    #[inline]
    pub fn set_sampler_state(&mut self, slot: usize, state: &mut SamplerState) -> Result<()> {
        self.context.ensure_sampler_slot(slot)?;
        self.use_state(state)?;
        self.context.set_sampler_state(slot, state)
    }

    /// Hand every changed state to the backend.
    ///
    /// Happens automatically before drawing.
    ///
    /// # Errors
    ///
    /// - [`Error::NotSupported`] when a current state needs something the backend can't do.
    /// - [`Error::ObjectDisposed`] when the device is disposed.
    #[inline]
    pub fn apply_state(&mut self) -> Result<()> {
        self.ensure_not_disposed()?;

        self.context.apply_state()
    }

    /// Draw non-indexed primitives with the current state.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] when `primitive_count` is zero.
    /// - When applying the state or drawing failed.
    /// - [`Error::ObjectDisposed`] when the device is disposed.
    #[inline]
    pub fn draw_primitives(
        &mut self,
        primitive_type: PrimitiveType,
        vertex_start: usize,
        primitive_count: usize,
    ) -> Result<()> {
        self.ensure_not_disposed()?;
        if primitive_count == 0 {
            return Err(Error::InvalidArgument(
                "primitive count must be greater than zero".to_owned(),
            ));
        }

        self.context
            .draw_primitives(primitive_type, vertex_start, primitive_count)
    }

    /// Clear the color, depth and stencil buffers.
    ///
    /// # Errors
    ///
    /// - When the backend failed to clear.
    /// - [`Error::ObjectDisposed`] when the device is disposed.
    #[inline]
    pub fn clear(&mut self, color: Color) -> Result<()> {
        self.clear_with(ClearOptions::ALL, color, 1.0, 0)
    }

    /// Clear selected buffers with explicit values.
    ///
    /// # Errors
    ///
    /// - When the backend failed to clear.
    /// - [`Error::ObjectDisposed`] when the device is disposed.
    #[inline]
    pub fn clear_with(
        &mut self,
        options: ClearOptions,
        color: Color,
        depth: f32,
        stencil: i32,
    ) -> Result<()> {
        self.ensure_not_disposed()?;

        self.context.clear(options, color, depth, stencil)
    }

    /// Show the back buffer.
    ///
    /// # Errors
    ///
    /// - When the backend failed to present.
    /// - [`Error::ObjectDisposed`] when the device is disposed.
    #[inline]
    pub fn present(&mut self) -> Result<()> {
        self.ensure_not_disposed()?;
        profiling::scope!("Present");

        self.context.backend_mut().present()
    }

    /// Reconfigure the back buffer in place, keeping the profile and every bound state.
    ///
    /// Every render state is applied again on the next draw.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] when the presentation parameters are invalid.
    /// - When the backend failed to reconfigure.
    /// - [`Error::ObjectDisposed`] when the device is disposed.
    pub fn reset(&mut self, mut presentation_parameters: PresentationParameters) -> Result<()> {
        self.ensure_not_disposed()?;

        presentation_parameters.multi_sample_count = self
            .adapter
            .clamp_multi_sample_count(presentation_parameters.multi_sample_count);
        presentation_parameters.validate()?;

        self.context
            .backend_mut()
            .reset(&presentation_parameters)?;
        self.context
            .reset(presentation_parameters.depth_stencil_format);
        self.presentation_parameters = presentation_parameters;

        log::debug!(
            "Reset {}, back buffer {}x{}",
            self.id,
            self.presentation_parameters.back_buffer_width,
            self.presentation_parameters.back_buffer_height
        );

        Ok(())
    }

    /// Match the back buffer dimensions to the display orientation.
    ///
    /// # Returns
    ///
    /// - `true` when the dimensions were swapped and the backend was reset.
    ///
    /// # Errors
    ///
    /// - When the backend failed to reconfigure.
    /// - [`Error::ObjectDisposed`] when the device is disposed.
    pub fn set_display_orientation(&mut self, orientation: DisplayOrientation) -> Result<bool> {
        self.ensure_not_disposed()?;

        let mut presentation_parameters = self.presentation_parameters.clone();
        if !presentation_parameters.orient(orientation) {
            // Only the flag changed
            self.presentation_parameters.display_orientation = orientation;

            return Ok(false);
        }

        log::debug!(
            "Orientation changed to {orientation:?}, back buffer is now {}x{}",
            presentation_parameters.back_buffer_width,
            presentation_parameters.back_buffer_height
        );
        self.reset(presentation_parameters)?;

        Ok(true)
    }

    /// Release the backend and every bound state registration.
    ///
    /// Calling it again does nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }

        let released = self.resources.release_all();
        self.context.backend_mut().dispose();
        self.disposed = true;

        log::info!("Disposed {}, released {released} state objects", self.id);
    }

    /// Bind a state object to this device.
    pub(crate) fn bind_state<S: StateObject>(&mut self, state: &mut S) -> Result<bool> {
        self.ensure_not_disposed()?;

        state
            .lifecycle_mut()
            .bind(S::KIND, self.id, &mut self.resources)
    }

    /// Bind a state object that's about to be used, presets are used as is.
    fn use_state<S: StateObject>(&mut self, state: &mut S) -> Result<()> {
        self.ensure_not_disposed()?;

        if !state.lifecycle().is_preset() {
            self.bind_state(state)?;
        }

        Ok(())
    }

    /// Fail if disposed.
    fn ensure_not_disposed(&self) -> Result<()> {
        if self.disposed {
            Err(Error::ObjectDisposed("GraphicsDevice"))
        } else {
            Ok(())
        }
    }
}

impl Drop for GraphicsDevice {
    fn drop(&mut self) {
        self.dispose();
    }
}
