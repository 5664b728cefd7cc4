//! Triangle rasterization.

use super::{StateLifecycle, StateObject};
use crate::{
    error::{Error, Result},
    graphics::{
        backend::{Capabilities, StateBackend},
        device::GraphicsDevice,
        resource::ResourceKind,
        DepthFormat,
    },
};

/// Which triangles are discarded based on their winding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    /// Draw everything.
    None,
    /// Discard clockwise triangles.
    CullClockwiseFace,
    /// Discard counter clockwise triangles.
    CullCounterClockwiseFace,
}

/// How triangles are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillMode {
    /// Filled triangles.
    Solid,
    /// Only the edges.
    WireFrame,
}

/// Rasterizer configuration.
///
/// # Example
///
/// ```
/// use kestrel::graphics::{CullMode, FillMode, RasterizerState};
///
/// # fn main() -> kestrel::Result<()> {
/// let mut state = RasterizerState::CULL_NONE.clone();
/// state.set_fill_mode(FillMode::WireFrame)?;
///
/// assert_eq!(state.cull_mode(), CullMode::None);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RasterizerState {
    /// Lock state.
    lifecycle: StateLifecycle,
    /// Face culling.
    cull_mode: CullMode,
    /// Polygon fill.
    fill_mode: FillMode,
    /// Constant depth offset as a fraction of the depth range.
    depth_bias: f32,
    /// Depth offset scaled by the polygon slope.
    slope_scale_depth_bias: f32,
    /// Scissor test.
    scissor_test_enable: bool,
    /// Multisample rasterization.
    multi_sample_anti_alias: bool,
    /// Clip against the near and far planes.
    depth_clip_enable: bool,
}

impl RasterizerState {
    /// Draw both faces.
    pub const CULL_NONE: Self = Self::preset("RasterizerState.CullNone", CullMode::None);
    /// Discard clockwise faces.
    pub const CULL_CLOCKWISE: Self =
        Self::preset("RasterizerState.CullClockwise", CullMode::CullClockwiseFace);
    /// Discard counter clockwise faces.
    pub const CULL_COUNTER_CLOCKWISE: Self = Self::preset(
        "RasterizerState.CullCounterClockwise",
        CullMode::CullCounterClockwiseFace,
    );

    /// Create a mutable state culling counter clockwise faces.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lifecycle: StateLifecycle::Mutable,
            cull_mode: CullMode::CullCounterClockwiseFace,
            fill_mode: FillMode::Solid,
            depth_bias: 0.0,
            slope_scale_depth_bias: 0.0,
            scissor_test_enable: false,
            multi_sample_anti_alias: true,
            depth_clip_enable: true,
        }
    }

    /// Construct a locked built-in.
    const fn preset(name: &'static str, cull_mode: CullMode) -> Self {
        Self {
            lifecycle: StateLifecycle::Preset(name),
            cull_mode,
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

    /// Face culling.
    #[inline]
    #[must_use]
    pub const fn cull_mode(&self) -> CullMode {
        self.cull_mode
    }

    /// Polygon fill.
    #[inline]
    #[must_use]
    pub const fn fill_mode(&self) -> FillMode {
        self.fill_mode
    }

    /// Constant depth offset as a fraction of the depth range.
    #[inline]
    #[must_use]
    pub const fn depth_bias(&self) -> f32 {
        self.depth_bias
    }

    /// Depth offset scaled by the polygon slope.
    #[inline]
    #[must_use]
    pub const fn slope_scale_depth_bias(&self) -> f32 {
        self.slope_scale_depth_bias
    }

    /// Whether pixels outside of the scissor rectangle are discarded.
    #[inline]
    #[must_use]
    pub const fn scissor_test_enable(&self) -> bool {
        self.scissor_test_enable
    }

    /// Whether multisample rasterization is enabled.
    #[inline]
    #[must_use]
    pub const fn multi_sample_anti_alias(&self) -> bool {
        self.multi_sample_anti_alias
    }

    /// Whether geometry is clipped against the near and far planes.
    #[inline]
    #[must_use]
    pub const fn depth_clip_enable(&self) -> bool {
        self.depth_clip_enable
    }

    /// Set the face culling.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_cull_mode(&mut self, value: CullMode) -> Result<()> {
        self.edit()?.cull_mode = value;

        Ok(())
    }

    /// Set the polygon fill.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_fill_mode(&mut self, value: FillMode) -> Result<()> {
        self.edit()?.fill_mode = value;

        Ok(())
    }

    /// Set the constant depth offset.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_depth_bias(&mut self, value: f32) -> Result<()> {
        self.edit()?.depth_bias = value;

        Ok(())
    }

    /// Set the slope scaled depth offset.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_slope_scale_depth_bias(&mut self, value: f32) -> Result<()> {
        self.edit()?.slope_scale_depth_bias = value;

        Ok(())
    }

    /// Enable or disable the scissor test.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_scissor_test_enable(&mut self, value: bool) -> Result<()> {
        self.edit()?.scissor_test_enable = value;

        Ok(())
    }

    /// Enable or disable multisample rasterization.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_multi_sample_anti_alias(&mut self, value: bool) -> Result<()> {
        self.edit()?.multi_sample_anti_alias = value;

        Ok(())
    }

    /// Enable or disable clipping against the near and far planes.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_depth_clip_enable(&mut self, value: bool) -> Result<()> {
        self.edit()?.depth_clip_enable = value;

        Ok(())
    }

    /// Self, if setters are still allowed.
    fn edit(&mut self) -> Result<&mut Self> {
        self.lifecycle.ensure_mutable(Self::KIND)?;

        Ok(self)
    }

    /// Issue the backend calls for every field that differs from the shadow cache.
    ///
    /// The constant depth bias is converted to depth buffer units with the scale of `depth_format`.
    #[allow(clippy::float_cmp)]
    pub(crate) fn apply<B: StateBackend + ?Sized>(
        &self,
        backend: &mut B,
        capabilities: &Capabilities,
        cache: &mut RasterizerCache,
        depth_format: DepthFormat,
        force: bool,
    ) -> Result<()> {
        // Validate before the first backend call
        if self.fill_mode == FillMode::WireFrame && !capabilities.wireframe {
            return Err(Error::NotSupported("wireframe fill mode".to_owned()));
        }
        if !self.depth_clip_enable && !capabilities.depth_clamp {
            return Err(Error::NotSupported("disabling depth clipping".to_owned()));
        }

        // Nothing was applied yet, the backend values are unknown
        let force = force || cache.last.is_none();
        let last = cache.last.get_or_insert_with(Self::new);

        if force || self.cull_mode != last.cull_mode {
            backend.set_cull_mode(self.cull_mode);
            last.cull_mode = self.cull_mode;
        }

        if force || self.fill_mode != last.fill_mode {
            backend.set_fill_mode(self.fill_mode);
            last.fill_mode = self.fill_mode;
        }

        if force || self.scissor_test_enable != last.scissor_test_enable {
            backend.set_scissor_test_enabled(self.scissor_test_enable);
            last.scissor_test_enable = self.scissor_test_enable;
        }

        if force
            || self.depth_bias != last.depth_bias
            || self.slope_scale_depth_bias != last.slope_scale_depth_bias
        {
            backend.set_depth_bias(
                self.depth_bias * depth_format.depth_bias_scale(),
                self.slope_scale_depth_bias,
            );
            last.depth_bias = self.depth_bias;
            last.slope_scale_depth_bias = self.slope_scale_depth_bias;
        }

        if force || self.depth_clip_enable != last.depth_clip_enable {
            backend.set_depth_clip_enabled(self.depth_clip_enable);
            last.depth_clip_enable = self.depth_clip_enable;
        }

        if force || self.multi_sample_anti_alias != last.multi_sample_anti_alias {
            backend.set_multisample_enabled(self.multi_sample_anti_alias);
            last.multi_sample_anti_alias = self.multi_sample_anti_alias;
        }

        Ok(())
    }
}

impl Default for RasterizerState {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RasterizerState {
    /// Detached mutable copy, also for presets and bound states.
    #[inline]
    fn clone(&self) -> Self {
        Self {
            lifecycle: StateLifecycle::Mutable,
            ..self.snapshot()
        }
    }
}

impl StateObject for RasterizerState {
    const KIND: ResourceKind = ResourceKind::RasterizerState;

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

/// Last applied rasterizer state of a context.
#[derive(Debug, Default)]
pub(crate) struct RasterizerCache {
    /// Values as the backend has them, `None` before the first apply.
    last: Option<RasterizerState>,
}

#[cfg(test)]
mod tests {
    use super::{CullMode, FillMode, RasterizerCache, RasterizerState};
    use crate::{
        error::Error,
        graphics::{
            backend::{
                recording::{BackendCall, RecordingBackend},
                Capabilities, StateBackend as _,
            },
            state::StateLifecycle,
            DepthFormat,
        },
    };

    #[test]
    fn defaults() {
        let state = RasterizerState::new();

        assert_eq!(state.cull_mode(), CullMode::CullCounterClockwiseFace);
        assert_eq!(state.fill_mode(), FillMode::Solid);
        assert!(state.depth_bias().abs() < f32::EPSILON);
        assert!(state.slope_scale_depth_bias().abs() < f32::EPSILON);
        assert!(!state.scissor_test_enable());
        assert!(state.multi_sample_anti_alias());
        assert!(state.depth_clip_enable());
    }

    #[test]
    fn presets_are_locked() {
        let mut preset = RasterizerState::CULL_NONE;

        assert!(matches!(
            preset.set_cull_mode(CullMode::CullClockwiseFace),
            Err(Error::DefaultStateModified {
                state: "RasterizerState.CullNone"
            })
        ));
        assert_eq!(preset.cull_mode(), CullMode::None);
        assert_eq!(
            RasterizerState::CULL_CLOCKWISE.cull_mode(),
            CullMode::CullClockwiseFace
        );

        let copy = RasterizerState::CULL_CLOCKWISE.clone();
        assert_eq!(copy.lifecycle(), StateLifecycle::Mutable);
        assert_eq!(copy.cull_mode(), CullMode::CullClockwiseFace);
    }

    #[test]
    fn depth_bias_is_scaled() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let capabilities = backend.capabilities();
        let mut cache = RasterizerCache::default();
        RasterizerState::new()
            .apply(&mut backend, &capabilities, &mut cache, DepthFormat::Depth16, true)
            .unwrap();
        log.clear();

        let mut state = RasterizerState::new();
        state.set_depth_bias(0.5).unwrap();
        state.set_slope_scale_depth_bias(2.0).unwrap();
        state
            .apply(&mut backend, &capabilities, &mut cache, DepthFormat::Depth16, false)
            .unwrap();

        assert_eq!(
            log.take(),
            vec![BackendCall::DepthBias {
                constant: 32_767.5,
                slope_scale: 2.0
            }]
        );
    }

    #[test]
    fn first_apply_sets_everything() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let capabilities = backend.capabilities();
        let mut cache = RasterizerCache::default();

        // The defaults match a fresh cache's values but the backend may have anything
        RasterizerState::new()
            .apply(&mut backend, &capabilities, &mut cache, DepthFormat::Depth24, false)
            .unwrap();
        assert_eq!(log.len(), 6);
        assert!(log
            .calls()
            .contains(&BackendCall::CullMode(CullMode::CullCounterClockwiseFace)));

        log.clear();
        RasterizerState::new()
            .apply(&mut backend, &capabilities, &mut cache, DepthFormat::Depth24, false)
            .unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn unchanged_state_is_skipped() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let capabilities = backend.capabilities();
        let mut cache = RasterizerCache::default();

        RasterizerState::CULL_NONE
            .apply(&mut backend, &capabilities, &mut cache, DepthFormat::Depth24, true)
            .unwrap();
        assert_eq!(log.take().len(), 6);

        RasterizerState::CULL_NONE
            .apply(&mut backend, &capabilities, &mut cache, DepthFormat::Depth24, false)
            .unwrap();
        assert!(log.is_empty());

        RasterizerState::CULL_CLOCKWISE
            .apply(&mut backend, &capabilities, &mut cache, DepthFormat::Depth24, false)
            .unwrap();
        assert_eq!(
            log.take(),
            vec![BackendCall::CullMode(CullMode::CullClockwiseFace)]
        );
    }

    #[test]
    fn unsupported_features_are_rejected() {
        let mut backend = RecordingBackend::with_capabilities(Capabilities::MINIMAL);
        let log = backend.log();
        let capabilities = backend.capabilities();
        let mut cache = RasterizerCache::default();

        let mut wireframe = RasterizerState::new();
        wireframe.set_fill_mode(FillMode::WireFrame).unwrap();
        assert!(matches!(
            wireframe.apply(&mut backend, &capabilities, &mut cache, DepthFormat::Depth24, true),
            Err(Error::NotSupported(_))
        ));

        let mut clamped = RasterizerState::new();
        clamped.set_depth_clip_enable(false).unwrap();
        assert!(matches!(
            clamped.apply(&mut backend, &capabilities, &mut cache, DepthFormat::Depth24, true),
            Err(Error::NotSupported(_))
        ));

        assert!(log.is_empty());
    }
}
