//! Texture sampling.

use super::{StateLifecycle, StateObject};
use crate::{
    error::{Error, Result},
    graphics::{
        backend::{Capabilities, StateBackend, TextureAxis},
        device::GraphicsDevice,
        resource::ResourceKind,
        Color, CompareFunction,
    },
};

/// Minification, magnification and mip filtering.
///
/// Variants not starting with `Min` use the same filter for all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    /// Linear everywhere.
    Linear,
    /// Point everywhere.
    Point,
    /// Anisotropic with linear mip filtering.
    Anisotropic,
    /// Linear minification and magnification, point mip filtering.
    LinearMipPoint,
    /// Point minification and magnification, linear mip filtering.
    PointMipLinear,
    /// Linear minification, point magnification, linear mip filtering.
    MinLinearMagPointMipLinear,
    /// Linear minification, point magnification, point mip filtering.
    MinLinearMagPointMipPoint,
    /// Point minification, linear magnification, linear mip filtering.
    MinPointMagLinearMipLinear,
    /// Point minification, linear magnification, point mip filtering.
    MinPointMagLinearMipPoint,
}

impl TextureFilter {
    /// Whether minification is linear.
    #[inline]
    #[must_use]
    pub const fn min_linear(self) -> bool {
        matches!(
            self,
            Self::Linear
                | Self::Anisotropic
                | Self::LinearMipPoint
                | Self::MinLinearMagPointMipLinear
                | Self::MinLinearMagPointMipPoint
        )
    }

    /// Whether magnification is linear.
    #[inline]
    #[must_use]
    pub const fn mag_linear(self) -> bool {
        matches!(
            self,
            Self::Linear
                | Self::Anisotropic
                | Self::LinearMipPoint
                | Self::MinPointMagLinearMipLinear
                | Self::MinPointMagLinearMipPoint
        )
    }

    /// Whether blending between mip levels is linear.
    #[inline]
    #[must_use]
    pub const fn mip_linear(self) -> bool {
        matches!(
            self,
            Self::Linear
                | Self::Anisotropic
                | Self::PointMipLinear
                | Self::MinLinearMagPointMipLinear
                | Self::MinPointMagLinearMipLinear
        )
    }
}

/// What happens with texture coordinates outside of `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureAddressMode {
    /// Repeat.
    Wrap,
    /// Clamp to the edge.
    Clamp,
    /// Repeat, flipping every other repetition.
    Mirror,
    /// Use [`SamplerState::border_color`].
    Border,
}

/// Whether a sampler returns filtered texels or comparison results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFilterMode {
    /// Regular sampling.
    #[default]
    Default,
    /// Compare against [`SamplerState::comparison_function`], for shadow maps.
    Comparison,
}

/// Texture sampler configuration.
#[derive(Debug)]
pub struct SamplerState {
    /// Lock state.
    lifecycle: StateLifecycle,
    /// Filtering.
    filter: TextureFilter,
    /// Horizontal addressing.
    address_u: TextureAddressMode,
    /// Vertical addressing.
    address_v: TextureAddressMode,
    /// Depth addressing.
    address_w: TextureAddressMode,
    /// Color outside of the texture for [`TextureAddressMode::Border`].
    border_color: Color,
    /// Anisotropy for [`TextureFilter::Anisotropic`].
    max_anisotropy: u16,
    /// Most detailed mip level used.
    max_mip_level: u32,
    /// Offset added to the computed mip level.
    mip_map_level_of_detail_bias: f32,
    /// Regular or comparison sampling.
    filter_mode: TextureFilterMode,
    /// Comparison for [`TextureFilterMode::Comparison`].
    comparison_function: CompareFunction,
}

impl SamplerState {
    /// Anisotropic filtering, clamped addressing.
    pub const ANISOTROPIC_CLAMP: Self = Self::preset(
        "SamplerState.AnisotropicClamp",
        TextureFilter::Anisotropic,
        TextureAddressMode::Clamp,
    );
    /// Anisotropic filtering, wrapped addressing.
    pub const ANISOTROPIC_WRAP: Self = Self::preset(
        "SamplerState.AnisotropicWrap",
        TextureFilter::Anisotropic,
        TextureAddressMode::Wrap,
    );
    /// Linear filtering, clamped addressing.
    pub const LINEAR_CLAMP: Self = Self::preset(
        "SamplerState.LinearClamp",
        TextureFilter::Linear,
        TextureAddressMode::Clamp,
    );
    /// Linear filtering, wrapped addressing.
    pub const LINEAR_WRAP: Self = Self::preset(
        "SamplerState.LinearWrap",
        TextureFilter::Linear,
        TextureAddressMode::Wrap,
    );
    /// Point filtering, clamped addressing.
    pub const POINT_CLAMP: Self = Self::preset(
        "SamplerState.PointClamp",
        TextureFilter::Point,
        TextureAddressMode::Clamp,
    );
    /// Point filtering, wrapped addressing.
    pub const POINT_WRAP: Self = Self::preset(
        "SamplerState.PointWrap",
        TextureFilter::Point,
        TextureAddressMode::Wrap,
    );

    /// Create a mutable linear wrapping sampler.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lifecycle: StateLifecycle::Mutable,
            filter: TextureFilter::Linear,
            address_u: TextureAddressMode::Wrap,
            address_v: TextureAddressMode::Wrap,
            address_w: TextureAddressMode::Wrap,
            border_color: Color::WHITE,
            max_anisotropy: 4,
            max_mip_level: 0,
            mip_map_level_of_detail_bias: 0.0,
            filter_mode: TextureFilterMode::Default,
            comparison_function: CompareFunction::Never,
        }
    }

    /// Construct a locked built-in.
    const fn preset(name: &'static str, filter: TextureFilter, address: TextureAddressMode) -> Self {
        Self {
            lifecycle: StateLifecycle::Preset(name),
            filter,
            address_u: address,
            address_v: address,
            address_w: address,
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
    /// Binding again to the same device does nothing.
    ///
    /// # Returns
    ///
    /// - `true` when the state was newly bound.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::DefaultStateBound`] when this is a preset.
    /// - [`crate::Error::BoundToOtherDevice`] when already bound to another device.
    /// - [`crate::Error::ObjectDisposed`] when the device is disposed.
    #[inline]
    pub fn bind_to_graphics_device(&mut self, device: &mut GraphicsDevice) -> Result<bool> {
        device.bind_state(self)
    }

    /// Filtering.
    #[inline]
    #[must_use]
    pub const fn filter(&self) -> TextureFilter {
        self.filter
    }

    /// Horizontal addressing.
    #[inline]
    #[must_use]
    pub const fn address_u(&self) -> TextureAddressMode {
        self.address_u
    }

    /// Vertical addressing.
    #[inline]
    #[must_use]
    pub const fn address_v(&self) -> TextureAddressMode {
        self.address_v
    }

    /// Depth addressing.
    #[inline]
    #[must_use]
    pub const fn address_w(&self) -> TextureAddressMode {
        self.address_w
    }

    /// Color returned outside of the texture in [`TextureAddressMode::Border`].
    #[inline]
    #[must_use]
    pub const fn border_color(&self) -> Color {
        self.border_color
    }

    /// Requested anisotropy.
    #[inline]
    #[must_use]
    pub const fn max_anisotropy(&self) -> u16 {
        self.max_anisotropy
    }

    /// Most detailed mip level used.
    #[inline]
    #[must_use]
    pub const fn max_mip_level(&self) -> u32 {
        self.max_mip_level
    }

    /// Offset added to the computed mip level.
    #[inline]
    #[must_use]
    pub const fn mip_map_level_of_detail_bias(&self) -> f32 {
        self.mip_map_level_of_detail_bias
    }

    /// Regular or comparison sampling.
    #[inline]
    #[must_use]
    pub const fn filter_mode(&self) -> TextureFilterMode {
        self.filter_mode
    }

    /// Comparison used in [`TextureFilterMode::Comparison`].
    #[inline]
    #[must_use]
    pub const fn comparison_function(&self) -> CompareFunction {
        self.comparison_function
    }

    /// Set the filtering.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_filter(&mut self, value: TextureFilter) -> Result<()> {
        self.edit()?.filter = value;

        Ok(())
    }

    /// Set the horizontal addressing.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_address_u(&mut self, value: TextureAddressMode) -> Result<()> {
        self.edit()?.address_u = value;

        Ok(())
    }

    /// Set the vertical addressing.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_address_v(&mut self, value: TextureAddressMode) -> Result<()> {
        self.edit()?.address_v = value;

        Ok(())
    }

    /// Set the depth addressing.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_address_w(&mut self, value: TextureAddressMode) -> Result<()> {
        self.edit()?.address_w = value;

        Ok(())
    }

    /// Set the border color.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_border_color(&mut self, value: Color) -> Result<()> {
        self.edit()?.border_color = value;

        Ok(())
    }

    /// Set the requested anisotropy.
    ///
    /// Values above what the backend supports are clamped when applied.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_max_anisotropy(&mut self, value: u16) -> Result<()> {
        self.edit()?.max_anisotropy = value;

        Ok(())
    }

    /// Set the most detailed mip level used.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_max_mip_level(&mut self, value: u32) -> Result<()> {
        self.edit()?.max_mip_level = value;

        Ok(())
    }

    /// Set the mip level offset.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_mip_map_level_of_detail_bias(&mut self, value: f32) -> Result<()> {
        self.edit()?.mip_map_level_of_detail_bias = value;

        Ok(())
    }

    /// Set regular or comparison sampling.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_filter_mode(&mut self, value: TextureFilterMode) -> Result<()> {
        self.edit()?.filter_mode = value;

        Ok(())
    }

    /// Set the comparison for comparison sampling.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_comparison_function(&mut self, value: CompareFunction) -> Result<()> {
        self.edit()?.comparison_function = value;

        Ok(())
    }

    /// Self, if setters are still allowed.
    fn edit(&mut self) -> Result<&mut Self> {
        self.lifecycle.ensure_mutable(Self::KIND)?;

        Ok(self)
    }

    /// Anisotropy as handed to the backend.
    fn effective_anisotropy(&self, capabilities: &Capabilities) -> u16 {
        if self.filter == TextureFilter::Anisotropic {
            self.max_anisotropy.clamp(1, capabilities.max_anisotropy.max(1))
        } else {
            1
        }
    }

    /// Comparison as handed to the backend.
    fn effective_comparison(&self) -> Option<CompareFunction> {
        (self.filter_mode == TextureFilterMode::Comparison).then_some(self.comparison_function)
    }

    /// Issue the backend calls for every field that differs from the shadow cache of `slot`.
    #[allow(clippy::float_cmp)]
    pub(crate) fn apply<B: StateBackend + ?Sized>(
        &self,
        backend: &mut B,
        capabilities: &Capabilities,
        slot: usize,
        cache: &mut SamplerCache,
        force: bool,
    ) -> Result<()> {
        let axes = [
            (TextureAxis::U, self.address_u),
            (TextureAxis::V, self.address_v),
            (TextureAxis::W, self.address_w),
        ];

        // Validate before the first backend call
        if !capabilities.border_address_mode
            && axes
                .iter()
                .any(|(_, mode)| *mode == TextureAddressMode::Border)
        {
            return Err(Error::NotSupported("border texture address mode".to_owned()));
        }
        if self.filter_mode == TextureFilterMode::Comparison && !capabilities.comparison_samplers {
            return Err(Error::NotSupported("comparison samplers".to_owned()));
        }

        // Nothing was applied yet, the backend values are unknown
        let force = force || cache.last.is_none();
        let last = cache.last.get_or_insert_with(Self::new);

        let anisotropy = self.effective_anisotropy(capabilities);
        if force || self.filter != last.filter || anisotropy != last.max_anisotropy {
            backend.set_sampler_filter(slot, self.filter, anisotropy);
            last.filter = self.filter;
            // The cache holds what the backend received
            last.max_anisotropy = anisotropy;
        }

        for (axis, mode) in axes {
            let last_mode = match axis {
                TextureAxis::U => &mut last.address_u,
                TextureAxis::V => &mut last.address_v,
                TextureAxis::W => &mut last.address_w,
            };
            if force || mode != *last_mode {
                backend.set_sampler_address(slot, axis, mode);
                *last_mode = mode;
            }
        }

        if force || self.border_color != last.border_color {
            backend.set_sampler_border_color(slot, self.border_color);
            last.border_color = self.border_color;
        }

        if force
            || self.max_mip_level != last.max_mip_level
            || self.mip_map_level_of_detail_bias != last.mip_map_level_of_detail_bias
        {
            backend.set_sampler_level_of_detail(
                slot,
                self.max_mip_level,
                self.mip_map_level_of_detail_bias,
            );
            last.max_mip_level = self.max_mip_level;
            last.mip_map_level_of_detail_bias = self.mip_map_level_of_detail_bias;
        }

        let comparison = self.effective_comparison();
        if force || comparison != last.effective_comparison() {
            backend.set_sampler_comparison(slot, comparison);
            last.filter_mode = self.filter_mode;
            last.comparison_function = self.comparison_function;
        }

        Ok(())
    }
}

impl Default for SamplerState {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SamplerState {
    /// Detached mutable copy, also for presets and bound states.
    #[inline]
    fn clone(&self) -> Self {
        Self {
            lifecycle: StateLifecycle::Mutable,
            ..self.snapshot()
        }
    }
}

impl StateObject for SamplerState {
    const KIND: ResourceKind = ResourceKind::SamplerState;

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

/// Last applied sampler state of a single slot.
#[derive(Debug, Default)]
pub(crate) struct SamplerCache {
    /// Values as the backend has them, `None` before the first apply.
    last: Option<SamplerState>,
}

#[cfg(test)]
mod tests {
    use super::{SamplerCache, SamplerState, TextureAddressMode, TextureFilter, TextureFilterMode};
    use crate::{
        error::Error,
        graphics::{
            backend::{
                recording::{BackendCall, RecordingBackend},
                Capabilities, StateBackend as _, TextureAxis,
            },
            Color, CompareFunction,
        },
    };

    #[test]
    fn defaults() {
        let state = SamplerState::new();

        assert_eq!(state.filter(), TextureFilter::Linear);
        assert_eq!(state.address_u(), TextureAddressMode::Wrap);
        assert_eq!(state.address_w(), TextureAddressMode::Wrap);
        assert_eq!(state.border_color(), Color::WHITE);
        assert_eq!(state.max_anisotropy(), 4);
        assert_eq!(state.max_mip_level(), 0);
        assert_eq!(state.filter_mode(), TextureFilterMode::Default);
        assert_eq!(state.comparison_function(), CompareFunction::Never);
    }

    #[test]
    fn filter_components() {
        assert!(TextureFilter::Linear.min_linear());
        assert!(!TextureFilter::Point.mag_linear());
        assert!(TextureFilter::PointMipLinear.mip_linear());
        assert!(!TextureFilter::PointMipLinear.min_linear());
        assert!(TextureFilter::MinLinearMagPointMipPoint.min_linear());
        assert!(!TextureFilter::MinLinearMagPointMipPoint.mag_linear());
        assert!(!TextureFilter::MinLinearMagPointMipPoint.mip_linear());
    }

    #[test]
    fn presets_are_locked() {
        let mut preset = SamplerState::POINT_CLAMP;

        assert!(preset.set_filter(TextureFilter::Linear).is_err());
        assert_eq!(preset.filter(), TextureFilter::Point);
        assert_eq!(preset.address_v(), TextureAddressMode::Clamp);
        assert_eq!(
            SamplerState::ANISOTROPIC_WRAP.filter(),
            TextureFilter::Anisotropic
        );
    }

    #[test]
    fn anisotropy_is_clamped() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let capabilities = backend.capabilities();
        let mut cache = SamplerCache::default();

        let mut state = SamplerState::ANISOTROPIC_CLAMP.clone();
        state.set_max_anisotropy(64).unwrap();
        state
            .apply(&mut backend, &capabilities, 2, &mut cache, true)
            .unwrap();

        assert!(log.calls().contains(&BackendCall::SamplerFilter {
            slot: 2,
            filter: TextureFilter::Anisotropic,
            max_anisotropy: 16,
        }));

        // Non anisotropic filters always get one
        log.clear();
        SamplerState::LINEAR_CLAMP
            .apply(&mut backend, &capabilities, 2, &mut cache, false)
            .unwrap();
        assert_eq!(
            log.take(),
            vec![BackendCall::SamplerFilter {
                slot: 2,
                filter: TextureFilter::Linear,
                max_anisotropy: 1,
            }]
        );
    }

    #[test]
    fn only_changed_axes_are_applied() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let capabilities = backend.capabilities();
        let mut cache = SamplerCache::default();

        SamplerState::LINEAR_WRAP
            .apply(&mut backend, &capabilities, 0, &mut cache, true)
            .unwrap();
        log.clear();

        let mut state = SamplerState::new();
        state.set_address_v(TextureAddressMode::Mirror).unwrap();
        state
            .apply(&mut backend, &capabilities, 0, &mut cache, false)
            .unwrap();

        assert_eq!(
            log.take(),
            vec![BackendCall::SamplerAddress {
                slot: 0,
                axis: TextureAxis::V,
                mode: TextureAddressMode::Mirror,
            }]
        );
    }

    #[test]
    fn comparison_sampler() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let capabilities = backend.capabilities();
        let mut cache = SamplerCache::default();
        SamplerState::LINEAR_CLAMP
            .apply(&mut backend, &capabilities, 1, &mut cache, true)
            .unwrap();
        log.clear();

        // The function alone doesn't matter in default mode
        let mut state = SamplerState::LINEAR_CLAMP.clone();
        state.set_comparison_function(CompareFunction::Less).unwrap();
        state
            .apply(&mut backend, &capabilities, 1, &mut cache, false)
            .unwrap();
        assert!(log.is_empty());

        let mut state = SamplerState::LINEAR_CLAMP.clone();
        state.set_comparison_function(CompareFunction::Less).unwrap();
        state.set_filter_mode(TextureFilterMode::Comparison).unwrap();
        state
            .apply(&mut backend, &capabilities, 1, &mut cache, false)
            .unwrap();
        assert_eq!(
            log.take(),
            vec![BackendCall::SamplerComparison {
                slot: 1,
                function: Some(CompareFunction::Less),
            }]
        );
    }

    #[test]
    fn unsupported_features_are_rejected() {
        let mut backend = RecordingBackend::with_capabilities(Capabilities::MINIMAL);
        let log = backend.log();
        let capabilities = backend.capabilities();
        let mut cache = SamplerCache::default();

        let mut border = SamplerState::new();
        border.set_address_w(TextureAddressMode::Border).unwrap();
        assert!(matches!(
            border.apply(&mut backend, &capabilities, 0, &mut cache, true),
            Err(Error::NotSupported(_))
        ));

        let mut comparison = SamplerState::new();
        comparison
            .set_filter_mode(TextureFilterMode::Comparison)
            .unwrap();
        assert!(matches!(
            comparison.apply(&mut backend, &capabilities, 0, &mut cache, true),
            Err(Error::NotSupported(_))
        ));

        assert!(log.is_empty());
    }
}
