//! Color and alpha blending.

use std::ops::BitOr;

use super::{StateLifecycle, StateObject};
use crate::{
    error::{Error, Result},
    graphics::{
        backend::{BlendFactors, BlendTarget, Capabilities, StateBackend},
        device::GraphicsDevice,
        resource::ResourceKind,
        Color, MAX_RENDER_TARGETS,
    },
};

/// Factor a source or destination color is multiplied with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Blend {
    /// `(1, 1, 1, 1)`.
    One,
    /// `(0, 0, 0, 0)`.
    Zero,
    /// Source color.
    SourceColor,
    /// One minus the source color.
    InverseSourceColor,
    /// Source alpha.
    SourceAlpha,
    /// One minus the source alpha.
    InverseSourceAlpha,
    /// Destination color.
    DestinationColor,
    /// One minus the destination color.
    InverseDestinationColor,
    /// Destination alpha.
    DestinationAlpha,
    /// One minus the destination alpha.
    InverseDestinationAlpha,
    /// [`BlendState::blend_factor`].
    BlendFactor,
    /// One minus [`BlendState::blend_factor`].
    InverseBlendFactor,
    /// Source alpha clamped to one minus the destination alpha.
    SourceAlphaSaturation,
}

/// How the weighted source and destination are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFunction {
    /// `source + destination`.
    Add,
    /// `source - destination`.
    Subtract,
    /// `destination - source`.
    ReverseSubtract,
    /// `min(source, destination)`.
    Min,
    /// `max(source, destination)`.
    Max,
}

/// Set of color channels written to the render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorWriteChannels(u8);

impl ColorWriteChannels {
    /// Write nothing.
    pub const NONE: Self = Self(0);
    /// Red channel.
    pub const RED: Self = Self(0b0001);
    /// Green channel.
    pub const GREEN: Self = Self(0b0010);
    /// Blue channel.
    pub const BLUE: Self = Self(0b0100);
    /// Alpha channel.
    pub const ALPHA: Self = Self(0b1000);
    /// Every channel.
    pub const ALL: Self = Self(0b1111);

    /// Raw bits, red is the lowest bit.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether all channels of `other` are written.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ColorWriteChannels {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Blending of a single render target.
///
/// The fields can only be reached mutably through [`BlendState::target_mut`], which refuses access once the owning state is locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetBlendState {
    /// Alpha blend equation.
    pub alpha_blend_function: BlendFunction,
    /// Alpha destination factor.
    pub alpha_destination_blend: Blend,
    /// Alpha source factor.
    pub alpha_source_blend: Blend,
    /// Color blend equation.
    pub color_blend_function: BlendFunction,
    /// Color destination factor.
    pub color_destination_blend: Blend,
    /// Color source factor.
    pub color_source_blend: Blend,
    /// Channels written.
    pub color_write_channels: ColorWriteChannels,
}

impl TargetBlendState {
    /// Blending disabled, write everything.
    pub const DEFAULT: Self = Self::with_factors(Blend::One, Blend::Zero);

    /// Same source and destination factors for color and alpha.
    const fn with_factors(source: Blend, destination: Blend) -> Self {
        Self {
            alpha_blend_function: BlendFunction::Add,
            alpha_destination_blend: destination,
            alpha_source_blend: source,
            color_blend_function: BlendFunction::Add,
            color_destination_blend: destination,
            color_source_blend: source,
            color_write_channels: ColorWriteChannels::ALL,
        }
    }

    /// Whether the factors actually blend, `One * source + Zero * destination` is a plain overwrite.
    #[inline]
    #[must_use]
    pub fn blend_enabled(&self) -> bool {
        !(self.color_source_blend == Blend::One
            && self.color_destination_blend == Blend::Zero
            && self.alpha_source_blend == Blend::One
            && self.alpha_destination_blend == Blend::Zero)
    }

    /// All four factors as fed to a single combined backend call.
    #[inline]
    #[must_use]
    pub const fn factors(&self) -> BlendFactors {
        BlendFactors {
            color_source: self.color_source_blend,
            color_destination: self.color_destination_blend,
            alpha_source: self.alpha_source_blend,
            alpha_destination: self.alpha_destination_blend,
        }
    }
}

impl Default for TargetBlendState {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// How pixel shader output is combined with the render target.
///
/// The un-indexed accessors like [`BlendState::color_source_blend`] operate on render target `0`.
///
/// # Example
///
/// ```
/// use kestrel::graphics::{Blend, BlendState};
///
/// # fn main() -> kestrel::Result<()> {
/// let mut state = BlendState::new();
/// state.set_color_source_blend(Blend::SourceAlpha)?;
/// state.set_color_destination_blend(Blend::InverseSourceAlpha)?;
///
/// // Presets can't be changed, but their clones can
/// let mut preset = BlendState::OPAQUE;
/// assert!(preset.set_alpha_source_blend(Blend::One).is_err());
/// assert!(preset.clone().set_alpha_source_blend(Blend::One).is_ok());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BlendState {
    /// Lock state.
    lifecycle: StateLifecycle,
    /// Per render target blending.
    targets: [TargetBlendState; MAX_RENDER_TARGETS],
    /// Constant color for [`Blend::BlendFactor`].
    blend_factor: Color,
    /// Multisample coverage mask.
    multi_sample_mask: u32,
    /// Use every target's own settings instead of target `0` for all.
    independent_blend_enable: bool,
}

impl BlendState {
    /// Overwrite the destination.
    pub const OPAQUE: Self = Self::preset("BlendState.Opaque", Blend::One, Blend::Zero);
    /// Premultiplied alpha blending.
    pub const ALPHA_BLEND: Self =
        Self::preset("BlendState.AlphaBlend", Blend::One, Blend::InverseSourceAlpha);
    /// Add the alpha weighted source to the destination.
    pub const ADDITIVE: Self = Self::preset("BlendState.Additive", Blend::SourceAlpha, Blend::One);
    /// Blending for colors that are not premultiplied.
    pub const NON_PREMULTIPLIED: Self = Self::preset(
        "BlendState.NonPremultiplied",
        Blend::SourceAlpha,
        Blend::InverseSourceAlpha,
    );

    /// Create a mutable state with blending disabled.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lifecycle: StateLifecycle::Mutable,
            targets: [TargetBlendState::DEFAULT; MAX_RENDER_TARGETS],
            blend_factor: Color::WHITE,
            multi_sample_mask: u32::MAX,
            independent_blend_enable: false,
        }
    }

    /// Construct a locked built-in.
    const fn preset(name: &'static str, source: Blend, destination: Blend) -> Self {
        Self {
            lifecycle: StateLifecycle::Preset(name),
            targets: [TargetBlendState::with_factors(source, destination); MAX_RENDER_TARGETS],
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

    /// Blending of every render target.
    #[inline]
    #[must_use]
    pub const fn targets(&self) -> &[TargetBlendState; MAX_RENDER_TARGETS] {
        &self.targets
    }

    /// Mutable blending of a single render target.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    /// - [`Error::InvalidArgument`] when `index` is not below [`MAX_RENDER_TARGETS`].
    #[inline]
    pub fn target_mut(&mut self, index: usize) -> Result<&mut TargetBlendState> {
        self.edit()?
            .targets
            .get_mut(index)
            .ok_or_else(|| Error::InvalidArgument(format!("render target index {index} out of range")))
    }

    /// Alpha blend equation of render target `0`.
    #[inline]
    #[must_use]
    pub const fn alpha_blend_function(&self) -> BlendFunction {
        self.targets[0].alpha_blend_function
    }

    /// Alpha destination factor of render target `0`.
    #[inline]
    #[must_use]
    pub const fn alpha_destination_blend(&self) -> Blend {
        self.targets[0].alpha_destination_blend
    }

    /// Alpha source factor of render target `0`.
    #[inline]
    #[must_use]
    pub const fn alpha_source_blend(&self) -> Blend {
        self.targets[0].alpha_source_blend
    }

    /// Color blend equation of render target `0`.
    #[inline]
    #[must_use]
    pub const fn color_blend_function(&self) -> BlendFunction {
        self.targets[0].color_blend_function
    }

    /// Color destination factor of render target `0`.
    #[inline]
    #[must_use]
    pub const fn color_destination_blend(&self) -> Blend {
        self.targets[0].color_destination_blend
    }

    /// Color source factor of render target `0`.
    #[inline]
    #[must_use]
    pub const fn color_source_blend(&self) -> Blend {
        self.targets[0].color_source_blend
    }

    /// Channels written to render target `0`.
    #[inline]
    #[must_use]
    pub const fn color_write_channels(&self) -> ColorWriteChannels {
        self.targets[0].color_write_channels
    }

    /// Constant blend color.
    #[inline]
    #[must_use]
    pub const fn blend_factor(&self) -> Color {
        self.blend_factor
    }

    /// Multisample coverage mask.
    #[inline]
    #[must_use]
    pub const fn multi_sample_mask(&self) -> u32 {
        self.multi_sample_mask
    }

    /// Whether every render target uses its own blending.
    #[inline]
    #[must_use]
    pub const fn independent_blend_enable(&self) -> bool {
        self.independent_blend_enable
    }

    /// Set the alpha blend equation of render target `0`.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_alpha_blend_function(&mut self, value: BlendFunction) -> Result<()> {
        self.edit()?.targets[0].alpha_blend_function = value;

        Ok(())
    }

    /// Set the alpha destination factor of render target `0`.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_alpha_destination_blend(&mut self, value: Blend) -> Result<()> {
        self.edit()?.targets[0].alpha_destination_blend = value;

        Ok(())
    }

    /// Set the alpha source factor of render target `0`.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_alpha_source_blend(&mut self, value: Blend) -> Result<()> {
        self.edit()?.targets[0].alpha_source_blend = value;

        Ok(())
    }

    /// Set the color blend equation of render target `0`.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_color_blend_function(&mut self, value: BlendFunction) -> Result<()> {
        self.edit()?.targets[0].color_blend_function = value;

        Ok(())
    }

    /// Set the color destination factor of render target `0`.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_color_destination_blend(&mut self, value: Blend) -> Result<()> {
        self.edit()?.targets[0].color_destination_blend = value;

        Ok(())
    }

    /// Set the color source factor of render target `0`.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_color_source_blend(&mut self, value: Blend) -> Result<()> {
        self.edit()?.targets[0].color_source_blend = value;

        Ok(())
    }

    /// Set the channels written to render target `0`.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_color_write_channels(&mut self, value: ColorWriteChannels) -> Result<()> {
        self.edit()?.targets[0].color_write_channels = value;

        Ok(())
    }

    /// Set the constant blend color.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_blend_factor(&mut self, value: Color) -> Result<()> {
        self.edit()?.blend_factor = value;

        Ok(())
    }

    /// Set the multisample coverage mask.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_multi_sample_mask(&mut self, value: u32) -> Result<()> {
        self.edit()?.multi_sample_mask = value;

        Ok(())
    }

    /// Set whether every render target uses its own blending.
    ///
    /// # Errors
    ///
    /// - When the state is a preset or already bound.
    #[inline]
    pub fn set_independent_blend_enable(&mut self, value: bool) -> Result<()> {
        self.edit()?.independent_blend_enable = value;

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
        capabilities: &Capabilities,
        last: &mut BlendCache,
        force: bool,
    ) -> Result<()> {
        // Shared calls touch every target while independent calls touch one, the shadow entries can't be trusted across a switch
        let force = force || last.independent != Some(self.independent_blend_enable);

        if self.independent_blend_enable {
            if !capabilities.independent_blend {
                return Err(Error::NotSupported(
                    "independent blending per render target".to_owned(),
                ));
            }

            for (index, (target, last_target)) in
                self.targets.iter().zip(last.targets.iter_mut()).enumerate()
            {
                apply_target(backend, BlendTarget::Index(index), target, last_target, force);
            }
        } else {
            apply_target(backend, BlendTarget::All, &self.targets[0], &mut last.targets[0], force);

            // Every target received the same calls
            let shared = last.targets[0];
            last.targets[1..].fill(shared);
        }
        last.independent = Some(self.independent_blend_enable);

        if force || self.blend_factor != last.blend_factor {
            backend.set_blend_color(self.blend_factor);
            last.blend_factor = self.blend_factor;
        }

        if force || self.multi_sample_mask != last.multi_sample_mask {
            backend.set_sample_mask(self.multi_sample_mask);
            last.multi_sample_mask = self.multi_sample_mask;
        }

        Ok(())
    }
}

impl Default for BlendState {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for BlendState {
    /// Detached mutable copy, also for presets and bound states.
    #[inline]
    fn clone(&self) -> Self {
        Self {
            lifecycle: StateLifecycle::Mutable,
            ..self.snapshot()
        }
    }
}

impl StateObject for BlendState {
    const KIND: ResourceKind = ResourceKind::BlendState;

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

/// Last applied blending of a single render target.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TargetBlendCache {
    /// Whether blending was enabled.
    enabled: bool,
    /// Equations, factors and write mask.
    state: TargetBlendState,
}

/// Last applied blend state of a context.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BlendCache {
    /// Per render target.
    targets: [TargetBlendCache; MAX_RENDER_TARGETS],
    /// Blend color.
    blend_factor: Color,
    /// Coverage mask.
    multi_sample_mask: u32,
    /// Mode of the last apply, `None` before the first one.
    independent: Option<bool>,
}

impl Default for BlendCache {
    fn default() -> Self {
        Self {
            targets: [TargetBlendCache::default(); MAX_RENDER_TARGETS],
            blend_factor: Color::WHITE,
            multi_sample_mask: u32::MAX,
            independent: None,
        }
    }
}

/// Diff and apply a single target.
fn apply_target<B: StateBackend + ?Sized>(
    backend: &mut B,
    id: BlendTarget,
    target: &TargetBlendState,
    last: &mut TargetBlendCache,
    force: bool,
) {
    let enabled = target.blend_enabled();
    if force || enabled != last.enabled {
        backend.set_blend_enabled(id, enabled);
        last.enabled = enabled;
    }

    // Both equations are set with a single call
    if force
        || target.color_blend_function != last.state.color_blend_function
        || target.alpha_blend_function != last.state.alpha_blend_function
    {
        backend.set_blend_equation(id, target.color_blend_function, target.alpha_blend_function);
        last.state.color_blend_function = target.color_blend_function;
        last.state.alpha_blend_function = target.alpha_blend_function;
    }

    // All four factors are set with a single call
    if force || target.factors() != last.state.factors() {
        backend.set_blend_function(id, target.factors());
        last.state.color_source_blend = target.color_source_blend;
        last.state.color_destination_blend = target.color_destination_blend;
        last.state.alpha_source_blend = target.alpha_source_blend;
        last.state.alpha_destination_blend = target.alpha_destination_blend;
    }

    if force || target.color_write_channels != last.state.color_write_channels {
        backend.set_color_write_mask(id, target.color_write_channels);
        last.state.color_write_channels = target.color_write_channels;
    }
}

#[cfg(test)]
mod tests {
    use super::{Blend, BlendCache, BlendFunction, BlendState, ColorWriteChannels};
    use crate::{
        error::Error,
        graphics::{
            backend::{
                recording::{BackendCall, RecordingBackend},
                BlendTarget, Capabilities, StateBackend as _,
            },
            state::StateLifecycle,
            Color,
        },
    };

    #[test]
    fn defaults() {
        let state = BlendState::new();

        assert_eq!(state.color_source_blend(), Blend::One);
        assert_eq!(state.color_destination_blend(), Blend::Zero);
        assert_eq!(state.color_blend_function(), BlendFunction::Add);
        assert_eq!(state.color_write_channels(), ColorWriteChannels::ALL);
        assert_eq!(state.blend_factor(), Color::WHITE);
        assert_eq!(state.multi_sample_mask(), u32::MAX);
        assert!(!state.independent_blend_enable());
        assert!(!state.targets()[0].blend_enabled());
    }

    #[test]
    fn presets_are_locked() {
        for mut preset in [
            BlendState::OPAQUE,
            BlendState::ALPHA_BLEND,
            BlendState::ADDITIVE,
            BlendState::NON_PREMULTIPLIED,
        ] {
            let before = preset.color_source_blend();

            assert!(matches!(
                preset.set_color_source_blend(Blend::Zero),
                Err(Error::DefaultStateModified { .. })
            ));
            assert!(preset.target_mut(2).is_err());
            assert!(preset.set_independent_blend_enable(true).is_err());
            assert_eq!(preset.color_source_blend(), before);
        }
    }

    #[test]
    fn preset_factors() {
        assert_eq!(BlendState::ALPHA_BLEND.color_source_blend(), Blend::One);
        assert_eq!(
            BlendState::ALPHA_BLEND.alpha_destination_blend(),
            Blend::InverseSourceAlpha
        );
        assert_eq!(BlendState::ADDITIVE.color_destination_blend(), Blend::One);
        assert_eq!(
            BlendState::NON_PREMULTIPLIED.color_source_blend(),
            Blend::SourceAlpha
        );
    }

    #[test]
    fn clone_detaches() {
        let mut copy = BlendState::ADDITIVE.clone();

        assert_eq!(copy.lifecycle(), StateLifecycle::Mutable);
        assert_eq!(copy.color_source_blend(), Blend::SourceAlpha);
        assert!(copy.set_color_source_blend(Blend::One).is_ok());
        assert_eq!(BlendState::ADDITIVE.color_source_blend(), Blend::SourceAlpha);
    }

    #[test]
    fn target_mut_range() {
        let mut state = BlendState::new();

        state.target_mut(3).unwrap().color_write_channels = ColorWriteChannels::RED;
        assert_eq!(state.targets()[3].color_write_channels, ColorWriteChannels::RED);
        assert!(matches!(state.target_mut(4), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn first_apply_is_complete_then_empty() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let capabilities = backend.capabilities();
        let mut last = BlendCache::default();

        BlendState::ALPHA_BLEND
            .apply(&mut backend, &capabilities, &mut last, false)
            .unwrap();
        // Enable, equation, function, write mask, color and sample mask
        assert_eq!(log.take().len(), 6);

        BlendState::ALPHA_BLEND
            .apply(&mut backend, &capabilities, &mut last, false)
            .unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn only_changed_groups_are_applied() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let capabilities = backend.capabilities();
        let mut last = BlendCache::default();

        BlendState::ALPHA_BLEND
            .apply(&mut backend, &capabilities, &mut last, true)
            .unwrap();
        log.clear();

        let mut state = BlendState::ALPHA_BLEND.clone();
        state.set_alpha_destination_blend(Blend::One).unwrap();
        state.apply(&mut backend, &capabilities, &mut last, false).unwrap();

        let calls = log.take();
        assert_eq!(calls.len(), 1);
        assert!(matches!(
            calls[0],
            BackendCall::BlendFunction(BlendTarget::All, factors) if factors.alpha_destination == Blend::One
        ));
    }

    #[test]
    fn force_applies_everything() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let capabilities = backend.capabilities();
        let mut last = BlendCache::default();

        BlendState::OPAQUE
            .apply(&mut backend, &capabilities, &mut last, true)
            .unwrap();
        let first = log.take().len();
        BlendState::OPAQUE
            .apply(&mut backend, &capabilities, &mut last, true)
            .unwrap();

        assert_eq!(log.take().len(), first);
    }

    #[test]
    fn independent_mode_uses_per_target_calls() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let capabilities = backend.capabilities();
        let mut last = BlendCache::default();

        let mut state = BlendState::new();
        state.set_independent_blend_enable(true).unwrap();
        state.target_mut(1).unwrap().color_source_blend = Blend::SourceAlpha;
        state.apply(&mut backend, &capabilities, &mut last, false).unwrap();

        let calls = log.take();
        assert!(!calls.iter().any(|call| matches!(
            call,
            BackendCall::BlendEnabled(BlendTarget::All, _)
                | BackendCall::BlendEquation(BlendTarget::All, ..)
                | BackendCall::BlendFunction(BlendTarget::All, _)
                | BackendCall::ColorWriteMask(BlendTarget::All, _)
        )));
        assert!(calls.contains(&BackendCall::BlendEnabled(BlendTarget::Index(1), true)));
        assert!(calls.contains(&BackendCall::BlendEnabled(BlendTarget::Index(0), false)));

        // Going back to shared mode must re-issue the shared calls
        BlendState::OPAQUE
            .apply(&mut backend, &capabilities, &mut last, false)
            .unwrap();
        let calls = log.take();
        assert!(calls.contains(&BackendCall::BlendEnabled(BlendTarget::All, false)));
        assert!(!calls
            .iter()
            .any(|call| matches!(call, BackendCall::BlendEnabled(BlendTarget::Index(_), _))));
    }

    #[test]
    fn independent_mode_unsupported() {
        let mut backend = RecordingBackend::with_capabilities(Capabilities::MINIMAL);
        let log = backend.log();
        let capabilities = backend.capabilities();
        let mut last = BlendCache::default();

        let mut state = BlendState::new();
        state.set_independent_blend_enable(true).unwrap();

        assert!(matches!(
            state.apply(&mut backend, &capabilities, &mut last, false),
            Err(Error::NotSupported(_))
        ));
        assert!(log.is_empty());
    }
}
