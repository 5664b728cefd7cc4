//! Render state objects.
//!
//! Every state category (blend, depth stencil, rasterizer, sampler) follows the same lifecycle:
//!
//! | Lifecycle | Setters | Can be bound |
//! | --- | --- | --- |
//! | [`StateLifecycle::Mutable`] | yes | yes, once |
//! | [`StateLifecycle::Preset`] | no | no |
//! | [`StateLifecycle::Bound`] | no | only again to the same device |
//!
//! The two locked variants are terminal, the only way to get an editable object back is [`Clone::clone`], which always returns a detached [`StateLifecycle::Mutable`] copy.

pub mod blend;
pub mod depth_stencil;
pub mod rasterizer;
pub mod sampler;

use crate::{
    error::{Error, Result},
    graphics::resource::{DeviceId, ResourceId, ResourceKind, ResourceRegistry},
};

/// Where a state object is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateLifecycle {
    /// Freshly constructed or cloned, every setter works.
    Mutable,
    /// One of the built-in presets, immutable forever.
    Preset(&'static str),
    /// Attached to a device, immutable forever.
    Bound {
        /// Device the state belongs to.
        device: DeviceId,
        /// Registration of the state on that device.
        resource: ResourceId,
    },
}

impl StateLifecycle {
    /// Whether setters are forbidden.
    #[inline]
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        !matches!(self, Self::Mutable)
    }

    /// Whether this is a built-in preset.
    #[inline]
    #[must_use]
    pub const fn is_preset(&self) -> bool {
        matches!(self, Self::Preset(_))
    }

    /// Device the state is bound to, if any.
    #[inline]
    #[must_use]
    pub const fn device(&self) -> Option<DeviceId> {
        match self {
            Self::Bound { device, .. } => Some(*device),
            _ => None,
        }
    }

    /// Fail if a setter isn't allowed anymore.
    ///
    /// The error tells the preset and bound cases apart because the fix for each is different.
    pub(crate) fn ensure_mutable(&self, kind: ResourceKind) -> Result<()> {
        match *self {
            Self::Mutable => Ok(()),
            Self::Preset(state) => Err(Error::DefaultStateModified { state }),
            Self::Bound { .. } => Err(Error::BoundStateModified { state: kind.name() }),
        }
    }

    /// Attach to a device, registering the state in the device's resource tracking.
    ///
    /// # Returns
    ///
    /// - `true` when the state was newly bound, `false` when it was already bound to the same device.
    ///
    /// # Errors
    ///
    /// - [`Error::DefaultStateBound`] when this is a preset.
    /// - [`Error::BoundToOtherDevice`] when already bound to another device, the existing binding is kept.
    pub(crate) fn bind(
        &mut self,
        kind: ResourceKind,
        device: DeviceId,
        registry: &mut ResourceRegistry,
    ) -> Result<bool> {
        match *self {
            Self::Preset(state) => Err(Error::DefaultStateBound { state }),
            Self::Bound { device: bound, .. } if bound == device => Ok(false),
            Self::Bound { .. } => Err(Error::BoundToOtherDevice { state: kind.name() }),
            Self::Mutable => {
                let resource = registry.register(kind);
                *self = Self::Bound { device, resource };

                log::debug!("Bound {} to {device}", kind.name());

                Ok(true)
            }
        }
    }
}

/// Shared access to the lifecycle of every state category.
pub(crate) trait StateObject {
    /// Category used for resource tracking and error messages.
    const KIND: ResourceKind;

    /// Current lifecycle.
    fn lifecycle(&self) -> StateLifecycle;

    /// Mutable lifecycle, only used for binding.
    fn lifecycle_mut(&mut self) -> &mut StateLifecycle;

    /// Copy including the lifecycle, as opposed to [`Clone::clone`].
    fn snapshot(&self) -> Self;
}
