//! Identity and lifetime tracking of resources living on a graphics device.

use std::{
    fmt,
    num::NonZeroU64,
    sync::atomic::{AtomicU64, Ordering},
};

use hashbrown::HashMap;

/// Counter for handing out unique device identifiers.
static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a [`crate::graphics::GraphicsDevice`].
///
/// Identifiers are never reused within a process, so a state object bound to a disposed device can never accidentally match a newly created one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(NonZeroU64);

impl DeviceId {
    /// Allocate a new unique identifier.
    pub(crate) fn next() -> Self {
        let id = NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed);

        // The counter starts at one and would need centuries to wrap
        Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN))
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

/// Identity of a single resource registered on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

/// What kind of resource is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ResourceKind {
    /// A bound [`crate::graphics::BlendState`].
    BlendState,
    /// A bound [`crate::graphics::DepthStencilState`].
    DepthStencilState,
    /// A bound [`crate::graphics::RasterizerState`].
    RasterizerState,
    /// A bound [`crate::graphics::SamplerState`].
    SamplerState,
}

impl ResourceKind {
    /// Human readable name, used in error messages.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BlendState => "blend state",
            Self::DepthStencilState => "depth stencil state",
            Self::RasterizerState => "rasterizer state",
            Self::SamplerState => "sampler state",
        }
    }
}

/// Book keeping of every resource bound to a single device.
///
/// Released in bulk when the device is disposed.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    /// Next identifier to hand out.
    next_id: u64,
    /// Live resources.
    resources: HashMap<ResourceId, ResourceKind>,
}

impl ResourceRegistry {
    /// Register a new resource and return its identity.
    pub(crate) fn register(&mut self, kind: ResourceKind) -> ResourceId {
        let id = ResourceId(self.next_id);
        self.next_id += 1;

        self.resources.insert(id, kind);

        id
    }

    /// Release every tracked resource.
    ///
    /// # Returns
    ///
    /// - Amount of resources that were still alive.
    pub(crate) fn release_all(&mut self) -> usize {
        let amount = self.resources.len();
        self.resources.clear();

        amount
    }

    /// Whether a resource is tracked by this registry.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: ResourceId) -> bool {
        self.resources.contains_key(&id)
    }

    /// Amount of tracked resources.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether nothing is tracked.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Amount of tracked resources of a single kind.
    #[inline]
    #[must_use]
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.resources.values().filter(|other| **other == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::{DeviceId, ResourceKind, ResourceRegistry};

    #[test]
    fn device_ids_are_unique() {
        let first = DeviceId::next();
        let second = DeviceId::next();

        assert_ne!(first, second);
    }

    #[test]
    fn register_and_release_all() {
        let mut registry = ResourceRegistry::default();

        let blend = registry.register(ResourceKind::BlendState);
        let sampler = registry.register(ResourceKind::SamplerState);
        assert_ne!(blend, sampler);
        assert_eq!(registry.count(ResourceKind::BlendState), 1);

        assert!(registry.contains(blend));
        assert!(registry.contains(sampler));

        assert_eq!(registry.release_all(), 2);
        assert!(!registry.contains(sampler));
        assert!(registry.is_empty());
    }
}
