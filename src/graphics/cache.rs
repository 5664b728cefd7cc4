//! Shadow copies of what a context last handed to its backend.

use super::{
    state::{
        blend::BlendCache, depth_stencil::DepthStencilCache, rasterizer::RasterizerCache,
        sampler::SamplerCache,
    },
    MAX_SAMPLER_SLOTS,
};

/// Last applied state of every category.
///
/// Only meaningful after a forced apply, a fresh cache holds defaults the backend may not have.
#[derive(Debug, Default)]
pub(crate) struct StateCache {
    /// Blending.
    pub(crate) blend: BlendCache,
    /// Depth and stencil.
    pub(crate) depth_stencil: DepthStencilCache,
    /// Rasterization.
    pub(crate) rasterizer: RasterizerCache,
    /// One per sampler slot.
    pub(crate) samplers: [SamplerCache; MAX_SAMPLER_SLOTS],
}
