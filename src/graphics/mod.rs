//! Graphics device, render state objects and the backends they are applied to.

pub mod adapter;
pub mod backend;
mod cache;
pub mod context;
pub mod device;
pub mod manager;
pub mod presentation;
pub mod resource;
pub mod state;

pub use adapter::{DisplayMode, GraphicsAdapter};
pub use context::GraphicsContext;
pub use device::GraphicsDevice;
pub use manager::GraphicsDeviceManager;
pub use presentation::{
    DisplayOrientation, GraphicsDeviceInformation, PreparingDeviceSettingsEventArgs,
    PresentInterval, PresentationParameters,
};
pub use state::{
    blend::{Blend, BlendFunction, BlendState, ColorWriteChannels, TargetBlendState},
    depth_stencil::{DepthStencilState, StencilOperation},
    rasterizer::{CullMode, FillMode, RasterizerState},
    sampler::{SamplerState, TextureAddressMode, TextureFilter, TextureFilterMode},
    StateLifecycle,
};

use serde::Deserialize;

/// Amount of simultaneous render targets that can have their own blend state.
pub const MAX_RENDER_TARGETS: usize = 4;

/// Amount of sampler slots on a device.
pub const MAX_SAMPLER_SLOTS: usize = 16;

/// 32 bit color with 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Fully opaque white.
    pub const WHITE: Self = Self::new(0xFF, 0xFF, 0xFF, 0xFF);
    /// Fully opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 0xFF);
    /// Black with zero alpha.
    pub const TRANSPARENT_BLACK: Self = Self::new(0, 0, 0, 0);
    /// The color XNA samples clear the screen with.
    pub const CORNFLOWER_BLUE: Self = Self::new(0x64, 0x95, 0xED, 0xFF);

    /// Construct from the separate channels.
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Channels normalized to `0.0..=1.0`, in RGBA order.
    #[inline]
    #[must_use]
    pub fn to_vector4(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a].map(|channel| f32::from(channel) / 255.0)
    }
}

/// Comparison used by depth, stencil and comparison sampler tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    /// Always pass.
    #[default]
    Always,
    /// Never pass.
    Never,
    /// Pass if the new value is less than the stored one.
    Less,
    /// Pass if the new value is less than or equal to the stored one.
    LessEqual,
    /// Pass if the values are equal.
    Equal,
    /// Pass if the new value is greater than or equal to the stored one.
    GreaterEqual,
    /// Pass if the new value is greater than the stored one.
    Greater,
    /// Pass if the values differ.
    NotEqual,
}

/// Feature level a device is created with.
///
/// Changing the profile of a running game always requires a brand new device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize)]
pub enum GraphicsProfile {
    /// Limited feature set, supported everywhere.
    Reach,
    /// Full feature set.
    #[default]
    HiDef,
}

/// Pixel format of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[non_exhaustive]
pub enum SurfaceFormat {
    /// 8 bits per channel, RGBA order.
    #[default]
    Color,
    /// 8 bits per channel, BGRA order.
    Bgra32,
    /// 5 bits red, 6 bits green, 5 bits blue.
    Bgr565,
    /// 4 bits per channel.
    Bgra4444,
    /// 10 bits per color channel, 2 bits alpha.
    Rgba1010102,
    /// 16 bit float per channel.
    HalfVector4,
    /// 32 bit float per channel.
    Vector4,
}

/// Format of the depth and stencil buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum DepthFormat {
    /// No depth buffer.
    None,
    /// 16 bit depth.
    Depth16,
    /// 24 bit depth.
    #[default]
    Depth24,
    /// 24 bit depth with an 8 bit stencil buffer.
    Depth24Stencil8,
}

impl DepthFormat {
    /// Factor a constant depth bias is multiplied with before it's given to the backend.
    ///
    /// The XNA depth bias is expressed as a fraction of the depth range, backends expect it in units of the smallest representable depth value.
    #[inline]
    #[must_use]
    pub const fn depth_bias_scale(self) -> f32 {
        match self {
            Self::None => 0.0,
            Self::Depth16 => 65_535.0,
            Self::Depth24 | Self::Depth24Stencil8 => 16_777_215.0,
        }
    }

    /// Whether the format has stencil bits.
    #[inline]
    #[must_use]
    pub const fn has_stencil(self) -> bool {
        matches!(self, Self::Depth24Stencil8)
    }
}

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// Separate triangles, three vertices each.
    TriangleList,
    /// Connected triangles sharing two vertices.
    TriangleStrip,
    /// Separate lines, two vertices each.
    LineList,
    /// Connected lines.
    LineStrip,
    /// Separate points.
    PointList,
}

impl PrimitiveType {
    /// Amount of vertices needed for drawing `primitive_count` primitives.
    #[inline]
    #[must_use]
    pub const fn vertex_count(self, primitive_count: usize) -> usize {
        match self {
            Self::TriangleList => primitive_count * 3,
            Self::TriangleStrip => primitive_count + 2,
            Self::LineList => primitive_count * 2,
            Self::LineStrip => primitive_count + 1,
            Self::PointList => primitive_count,
        }
    }
}

/// Which buffers a clear call touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClearOptions(u8);

impl ClearOptions {
    /// Clear the color target.
    pub const TARGET: Self = Self(0b001);
    /// Clear the depth buffer.
    pub const DEPTH_BUFFER: Self = Self(0b010);
    /// Clear the stencil buffer.
    pub const STENCIL: Self = Self(0b100);
    /// Clear everything.
    pub const ALL: Self = Self(0b111);

    /// Whether all flags of `other` are set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ClearOptions {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{ClearOptions, Color, DepthFormat, PrimitiveType};

    #[test]
    fn color_to_vector() {
        assert_eq!(Color::WHITE.to_vector4(), [1.0; 4]);
        assert_eq!(Color::TRANSPARENT_BLACK.to_vector4(), [0.0; 4]);
    }

    #[test]
    fn depth_bias_scale() {
        assert!(DepthFormat::None.depth_bias_scale().abs() < f32::EPSILON);
        assert!(DepthFormat::Depth24Stencil8.depth_bias_scale() > DepthFormat::Depth16.depth_bias_scale());
    }

    #[test]
    fn vertex_count() {
        assert_eq!(PrimitiveType::TriangleList.vertex_count(2), 6);
        assert_eq!(PrimitiveType::TriangleStrip.vertex_count(2), 4);
        assert_eq!(PrimitiveType::LineStrip.vertex_count(3), 4);
    }

    #[test]
    fn clear_options() {
        let options = ClearOptions::TARGET | ClearOptions::STENCIL;

        assert!(options.contains(ClearOptions::TARGET));
        assert!(!options.contains(ClearOptions::DEPTH_BUFFER));
        assert!(ClearOptions::ALL.contains(options));
    }
}
