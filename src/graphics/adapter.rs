//! Static description of a display adapter.

use super::{GraphicsProfile, SurfaceFormat};

/// Resolution and format of a display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayMode {
    /// Horizontal pixels.
    pub width: u32,
    /// Vertical pixels.
    pub height: u32,
    /// Pixel format.
    pub format: SurfaceFormat,
}

impl DisplayMode {
    /// Width divided by height.
    #[inline]
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// What a physical or virtual display adapter can do.
///
/// # Example
///
/// ```
/// use kestrel::graphics::{GraphicsAdapter, GraphicsProfile};
///
/// let adapter = GraphicsAdapter::new("Software").with_max_profile(GraphicsProfile::Reach);
///
/// assert!(adapter.is_profile_supported(GraphicsProfile::Reach));
/// assert!(!adapter.is_profile_supported(GraphicsProfile::HiDef));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicsAdapter {
    /// Human readable name.
    description: String,
    /// PCI vendor.
    vendor_id: u32,
    /// PCI device.
    device_id: u32,
    /// Highest supported profile.
    max_profile: GraphicsProfile,
    /// Highest multisample count for a back buffer.
    max_multi_sample_count: u32,
    /// Mode of the attached display.
    current_display_mode: DisplayMode,
}

impl GraphicsAdapter {
    /// Describe an adapter supporting [`GraphicsProfile::HiDef`], 8 samples and a 1920x1080 display.
    #[inline]
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            vendor_id: 0,
            device_id: 0,
            max_profile: GraphicsProfile::HiDef,
            max_multi_sample_count: 8,
            current_display_mode: DisplayMode {
                width: 1920,
                height: 1080,
                format: SurfaceFormat::Color,
            },
        }
    }

    /// Set the PCI vendor and device identifiers.
    #[inline]
    #[must_use]
    pub const fn with_ids(mut self, vendor_id: u32, device_id: u32) -> Self {
        self.vendor_id = vendor_id;
        self.device_id = device_id;

        self
    }

    /// Set the highest supported profile.
    #[inline]
    #[must_use]
    pub const fn with_max_profile(mut self, max_profile: GraphicsProfile) -> Self {
        self.max_profile = max_profile;

        self
    }

    /// Set the highest multisample count.
    #[inline]
    #[must_use]
    pub const fn with_max_multi_sample_count(mut self, max_multi_sample_count: u32) -> Self {
        self.max_multi_sample_count = max_multi_sample_count;

        self
    }

    /// Set the mode of the attached display.
    #[inline]
    #[must_use]
    pub const fn with_current_display_mode(mut self, current_display_mode: DisplayMode) -> Self {
        self.current_display_mode = current_display_mode;

        self
    }

    /// Human readable name.
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// PCI vendor.
    #[inline]
    #[must_use]
    pub const fn vendor_id(&self) -> u32 {
        self.vendor_id
    }

    /// PCI device.
    #[inline]
    #[must_use]
    pub const fn device_id(&self) -> u32 {
        self.device_id
    }

    /// Highest multisample count for a back buffer.
    #[inline]
    #[must_use]
    pub const fn max_multi_sample_count(&self) -> u32 {
        self.max_multi_sample_count
    }

    /// Mode of the attached display.
    #[inline]
    #[must_use]
    pub const fn current_display_mode(&self) -> DisplayMode {
        self.current_display_mode
    }

    /// Whether a device with `profile` can be created on this adapter.
    #[inline]
    #[must_use]
    pub fn is_profile_supported(&self, profile: GraphicsProfile) -> bool {
        profile <= self.max_profile
    }

    /// Clamp a requested multisample count to what the adapter supports.
    ///
    /// The result is a power of two, `0` and `1` both mean no multisampling and become `0`.
    #[inline]
    #[must_use]
    pub fn clamp_multi_sample_count(&self, requested: u32) -> u32 {
        let clamped = requested.min(self.max_multi_sample_count);
        if clamped <= 1 {
            0
        } else {
            // Round down to a power of two
            1 << (u32::BITS - 1 - clamped.leading_zeros())
        }
    }
}

impl Default for GraphicsAdapter {
    #[inline]
    fn default() -> Self {
        Self::new("Default adapter")
    }
}

#[cfg(test)]
mod tests {
    use super::{DisplayMode, GraphicsAdapter};
    use crate::graphics::{GraphicsProfile, SurfaceFormat};

    #[test]
    fn profile_support() {
        let hidef = GraphicsAdapter::default();

        assert!(hidef.is_profile_supported(GraphicsProfile::Reach));
        assert!(hidef.is_profile_supported(GraphicsProfile::HiDef));
    }

    #[test]
    fn multi_sample_clamp() {
        let adapter = GraphicsAdapter::default().with_max_multi_sample_count(6);

        assert_eq!(adapter.clamp_multi_sample_count(0), 0);
        assert_eq!(adapter.clamp_multi_sample_count(1), 0);
        assert_eq!(adapter.clamp_multi_sample_count(3), 2);
        assert_eq!(adapter.clamp_multi_sample_count(4), 4);
        assert_eq!(adapter.clamp_multi_sample_count(16), 4);
    }

    #[test]
    fn aspect_ratio() {
        let mode = DisplayMode {
            width: 800,
            height: 400,
            format: SurfaceFormat::Color,
        };

        assert!((mode.aspect_ratio() - 2.0).abs() < f32::EPSILON);
    }
}
