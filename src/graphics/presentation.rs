//! Back buffer configuration and the device negotiation bundle.

use std::ops::BitOr;

use raw_window_handle::RawWindowHandle;
use serde::Deserialize;

use super::{adapter::GraphicsAdapter, DepthFormat, GraphicsProfile, SurfaceFormat};
use crate::error::{Error, Result};

/// Set of display orientations.
///
/// Used both for what a game supports and, with a single flag set, for what the display currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "Vec<String>")]
pub struct DisplayOrientation(u8);

impl DisplayOrientation {
    /// Let the framework decide based on the preferred back buffer size.
    pub const DEFAULT: Self = Self(0);
    /// Rotated counter clockwise.
    pub const LANDSCAPE_LEFT: Self = Self(0b0001);
    /// Rotated clockwise.
    pub const LANDSCAPE_RIGHT: Self = Self(0b0010);
    /// Upright.
    pub const PORTRAIT: Self = Self(0b0100);
    /// Upside down.
    pub const PORTRAIT_DOWN: Self = Self(0b1000);
    /// Orientation can't be determined.
    pub const UNKNOWN: Self = Self(0b1_0000);

    /// Whether all flags of `other` are set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any flag of `other` is set.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether any landscape flag is set.
    #[inline]
    #[must_use]
    pub const fn is_landscape(self) -> bool {
        self.intersects(Self(Self::LANDSCAPE_LEFT.0 | Self::LANDSCAPE_RIGHT.0))
    }

    /// Whether any portrait flag is set.
    #[inline]
    #[must_use]
    pub const fn is_portrait(self) -> bool {
        self.intersects(Self(Self::PORTRAIT.0 | Self::PORTRAIT_DOWN.0))
    }

    /// Resolve [`Self::DEFAULT`] into concrete orientations.
    ///
    /// A wide back buffer supports both landscapes, otherwise portrait.
    #[inline]
    #[must_use]
    pub const fn effective(self, width: u32, height: u32) -> Self {
        if self.0 != Self::DEFAULT.0 {
            self
        } else if width > height {
            Self(Self::LANDSCAPE_LEFT.0 | Self::LANDSCAPE_RIGHT.0)
        } else {
            Self::PORTRAIT
        }
    }
}

impl BitOr for DisplayOrientation {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl From<Vec<String>> for DisplayOrientation {
    /// Parse a list of names like `["LandscapeLeft", "Portrait"]`, unknown names are ignored.
    #[inline]
    fn from(names: Vec<String>) -> Self {
        names
            .iter()
            .filter_map(|name| match name.as_str() {
                "LandscapeLeft" => Some(Self::LANDSCAPE_LEFT),
                "LandscapeRight" => Some(Self::LANDSCAPE_RIGHT),
                "Portrait" => Some(Self::PORTRAIT),
                "PortraitDown" => Some(Self::PORTRAIT_DOWN),
                _ => {
                    log::warn!("Ignoring unknown display orientation '{name}'");

                    None
                }
            })
            .fold(Self::DEFAULT, |acc, orientation| acc | orientation)
    }
}

/// When presenting waits for the vertical retrace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum PresentInterval {
    /// Same as [`Self::One`].
    #[default]
    Default,
    /// Wait for every retrace.
    One,
    /// Wait for every second retrace.
    Two,
    /// Present immediately, can tear.
    Immediate,
}

impl PresentInterval {
    /// Whether presenting is synchronized with the display.
    #[inline]
    #[must_use]
    pub const fn is_vsync(self) -> bool {
        !matches!(self, Self::Immediate)
    }
}

/// How the device presents to the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationParameters {
    /// Horizontal back buffer pixels.
    pub back_buffer_width: u32,
    /// Vertical back buffer pixels.
    pub back_buffer_height: u32,
    /// Back buffer pixel format.
    pub back_buffer_format: SurfaceFormat,
    /// Depth buffer format.
    pub depth_stencil_format: DepthFormat,
    /// Exclusive full screen.
    pub is_full_screen: bool,
    /// Samples per pixel, `0` for none.
    pub multi_sample_count: u32,
    /// Current orientation of the display.
    pub display_orientation: DisplayOrientation,
    /// Native window the device presents into, `None` for headless devices.
    pub device_window_handle: Option<RawWindowHandle>,
    /// Vertical retrace synchronization.
    pub presentation_interval: PresentInterval,
    /// Change the display mode instead of stretching a borderless window in full screen.
    pub hardware_mode_switch: bool,
}

impl PresentationParameters {
    /// Check the values can be used to create or reset a device.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] when a back buffer dimension is zero.
    /// - [`Error::InvalidArgument`] when the multisample count is not zero or a power of two.
    #[inline]
    pub fn validate(&self) -> Result<()> {
        if self.back_buffer_width == 0 || self.back_buffer_height == 0 {
            return Err(Error::InvalidArgument(format!(
                "back buffer size {}x{} must not be empty",
                self.back_buffer_width, self.back_buffer_height
            )));
        }

        if self.multi_sample_count != 0 && !self.multi_sample_count.is_power_of_two() {
            return Err(Error::InvalidArgument(format!(
                "multisample count {} is not a power of two",
                self.multi_sample_count
            )));
        }

        Ok(())
    }

    /// Swap the back buffer dimensions so they match `orientation`.
    ///
    /// # Returns
    ///
    /// - `true` when the dimensions were swapped.
    #[inline]
    pub fn orient(&mut self, orientation: DisplayOrientation) -> bool {
        self.display_orientation = orientation;

        let wide = self.back_buffer_width > self.back_buffer_height;
        let tall = self.back_buffer_width < self.back_buffer_height;
        if (orientation.is_landscape() && tall) || (orientation.is_portrait() && wide) {
            std::mem::swap(&mut self.back_buffer_width, &mut self.back_buffer_height);

            true
        } else {
            false
        }
    }
}

impl Default for PresentationParameters {
    #[inline]
    fn default() -> Self {
        Self {
            back_buffer_width: 800,
            back_buffer_height: 480,
            back_buffer_format: SurfaceFormat::Color,
            depth_stencil_format: DepthFormat::Depth24,
            is_full_screen: false,
            multi_sample_count: 0,
            display_orientation: DisplayOrientation::DEFAULT,
            device_window_handle: None,
            presentation_interval: PresentInterval::Default,
            hardware_mode_switch: true,
        }
    }
}

/// Everything needed to create a device.
///
/// The members are optional only so a [`PreparingDeviceSettingsEventArgs`] handler can clear them, device creation rejects a cleared member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicsDeviceInformation {
    /// Adapter to create the device on.
    pub adapter: Option<GraphicsAdapter>,
    /// Feature level.
    pub graphics_profile: GraphicsProfile,
    /// Back buffer configuration.
    pub presentation_parameters: Option<PresentationParameters>,
}

impl GraphicsDeviceInformation {
    /// Unwrap the members.
    ///
    /// # Errors
    ///
    /// - [`Error::NullDeviceSettings`] when a handler cleared the adapter or the presentation parameters.
    #[inline]
    pub fn into_parts(self) -> Result<(GraphicsAdapter, GraphicsProfile, PresentationParameters)> {
        let adapter = self.adapter.ok_or(Error::NullDeviceSettings { member: "adapter" })?;
        let presentation_parameters = self.presentation_parameters.ok_or(Error::NullDeviceSettings {
            member: "presentation_parameters",
        })?;

        Ok((adapter, self.graphics_profile, presentation_parameters))
    }
}

/// Argument of the preparing device settings event.
///
/// Handlers may replace or clear anything in [`Self::graphics_device_information`].
#[derive(Debug)]
pub struct PreparingDeviceSettingsEventArgs<'a> {
    /// Negotiated settings.
    pub graphics_device_information: &'a mut GraphicsDeviceInformation,
}
