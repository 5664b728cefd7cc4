//! Game configuration.

use std::{path::Path, time::Duration};

use serde::Deserialize;

use crate::{
    error::Result,
    game::Timing,
    graphics::{DepthFormat, DisplayOrientation, GraphicsProfile, SurfaceFormat},
};

/// Initial game configuration passed to [`crate::game::GameHost::new`].
///
/// There's three ways to initialize the config:
///
/// # Example
///
/// ```rust
/// # use kestrel::Config;
/// Config {
///   title: "My Game".to_owned(),
///   ..Default::default()
/// };
/// ```
///
/// # Example
///
/// ```rust
/// # use kestrel::Config;
/// Config::default().with_title("My Game");
/// ```
///
/// # Example
///
/// ```rust
/// # use kestrel::Config;
/// let config = Config::from_toml(r#"
///   title = "My Game"
///   target_elapsed_time = 0.02
///
///   [graphics]
///   preferred_back_buffer_width = 1280
///   preferred_back_buffer_height = 720
/// "#)?;
///
/// assert_eq!(config.graphics.preferred_back_buffer_width, 1280);
/// # Ok::<(), kestrel::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the game, shown in the title bar by windowed platforms.
    ///
    /// Defaults to `"Kestrel"`.
    pub title: String,
    /// Update with a constant [`Self::target_elapsed_time`] instead of once per frame with the measured time.
    ///
    /// Defaults to `true`.
    pub is_fixed_time_step: bool,
    /// Duration of a single update in fixed time step mode.
    ///
    /// Seconds in TOML.
    ///
    /// Defaults to 166667 ticks of 100 nanoseconds, roughly 60 updates a second.
    #[serde(deserialize_with = "seconds")]
    pub target_elapsed_time: Duration,
    /// Upper bound of the time that's accounted for in a single tick, anything above is dropped.
    ///
    /// Seconds in TOML.
    ///
    /// Defaults to half a second.
    #[serde(deserialize_with = "seconds")]
    pub max_elapsed_time: Duration,
    /// Time slept every tick while the game is in the background.
    ///
    /// Seconds in TOML.
    ///
    /// Defaults to 20 milliseconds.
    #[serde(deserialize_with = "seconds")]
    pub inactive_sleep_time: Duration,
    /// Preferred graphics settings of the device manager.
    pub graphics: GraphicsConfig,
}

impl Config {
    /// Parse a TOML document, missing values keep their defaults.
    ///
    /// # Errors
    ///
    /// - When the document is not valid TOML or a value has the wrong type.
    #[inline]
    pub fn from_toml(source: &str) -> Result<Self> {
        let config = toml::from_str(source)?;

        Ok(config)
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    ///
    /// - When the file could not be read.
    /// - When the file is not valid TOML or a value has the wrong type.
    #[inline]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading configuration from '{}'", path.display());

        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// Set the name of the game.
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();

        self
    }

    /// Set whether updates use a constant time step.
    #[inline]
    #[must_use]
    pub const fn with_fixed_time_step(mut self, is_fixed_time_step: bool) -> Self {
        self.is_fixed_time_step = is_fixed_time_step;

        self
    }

    /// Set the duration of a single fixed update.
    #[inline]
    #[must_use]
    pub const fn with_target_elapsed_time(mut self, target_elapsed_time: Duration) -> Self {
        self.target_elapsed_time = target_elapsed_time;

        self
    }

    /// Set the maximum time accounted for in a single tick.
    #[inline]
    #[must_use]
    pub const fn with_max_elapsed_time(mut self, max_elapsed_time: Duration) -> Self {
        self.max_elapsed_time = max_elapsed_time;

        self
    }

    /// Set the time slept every tick while the game is in the background.
    #[inline]
    #[must_use]
    pub const fn with_inactive_sleep_time(mut self, inactive_sleep_time: Duration) -> Self {
        self.inactive_sleep_time = inactive_sleep_time;

        self
    }

    /// Set the preferred graphics settings.
    #[inline]
    #[must_use]
    pub fn with_graphics(mut self, graphics: GraphicsConfig) -> Self {
        self.graphics = graphics;

        self
    }

    /// Game loop settings derived from this configuration.
    #[inline]
    #[must_use]
    pub const fn timing(&self) -> Timing {
        Timing {
            is_fixed_time_step: self.is_fixed_time_step,
            target_elapsed_time: self.target_elapsed_time,
            max_elapsed_time: self.max_elapsed_time,
            inactive_sleep_time: self.inactive_sleep_time,
        }
    }
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        let timing = Timing::default();

        Self {
            title: "Kestrel".to_owned(),
            is_fixed_time_step: timing.is_fixed_time_step,
            target_elapsed_time: timing.target_elapsed_time,
            max_elapsed_time: timing.max_elapsed_time,
            inactive_sleep_time: timing.inactive_sleep_time,
            graphics: GraphicsConfig::default(),
        }
    }
}

/// Preferred settings the [`crate::graphics::GraphicsDeviceManager`] starts with.
///
/// They are only a wish, the preparing device settings handlers and the adapter have the final say.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct GraphicsConfig {
    /// Horizontal back buffer pixels.
    ///
    /// Defaults to `800`.
    pub preferred_back_buffer_width: u32,
    /// Vertical back buffer pixels.
    ///
    /// Defaults to `480`.
    pub preferred_back_buffer_height: u32,
    /// Back buffer pixel format.
    ///
    /// Defaults to [`SurfaceFormat::Color`].
    pub preferred_back_buffer_format: SurfaceFormat,
    /// Depth buffer format.
    ///
    /// Defaults to [`DepthFormat::Depth24`].
    pub preferred_depth_stencil_format: DepthFormat,
    /// Request multisampled anti-aliasing.
    ///
    /// Defaults to `false`.
    pub prefer_multi_sampling: bool,
    /// Wait for the vertical retrace when presenting.
    ///
    /// Defaults to `true`.
    pub synchronize_with_vertical_retrace: bool,
    /// Start in full screen.
    ///
    /// Defaults to `false`.
    pub is_full_screen: bool,
    /// Change the display mode in full screen instead of stretching a borderless window.
    ///
    /// Defaults to `true`.
    pub hardware_mode_switch: bool,
    /// Requested feature level, lowered to [`GraphicsProfile::Reach`] when the adapter can't do it.
    ///
    /// Defaults to [`GraphicsProfile::HiDef`].
    pub graphics_profile: GraphicsProfile,
    /// Orientations the game can be played in.
    ///
    /// A list of names in TOML, for example `["LandscapeLeft", "Portrait"]`.
    ///
    /// Defaults to [`DisplayOrientation::DEFAULT`], which picks based on the preferred back buffer size.
    pub supported_orientations: DisplayOrientation,
    /// Offset pixel centers by half a pixel, only changeable before the device exists.
    ///
    /// Defaults to `false`.
    pub prefer_half_pixel_offset: bool,
}

impl GraphicsConfig {
    /// Set the preferred back buffer size.
    #[inline]
    #[must_use]
    pub const fn with_back_buffer_size(mut self, width: u32, height: u32) -> Self {
        self.preferred_back_buffer_width = width;
        self.preferred_back_buffer_height = height;

        self
    }

    /// Set the preferred back buffer pixel format.
    #[inline]
    #[must_use]
    pub const fn with_back_buffer_format(mut self, format: SurfaceFormat) -> Self {
        self.preferred_back_buffer_format = format;

        self
    }

    /// Set the preferred depth buffer format.
    #[inline]
    #[must_use]
    pub const fn with_depth_stencil_format(mut self, format: DepthFormat) -> Self {
        self.preferred_depth_stencil_format = format;

        self
    }

    /// Set whether multisampled anti-aliasing is requested.
    #[inline]
    #[must_use]
    pub const fn with_multi_sampling(mut self, prefer_multi_sampling: bool) -> Self {
        self.prefer_multi_sampling = prefer_multi_sampling;

        self
    }

    /// Set whether presenting waits for the vertical retrace.
    #[inline]
    #[must_use]
    pub const fn with_vsync(mut self, synchronize_with_vertical_retrace: bool) -> Self {
        self.synchronize_with_vertical_retrace = synchronize_with_vertical_retrace;

        self
    }

    /// Set whether the game starts in full screen.
    #[inline]
    #[must_use]
    pub const fn with_full_screen(mut self, is_full_screen: bool) -> Self {
        self.is_full_screen = is_full_screen;

        self
    }

    /// Set the requested feature level.
    #[inline]
    #[must_use]
    pub const fn with_graphics_profile(mut self, graphics_profile: GraphicsProfile) -> Self {
        self.graphics_profile = graphics_profile;

        self
    }

    /// Set the orientations the game can be played in.
    #[inline]
    #[must_use]
    pub const fn with_supported_orientations(mut self, orientations: DisplayOrientation) -> Self {
        self.supported_orientations = orientations;

        self
    }
}

impl Default for GraphicsConfig {
    #[inline]
    fn default() -> Self {
        Self {
            preferred_back_buffer_width: 800,
            preferred_back_buffer_height: 480,
            preferred_back_buffer_format: SurfaceFormat::Color,
            preferred_depth_stencil_format: DepthFormat::Depth24,
            prefer_multi_sampling: false,
            synchronize_with_vertical_retrace: true,
            is_full_screen: false,
            hardware_mode_switch: true,
            graphics_profile: GraphicsProfile::HiDef,
            supported_orientations: DisplayOrientation::DEFAULT,
            prefer_half_pixel_offset: false,
        }
    }
}

/// Deserialize fractional seconds into a duration.
fn seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let seconds = f64::deserialize(deserializer)?;

    Duration::try_from_secs_f64(seconds).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Config;
    use crate::{
        error::Error,
        graphics::{DepthFormat, DisplayOrientation, GraphicsProfile},
    };

    #[test]
    fn defaults() {
        let config = Config::default();

        assert!(config.is_fixed_time_step);
        assert_eq!(config.target_elapsed_time, Duration::from_nanos(16_666_700));
        assert_eq!(config.max_elapsed_time, Duration::from_millis(500));
        assert_eq!(config.inactive_sleep_time, Duration::from_millis(20));
        assert_eq!(config.graphics.preferred_back_buffer_width, 800);
        assert_eq!(config.graphics.preferred_back_buffer_height, 480);
        assert_eq!(config.graphics.graphics_profile, GraphicsProfile::HiDef);
        assert!(config.graphics.synchronize_with_vertical_retrace);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            is_fixed_time_step = false
            max_elapsed_time = 0.25

            [graphics]
            preferred_depth_stencil_format = "Depth24Stencil8"
            graphics_profile = "Reach"
            supported_orientations = ["Portrait", "PortraitDown"]
            "#,
        )
        .unwrap();

        assert!(!config.is_fixed_time_step);
        assert_eq!(config.max_elapsed_time, Duration::from_millis(250));
        assert_eq!(config.target_elapsed_time, Config::default().target_elapsed_time);
        assert_eq!(config.graphics.preferred_depth_stencil_format, DepthFormat::Depth24Stencil8);
        assert_eq!(config.graphics.graphics_profile, GraphicsProfile::Reach);
        assert_eq!(
            config.graphics.supported_orientations,
            DisplayOrientation::PORTRAIT | DisplayOrientation::PORTRAIT_DOWN
        );
        assert_eq!(config.graphics.preferred_back_buffer_width, 800);
    }

    #[test]
    fn negative_duration_is_rejected() {
        let result = Config::from_toml("target_elapsed_time = -1.0");

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            Config::load("this/file/does/not/exist.toml"),
            Err(Error::Io(_))
        ));
    }
}
