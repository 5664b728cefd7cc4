//! Errors returned by the state, device and game loop APIs.
//!
//! Nothing inside the crate recovers from these, they are meant to reach the game code unchanged.

use miette::Diagnostic;
use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// All errors that can occur.
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum Error {
    /// A setter was called on one of the built-in preset state objects.
    #[error("You cannot modify a default state object ({state})")]
    #[diagnostic(
        code(kestrel::state::default_modified),
        help("Call `.clone()` on the preset and modify the copy instead")
    )]
    DefaultStateModified {
        /// Name of the preset.
        state: &'static str,
    },
    /// A setter was called on a state object that is already bound to a graphics device.
    #[error("You cannot modify the {state} after it has been bound to the graphics device")]
    #[diagnostic(
        code(kestrel::state::bound_modified),
        help("Clone the state object before binding it when you need a variation of it")
    )]
    BoundStateModified {
        /// Category of the state object.
        state: &'static str,
    },
    /// A built-in preset was passed where a bindable state object is required.
    #[error("You cannot bind a default state object ({state})")]
    #[diagnostic(code(kestrel::state::default_bound))]
    DefaultStateBound {
        /// Name of the preset.
        state: &'static str,
    },
    /// The state object already belongs to another graphics device.
    #[error("This {state} is already bound to a different graphics device")]
    #[diagnostic(
        code(kestrel::state::other_device),
        help("A state object can only ever be bound to a single device, clone it for the other device")
    )]
    BoundToOtherDevice {
        /// Category of the state object.
        state: &'static str,
    },
    /// `prefer_half_pixel_offset` can only be changed before the device exists.
    #[error("Setting the half pixel offset preference is not allowed after the graphics device is created")]
    #[diagnostic(code(kestrel::device::half_pixel_offset))]
    HalfPixelOffsetAfterDeviceCreated,
    /// A preparing device settings handler removed a required member.
    #[error("Members should not be set to null in PreparingDeviceSettingsEventArgs ({member} is missing)")]
    #[diagnostic(code(kestrel::device::null_settings))]
    NullDeviceSettings {
        /// Name of the missing member.
        member: &'static str,
    },
    /// The current backend can't express the requested state.
    #[error("Not supported by the graphics backend: {0}")]
    #[diagnostic(code(kestrel::backend::not_supported))]
    NotSupported(String),
    /// An argument was out of range or otherwise invalid.
    #[error("Invalid argument: {0}")]
    #[diagnostic(code(kestrel::invalid_argument))]
    InvalidArgument(String),
    /// The object has already been disposed.
    #[error("Cannot access a disposed object: {0}")]
    #[diagnostic(code(kestrel::disposed))]
    ObjectDisposed(&'static str),
    /// An operation needed a graphics device but none has been created yet.
    #[error("No graphics device has been created")]
    #[diagnostic(
        code(kestrel::device::missing),
        help("Call `GraphicsDeviceManager::create_device` or `apply_changes` first")
    )]
    NoGraphicsDevice,
    /// The game has already exited and can't be ticked anymore.
    #[error("The game has already exited")]
    #[diagnostic(code(kestrel::game::exited))]
    GameExited,
    /// The concrete backend reported a failure.
    #[error("Graphics backend error: {0}")]
    #[diagnostic(code(kestrel::backend::failure))]
    Backend(String),
    /// The configuration file could not be parsed.
    #[error("Error parsing configuration")]
    #[diagnostic(code(kestrel::config::parse))]
    Config(#[from] toml::de::Error),
    /// The configuration file could not be read.
    #[error("Error reading configuration file")]
    #[diagnostic(code(kestrel::config::io))]
    Io(#[from] std::io::Error),
}
