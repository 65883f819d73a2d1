//! Error types for gnome-rotate
//!
//! Geometry problems inside a single logical monitor are recovered
//! locally by the callers; everything talking to the display service
//! is surfaced as-is.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid degree of rotation, multiples of 90 degrees only, got {0}")]
    InvalidDegrees(isize),

    #[error("Unknown rotation {0:?}, expected clockwise, counter-clockwise, half, none or degrees")]
    UnknownRotation(String),

    #[error("Invalid monitor transform {0}, expected 0-7")]
    InvalidTransform(u32),

    #[error("Logical monitor at ({x}, {y}) has an incoherent geometry: {reason}")]
    InvalidLayoutGeometry { x: i32, y: i32, reason: String },

    #[error("No valid logical monitor left to compute a hitbox from")]
    EmptyHitbox,

    #[error("Display state has not been loaded yet")]
    NotLoaded,

    #[error("Failed to query the current display state")]
    ServiceQuery(#[source] zbus::Error),

    #[error("Display configuration was rejected")]
    ConfigRejected(#[source] zbus::Error),

    #[error("Could not reach the display configuration service")]
    Connection(#[from] zbus::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
