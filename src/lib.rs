//! Rotate a whole multi-monitor layout by quarter turns and hand it back to
//! the compositor.

pub mod apply;
pub mod backends;
pub mod display;
pub mod error;
pub mod geometry;
pub mod listener;
pub mod orientation;
pub mod rotation;
pub mod store;
