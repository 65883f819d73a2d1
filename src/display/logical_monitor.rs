use serde::Serialize;

use crate::orientation::Transform;

/// One rectangle of the logical desktop.
///
/// More than one connector means the physical monitors mirror each other.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LogicalMonitor {
    pub x: i32,
    pub y: i32,
    pub scale: f64,
    pub transform: Transform,
    pub primary: bool,
    pub connectors: Vec<String>,
}

impl LogicalMonitor {
    /// Connector whose mode stands for the whole group.
    pub fn representative(&self) -> Option<&str> {
        self.connectors.first().map(String::as_str)
    }
}
