//! Monitor catalog and layout geometry.
//!
//! A [`DisplayState`] is a complete snapshot of what the compositor reported
//! in one query. It is never patched: every refresh builds a new one.

pub mod logical_monitor;
pub mod physical_monitor;

pub use logical_monitor::LogicalMonitor;
pub use physical_monitor::{
    MonitorIdentity, MonitorMode, MonitorProperties, PhysicalMonitor, PrivacyScreen,
};

use serde::Serialize;
use tracing::warn;

use crate::error::{Error, Result};
use crate::geometry::{Rect, Size};

/// How the size of a logical monitor relates to the modes backing it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Mode size divided by the logical monitor scale.
    Logical,
    /// Mode size as is.
    Physical,
}

impl LayoutMode {
    pub fn from_wire(value: u32) -> Option<Self> {
        match value {
            1 => Some(LayoutMode::Logical),
            2 => Some(LayoutMode::Physical),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u32 {
        match self {
            LayoutMode::Logical => 1,
            LayoutMode::Physical => 2,
        }
    }
}

/// Global properties of the display configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GlobalProperties {
    pub layout_mode: Option<LayoutMode>,
    pub supports_changing_layout_mode: bool,
    pub global_scale_required: bool,
    pub legacy_ui_scaling_factor: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DisplayState {
    pub serial: u32,
    pub physical_monitors: Vec<PhysicalMonitor>,
    pub logical_monitors: Vec<LogicalMonitor>,
    pub properties: GlobalProperties,
}

impl DisplayState {
    /// Absence of the property means logical layout.
    pub fn layout_mode(&self) -> LayoutMode {
        self.properties.layout_mode.unwrap_or(LayoutMode::Logical)
    }

    pub fn physical_monitor(&self, connector: &str) -> Option<&PhysicalMonitor> {
        self.physical_monitors
            .iter()
            .find(|pm| pm.connector() == connector)
    }

    pub fn primary_monitor(&self) -> Option<&LogicalMonitor> {
        self.logical_monitors.iter().find(|lm| lm.primary)
    }

    pub fn builtin_monitor(&self) -> Option<&PhysicalMonitor> {
        self.physical_monitors.iter().find(|pm| pm.is_builtin())
    }

    /// Pixel size of the current mode on `connector`.
    ///
    /// Unknown connectors and monitors without a current mode are `0x0`.
    pub fn screen_size(&self, connector: &str) -> Size {
        self.physical_monitor(connector)
            .and_then(PhysicalMonitor::current_mode)
            .map(MonitorMode::size)
            .unwrap_or(Size::ZERO)
    }

    /// Size a logical monitor occupies in the layout, given the modes of its
    /// connectors, its transform and its scale.
    ///
    /// Fails when the connectors of a cloned group disagree on their size.
    pub fn logical_size(&self, logical: &LogicalMonitor) -> Result<Size> {
        let invalid = |reason: String| Error::InvalidLayoutGeometry {
            x: logical.x,
            y: logical.y,
            reason,
        };

        let mut sizes = logical
            .connectors
            .iter()
            .map(|connector| (connector, self.screen_size(connector)));
        let (first_connector, size) = sizes
            .next()
            .ok_or_else(|| invalid("no connectors".to_string()))?;
        if let Some((connector, other)) = sizes.find(|(_, other)| *other != size) {
            return Err(invalid(format!(
                "{} is {}x{} but {} is {}x{}",
                first_connector,
                size.width,
                size.height,
                connector,
                other.width,
                other.height
            )));
        }

        Ok(self.scaled(logical, size))
    }

    /// Layout size of a logical monitor, measured on its first connector only.
    pub fn representative_size(&self, logical: &LogicalMonitor) -> Size {
        let size = logical
            .representative()
            .map(|connector| self.screen_size(connector))
            .unwrap_or(Size::ZERO);
        self.scaled(logical, size)
    }

    pub fn footprint(&self, logical: &LogicalMonitor) -> Result<Rect> {
        Ok(Rect::at(logical.x, logical.y, self.logical_size(logical)?))
    }

    /// Bounding rectangle of every logical monitor with a coherent geometry.
    ///
    /// Incoherent logical monitors are left out with a warning.
    /// Fails when nothing is left, or when the layout spans more than `i32` can hold.
    pub fn hitbox(&self, logical_monitors: &[LogicalMonitor]) -> Result<Rect> {
        let mut footprints = logical_monitors
            .iter()
            .filter_map(|logical| match self.footprint(logical) {
                Ok(rect) => Some(rect),
                Err(e) => {
                    warn!(error = %e, connectors = ?logical.connectors, "excluding logical monitor from hitbox");
                    None
                }
            });
        let first = footprints.next().ok_or(Error::EmptyHitbox)?;
        footprints.try_fold(first, |hitbox, rect| {
            hitbox.extend(&rect).ok_or_else(|| Error::InvalidLayoutGeometry {
                x: rect.x,
                y: rect.y,
                reason: "layout extends past the coordinate range".to_string(),
            })
        })
    }

    fn scaled(&self, logical: &LogicalMonitor, size: Size) -> Size {
        let size = if logical.transform.is_quarter_turn() {
            size.transposed()
        } else {
            size
        };
        match self.layout_mode() {
            LayoutMode::Physical => size,
            LayoutMode::Logical if logical.scale > 0.0 && logical.scale.is_finite() => Size::new(
                (f64::from(size.width) / logical.scale).round() as i32,
                (f64::from(size.height) / logical.scale).round() as i32,
            ),
            LayoutMode::Logical => size,
        }
    }
}
