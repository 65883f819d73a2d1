use serde::Serialize;

use crate::geometry::Size;

/// Identity of a physical display as reported by the compositor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonitorIdentity {
    pub connector: String,
    pub vendor: String,
    pub product: String,
    pub serial: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonitorMode {
    pub id: String,
    pub width: i32,
    pub height: i32,
    pub refresh_rate: f64,
    pub preferred_scale: f64,
    pub supported_scales: Vec<f64>,
    pub is_current: bool,
    pub is_preferred: bool,
    pub is_interlaced: bool,
}

impl MonitorMode {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PrivacyScreen {
    pub enabled: bool,
    /// Hardware locked, can't be changed from software.
    pub locked: bool,
}

/// Optional properties of a physical display; absent keys stay `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MonitorProperties {
    pub width_mm: Option<i32>,
    pub height_mm: Option<i32>,
    /// `None` when underscanning is not supported at all.
    pub is_underscanning: Option<bool>,
    /// `None` means unlimited.
    pub max_screen_size: Option<Size>,
    pub is_builtin: bool,
    pub display_name: Option<String>,
    pub privacy_screen: Option<PrivacyScreen>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhysicalMonitor {
    pub identity: MonitorIdentity,
    pub modes: Vec<MonitorMode>,
    pub properties: MonitorProperties,
}

impl PhysicalMonitor {
    pub fn connector(&self) -> &str {
        &self.identity.connector
    }

    pub fn is_builtin(&self) -> bool {
        self.properties.is_builtin
    }

    pub fn current_mode(&self) -> Option<&MonitorMode> {
        self.modes.iter().find(|mode| mode.is_current)
    }

    /// Human readable name, falling back to the connector.
    pub fn display_name(&self) -> &str {
        self.properties
            .display_name
            .as_deref()
            .unwrap_or_else(|| self.connector())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn mode(id: &str, width: i32, height: i32, is_current: bool) -> MonitorMode {
        MonitorMode {
            id: id.to_string(),
            width,
            height,
            refresh_rate: 60.0,
            preferred_scale: 1.0,
            supported_scales: vec![1.0, 2.0],
            is_current,
            is_preferred: false,
            is_interlaced: false,
        }
    }

    pub(crate) fn monitor(connector: &str, modes: Vec<MonitorMode>) -> PhysicalMonitor {
        PhysicalMonitor {
            identity: MonitorIdentity {
                connector: connector.to_string(),
                vendor: "GSM".to_string(),
                product: "LG ULTRAFINE".to_string(),
                serial: "0x0001".to_string(),
            },
            modes,
            properties: MonitorProperties::default(),
        }
    }

    #[test]
    fn finds_current_mode() {
        let pm = monitor(
            "DP-1",
            vec![
                mode("3840x2160@60", 3840, 2160, false),
                mode("1920x1080@60", 1920, 1080, true),
            ],
        );
        assert_eq!(pm.current_mode().map(|m| m.id.as_str()), Some("1920x1080@60"));
    }

    #[test]
    fn no_current_mode() {
        let pm = monitor("DP-1", vec![mode("1920x1080@60", 1920, 1080, false)]);
        assert!(pm.current_mode().is_none());
    }

    #[test]
    fn display_name_falls_back_to_connector() {
        let mut pm = monitor("eDP-1", vec![]);
        assert_eq!(pm.display_name(), "eDP-1");
        pm.properties.display_name = Some("Built-in display".to_string());
        assert_eq!(pm.display_name(), "Built-in display");
    }
}
