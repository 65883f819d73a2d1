//! GNOME Mutter backend, over `org.gnome.Mutter.DisplayConfig` on the session bus.

use std::collections::HashMap;

use futures_util::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zbus::zvariant::{OwnedValue, Type, Value};
use zbus::{proxy, Connection};

use super::DisplayConfigService;
use crate::apply::ApplyConfig;
use crate::display::{
    DisplayState, GlobalProperties, LayoutMode, LogicalMonitor, MonitorIdentity, MonitorMode,
    MonitorProperties, PhysicalMonitor, PrivacyScreen,
};
use crate::error::{Error, Result};
use crate::geometry::Size;
use crate::orientation::Transform;

type Properties = HashMap<String, OwnedValue>;

#[derive(Debug, Type, Deserialize)]
struct WireMonitorSpec {
    connector: String,
    vendor: String,
    product: String,
    serial: String,
}

#[derive(Debug, Type, Deserialize)]
struct WireMode {
    id: String,
    width: i32,
    height: i32,
    refresh_rate: f64,
    preferred_scale: f64,
    supported_scales: Vec<f64>,

    /*  "is-current" (b), "is-preferred" (b), "is-interlaced" (b)  */
    properties: Properties,
}

#[derive(Debug, Type, Deserialize)]
struct WirePhysicalMonitor {
    spec: WireMonitorSpec,
    modes: Vec<WireMode>,

    /*  "width-mm" (i), "height-mm" (i), "is-underscanning" (b),
        "max-screen-size" (ii), "is-builtin" (b), "display-name" (s),
        "privacy-screen-state" (bb): enabled, hardware locked  */
    properties: Properties,
}

#[derive(Debug, Type, Deserialize)]
struct WireLogicalMonitor {
    x: i32,
    y: i32,
    scale: f64,
    transform: u32,
    primary: bool,
    monitors: Vec<WireMonitorSpec>,
    properties: Properties,
}

#[derive(Debug, Type, Serialize)]
struct WireApplyMonitor<'a> {
    connector: &'a str,
    mode_id: &'a str,

    /*  "enable_underscanning" (b)  */
    properties: HashMap<&'a str, Value<'a>>,
}

#[derive(Debug, Type, Serialize)]
struct WireApplyLogicalMonitor<'a> {
    x: i32,
    y: i32,
    scale: f64,
    transform: u32,
    primary: bool,
    monitors: Vec<WireApplyMonitor<'a>>,
}

#[proxy(
    interface = "org.gnome.Mutter.DisplayConfig",
    default_service = "org.gnome.Mutter.DisplayConfig",
    default_path = "/org/gnome/Mutter/DisplayConfig"
)]
trait DisplayConfig {
    /*  "layout-mode" (u): 1 logical, 2 physical; absent means logical
        "supports-changing-layout-mode" (b)
        "global-scale-required" (b)
        "legacy-ui-scaling-factor" (i)  */
    fn get_current_state(
        &self,
    ) -> zbus::Result<(u32, Vec<WirePhysicalMonitor>, Vec<WireLogicalMonitor>, Properties)>;

    /*  method: 0 verify, 1 temporary, 2 persistent
        properties: "layout-mode" (u), only when it may be changed  */
    fn apply_monitors_config(
        &self,
        serial: u32,
        method: u32,
        logical_monitors: &[WireApplyLogicalMonitor<'_>],
        properties: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    fn monitors_changed(&self) -> zbus::Result<()>;
}

pub struct MutterDisplayConfig {
    proxy: DisplayConfigProxy<'static>,
}

impl MutterDisplayConfig {
    pub async fn connect() -> Result<Self> {
        let connection = Connection::session().await?;
        Self::new(&connection).await
    }

    pub async fn new(connection: &Connection) -> Result<Self> {
        let proxy = DisplayConfigProxy::new(connection).await?;
        Ok(MutterDisplayConfig { proxy })
    }
}

#[async_trait::async_trait]
impl DisplayConfigService for MutterDisplayConfig {
    async fn query_current_state(&self) -> Result<DisplayState> {
        let (serial, physical, logical, properties) = self
            .proxy
            .get_current_state()
            .await
            .map_err(Error::ServiceQuery)?;
        debug!(serial, "got current state from mutter");

        Ok(DisplayState {
            serial,
            physical_monitors: physical.into_iter().map(physical_monitor).collect(),
            logical_monitors: logical
                .into_iter()
                .map(logical_monitor)
                .collect::<Result<_>>()?,
            properties: global_properties(&properties),
        })
    }

    async fn apply_configuration(&self, config: &ApplyConfig) -> Result<()> {
        self.proxy
            .apply_monitors_config(
                config.serial,
                config.durability.to_wire(),
                &wire_logical_monitors(config),
                wire_properties(config),
            )
            .await
            .map_err(Error::ConfigRejected)
    }

    async fn layout_changes(&self) -> Result<BoxStream<'static, ()>> {
        let changes = self.proxy.receive_monitors_changed().await?;
        Ok(changes.map(|_| ()).boxed())
    }
}

fn wire_logical_monitors(config: &ApplyConfig) -> Vec<WireApplyLogicalMonitor<'_>> {
    config
        .logical_monitors
        .iter()
        .map(|lm| WireApplyLogicalMonitor {
            x: lm.x,
            y: lm.y,
            scale: lm.scale,
            transform: lm.transform.to_wire(),
            primary: lm.primary,
            monitors: lm
                .monitors
                .iter()
                .map(|m| WireApplyMonitor {
                    connector: &m.connector,
                    mode_id: &m.mode_id,
                    properties: m
                        .enable_underscanning
                        .map(|enabled| ("enable_underscanning", Value::Bool(enabled)))
                        .into_iter()
                        .collect(),
                })
                .collect(),
        })
        .collect()
}

fn wire_properties(config: &ApplyConfig) -> HashMap<&'static str, Value<'static>> {
    config
        .layout_mode
        .map(|mode| ("layout-mode", Value::U32(mode.to_wire())))
        .into_iter()
        .collect()
}

fn physical_monitor(wire: WirePhysicalMonitor) -> PhysicalMonitor {
    let props = &wire.properties;
    PhysicalMonitor {
        identity: identity(wire.spec),
        modes: wire
            .modes
            .into_iter()
            .map(|mode| MonitorMode {
                is_current: get(&mode.properties, "is-current").and_then(as_bool) == Some(true),
                is_preferred: get(&mode.properties, "is-preferred").and_then(as_bool) == Some(true),
                is_interlaced: get(&mode.properties, "is-interlaced").and_then(as_bool) == Some(true),
                id: mode.id,
                width: mode.width,
                height: mode.height,
                refresh_rate: mode.refresh_rate,
                preferred_scale: mode.preferred_scale,
                supported_scales: mode.supported_scales,
            })
            .collect(),
        properties: MonitorProperties {
            width_mm: get(props, "width-mm").and_then(as_i32),
            height_mm: get(props, "height-mm").and_then(as_i32),
            is_underscanning: get(props, "is-underscanning").and_then(as_bool),
            max_screen_size: get(props, "max-screen-size")
                .and_then(|v| as_pair(v, as_i32))
                .map(|(width, height)| Size::new(width, height)),
            is_builtin: get(props, "is-builtin").and_then(as_bool) == Some(true),
            display_name: get(props, "display-name").and_then(as_string),
            privacy_screen: get(props, "privacy-screen-state")
                .and_then(|v| as_pair(v, as_bool))
                .map(|(enabled, locked)| PrivacyScreen { enabled, locked }),
        },
    }
}

fn logical_monitor(wire: WireLogicalMonitor) -> Result<LogicalMonitor> {
    Ok(LogicalMonitor {
        x: wire.x,
        y: wire.y,
        scale: wire.scale,
        transform: Transform::try_from(wire.transform)?,
        primary: wire.primary,
        connectors: wire.monitors.into_iter().map(|m| m.connector).collect(),
    })
}

fn global_properties(props: &Properties) -> GlobalProperties {
    GlobalProperties {
        layout_mode: get(props, "layout-mode")
            .and_then(as_u32)
            .and_then(LayoutMode::from_wire),
        supports_changing_layout_mode: get(props, "supports-changing-layout-mode")
            .and_then(as_bool)
            == Some(true),
        global_scale_required: get(props, "global-scale-required").and_then(as_bool) == Some(true),
        legacy_ui_scaling_factor: get(props, "legacy-ui-scaling-factor").and_then(as_i32),
    }
}

fn identity(spec: WireMonitorSpec) -> MonitorIdentity {
    MonitorIdentity {
        connector: spec.connector,
        vendor: spec.vendor,
        product: spec.product,
        serial: spec.serial,
    }
}

fn get<'a>(props: &'a Properties, key: &str) -> Option<&'a Value<'static>> {
    props.get(key).map(|value| &**value)
}

fn as_bool(value: &Value<'_>) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Value(inner) => as_bool(inner),
        _ => None,
    }
}

fn as_i32(value: &Value<'_>) -> Option<i32> {
    match value {
        Value::I32(i) => Some(*i),
        Value::Value(inner) => as_i32(inner),
        _ => None,
    }
}

fn as_u32(value: &Value<'_>) -> Option<u32> {
    match value {
        Value::U32(u) => Some(*u),
        Value::Value(inner) => as_u32(inner),
        _ => None,
    }
}

fn as_string(value: &Value<'_>) -> Option<String> {
    match value {
        Value::Str(s) => Some(s.as_str().to_string()),
        Value::Value(inner) => as_string(inner),
        _ => None,
    }
}

fn as_pair<T>(value: &Value<'_>, field: fn(&Value<'_>) -> Option<T>) -> Option<(T, T)> {
    match value {
        Value::Structure(s) => match s.fields() {
            [first, second] => Some((field(first)?, field(second)?)),
            _ => None,
        },
        Value::Value(inner) => as_pair(inner, field),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::{ApplyLogicalMonitor, ApplyMonitor, Durability};

    fn spec(connector: &str) -> WireMonitorSpec {
        WireMonitorSpec {
            connector: connector.to_string(),
            vendor: "GSM".to_string(),
            product: "LG HDR 4K".to_string(),
            serial: "0x0000c3a1".to_string(),
        }
    }

    #[test]
    fn property_values() {
        assert_eq!(as_bool(&Value::Bool(true)), Some(true));
        assert_eq!(as_bool(&Value::I32(1)), None);
        assert_eq!(as_i32(&Value::I32(597)), Some(597));
        assert_eq!(as_u32(&Value::U32(2)), Some(2));
        assert_eq!(
            as_string(&Value::from("Built-in display")),
            Some("Built-in display".to_string())
        );
        assert_eq!(as_bool(&Value::Value(Box::new(Value::Bool(false)))), Some(false));
    }

    #[test]
    fn physical_monitor_without_properties() {
        let pm = physical_monitor(WirePhysicalMonitor {
            spec: spec("HDMI-1"),
            modes: vec![WireMode {
                id: "3840x2160@60.000".to_string(),
                width: 3840,
                height: 2160,
                refresh_rate: 60.0,
                preferred_scale: 2.0,
                supported_scales: vec![1.0, 2.0],
                properties: Properties::new(),
            }],
            properties: Properties::new(),
        });

        assert_eq!(pm.connector(), "HDMI-1");
        assert_eq!(pm.modes[0].size(), Size::new(3840, 2160));
        assert!(pm.current_mode().is_none());
        assert_eq!(pm.properties, MonitorProperties::default());
    }

    #[test]
    fn logical_monitor_connectors() -> Result<()> {
        let lm = logical_monitor(WireLogicalMonitor {
            x: 1920,
            y: 0,
            scale: 1.5,
            transform: 5,
            primary: true,
            monitors: vec![spec("DP-1"), spec("DP-2")],
            properties: Properties::new(),
        })?;

        assert_eq!(lm.connectors, vec!["DP-1", "DP-2"]);
        assert_eq!(lm.transform, Transform::new(1, true));
        Ok(())
    }

    #[test]
    fn apply_config_to_wire() {
        let config = ApplyConfig {
            serial: 7,
            durability: Durability::Temporary,
            logical_monitors: vec![ApplyLogicalMonitor {
                x: 0,
                y: 1920,
                scale: 1.25,
                transform: Transform::new(3, true),
                primary: true,
                monitors: vec![
                    ApplyMonitor {
                        connector: "DP-1".to_string(),
                        mode_id: "1920x1080@60".to_string(),
                        enable_underscanning: Some(true),
                    },
                    ApplyMonitor {
                        connector: "HDMI-1".to_string(),
                        mode_id: "1920x1080@60".to_string(),
                        enable_underscanning: None,
                    },
                ],
            }],
            layout_mode: Some(LayoutMode::Physical),
        };

        let wire = wire_logical_monitors(&config);
        assert_eq!(wire.len(), 1);
        assert_eq!((wire[0].x, wire[0].y, wire[0].transform), (0, 1920, 7));
        assert!(wire[0].primary);
        assert_eq!(wire[0].monitors[0].connector, "DP-1");
        assert_eq!(wire[0].monitors[0].mode_id, "1920x1080@60");
        assert_eq!(
            wire[0].monitors[0].properties.get("enable_underscanning"),
            Some(&Value::Bool(true))
        );
        assert!(wire[0].monitors[1].properties.is_empty());

        let properties = wire_properties(&config);
        assert_eq!(properties.get("layout-mode"), Some(&Value::U32(2)));
    }

    #[test]
    fn layout_mode_left_out_when_fixed() {
        let config = ApplyConfig {
            serial: 1,
            durability: Durability::Verify,
            logical_monitors: Vec::new(),
            layout_mode: None,
        };
        assert!(wire_properties(&config).is_empty());
        assert!(wire_logical_monitors(&config).is_empty());
    }

    #[test]
    fn logical_monitor_bad_transform() {
        let result = logical_monitor(WireLogicalMonitor {
            x: 0,
            y: 0,
            scale: 1.0,
            transform: 9,
            primary: true,
            monitors: vec![spec("DP-1")],
            properties: Properties::new(),
        });
        assert!(matches!(result, Err(Error::InvalidTransform(9))));
    }

    #[test]
    fn absent_global_properties() {
        let props = global_properties(&Properties::new());
        assert_eq!(props, GlobalProperties::default());
    }
}
