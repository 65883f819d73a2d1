//! Dummy display service.
//!
//! This is purely for testing or debugging.
//! It keeps a layout in memory, enforces the serial the same way the
//! compositor does and logs changes.

use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::sync::{broadcast, Mutex};
use tracing::info;

use super::DisplayConfigService;
use crate::apply::{ApplyConfig, Durability};
use crate::display::{
    DisplayState, GlobalProperties, LayoutMode, LogicalMonitor, MonitorIdentity, MonitorMode,
    MonitorProperties, PhysicalMonitor,
};
use crate::error::{Error, Result};
use crate::orientation::Transform;

pub struct DummyDisplayConfig {
    state: Mutex<DisplayState>,
    applied: Mutex<Vec<ApplyConfig>>,
    changes: broadcast::Sender<()>,
    available: AtomicBool,
}

impl DummyDisplayConfig {
    pub fn new(state: DisplayState) -> Self {
        let (changes, _) = broadcast::channel(16);
        DummyDisplayConfig {
            state: Mutex::new(state),
            applied: Mutex::new(Vec::new()),
            changes,
            available: AtomicBool::new(true),
        }
    }

    /// A laptop panel with an external 1440p monitor to its right.
    pub fn laptop_with_external() -> Self {
        let panel = PhysicalMonitor {
            identity: MonitorIdentity {
                connector: "eDP-1".to_string(),
                vendor: "BOE".to_string(),
                product: "0x0ad1".to_string(),
                serial: "0x00000000".to_string(),
            },
            modes: vec![mode(1920, 1200, 60.0, true, true)],
            properties: MonitorProperties {
                width_mm: Some(302),
                height_mm: Some(189),
                is_builtin: true,
                display_name: Some("Built-in display".to_string()),
                ..MonitorProperties::default()
            },
        };
        let external = PhysicalMonitor {
            identity: MonitorIdentity {
                connector: "DP-1".to_string(),
                vendor: "DEL".to_string(),
                product: "DELL U2719D".to_string(),
                serial: "7XJPK13".to_string(),
            },
            modes: vec![
                mode(2560, 1440, 59.951, true, true),
                mode(1920, 1080, 60.0, false, false),
            ],
            properties: MonitorProperties {
                width_mm: Some(597),
                height_mm: Some(336),
                is_underscanning: Some(false),
                display_name: Some("Dell Inc. 27\"".to_string()),
                ..MonitorProperties::default()
            },
        };
        let logical = |x, y, primary, connector: &str| LogicalMonitor {
            x,
            y,
            scale: 1.0,
            transform: Transform::NORMAL,
            primary,
            connectors: vec![connector.to_string()],
        };

        DummyDisplayConfig::new(DisplayState {
            serial: 1,
            physical_monitors: vec![panel, external],
            logical_monitors: vec![logical(0, 240, false, "eDP-1"), logical(1920, 0, true, "DP-1")],
            properties: GlobalProperties {
                layout_mode: Some(LayoutMode::Logical),
                supports_changing_layout_mode: true,
                global_scale_required: false,
                legacy_ui_scaling_factor: Some(1),
            },
        })
    }

    /// Make the service unreachable, or reachable again.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Change the layout behind the client's back, as another tool would.
    pub async fn simulate_change(&self, change: impl FnOnce(&mut DisplayState)) {
        let mut state = self.state.lock().await;
        change(&mut *state);
        self.publish(&mut *state);
    }

    /// Every configuration accepted so far, verify-only ones included.
    pub async fn applied(&self) -> Vec<ApplyConfig> {
        self.applied.lock().await.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    fn publish(&self, state: &mut DisplayState) {
        state.serial = state.serial.wrapping_add(1);
        info!(serial = state.serial, "dummy layout changed");
        // Nobody listening is fine.
        let _ = self.changes.send(());
    }
}

#[async_trait::async_trait]
impl DisplayConfigService for DummyDisplayConfig {
    async fn query_current_state(&self) -> Result<DisplayState> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(Error::ServiceQuery(zbus::Error::Failure(
                "dummy service unavailable".to_string(),
            )));
        }
        Ok(self.state.lock().await.clone())
    }

    async fn apply_configuration(&self, config: &ApplyConfig) -> Result<()> {
        let mut state = self.state.lock().await;
        if config.serial != state.serial {
            return Err(reject(format!(
                "stale serial {}, current is {}",
                config.serial, state.serial
            )));
        }

        let mut candidate = state.clone();
        candidate.logical_monitors = config
            .logical_monitors
            .iter()
            .map(|lm| LogicalMonitor {
                x: lm.x,
                y: lm.y,
                scale: lm.scale,
                transform: lm.transform,
                primary: lm.primary,
                connectors: lm.monitors.iter().map(|m| m.connector.clone()).collect(),
            })
            .collect();
        for requested in config.logical_monitors.iter().flat_map(|lm| &lm.monitors) {
            let pm = candidate
                .physical_monitors
                .iter_mut()
                .find(|pm| pm.connector() == requested.connector)
                .ok_or_else(|| reject(format!("unknown connector {}", requested.connector)))?;
            if !pm.modes.iter().any(|mode| mode.id == requested.mode_id) {
                return Err(reject(format!("unknown mode {}", requested.mode_id)));
            }
            for mode in &mut pm.modes {
                mode.is_current = mode.id == requested.mode_id;
            }
        }
        validate(&candidate)?;

        self.applied.lock().await.push(config.clone());
        if config.durability == Durability::Verify {
            return Ok(());
        }

        *state = candidate;
        self.publish(&mut *state);
        Ok(())
    }

    async fn layout_changes(&self) -> Result<BoxStream<'static, ()>> {
        let receiver = self.changes.subscribe();
        Ok(stream::unfold(receiver, |mut receiver| async move {
            match receiver.recv().await {
                // Missed notifications still mean the layout changed.
                Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => Some(((), receiver)),
                Err(broadcast::error::RecvError::Closed) => None,
            }
        })
        .boxed())
    }
}

fn reject(reason: String) -> Error {
    Error::ConfigRejected(zbus::Error::Failure(reason))
}

/// Refuse empty groups and overlapping monitors, like the compositor does.
fn validate(state: &DisplayState) -> Result<()> {
    let mut placed = Vec::with_capacity(state.logical_monitors.len());
    for logical in &state.logical_monitors {
        if logical.connectors.is_empty() {
            return Err(reject(format!(
                "logical monitor at ({}, {}) has no monitors",
                logical.x, logical.y
            )));
        }
        let rect = state
            .footprint(logical)
            .map_err(|e| reject(e.to_string()))?;
        if placed.iter().any(|other| rect.intersects(other)) {
            return Err(reject(format!("logical monitors overlap at {:?}", rect)));
        }
        placed.push(rect);
    }
    if state.logical_monitors.iter().filter(|lm| lm.primary).count() != 1 {
        return Err(reject("exactly one primary monitor required".to_string()));
    }
    Ok(())
}

fn mode(width: i32, height: i32, refresh_rate: f64, is_current: bool, is_preferred: bool) -> MonitorMode {
    MonitorMode {
        id: format!("{}x{}@{}", width, height, refresh_rate),
        width,
        height,
        refresh_rate,
        preferred_scale: 1.0,
        supported_scales: vec![1.0, 1.25, 1.5, 1.75, 2.0],
        is_current,
        is_preferred,
        is_interlaced: false,
    }
}
