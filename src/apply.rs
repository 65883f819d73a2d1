//! Turning a layout into a configuration request and submitting it.
//!
//! A request is always tied to the serial of the snapshot it was computed
//! from. When the compositor has moved on in the meantime it refuses the
//! request, and the caller has to refresh and start over; nothing is retried
//! here.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::display::{DisplayState, LayoutMode, LogicalMonitor};
use crate::error::{Error, Result};
use crate::orientation::{Rotation, Transform};
use crate::rotation::rotate_layout;
use crate::store::DisplayStateStore;

/// How long an applied configuration should stick.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, clap::ValueEnum)]
pub enum Durability {
    /// Only check whether the configuration would be accepted.
    Verify,
    /// Applied until the next session or configuration change.
    Temporary,
    /// Applied and stored by the compositor.
    Persistent,
}

impl Durability {
    pub fn to_wire(self) -> u32 {
        match self {
            Durability::Verify => 0,
            Durability::Temporary => 1,
            Durability::Persistent => 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApplyMonitor {
    pub connector: String,
    pub mode_id: String,
    /// Carried over from the monitor so a relayout doesn't reset it.
    pub enable_underscanning: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApplyLogicalMonitor {
    pub x: i32,
    pub y: i32,
    pub scale: f64,
    pub transform: Transform,
    pub primary: bool,
    pub monitors: Vec<ApplyMonitor>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApplyConfig {
    pub serial: u32,
    pub durability: Durability,
    pub logical_monitors: Vec<ApplyLogicalMonitor>,
    /// Only set when the compositor allows changing the layout mode.
    pub layout_mode: Option<LayoutMode>,
}

impl ApplyConfig {
    /// Build the request for `logical_monitors` against the catalog and serial of `state`.
    ///
    /// Connectors without a known monitor or current mode are dropped; a
    /// logical monitor left without any connector fails the whole request.
    pub fn build(
        state: &DisplayState,
        logical_monitors: &[LogicalMonitor],
        durability: Durability,
    ) -> Result<Self> {
        let logical_monitors = logical_monitors
            .iter()
            .map(|logical| {
                let monitors = logical
                    .connectors
                    .iter()
                    .filter_map(|connector| {
                        let resolved = state.physical_monitor(connector).and_then(|pm| {
                            pm.current_mode().map(|mode| ApplyMonitor {
                                connector: connector.clone(),
                                mode_id: mode.id.clone(),
                                enable_underscanning: pm.properties.is_underscanning,
                            })
                        });
                        if resolved.is_none() {
                            warn!(connector = %connector, "dropping connector without a current mode");
                        }
                        resolved
                    })
                    .collect::<Vec<_>>();

                if monitors.is_empty() {
                    return Err(Error::InvalidLayoutGeometry {
                        x: logical.x,
                        y: logical.y,
                        reason: "none of its connectors could be resolved".to_string(),
                    });
                }

                Ok(ApplyLogicalMonitor {
                    x: logical.x,
                    y: logical.y,
                    scale: logical.scale,
                    transform: logical.transform,
                    primary: logical.primary,
                    monitors,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let layout_mode = state
            .properties
            .supports_changing_layout_mode
            .then(|| state.layout_mode());

        Ok(ApplyConfig {
            serial: state.serial,
            durability,
            logical_monitors,
            layout_mode,
        })
    }
}

/// Submits layouts computed from the store's most recent snapshot.
pub struct ApplyOrchestrator {
    store: Arc<DisplayStateStore>,
    durability: Durability,
}

impl ApplyOrchestrator {
    pub fn new(store: Arc<DisplayStateStore>, durability: Durability) -> Self {
        ApplyOrchestrator { store, durability }
    }

    /// Submit `logical_monitors` with the serial of the current snapshot.
    pub async fn apply(&self, logical_monitors: &[LogicalMonitor]) -> Result<()> {
        let state = self.store.current().await?;
        self.submit(&state, logical_monitors).await
    }

    /// Rotate the whole current layout and submit it.
    ///
    /// Returns the layout that was submitted.
    pub async fn rotate(&self, rotation: Rotation) -> Result<Vec<LogicalMonitor>> {
        let state = self.store.current().await?;
        if rotation == Rotation::None {
            debug!("nothing to rotate");
            return Ok(state.logical_monitors.clone());
        }

        debug!(serial = state.serial, degrees = rotation.to_degrees(), "rotating layout");
        let rotated = rotate_layout(&state, &state.logical_monitors, rotation)?;
        self.submit(&state, &rotated).await?;
        Ok(rotated)
    }

    async fn submit(&self, state: &DisplayState, logical_monitors: &[LogicalMonitor]) -> Result<()> {
        let config = ApplyConfig::build(state, logical_monitors, self.durability)?;
        debug!(?config, "submitting monitor configuration");

        self.store
            .service()
            .apply_configuration(&config)
            .await
            .map_err(|e| {
                warn!(error = %e, serial = config.serial, "monitor configuration rejected");
                e
            })?;

        info!(
            serial = config.serial,
            durability = ?self.durability,
            monitors = config.logical_monitors.len(),
            "monitor configuration applied"
        );
        Ok(())
    }
}
