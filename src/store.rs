//! The local copy of the display state.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::backends::DisplayConfigService;
use crate::display::DisplayState;
use crate::error::{Error, Result};

/// Holds the most recent [`DisplayState`] fetched from the service.
///
/// Snapshots are swapped in whole; readers never see a partial refresh.
/// Two racing refreshes install in completion order, the serial check on
/// apply catches whatever that gets wrong.
pub struct DisplayStateStore {
    service: Arc<dyn DisplayConfigService>,
    state: RwLock<Option<Arc<DisplayState>>>,
}

impl DisplayStateStore {
    pub fn new(service: Arc<dyn DisplayConfigService>) -> Self {
        DisplayStateStore {
            service,
            state: RwLock::new(None),
        }
    }

    pub fn service(&self) -> &Arc<dyn DisplayConfigService> {
        &self.service
    }

    /// Query the service and replace the held state.
    ///
    /// On failure the previous state is kept.
    pub async fn refresh(&self) -> Result<Arc<DisplayState>> {
        let fresh = match self.service.query_current_state().await {
            Ok(state) => Arc::new(state),
            Err(e) => {
                warn!(error = %e, "keeping previous display state");
                return Err(e);
            }
        };

        info!(
            serial = fresh.serial,
            physical = fresh.physical_monitors.len(),
            logical = fresh.logical_monitors.len(),
            "display state refreshed"
        );
        *self.state.write().await = Some(fresh.clone());
        Ok(fresh)
    }

    pub async fn current(&self) -> Result<Arc<DisplayState>> {
        self.state.read().await.clone().ok_or(Error::NotLoaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::dummy::DummyDisplayConfig;
    use crate::display::tests::side_by_side;

    #[tokio::test]
    async fn empty_until_refreshed() -> Result<()> {
        let store = DisplayStateStore::new(Arc::new(DummyDisplayConfig::new(side_by_side())));
        assert!(matches!(store.current().await, Err(Error::NotLoaded)));

        let refreshed = store.refresh().await?;
        assert_eq!(refreshed.serial, 1);
        assert_eq!(*store.current().await?, side_by_side());
        Ok(())
    }

    #[tokio::test]
    async fn refresh_replaces_whole_state() -> Result<()> {
        let dummy = Arc::new(DummyDisplayConfig::new(side_by_side()));
        let store = DisplayStateStore::new(dummy.clone());
        let before = store.refresh().await?;

        dummy
            .simulate_change(|state| {
                state.logical_monitors.pop();
            })
            .await;
        let after = store.refresh().await?;

        assert_eq!(after.serial, 2);
        assert_eq!(after.logical_monitors.len(), 1);
        // Old snapshots stay as they were.
        assert_eq!(before.logical_monitors.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn failed_refresh_keeps_state() -> Result<()> {
        let dummy = Arc::new(DummyDisplayConfig::new(side_by_side()));
        let store = DisplayStateStore::new(dummy.clone());
        store.refresh().await?;

        dummy.simulate_change(|_| {}).await;
        dummy.set_available(false);
        assert!(matches!(store.refresh().await, Err(Error::ServiceQuery(_))));
        assert_eq!(store.current().await?.serial, 1);

        dummy.set_available(true);
        assert_eq!(store.refresh().await?.serial, 2);
        Ok(())
    }
}
