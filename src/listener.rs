//! Keeping the store in sync with change notifications.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::store::DisplayStateStore;

/// Refreshes the store once per layout change notification.
///
/// The subscription lives as long as this value; dropping it unsubscribes,
/// whatever refresh is still in flight.
pub struct ChangeListener {
    task: JoinHandle<()>,
}

impl ChangeListener {
    /// Subscribe, then load the current state.
    ///
    /// A change landing between the two is still seen by the initial refresh.
    pub async fn subscribe(store: Arc<DisplayStateStore>) -> Result<Self> {
        let mut changes = store.service().layout_changes().await?;
        debug!("subscribed to layout changes");
        store.refresh().await?;

        let task = tokio::spawn(async move {
            while changes.next().await.is_some() {
                match store.refresh().await {
                    Ok(state) => info!(
                        serial = state.serial,
                        primary = ?state.primary_monitor().and_then(|lm| lm.representative()),
                        "layout changed"
                    ),
                    Err(e) => warn!(error = %e, "failed to refresh after layout change"),
                }
            }
            debug!("layout change notifications ended");
        });

        Ok(ChangeListener { task })
    }
}

impl Drop for ChangeListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::dummy::DummyDisplayConfig;
    use crate::display::tests::side_by_side;

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn loads_state_on_subscribe() -> Result<()> {
        let dummy = Arc::new(DummyDisplayConfig::new(side_by_side()));
        let store = Arc::new(DisplayStateStore::new(dummy.clone()));

        let _listener = ChangeListener::subscribe(store.clone()).await?;
        assert_eq!(dummy.subscriber_count(), 1);
        assert_eq!(store.current().await?.serial, 1);
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_service_fails_subscribe() {
        let dummy = Arc::new(DummyDisplayConfig::new(side_by_side()));
        dummy.set_available(false);
        let store = Arc::new(DisplayStateStore::new(dummy.clone()));

        assert!(ChangeListener::subscribe(store).await.is_err());
        assert_eq!(dummy.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn refreshes_on_change() -> Result<()> {
        let dummy = Arc::new(DummyDisplayConfig::new(side_by_side()));
        let store = Arc::new(DisplayStateStore::new(dummy.clone()));

        let _listener = ChangeListener::subscribe(store.clone()).await?;

        dummy
            .simulate_change(|state| state.logical_monitors[1].x = 2000)
            .await;
        settle().await;

        let state = store.current().await?;
        assert_eq!(state.serial, 2);
        assert_eq!(state.logical_monitors[1].x, 2000);
        Ok(())
    }

    #[tokio::test]
    async fn drop_unsubscribes() -> Result<()> {
        let dummy = Arc::new(DummyDisplayConfig::new(side_by_side()));
        let store = Arc::new(DisplayStateStore::new(dummy.clone()));

        let listener = ChangeListener::subscribe(store.clone()).await?;
        assert_eq!(dummy.subscriber_count(), 1);

        drop(listener);
        settle().await;
        assert_eq!(dummy.subscriber_count(), 0);

        dummy.simulate_change(|_| {}).await;
        settle().await;
        assert_eq!(store.current().await?.serial, 1);
        Ok(())
    }
}
