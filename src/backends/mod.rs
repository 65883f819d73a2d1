use futures_util::stream::BoxStream;

use crate::apply::ApplyConfig;
use crate::display::DisplayState;
use crate::error::Result;

/// The compositor service that owns the monitor topology.
#[async_trait::async_trait]
pub trait DisplayConfigService: Send + Sync {
    /// Fetch the full current state, including the serial any apply must carry.
    async fn query_current_state(&self) -> Result<DisplayState>;

    /// Submit a new layout. Rejected when the serial is stale or the layout invalid.
    async fn apply_configuration(&self, config: &ApplyConfig) -> Result<()>;

    /// Subscribe to layout change notifications.
    /// Dropping the stream unsubscribes.
    async fn layout_changes(&self) -> Result<BoxStream<'static, ()>>;
}

pub mod dummy;
pub mod mutter;
