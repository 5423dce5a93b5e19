//! Application state shared by the handlers.

use std::sync::Arc;

use neuroscan_db::PgStore;
use neuroscan_worker::BatchProcessor;

#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<BatchProcessor>,
    pub store: PgStore,
    /// Shared secret for the cron trigger; `None` disables the auth check.
    pub cron_secret: Option<String>,
}
