// Application state module
// Runtime state shared by every connection task

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::types::Config;

/// Application state
///
/// The request path never mutates this; the only shared values are the
/// loaded configuration and the cached access-log flag.
pub struct AppState {
    pub config: Config,

    // Cached config value for fast access without locks
    pub cached_access_log: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            cached_access_log: Arc::new(AtomicBool::new(config.logging.access_log)),
        }
    }
}
