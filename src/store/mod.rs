pub mod disk;
#[cfg(test)]
pub mod memory;

use crate::core::cache::RateStore;
use crate::core::config::AppConfig;
use disk::DiskStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decides once whether a persisted tier is available.
///
/// Returns `None` when persistence is switched off or the data directory
/// cannot be opened; the converter then runs on its memory tier alone.
pub fn open_store(config: &AppConfig) -> Option<Arc<dyn RateStore>> {
    if !config.cache.persist {
        debug!("Rate persistence disabled by config");
        return None;
    }

    let cache_dir = match config.default_data_path() {
        Ok(path) => path.join("cache"),
        Err(e) => {
            warn!(error = %e, "No data directory, rates will not be persisted");
            return None;
        }
    };

    match DiskStore::open(&cache_dir) {
        Ok(store) => {
            debug!("Opened rate store at {}", cache_dir.display());
            Some(Arc::new(store))
        }
        Err(e) => {
            warn!(error = %e, "Failed to open rate store at {}", cache_dir.display());
            None
        }
    }
}
