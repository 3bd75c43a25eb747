use std::sync::Arc;

use adventures_core::{Adventures, Store};
use anyhow::Result;
use parking_lot::Mutex;

use crate::config::AppConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    // One connection; each request holds the lock for one operation
    adventures: Arc<Mutex<Adventures>>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let store = Store::open(&config.database_path())?;
        Ok(Self::from_service(
            Adventures::new(store).with_slow_threshold(config.slow_threshold()),
        ))
    }

    pub fn from_service(adventures: Adventures) -> Self {
        AppState {
            adventures: Arc::new(Mutex::new(adventures)),
        }
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::from_service(Adventures::new(Store::open_in_memory().unwrap()))
    }

    pub fn adventures(&self) -> &Mutex<Adventures> {
        &self.adventures
    }
}
