use std::sync::Arc;

use tracing::{debug, error};

use crate::error::{ScheduleError, StoreError};
use crate::gameweek::{Gameweek, ScheduleWindow};
use crate::store::KeyValueStore;

pub const SCHEDULE_KEY: &str = "gameweekData";

/// Owns the single persisted schedule window.
#[derive(Clone)]
pub struct ScheduleCache {
    store: Arc<dyn KeyValueStore>,
}

impl ScheduleCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Replaces whatever window was stored before.
    pub fn save(&self, window: &[Gameweek]) -> Result<(), StoreError> {
        let json = serde_json::to_string(window)?;
        self.store.set(SCHEDULE_KEY, &json)?;
        debug!(len = window.len(), "saved schedule window");
        Ok(())
    }

    /// `None` when nothing usable is stored: absent, unreadable, or the store failed.
    pub fn load(&self) -> Option<ScheduleWindow> {
        let raw = match self.store.get(SCHEDULE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                error!(%err, "error loading gameweeks");
                return None;
            }
        };
        match decode_window(&raw) {
            Ok(window) => Some(window),
            Err(err) => {
                error!(%err, "error loading gameweeks");
                None
            }
        }
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(SCHEDULE_KEY)
    }
}

pub fn decode_window(raw: &str) -> Result<ScheduleWindow, ScheduleError> {
    let window = serde_json::from_str::<ScheduleWindow>(raw)?;
    Ok(window)
}
