use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::http_client::http_client;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AppEvent {
    LeagueAdded {
        league_id: String,
    },
    ManagerSelected {
        league_id: String,
        manager_id: String,
    },
    ImagesViewed {
        league_id: String,
        gameweek: u32,
        category: String,
    },
    ImagesShared {
        league_id: String,
        gameweek: u32,
        count: usize,
    },
}

/// Fire-and-forget event sink. `record` returns immediately and never
/// reports delivery failure to the caller.
pub trait Telemetry: Send + Sync {
    fn record(&self, event: AppEvent);

    /// Waits for pending deliveries to finish, successful or not. Call before
    /// the process exits.
    fn flush(&self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogTelemetry;

impl Telemetry for LogTelemetry {
    fn record(&self, event: AppEvent) {
        info!(?event, "telemetry");
    }
}

#[derive(Debug)]
pub struct HttpTelemetry {
    url: String,
    timeout: Duration,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl HttpTelemetry {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
            pending: Mutex::new(Vec::new()),
        }
    }
}

impl Telemetry for HttpTelemetry {
    fn record(&self, event: AppEvent) {
        let url = self.url.clone();
        let timeout = self.timeout;
        let handle = thread::spawn(move || {
            let result = http_client(timeout).and_then(|client| {
                client
                    .post(&url)
                    .json(&event)
                    .send()
                    .and_then(|resp| resp.error_for_status())
            });
            if let Err(err) = result {
                debug!(%err, ?event, "telemetry post failed");
            }
        });
        match self.pending.lock() {
            Ok(mut pending) => {
                pending.retain(|h| !h.is_finished());
                pending.push(handle);
            }
            Err(_) => warn!("telemetry pending list poisoned; event will not be flushed"),
        }
    }

    fn flush(&self) {
        let handles = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => return,
        };
        for handle in handles {
            if handle.join().is_err() {
                debug!("telemetry worker panicked");
            }
        }
    }
}

pub fn telemetry_from_config(config: &AppConfig) -> Arc<dyn Telemetry> {
    match config.events_url.as_ref() {
        Some(url) => Arc::new(HttpTelemetry::new(url.clone(), config.http_timeout)),
        None => Arc::new(LogTelemetry),
    }
}
