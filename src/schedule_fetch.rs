use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::AppConfig;
use crate::error::ScheduleError;
use crate::gameweek::{RemoteGameweek, ScheduleWindow, WINDOW_SIZE};
use crate::http_client::http_client;

pub const SCHEDULE_PATH: &str = "/api/app-gameweek";
const SCHEDULE_FIELD: &str = "appGameweekTimes";

/// Source of fresh schedule windows. Implementations absorb their own
/// failures: an empty window means "no data", whatever the cause.
pub trait ScheduleFetcher: Send + Sync {
    fn fetch(&self) -> ScheduleWindow;
}

#[derive(Debug, Clone)]
pub struct HttpScheduleFetcher {
    url: String,
    timeout: Duration,
}

impl HttpScheduleFetcher {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            url: config.endpoint(SCHEDULE_PATH),
            timeout: config.http_timeout,
        }
    }

    pub fn fetch_schedule(&self) -> Result<ScheduleWindow, ScheduleError> {
        let client = http_client(self.timeout)?;
        let resp = client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(ScheduleError::NetworkFailure(format!("http {status}")));
        }
        window_from_schedule_json(&body)
    }
}

impl ScheduleFetcher for HttpScheduleFetcher {
    fn fetch(&self) -> ScheduleWindow {
        absorb_fetch_result(self.fetch_schedule())
    }
}

/// Collapses every fetch failure into an empty window, logging it on the way.
pub fn absorb_fetch_result(result: Result<ScheduleWindow, ScheduleError>) -> ScheduleWindow {
    match result {
        Ok(window) => {
            debug!(len = window.len(), "fetched schedule window");
            window
        }
        Err(ScheduleError::NoCurrentMarker) => {
            warn!("no current gameweek found in schedule response");
            Vec::new()
        }
        Err(err) => {
            error!(%err, "failed to fetch gameweeks");
            Vec::new()
        }
    }
}

pub fn window_from_schedule_json(raw: &str) -> Result<ScheduleWindow, ScheduleError> {
    let records = parse_schedule_json(raw)?;
    build_window(&records)
}

#[derive(Debug, Deserialize)]
struct ScheduleRecord {
    id: u32,
    #[serde(rename = "app_switch_time", alias = "switchTime")]
    switch_time: String,
    #[serde(default, rename = "is_current", alias = "isCurrent")]
    is_current: bool,
}

pub fn parse_schedule_json(raw: &str) -> Result<Vec<RemoteGameweek>, ScheduleError> {
    let root: Value = serde_json::from_str(raw.trim())
        .map_err(|err| ScheduleError::MalformedResponse(format!("invalid json: {err}")))?;
    let Some(items) = root.get(SCHEDULE_FIELD).and_then(Value::as_array) else {
        return Err(ScheduleError::MalformedResponse(format!(
            "expected `{SCHEDULE_FIELD}` array"
        )));
    };

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let record = ScheduleRecord::deserialize(item)
            .map_err(|err| ScheduleError::MalformedResponse(format!("bad gameweek record: {err}")))?;
        let Some(switch_time) = parse_switch_time(&record.switch_time) else {
            return Err(ScheduleError::MalformedResponse(format!(
                "gameweek {} has unreadable switch time {:?}",
                record.id, record.switch_time
            )));
        };
        out.push(RemoteGameweek {
            id: record.id,
            switch_time,
            is_current: record.is_current,
        });
    }
    Ok(out)
}

/// The flagged-current record, then up to three later records ascending by
/// switch time. Equal switch times fall back to the smaller id.
pub fn build_window(records: &[RemoteGameweek]) -> Result<ScheduleWindow, ScheduleError> {
    let Some(current) = records.iter().find(|r| r.is_current) else {
        return Err(ScheduleError::NoCurrentMarker);
    };

    let mut upcoming: Vec<&RemoteGameweek> = records
        .iter()
        .filter(|r| r.id != current.id && r.switch_time > current.switch_time)
        .collect();
    upcoming.sort_by(|a, b| {
        a.switch_time
            .cmp(&b.switch_time)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut window = Vec::with_capacity(WINDOW_SIZE);
    window.push(current.to_gameweek());
    for record in upcoming {
        if window.len() == WINDOW_SIZE {
            break;
        }
        if window.iter().any(|gw| gw.id == record.id) {
            continue;
        }
        window.push(record.to_gameweek());
    }
    Ok(window)
}

pub fn parse_switch_time(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    // Offset-less timestamps are taken as UTC.
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}
