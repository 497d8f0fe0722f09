use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::gameweek::Gameweek;

/// Picks the gameweek the UI should treat as current at `now`.
///
/// The most recently switched-in entry wins. When every entry is still in
/// the future (typically right after a fresh fetch) the earliest upcoming
/// one is used instead. Equal switch times resolve to the smaller id.
pub fn resolve_current(window: &[Gameweek], now: DateTime<Utc>) -> Option<Gameweek> {
    if window.is_empty() {
        return None;
    }

    let latest_past = window
        .iter()
        .filter(|gw| gw.switch_time <= now)
        .max_by_key(|gw| (gw.switch_time, Reverse(gw.id)));
    if let Some(gw) = latest_past {
        return Some(gw.clone());
    }

    let earliest_future = window
        .iter()
        .filter(|gw| gw.switch_time > now)
        .min_by_key(|gw| (gw.switch_time, gw.id))
        .cloned();
    warn!(
        fallback = ?earliest_future.as_ref().map(|gw| gw.id),
        "no past gameweek found; selecting the closest future gameweek"
    );
    earliest_future
}
