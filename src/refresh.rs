use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::gameweek::{Gameweek, WINDOW_SIZE};
use crate::resolver::resolve_current;
use crate::schedule_cache::ScheduleCache;
use crate::schedule_fetch::ScheduleFetcher;
use crate::store::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Cached window is already full; no fetch was made.
    Skipped,
    /// Another refresh was running; this call did nothing.
    InFlight,
    Updated(usize),
    /// Fetch produced nothing; the existing cache was kept.
    Retained,
    SaveFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Start,
    Foreground,
}

pub struct RefreshPolicy {
    cache: ScheduleCache,
    fetcher: Arc<dyn ScheduleFetcher>,
    in_flight: AtomicBool,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RefreshPolicy {
    pub fn new(cache: ScheduleCache, fetcher: Arc<dyn ScheduleFetcher>) -> Self {
        Self {
            cache,
            fetcher,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Never fails: the worst case is an unchanged cache.
    ///
    /// A full window is treated as fresh enough, so once four entries are
    /// cached no fetch happens even if they have all switched in already.
    pub fn refresh_if_needed(&self) -> RefreshOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("schedule refresh already in progress");
            return RefreshOutcome::InFlight;
        }
        let _guard = InFlightGuard(&self.in_flight);

        let existing = self.cache.load();
        if existing.as_ref().is_some_and(|w| w.len() == WINDOW_SIZE) {
            debug!("schedule window full; skipping fetch");
            return RefreshOutcome::Skipped;
        }

        let fresh = self.fetcher.fetch();
        if fresh.is_empty() {
            warn!(
                cached = existing.as_ref().map_or(0, Vec::len),
                "no gameweeks fetched; retaining existing data"
            );
            return RefreshOutcome::Retained;
        }

        match self.cache.save(&fresh) {
            Ok(()) => {
                info!(len = fresh.len(), first = fresh[0].id, "schedule window refreshed");
                RefreshOutcome::Updated(fresh.len())
            }
            Err(err) => {
                error!(%err, "failed to save gameweeks");
                RefreshOutcome::SaveFailed
            }
        }
    }
}

/// The two operations the UI layer uses: refresh on lifecycle events and
/// read the current gameweek.
pub struct GameweekService {
    cache: ScheduleCache,
    policy: RefreshPolicy,
}

impl GameweekService {
    pub fn new(store: Arc<dyn KeyValueStore>, fetcher: Arc<dyn ScheduleFetcher>) -> Self {
        let cache = ScheduleCache::new(store);
        let policy = RefreshPolicy::new(cache.clone(), fetcher);
        Self { cache, policy }
    }

    pub fn cache(&self) -> &ScheduleCache {
        &self.cache
    }

    pub fn refresh_if_needed(&self) -> RefreshOutcome {
        self.policy.refresh_if_needed()
    }

    pub fn on_lifecycle(&self, event: LifecycleEvent) -> RefreshOutcome {
        debug!(?event, "lifecycle refresh");
        self.refresh_if_needed()
    }

    pub fn current_gameweek(&self) -> Option<Gameweek> {
        self.current_gameweek_at(Utc::now())
    }

    pub fn current_gameweek_at(&self, now: DateTime<Utc>) -> Option<Gameweek> {
        let Some(window) = self.cache.load().filter(|w| !w.is_empty()) else {
            warn!("no gameweeks available");
            return None;
        };
        resolve_current(&window, now)
    }
}
