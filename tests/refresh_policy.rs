use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{Duration, TimeZone, Utc};

use gegenpress_companion::gameweek::{Gameweek, ScheduleWindow};
use gegenpress_companion::refresh::{GameweekService, LifecycleEvent, RefreshOutcome};
use gegenpress_companion::schedule_cache::ScheduleCache;
use gegenpress_companion::schedule_fetch::ScheduleFetcher;
use gegenpress_companion::store::MemoryStore;

struct CountingFetcher {
    calls: AtomicUsize,
    window: ScheduleWindow,
}

impl CountingFetcher {
    fn new(window: ScheduleWindow) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            window,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ScheduleFetcher for CountingFetcher {
    fn fetch(&self) -> ScheduleWindow {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.window.clone()
    }
}

fn window(ids: &[u32]) -> ScheduleWindow {
    let base = Utc.with_ymd_and_hms(2025, 1, 17, 18, 30, 0).unwrap();
    ids.iter()
        .enumerate()
        .map(|(i, id)| Gameweek::new(*id, base + Duration::weeks(i as i64)))
        .collect()
}

fn setup(
    cached: Option<ScheduleWindow>,
    fetched: ScheduleWindow,
) -> (GameweekService, ScheduleCache, Arc<CountingFetcher>) {
    let store = Arc::new(MemoryStore::new());
    let cache = ScheduleCache::new(store.clone());
    if let Some(w) = cached {
        cache.save(&w).unwrap();
    }
    let fetcher = CountingFetcher::new(fetched);
    let service = GameweekService::new(store, fetcher.clone());
    (service, cache, fetcher)
}

#[test]
fn full_window_skips_fetch() {
    let (service, cache, fetcher) = setup(Some(window(&[21, 22, 23, 24])), window(&[30]));
    assert_eq!(service.refresh_if_needed(), RefreshOutcome::Skipped);
    assert_eq!(fetcher.calls(), 0);
    assert_eq!(cache.load().map(|w| w.len()), Some(4));
}

#[test]
fn empty_fetch_keeps_stale_cache() {
    let stale = window(&[37, 38]);
    let (service, cache, fetcher) = setup(Some(stale.clone()), Vec::new());
    assert_eq!(service.refresh_if_needed(), RefreshOutcome::Retained);
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(cache.load(), Some(stale));
}

#[test]
fn empty_cache_is_filled_from_fetch() {
    let fresh = window(&[21, 22, 23, 24]);
    let (service, cache, fetcher) = setup(None, fresh.clone());
    assert_eq!(
        service.on_lifecycle(LifecycleEvent::Start),
        RefreshOutcome::Updated(4)
    );
    assert_eq!(cache.load(), Some(fresh));

    // Now full, so the foreground transition does nothing.
    assert_eq!(
        service.on_lifecycle(LifecycleEvent::Foreground),
        RefreshOutcome::Skipped
    );
    assert_eq!(fetcher.calls(), 1);
}

#[test]
fn short_window_is_replaced_wholesale() {
    let (service, cache, _) = setup(Some(window(&[20, 21])), window(&[21, 22, 23]));
    assert_eq!(service.refresh_if_needed(), RefreshOutcome::Updated(3));
    let ids: Vec<u32> = cache.load().unwrap().iter().map(|gw| gw.id).collect();
    assert_eq!(ids, vec![21, 22, 23]);
}

#[test]
fn empty_fetch_with_no_cache_leaves_nothing() {
    let (service, cache, _) = setup(None, Vec::new());
    assert_eq!(service.refresh_if_needed(), RefreshOutcome::Retained);
    assert!(cache.load().is_none());
    assert!(service.current_gameweek().is_none());
}

struct BlockingFetcher {
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl ScheduleFetcher for BlockingFetcher {
    fn fetch(&self) -> ScheduleWindow {
        self.entered.lock().unwrap().send(()).unwrap();
        self.release.lock().unwrap().recv().unwrap();
        window(&[21])
    }
}

#[test]
fn overlapping_refresh_is_skipped_while_in_flight() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let fetcher = Arc::new(BlockingFetcher {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    });
    let store = Arc::new(MemoryStore::new());
    let service = Arc::new(GameweekService::new(store, fetcher));

    let background = {
        let service = service.clone();
        thread::spawn(move || service.on_lifecycle(LifecycleEvent::Start))
    };
    entered_rx.recv().unwrap();

    assert_eq!(
        service.on_lifecycle(LifecycleEvent::Foreground),
        RefreshOutcome::InFlight
    );

    release_tx.send(()).unwrap();
    assert_eq!(background.join().unwrap(), RefreshOutcome::Updated(1));
    assert_eq!(service.cache().load().map(|w| w.len()), Some(1));
}
