use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use chrono::{
    DateTime,
    Duration,
    Utc,
};
use log::{
    debug,
    info,
    warn,
};

use crate::{
    core::{
        KanjiItem,
        StudyError,
    },
    store::Store,
};

pub mod api;

pub use api::{
    WaniKaniClient,
    BATCH_SIZE,
};

/// Remote origin of the kanji dataset. The cache only ever asks for the
/// complete set.
pub trait KanjiSource {
    fn fetch_all(&self) -> Result<Vec<KanjiItem>, StudyError>;
}

impl KanjiSource for WaniKaniClient {
    fn fetch_all(&self) -> Result<Vec<KanjiItem>, StudyError> {
        let ids = self.list_kanji_subject_ids()?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.fetch_subjects(&ids)
    }
}

/// TTL cache over a [`KanjiSource`]: the item list lives in a payload file,
/// the refresh timestamp in the store's singleton cache row.
pub struct KanjiCache<'a, S> {
    store: &'a Store,
    source: S,
    ttl_days: i64,
    payload_path: PathBuf,
}

impl<'a, S: KanjiSource> KanjiCache<'a, S> {
    pub fn new(store: &'a Store, source: S, ttl_days: i64, payload_path: PathBuf) -> Self {
        Self { store, source, ttl_days, payload_path }
    }

    /// The cached dataset, refreshed first when stale or forced.
    pub fn get_kanji(&self, force_refresh: bool) -> Result<Vec<KanjiItem>, StudyError> {
        let state = self.store.ensure_cache_row(&self.payload_path)?;
        // The recorded location is authoritative for reads; writes go to the
        // configured path.
        let payload_path = PathBuf::from(&state.payload_path);

        let stale = force_refresh
            || needs_refresh(state.last_refresh.as_deref(), self.ttl_days)
            || !payload_path.exists();
        if stale {
            info!("kanji cache is stale, fetching from remote");
            return self.refresh();
        }

        match read_payload(&payload_path) {
            Ok(items) => {
                debug!("kanji cache hit: {} items from {}", items.len(), payload_path.display());
                Ok(items)
            }
            Err(e) => {
                // Corrupt payload under a fresh timestamp is implicit staleness
                warn!("unreadable kanji payload {}: {e}; refetching", payload_path.display());
                self.refresh()
            }
        }
    }

    /// Fetch, write the payload file, then commit the timestamp. This order
    /// keeps a crash mid-write from marking stale data fresh.
    fn refresh(&self) -> Result<Vec<KanjiItem>, StudyError> {
        let items = self.source.fetch_all()?;
        write_payload(&self.payload_path, &items)?;
        self.store.mark_cache_refreshed(Utc::now(), &self.payload_path)?;
        info!("kanji cache refreshed: {} items", items.len());
        Ok(items)
    }
}

/// Stale when no parseable timestamp exists or the recorded one is older
/// than the TTL.
fn needs_refresh(last_refresh: Option<&str>, ttl_days: i64) -> bool {
    let Some(raw) = last_refresh else {
        return true;
    };
    let Ok(parsed) = DateTime::parse_from_rfc3339(raw) else {
        return true;
    };
    Utc::now() - parsed.with_timezone(&Utc) > Duration::days(ttl_days)
}

fn write_payload(path: &Path, items: &[KanjiItem]) -> Result<(), StudyError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(items)?;
    fs::write(path, json)?;
    Ok(())
}

fn read_payload(path: &Path) -> Result<Vec<KanjiItem>, StudyError> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::core::{
        Reading,
        ReadingKind,
    };

    struct FakeSource {
        calls: Cell<usize>,
        items: Vec<KanjiItem>,
        fail: bool,
    }

    impl FakeSource {
        fn new(items: Vec<KanjiItem>) -> Self {
            Self { calls: Cell::new(0), items, fail: false }
        }

        fn failing() -> Self {
            Self { calls: Cell::new(0), items: Vec::new(), fail: true }
        }
    }

    impl KanjiSource for &FakeSource {
        fn fetch_all(&self) -> Result<Vec<KanjiItem>, StudyError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(StudyError::Custom("remote down".to_string()));
            }
            Ok(self.items.clone())
        }
    }

    fn sample_items() -> Vec<KanjiItem> {
        vec![
            KanjiItem {
                id: 440,
                characters: Some("一".to_string()),
                meanings: vec!["One".to_string()],
                readings: vec![
                    Reading { reading: "いち".to_string(), kind: ReadingKind::Onyomi },
                    Reading { reading: "ひと".to_string(), kind: ReadingKind::Kunyomi },
                ],
            },
            KanjiItem {
                id: 441,
                characters: None,
                meanings: Vec::new(),
                readings: Vec::new(),
            },
        ]
    }

    #[test]
    fn first_read_fetches_once_and_persists_timestamp() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let store = Store::open_in_memory().expect("open");
        let source = FakeSource::new(sample_items());
        let cache = KanjiCache::new(&store, &source, 1, dir.path().join("wk_cache.json"));

        let before = Utc::now();
        let items = cache.get_kanji(false).expect("get");
        let after = Utc::now();

        assert_eq!(items, sample_items());
        assert_eq!(source.calls.get(), 1);

        let state = store.cache_state().expect("query").expect("row");
        let stamp = DateTime::parse_from_rfc3339(&state.last_refresh.expect("timestamp"))
            .expect("rfc3339")
            .with_timezone(&Utc);
        assert!(stamp >= before && stamp <= after);
    }

    #[test]
    fn fresh_cache_makes_no_remote_calls() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let store = Store::open_in_memory().expect("open");
        let payload = dir.path().join("wk_cache.json");

        let primer = FakeSource::new(sample_items());
        KanjiCache::new(&store, &primer, 1, payload.clone()).get_kanji(false).expect("prime");

        let idle = FakeSource::new(Vec::new());
        let items = KanjiCache::new(&store, &idle, 1, payload).get_kanji(false).expect("get");
        assert_eq!(items, sample_items());
        assert_eq!(idle.calls.get(), 0);
    }

    #[test]
    fn expired_timestamp_triggers_refetch() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let store = Store::open_in_memory().expect("open");
        let payload = dir.path().join("wk_cache.json");

        let source = FakeSource::new(sample_items());
        let cache = KanjiCache::new(&store, &source, 1, payload.clone());
        cache.get_kanji(false).expect("prime");

        // Age the recorded timestamp past the TTL
        store
            .mark_cache_refreshed(Utc::now() - Duration::days(2), &payload)
            .expect("age");
        cache.get_kanji(false).expect("get");
        assert_eq!(source.calls.get(), 2);
    }

    #[test]
    fn timestamp_within_ttl_is_fresh() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let store = Store::open_in_memory().expect("open");
        let payload = dir.path().join("wk_cache.json");

        let source = FakeSource::new(sample_items());
        let cache = KanjiCache::new(&store, &source, 3, payload.clone());
        cache.get_kanji(false).expect("prime");

        store
            .mark_cache_refreshed(Utc::now() - Duration::days(2), &payload)
            .expect("age");
        cache.get_kanji(false).expect("get");
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn deleted_payload_file_forces_refetch() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let store = Store::open_in_memory().expect("open");
        let payload = dir.path().join("wk_cache.json");

        let source = FakeSource::new(sample_items());
        let cache = KanjiCache::new(&store, &source, 1, payload.clone());
        cache.get_kanji(false).expect("prime");

        fs::remove_file(&payload).expect("delete out-of-band");
        let items = cache.get_kanji(false).expect("get");
        assert_eq!(items, sample_items());
        assert_eq!(source.calls.get(), 2);
        assert!(payload.exists());
    }

    #[test]
    fn corrupt_payload_is_implicit_staleness() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let store = Store::open_in_memory().expect("open");
        let payload = dir.path().join("wk_cache.json");

        let source = FakeSource::new(sample_items());
        let cache = KanjiCache::new(&store, &source, 1, payload.clone());
        cache.get_kanji(false).expect("prime");

        fs::write(&payload, "not json at all").expect("corrupt");
        let items = cache.get_kanji(false).expect("get");
        assert_eq!(items, sample_items());
        assert_eq!(source.calls.get(), 2);
    }

    #[test]
    fn unparseable_timestamp_means_never_refreshed() {
        assert!(needs_refresh(None, 1));
        assert!(needs_refresh(Some("yesterday-ish"), 1));
        assert!(needs_refresh(Some(""), 1));

        let fresh = Utc::now().to_rfc3339();
        assert!(!needs_refresh(Some(&fresh), 1));
    }

    #[test]
    fn force_refresh_bypasses_fresh_cache() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let store = Store::open_in_memory().expect("open");

        let source = FakeSource::new(sample_items());
        let cache = KanjiCache::new(&store, &source, 1, dir.path().join("wk_cache.json"));
        cache.get_kanji(false).expect("prime");
        cache.get_kanji(true).expect("forced");
        assert_eq!(source.calls.get(), 2);
    }

    #[test]
    fn remote_failure_leaves_prior_cache_intact() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let store = Store::open_in_memory().expect("open");
        let payload = dir.path().join("wk_cache.json");

        let primer = FakeSource::new(sample_items());
        KanjiCache::new(&store, &primer, 1, payload.clone()).get_kanji(false).expect("prime");
        let stamped = store.cache_state().expect("query").expect("row").last_refresh;

        let broken = FakeSource::failing();
        let result = KanjiCache::new(&store, &broken, 1, payload.clone()).get_kanji(true);
        assert!(result.is_err());

        // No partial update: payload still readable, timestamp untouched
        assert_eq!(read_payload(&payload).expect("payload"), sample_items());
        let state = store.cache_state().expect("query").expect("row");
        assert_eq!(state.last_refresh, stamped);
    }

    #[test]
    fn payload_round_trips_structurally() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let payload = dir.path().join("round_trip.json");

        let items = sample_items();
        write_payload(&payload, &items).expect("write");
        assert_eq!(read_payload(&payload).expect("read"), items);

        // Empty list round-trips too
        write_payload(&payload, &[]).expect("write empty");
        assert_eq!(read_payload(&payload).expect("read empty"), Vec::<KanjiItem>::new());
    }
}
