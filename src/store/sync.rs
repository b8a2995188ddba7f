use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use crate::store::json_store::JsonStore;
use crate::store::schema::{ProgressSnapshot, reconcile};
use crate::store::{ProgressStore, StoreError};

/// Local-first progress persistence with best-effort remote mirroring.
///
/// The local store is authoritative for this device. Remote reads and writes
/// never fail the caller; their errors are logged.
pub struct ProgressSync {
    local: JsonStore,
    remote: Option<Arc<dyn ProgressStore>>,
}

/// Handle on an in-flight remote save.
#[must_use = "dropping detaches the remote save"]
pub struct PendingSync(Option<JoinHandle<()>>);

impl PendingSync {
    /// Block until the remote save has finished (or was never started).
    pub fn wait(self) {
        if let Some(handle) = self.0 {
            let _ = handle.join();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.0.as_ref().is_none_or(|handle| handle.is_finished())
    }
}

impl ProgressSync {
    pub fn new(local: JsonStore, remote: Option<Arc<dyn ProgressStore>>) -> Self {
        Self { local, remote }
    }

    pub fn local(&self) -> &JsonStore {
        &self.local
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Progress to resume `book_id` from, reconciled across local and remote.
    /// Snapshots that do not fit a buffer of `text_len` chars are dropped.
    pub fn load(&self, book_id: &str, text_len: usize) -> Option<ProgressSnapshot> {
        let local = self.local.load_progress(book_id).unwrap_or_else(|e| {
            warn!(book_id, error = %e, "local progress unavailable");
            None
        });
        let remote = self.remote.as_ref().and_then(|remote| {
            remote.load_progress(book_id).unwrap_or_else(|e| {
                warn!(book_id, error = %e, "remote progress unavailable");
                None
            })
        });

        let local = local.filter(|p| p.fits(text_len));
        let remote = remote.filter(|p| p.fits(text_len));
        let picked = reconcile(local, remote);
        if let Some(p) = &picked {
            info!(book_id, position = p.position_index, updated_at = %p.updated_at, "resuming progress");
        }
        picked
    }

    /// Save locally, then push to the remote on a background thread.
    pub fn save(&self, snapshot: &ProgressSnapshot) -> Result<PendingSync, StoreError> {
        self.local.save_progress(snapshot)?;

        let Some(remote) = self.remote.clone() else {
            return Ok(PendingSync(None));
        };
        let snapshot = snapshot.clone();
        let handle = thread::spawn(move || {
            if let Err(e) = remote.save_progress(&snapshot) {
                warn!(book_id = %snapshot.book_id, error = %e, "remote progress save failed");
            }
        });
        Ok(PendingSync(Some(handle)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{DateTime, Duration, TimeZone, Utc};
    use tempfile::TempDir;

    use super::*;
    use crate::session::stats::SessionStats;

    #[derive(Default)]
    struct MemoryStore {
        entries: Mutex<Vec<ProgressSnapshot>>,
        fail: bool,
    }

    impl ProgressStore for MemoryStore {
        fn load_progress(&self, book_id: &str) -> Result<Option<ProgressSnapshot>, StoreError> {
            if self.fail {
                return Err(StoreError::Status {
                    status: 503,
                    url: "memory".to_string(),
                });
            }
            let entries = self.entries.lock().unwrap();
            Ok(entries.iter().find(|p| p.book_id == book_id).cloned())
        }

        fn save_progress(&self, snapshot: &ProgressSnapshot) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Status {
                    status: 503,
                    url: "memory".to_string(),
                });
            }
            self.entries.lock().unwrap().push(snapshot.clone());
            Ok(())
        }
    }

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 2, 10, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn snapshot(position_index: usize, minutes: i64) -> ProgressSnapshot {
        ProgressSnapshot {
            book_id: "book".to_string(),
            title: "Book".to_string(),
            total_chars: 50,
            position_index,
            updated_at: at(minutes),
            stats: SessionStats::new(at(minutes)),
        }
    }

    fn make_sync(remote: Option<Arc<MemoryStore>>) -> (TempDir, ProgressSync) {
        let dir = TempDir::new().unwrap();
        let local = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        let remote = remote.map(|r| r as Arc<dyn ProgressStore>);
        (dir, ProgressSync::new(local, remote))
    }

    #[test]
    fn test_load_prefers_newer_remote() {
        let remote = Arc::new(MemoryStore::default());
        remote.entries.lock().unwrap().push(snapshot(40, 5));
        let (_dir, sync) = make_sync(Some(remote));
        sync.local().save_progress(&snapshot(10, 1)).unwrap();

        assert_eq!(sync.load("book", 50).unwrap().position_index, 40);
    }

    #[test]
    fn test_load_keeps_newer_local() {
        let remote = Arc::new(MemoryStore::default());
        remote.entries.lock().unwrap().push(snapshot(40, 1));
        let (_dir, sync) = make_sync(Some(remote));
        sync.local().save_progress(&snapshot(10, 5)).unwrap();

        assert_eq!(sync.load("book", 50).unwrap().position_index, 10);
    }

    #[test]
    fn test_load_survives_remote_failure() {
        let remote = Arc::new(MemoryStore {
            fail: true,
            ..Default::default()
        });
        let (_dir, sync) = make_sync(Some(remote));
        sync.local().save_progress(&snapshot(10, 1)).unwrap();

        assert_eq!(sync.load("book", 50).unwrap().position_index, 10);
    }

    #[test]
    fn test_load_drops_progress_that_does_not_fit() {
        let (_dir, sync) = make_sync(None);
        sync.local().save_progress(&snapshot(30, 1)).unwrap();

        assert!(sync.load("book", 20).is_none());
        assert!(sync.load("book", 30).is_some());
    }

    #[test]
    fn test_save_writes_local_and_remote() {
        let remote = Arc::new(MemoryStore::default());
        let (_dir, sync) = make_sync(Some(remote.clone()));

        sync.save(&snapshot(12, 3)).unwrap().wait();

        assert_eq!(sync.local().load_progress("book").unwrap().unwrap().position_index, 12);
        assert_eq!(remote.entries.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_remote_save_failure_is_swallowed() {
        let remote = Arc::new(MemoryStore {
            fail: true,
            ..Default::default()
        });
        let (_dir, sync) = make_sync(Some(remote));

        sync.save(&snapshot(12, 3)).unwrap().wait();
        assert!(sync.local().load_progress("book").unwrap().is_some());
    }

    #[test]
    fn test_pending_without_remote_is_finished() {
        let (_dir, sync) = make_sync(None);
        let pending = sync.save(&snapshot(12, 3)).unwrap();
        assert!(pending.is_finished());
        pending.wait();
    }

    #[test]
    fn test_local_save_failure_is_returned() {
        let (_dir, sync) = make_sync(None);
        assert!(sync.save(&snapshot(99, 3)).is_err());
    }
}
