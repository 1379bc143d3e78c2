//! Reload-on-change holder for the current snapshot.
//!
//! Delivery layers keep one `SnapshotCache` per data file and call
//! `get_or_reload` on every request. The file is re-read only when its
//! modification time differs from the one recorded at the last load; each
//! reload produces a fresh `Arc<Catalog>`, so requests still holding the
//! previous snapshot are unaffected.

use crate::catalog::{Catalog, LoadError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

#[derive(Debug, Default)]
pub struct SnapshotCache {
    source: Option<PathBuf>,
    last_loaded: Option<SystemTime>,
    snapshot: Option<Arc<Catalog>>,
    quiet: bool,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress the stderr line written when a reload fails.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Current snapshot for `path`, reloading when the file changed.
    ///
    /// A failed load is remembered against the modification time that
    /// produced it, so a broken file is not re-parsed on every call; it is
    /// retried once the file changes again. A file that cannot be stat'ed
    /// yields `None` and clears the cache.
    pub fn get_or_reload(&mut self, path: &Path) -> Option<Arc<Catalog>> {
        let modified = match fs::metadata(path).and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(err) => {
                self.report(&LoadError::Io {
                    path: path.to_path_buf(),
                    source: err,
                });
                self.clear();
                return None;
            }
        };

        let same_source = self.source.as_deref() == Some(path);
        if same_source && self.last_loaded == Some(modified) {
            return self.snapshot.clone();
        }

        self.source = Some(path.to_path_buf());
        self.last_loaded = Some(modified);
        self.snapshot = match Catalog::load(path) {
            Ok(catalog) => Some(Arc::new(catalog)),
            Err(err) => {
                self.report(&err);
                None
            }
        };
        self.snapshot.clone()
    }

    /// Modification time of the file behind the current snapshot.
    pub fn last_loaded(&self) -> Option<SystemTime> {
        self.last_loaded
    }

    pub fn snapshot(&self) -> Option<Arc<Catalog>> {
        self.snapshot.clone()
    }

    pub fn clear(&mut self) {
        self.source = None;
        self.last_loaded = None;
        self.snapshot = None;
    }

    fn report(&self, err: &LoadError) {
        if !self.quiet {
            eprintln!("portfolio: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{File, FileTimes};
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_with_mtime(path: &Path, contents: &str, mtime: SystemTime) {
        fs::write(path, contents).unwrap();
        let file = File::options().write(true).open(path).unwrap();
        file.set_times(FileTimes::new().set_modified(mtime)).unwrap();
    }

    const ONE: &str = r#"[{"project_no": 1, "project_name": "a", "techniques_used": []}]"#;
    const TWO: &str = r#"[
        {"project_no": 1, "project_name": "a", "techniques_used": []},
        {"project_no": 2, "project_name": "b", "techniques_used": []}
    ]"#;

    #[test]
    fn unchanged_file_reuses_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        write_with_mtime(&path, ONE, t0);

        let mut cache = SnapshotCache::new().quiet();
        let first = cache.get_or_reload(&path).unwrap();
        let second = cache.get_or_reload(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.last_loaded(), Some(t0));
    }

    #[test]
    fn changed_file_hands_out_new_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        write_with_mtime(&path, ONE, t0);

        let mut cache = SnapshotCache::new().quiet();
        let before = cache.get_or_reload(&path).unwrap();

        write_with_mtime(&path, TWO, t0 + Duration::from_secs(60));
        let after = cache.get_or_reload(&path).unwrap();

        assert_eq!(before.count(), 1);
        assert_eq!(after.count(), 2);
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn broken_file_yields_none_until_fixed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        write_with_mtime(&path, "not json", t0);

        let mut cache = SnapshotCache::new().quiet();
        assert!(cache.get_or_reload(&path).is_none());
        assert!(cache.get_or_reload(&path).is_none());

        write_with_mtime(&path, ONE, t0 + Duration::from_secs(1));
        assert_eq!(cache.get_or_reload(&path).map(|c| c.count()), Some(1));
    }

    #[test]
    fn missing_file_clears_cache() {
        let dir = TempDir::new().unwrap();
        let mut cache = SnapshotCache::new().quiet();
        assert!(cache.get_or_reload(&dir.path().join("absent.json")).is_none());
        assert!(cache.snapshot().is_none());
        assert!(cache.last_loaded().is_none());
    }
}
