//! Per-path temporary-file cache of the latest full text seen for every
//! live file, plus its MD5 digest.
//!
//! The cache is split into two tiers on disk: `td/` holds full texts
//! reconstructed by applying a text delta, `df/` is scratch space for
//! svndiff windows generated when dumping in deltas mode. Both are
//! subdirectories of a single working directory owned by the dump run.

use std::{
    collections::HashMap,
    fs::{self, File},
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

mod error;
pub use error::Error;

mod sink;
pub use sink::TextSink;

#[derive(Debug, Clone)]
struct Entry {
    path: PathBuf,
    md5: String,
}

/// Owns the `td/`/`df/` tiers and the path→(tempfile, digest) index.
pub struct ContentCache {
    text_dir: PathBuf,
    delta_dir: PathBuf,
    entries: HashMap<String, Entry>,
    next_id: AtomicU64,
}

impl ContentCache {
    pub fn open(working_dir: impl AsRef<Path>) -> Result<Self, Error> {
        let text_dir = working_dir.as_ref().join("td");
        let delta_dir = working_dir.as_ref().join("df");
        fs::create_dir_all(&text_dir)?;
        fs::create_dir_all(&delta_dir)?;

        Ok(Self {
            text_dir,
            delta_dir,
            entries: HashMap::new(),
            next_id: AtomicU64::new(0),
        })
    }

    /// Opens a fresh temp file under `td/` to stream a new full text
    /// into. The caller writes svndiff-applied output bytes to the
    /// returned sink and calls [`TextSink::finish`] when the delta
    /// application completes, then [`ContentCache::commit`] to bind it to
    /// `path`.
    pub fn begin_text(&self) -> Result<TextSink, Error> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let path = self.text_dir.join(format!("t{:08x}", id));
        let file = File::create(&path)?;
        Ok(TextSink::new(path, file))
    }

    /// Opens a fresh temp file under `df/` for svndiff window staging.
    pub fn begin_delta_scratch(&self) -> Result<PathBuf, Error> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let path = self.delta_dir.join(format!("d{:08x}", id));
        File::create(&path)?;
        Ok(path)
    }

    /// Binds `path` to a freshly finished text, unlinking whatever file
    /// was previously cached for it.
    pub fn commit(&mut self, path: &str, new_file: PathBuf, md5: String) -> Result<(), Error> {
        if let Some(old) = self.entries.insert(
            path.to_string(),
            Entry {
                path: new_file,
                md5,
            },
        ) {
            let _ = fs::remove_file(&old.path);
        }
        Ok(())
    }

    /// The filesystem path of the currently cached text for `path`, if
    /// any — used as the source stream when a text delta arrives for a
    /// file that already has a base text.
    pub fn source_path(&self, path: &str) -> Option<&Path> {
        self.entries.get(path).map(|e| e.path.as_path())
    }

    /// The MD5 digest of the currently cached text for `path`, if any.
    /// Used by the copy resolver's MD5-match content-suppression rule.
    pub fn md5_of(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(|e| e.md5.as_str())
    }

    /// Drops the cached entry for `path` and unlinks its backing file.
    /// Called on node delete (recursively, by the caller, for every
    /// descendant path).
    pub fn remove(&mut self, path: &str) {
        if let Some(entry) = self.entries.remove(path) {
            let _ = fs::remove_file(&entry.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn streamed_write_produces_matching_digest() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::open(dir.path()).unwrap();

        let mut sink = cache.begin_text().unwrap();
        sink.write_all(b"hello\n").unwrap();
        let (path, md5) = sink.finish().unwrap();

        assert_eq!(md5, "b1946ac92492d2347c6235b4d2611184");
        assert_eq!(fs::read(&path).unwrap(), b"hello\n");
    }

    #[test]
    fn commit_replaces_and_unlinks_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ContentCache::open(dir.path()).unwrap();

        let mut first = cache.begin_text().unwrap();
        first.write_all(b"one").unwrap();
        let (first_path, first_md5) = first.finish().unwrap();
        cache.commit("a", first_path.clone(), first_md5).unwrap();
        assert!(first_path.exists());

        let mut second = cache.begin_text().unwrap();
        second.write_all(b"two").unwrap();
        let (second_path, second_md5) = second.finish().unwrap();
        cache.commit("a", second_path.clone(), second_md5).unwrap();

        assert!(!first_path.exists());
        assert_eq!(cache.source_path("a"), Some(second_path.as_path()));
    }
}
