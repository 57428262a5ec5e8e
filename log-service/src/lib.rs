//! Fetches revision metadata from the remote and re-keys it relative to
//! the session's dumped prefix.
//!
//! `dump-writer` is the only caller; it drives one revision at a time
//! through [`LogService::fetch_single`] in the main loop, and uses
//! [`LogService::fetch_all`] and [`LogService::range_of`] only during
//! startup (the prime phase, and narrowing the start revision when the
//! dumped root is a subdirectory).

use std::collections::BTreeMap;

use svn_client::{ChangedPath, LogEntry, RaSession};

mod error;
pub use error::Error;

pub struct LogService {
    /// The path, relative to the repository root, being dumped. Empty
    /// means the whole repository.
    prefix: String,
}

impl LogService {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Fetches the log entry for exactly `rev`, which must not exceed
    /// `upper_bound` (the caller's established end-of-range revision;
    /// violating it is a programmer error, checked with an assertion
    /// rather than threaded through as a recoverable `Error` variant).
    pub async fn fetch_single<S: RaSession>(
        &self,
        session: &S,
        rev: u64,
        upper_bound: u64,
    ) -> Result<LogEntry, Error> {
        assert!(rev <= upper_bound, "revision {} exceeds upper bound {}", rev, upper_bound);

        let mut entries = session
            .get_log(&[self.root_path()], rev, rev, 1, true)
            .await?;
        let entry = entries.pop().ok_or(Error::MissingEntry(rev))?;
        Ok(self.filter(entry))
    }

    /// Pulls every log entry in `start..=end`, appending each (prefix
    /// filtered) entry to `out` in revision order and invoking `progress`
    /// once per entry fetched.
    pub async fn fetch_all<S: RaSession>(
        &self,
        session: &S,
        start: u64,
        end: u64,
        out: &mut Vec<LogEntry>,
        mut progress: impl FnMut(u64),
    ) -> Result<(), Error> {
        let entries = session
            .get_log(&[self.root_path()], start, end, 0, true)
            .await?;

        for entry in entries {
            progress(entry.revision);
            out.push(self.filter(entry));
        }

        Ok(())
    }

    /// Locates the first and last revisions in `start..=end` that touched
    /// the session root, used when dumping a subdirectory to find the
    /// earliest sensible start revision.
    pub async fn range_of<S: RaSession>(
        &self,
        session: &S,
        start: u64,
        end: u64,
    ) -> Result<(u64, u64), Error> {
        let entries = session
            .get_log(&[self.root_path()], start, end, 0, false)
            .await?;

        match (entries.first(), entries.last()) {
            (Some(first), Some(last)) => Ok((first.revision, last.revision)),
            _ => Err(Error::RootNeverTouched {
                root: self.prefix.clone(),
                start,
                end,
            }),
        }
    }

    fn root_path(&self) -> String {
        self.prefix.clone()
    }

    /// Drops changed-path entries outside `self.prefix` and strips the
    /// prefix (plus exactly one separating slash) from the keys that
    /// survive. `copy_from` paths are left untouched — they stay
    /// repository-absolute, since `path-repo` and `copy-resolver` need to
    /// tell an in-prefix copy source from an out-of-prefix one, which
    /// requires the original absolute path.
    fn filter(&self, mut entry: LogEntry) -> LogEntry {
        if self.prefix.is_empty() {
            return entry;
        }

        let mut filtered: BTreeMap<String, ChangedPath> = BTreeMap::new();
        for (path, changed) in entry.changed_paths.into_iter() {
            if let Some(relative) = strip_prefix(&self.prefix, &path) {
                filtered.insert(relative, changed);
            }
        }
        entry.changed_paths = filtered;
        entry
    }
}

/// `path` survives iff it is `prefix` itself or nested under it (the
/// nested case requiring the separating `/`); the returned string has the
/// prefix and that separator removed exactly once.
fn strip_prefix(prefix: &str, path: &str) -> Option<String> {
    if path == prefix {
        return Some(String::new());
    }
    path.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefix_and_drops_paths_outside_it() {
        assert_eq!(strip_prefix("trunk", "trunk/a/b"), Some("a/b".to_string()));
        assert_eq!(strip_prefix("trunk", "trunk"), Some(String::new()));
        assert_eq!(strip_prefix("trunk", "branches/v1"), None);
        assert_eq!(strip_prefix("trunk", "trunk2/a"), None);
    }

    #[test]
    fn empty_prefix_is_a_no_op() {
        let service = LogService::new("");
        let mut paths = BTreeMap::new();
        paths.insert(
            "anything/at/all".to_string(),
            ChangedPath {
                action: svn_client::ChangeAction::Modify,
                copy_from: None,
            },
        );
        let entry = LogEntry {
            revision: 1,
            changed_paths: paths.clone(),
            ..Default::default()
        };
        assert_eq!(service.filter(entry).changed_paths, paths);
    }
}
