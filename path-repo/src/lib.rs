//! Versioned set of all live paths in the dumped tree.
//!
//! Plays the same role for this workspace that a version-control system's
//! own working-copy index plays: a sorted set of paths that is live right
//! now, plus enough history to answer "was path P live at past revision
//! R?" without re-walking the remote. History is kept as a sequence of
//! per-revision deltas with periodic full snapshots, persisted through
//! `blob-store` exactly as `prop-store` persists property blobs — the two
//! crates share the storage layer but not its keying scheme.

use std::path::Path;

use svn_client::{ChangeAction, LogEntry, NodeKind, RaSession};

mod cache;
use cache::ReconstructionCache;

mod encoding;
use encoding::Operation;

mod error;
pub use error::Error;

mod revmap;
pub use revmap::{local_for_remote, RevisionMapEntry};

mod tree;
pub use tree::Tree;

/// Revisions at this interval get a full snapshot instead of a delta, so
/// `reconstruct` never needs to replay more than `SNAPSHOT_INTERVAL`
/// deltas on top of a base.
const SNAPSHOT_INTERVAL: u64 = 1024;

/// Depth of the FIFO reconstruction cache.
const CACHE_SIZE: usize = 4;

pub struct PathRepo {
    store: blob_store::Store,
    /// The tree as of the most recently committed revision.
    working: Tree,
    /// `working` plus every operation applied since, not yet committed.
    scratch: Tree,
    staged: Vec<Operation>,
    head: Option<u64>,
    cache: ReconstructionCache,
}

impl PathRepo {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self {
            store: blob_store::Store::open(path)?,
            working: Tree::default(),
            scratch: Tree::default(),
            staged: Vec::new(),
            head: None,
            cache: ReconstructionCache::new(CACHE_SIZE),
        })
    }

    /// Marks `path` as live, effective on the next `commit`.
    pub fn add(&mut self, path: impl Into<String>) {
        let op = Operation::Add(path.into());
        encoding::apply(&mut self.scratch, &op);
        self.staged.push(op);
    }

    /// Marks `path` and every descendant of it as no longer live,
    /// effective on the next `commit`.
    pub fn delete(&mut self, path: impl Into<String>) {
        let op = Operation::Delete(path.into());
        encoding::apply(&mut self.scratch, &op);
        self.staged.push(op);
    }

    /// Persists the staged operations (or, on a snapshot revision, a full
    /// tree snapshot) keyed by `local_revnum`, and promotes `scratch` to
    /// be the new `working` tree.
    pub fn commit(&mut self, local_revnum: u64) -> Result<(), Error> {
        let is_snapshot = local_revnum > 0 && local_revnum % SNAPSHOT_INTERVAL == 0;

        if !self.staged.is_empty() || is_snapshot {
            let plain = if is_snapshot {
                encoding::encode_snapshot(&self.scratch)
            } else {
                encoding::encode_ops(&self.staged)
            };
            let compressed = zstd::stream::encode_all(plain.as_slice(), 0)?;

            let mut conn = self.store.connection()?;
            conn.store(&local_revnum.to_le_bytes(), &compressed)?;
        }

        self.working = self.scratch.clone();
        self.staged.clear();
        self.head = Some(local_revnum);
        self.cache.insert(local_revnum, self.working.clone());

        Ok(())
    }

    /// Rolls back every `add`/`delete` call since the last `commit`.
    pub fn discard(&mut self) {
        self.scratch = self.working.clone();
        self.staged.clear();
    }

    /// Whether `path` was live at committed revision `rev`.
    pub fn exists(&mut self, path: &str, rev: u64) -> Result<bool, Error> {
        Ok(self.tree_at(rev)?.contains(path))
    }

    /// Whether `parent`/`child_basename` was live at committed revision
    /// `rev`.
    pub fn parent_of(&mut self, parent: &str, child_basename: &str, rev: u64) -> Result<bool, Error> {
        let joined = if parent.is_empty() {
            child_basename.to_string()
        } else {
            format!("{}/{}", parent, child_basename)
        };
        self.exists(&joined, rev)
    }

    /// Returns the tree as of committed revision `rev`, using the working
    /// tree directly when `rev` is the current head and the FIFO cache
    /// otherwise.
    pub fn tree_at(&mut self, rev: u64) -> Result<Tree, Error> {
        if self.head == Some(rev) {
            return Ok(self.working.clone());
        }
        if let Some(tree) = self.cache.get(rev) {
            return Ok(tree.clone());
        }
        let tree = self.reconstruct(rev)?;
        self.cache.insert(rev, tree.clone());
        Ok(tree)
    }

    /// Rebuilds the tree at `rev` from scratch: applies the nearest
    /// snapshot at or before `rev`, then replays every stored delta
    /// between it and `rev` in order. Bypasses the FIFO cache entirely —
    /// used both by `tree_at` on a cache miss and directly by tests that
    /// want to verify the cache isn't masking a reconstruction bug.
    pub fn reconstruct(&self, rev: u64) -> Result<Tree, Error> {
        let mut conn = self.store.connection()?;
        let mut tree = Tree::default();

        let snapshot_base = (rev / SNAPSHOT_INTERVAL) * SNAPSHOT_INTERVAL;
        let mut start = 0u64;

        if snapshot_base > 0 {
            if let Some(bytes) = conn.fetch(&snapshot_base.to_le_bytes())? {
                let ops = decode_blob(&bytes, snapshot_base)?;
                for op in &ops {
                    encoding::apply(&mut tree, op);
                }
                start = snapshot_base + 1;
            }
        }

        for r in start..=rev {
            if let Some(bytes) = conn.fetch(&r.to_le_bytes())? {
                let ops = decode_blob(&bytes, r)?;
                for op in &ops {
                    encoding::apply(&mut tree, op);
                }
            }
        }

        Ok(tree)
    }

    /// Implements the replay logic of `commit_log`: sorts `log_entry`'s
    /// changed paths, applies deletes, then resolves and applies adds
    /// (expanding copies by reconstructing the source tree when the copy
    /// source is inside `session_prefix` and resolvable, or by fetching
    /// the subtree fresh from `session` otherwise), and finally commits.
    ///
    /// On failure no partial state survives: the caller must call
    /// `discard` (the scratch tree is left mutated, by design, so the
    /// caller can inspect it for diagnostics before discarding).
    pub async fn commit_log<S: RaSession>(
        &mut self,
        session: &S,
        session_prefix: &str,
        log_entry: &LogEntry,
        local_revnum: u64,
        revmap: &[RevisionMapEntry],
    ) -> Result<(), Error> {
        let mut paths: Vec<&String> = log_entry.changed_paths.keys().collect();
        paths.sort();

        for path in &paths {
            let entry = &log_entry.changed_paths[*path];
            if matches!(entry.action, ChangeAction::Delete | ChangeAction::Replace) {
                self.delete(path.as_str());
            }
        }

        for path in paths {
            let entry = &log_entry.changed_paths[path];
            if !matches!(entry.action, ChangeAction::Add | ChangeAction::Replace) {
                continue;
            }

            match &entry.copy_from {
                None => self.add(path.clone()),
                Some(copy_from) => {
                    self.expand_copy(session, session_prefix, path, copy_from, log_entry.revision, revmap)
                        .await?;
                }
            }
        }

        self.commit(local_revnum)
    }

    async fn expand_copy<S: RaSession>(
        &mut self,
        session: &S,
        session_prefix: &str,
        dest: &str,
        copy_from: &svn_client::CopyFrom,
        log_remote_rev: u64,
        revmap: &[RevisionMapEntry],
    ) -> Result<(), Error> {
        if let Some(rel_source) = strip_prefix(session_prefix, &copy_from.path) {
            if let Some(local_rev) = local_for_remote(revmap, copy_from.revision) {
                let source_tree = self.reconstruct(local_rev)?;
                let members = source_tree.subtree(&rel_source);

                // Single-member subtree (a file copy, never a directory
                // with descendants): no suffix rewriting needed, since
                // there is nothing below the copy source to re-prefix.
                if members.len() == 1 && members[0] == rel_source {
                    self.add(dest.to_string());
                } else {
                    for member in members {
                        let suffix = member[rel_source.len()..].trim_start_matches('/');
                        let new_path = if suffix.is_empty() {
                            dest.to_string()
                        } else {
                            format!("{}/{}", dest, suffix)
                        };
                        self.add(new_path);
                    }
                }
                return Ok(());
            }
        }

        // Copy source outside the dumped prefix, or inside it but not
        // resolvable to a local revision: materialise by listing the
        // remote tree directly, rooted at the destination, at the log
        // entry's own remote revision (see SPEC_FULL.md's open question
        // on this point).
        let members = fetch_subtree(session, dest, log_remote_rev).await?;
        for member in members {
            self.add(member);
        }
        Ok(())
    }
}

fn decode_blob(compressed: &[u8], revision: u64) -> Result<Vec<Operation>, Error> {
    let plain = zstd::stream::decode_all(compressed)?;
    encoding::decode_ops(&plain, revision)
}

/// Strips `prefix` from `path` if `path` is `prefix` itself or nested
/// beneath it, returning the relative remainder (empty string if equal).
/// `prefix` empty means every path is "inside".
fn strip_prefix(prefix: &str, path: &str) -> Option<String> {
    if prefix.is_empty() {
        return Some(path.to_string());
    }
    if path == prefix {
        return Some(String::new());
    }
    path.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .map(|s| s.to_string())
}

async fn fetch_subtree<S: RaSession>(session: &S, root: &str, rev: u64) -> Result<Vec<String>, Error> {
    let mut results = Vec::new();
    let mut stack = vec![root.to_string()];

    while let Some(dir) = stack.pop() {
        let kind = session.check_path(&dir, rev).await?;
        results.push(dir.clone());

        if kind != Some(NodeKind::Dir) {
            continue;
        }

        for (name, dirent) in session.get_dir(&dir, rev).await? {
            let child = format!("{}/{}", dir, name);
            if dirent.kind == NodeKind::Dir {
                stack.push(child);
            } else {
                results.push(child);
            }
        }
    }

    results.sort();
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_persists_and_reconstruct_replays_it() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = PathRepo::open(dir.path().join("paths.db")).unwrap();

        repo.add("trunk");
        repo.add("trunk/README");
        repo.commit(1).unwrap();

        repo.delete("trunk/README");
        repo.add("trunk/NOTES");
        repo.commit(2).unwrap();

        assert!(repo.exists("trunk/NOTES", 2).unwrap());
        assert!(!repo.exists("trunk/README", 2).unwrap());
        assert!(repo.exists("trunk/README", 1).unwrap());

        let replayed = repo.reconstruct(2).unwrap();
        assert_eq!(replayed, repo.tree_at(2).unwrap());
    }

    #[test]
    fn discard_rolls_back_uncommitted_changes() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = PathRepo::open(dir.path().join("paths.db")).unwrap();
        repo.add("a");
        repo.commit(1).unwrap();

        repo.add("b");
        repo.discard();

        assert!(repo.exists("a", 1).unwrap());
        assert!(!repo.scratch.contains("b"));
    }

    #[test]
    fn parent_of_checks_the_joined_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = PathRepo::open(dir.path().join("paths.db")).unwrap();
        repo.add("trunk/a.txt");
        repo.commit(1).unwrap();

        assert!(repo.parent_of("trunk", "a.txt", 1).unwrap());
        assert!(!repo.parent_of("trunk", "b.txt", 1).unwrap());
    }

    #[test]
    fn reconstruction_past_a_snapshot_boundary_matches_live_tree() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = PathRepo::open(dir.path().join("paths.db")).unwrap();

        // Drive past the snapshot interval so a snapshot blob gets
        // written at r=1024, then verify a later reconstruction still
        // matches replaying every delta from r=0.
        for r in 1..=1026u64 {
            repo.add(format!("f{}", r));
            repo.commit(r).unwrap();
        }

        let reconstructed = repo.reconstruct(1026).unwrap();
        assert_eq!(reconstructed, repo.tree_at(1026).unwrap());
        assert!(reconstructed.contains("f1"));
        assert!(reconstructed.contains("f1026"));
    }

    /// A scripted `RaSession` covering only what `expand_copy`'s
    /// outside-prefix fallback exercises: `check_path`/`get_dir` against a
    /// small fixed directory listing. Every other operation is unreachable
    /// from that code path and panics if called.
    mod fake_session {
        use std::collections::BTreeMap;

        use async_trait::async_trait;
        use svn_client::{DeltaConsumer, Dirent, Error, LogEntry, NodeKind, RaSession};

        pub struct FakeSession {
            /// Maps a path to its kind and children (for directories).
            pub tree: BTreeMap<&'static str, (NodeKind, &'static [&'static str])>,
        }

        #[async_trait]
        impl RaSession for FakeSession {
            async fn get_log(&self, _paths: &[String], _start: u64, _end: u64, _limit: u32, _discover_changed_paths: bool) -> Result<Vec<LogEntry>, Error> {
                unreachable!("not exercised by expand_copy's fallback")
            }

            async fn stat(&self, _path: &str, _revision: u64) -> Result<Option<Dirent>, Error> {
                unreachable!("not exercised by expand_copy's fallback")
            }

            async fn check_path(&self, path: &str, _revision: u64) -> Result<Option<NodeKind>, Error> {
                Ok(self.tree.get(path).map(|(kind, _)| *kind))
            }

            async fn get_uuid(&self) -> Result<String, Error> {
                unreachable!("not exercised by expand_copy's fallback")
            }

            async fn get_dir(&self, path: &str, _revision: u64) -> Result<BTreeMap<String, Dirent>, Error> {
                let (_, children) = self.tree.get(path).copied().unwrap_or((NodeKind::Dir, &[]));
                let mut out = BTreeMap::new();
                for child in children {
                    let child_path = format!("{}/{}", path, child);
                    let (kind, _) = self.tree.get(child_path.as_str()).copied().unwrap_or((NodeKind::File, &[]));
                    out.insert((*child).to_string(), Dirent { kind, created_rev: 0 });
                }
                Ok(out)
            }

            async fn do_diff<C>(&self, _base_revision: u64, _target_revision: u64, _start_empty: bool, _consumer: C) -> Result<C, Error>
            where
                C: DeltaConsumer + Send,
                Self: Sized,
            {
                unreachable!("not exercised by expand_copy's fallback")
            }
        }
    }

    /// Covers `expand_copy`'s fallback branch (§4.3/SPEC_FULL.md's S4):
    /// a copy source outside the dumped prefix — here `/vendor/x` copied
    /// into `/trunk/x` while `session_prefix` is `trunk` — can never
    /// resolve through the local revision map, so the destination subtree
    /// is materialised by listing the remote tree directly, rooted at the
    /// destination path, rather than by reconstructing any local tree.
    #[tokio::test]
    async fn expand_copy_falls_back_to_listing_the_remote_tree_outside_the_prefix() {
        use fake_session::FakeSession;
        use svn_client::{ChangedPath, ChangeAction, CopyFrom};

        let dir = tempfile::tempdir().unwrap();
        let mut repo = PathRepo::open(dir.path().join("paths.db")).unwrap();

        let mut tree = std::collections::BTreeMap::new();
        tree.insert("trunk/x", (NodeKind::Dir, &["a.txt", "b.txt"][..]));
        let session = FakeSession { tree };

        let mut log_entry = LogEntry {
            revision: 5,
            ..Default::default()
        };
        log_entry.changed_paths.insert(
            "trunk/x".to_string(),
            ChangedPath {
                action: ChangeAction::Add,
                copy_from: Some(CopyFrom {
                    path: "vendor/x".to_string(),
                    revision: 4,
                }),
            },
        );

        // An empty revmap: revision 4 has no local translation, and even
        // if it did, "vendor/x" doesn't sit under "trunk" so the prefix
        // check alone would already force the fallback.
        repo.commit_log(&session, "trunk", &log_entry, 1, &[]).await.unwrap();

        assert!(repo.exists("trunk/x", 1).unwrap());
        assert!(repo.exists("trunk/x/a.txt", 1).unwrap());
        assert!(repo.exists("trunk/x/b.txt", 1).unwrap());
    }
}
