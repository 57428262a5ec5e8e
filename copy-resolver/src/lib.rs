//! Maps a remote copy-source `(path, revision)` to a local copyfrom
//! record, a failure to resolve, or a signal that the source lies outside
//! the dumped tree entirely.
//!
//! `delta-driver` is the only caller: it consults [`CopyResolver::resolve`]
//! once per node that the remote reports as a copy, and
//! [`CopyResolver::propagate`] once per child of a node already classified
//! as a copy, to decide whether that child inherits the parent's
//! copyfrom record.

use path_repo::{local_for_remote, PathRepo, RevisionMapEntry};

/// The outcome of resolving a copy source against the dumped tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Not a copy.
    None,
    /// The copy source is inside the dumped prefix and resolves to a
    /// revision this run has already assigned a local number to.
    Copy { local_path: String, local_rev: u64 },
    /// Inside the dumped prefix, but no local revision could be found for
    /// the source — the node must be materialised as a plain Add instead
    /// of carrying a `Node-copyfrom-*` pair.
    Failed,
    /// The copy source lies outside the dumped prefix altogether.
    FailedOutside,
}

pub struct CopyResolver {
    session_prefix: String,
    /// The first remote revision covered by this dump run.
    start: u64,
    keep_revnums: bool,
    incremental: bool,
}

impl CopyResolver {
    pub fn new(session_prefix: impl Into<String>, start: u64, incremental: bool, keep_revnums: bool) -> Self {
        Self {
            session_prefix: session_prefix.into(),
            start,
            keep_revnums,
            incremental,
        }
    }

    /// Classifies a copy whose source is `remote_path` at `remote_rev`.
    pub fn resolve(&self, remote_path: &str, remote_rev: u64, revmap: &[RevisionMapEntry]) -> Classification {
        if self.session_prefix.is_empty() && (self.start == 0 || self.incremental) {
            return Classification::Copy {
                local_path: remote_path.to_string(),
                local_rev: remote_rev,
            };
        }

        if remote_rev >= self.start {
            if let Some(relative) = strip_prefix(&self.session_prefix, remote_path) {
                let local_rev = if self.keep_revnums {
                    Some(remote_rev)
                } else {
                    local_for_remote(revmap, remote_rev)
                };

                return match local_rev {
                    Some(local_rev) => Classification::Copy {
                        local_path: relative,
                        local_rev,
                    },
                    None => Classification::Failed,
                };
            }
        }

        Classification::FailedOutside
    }

    /// Propagates `parent`'s classification to a child found at
    /// `relative_child` underneath the copied node (empty string for the
    /// copied node itself revisited, never called that way in practice).
    /// A `Copy` classification only survives if that relative path
    /// existed, at the copy's source revision, under the copy's source
    /// path; otherwise the child reverts to `None` (it is an addition the
    /// remote is reporting within an otherwise-copied subtree, not part
    /// of what was copied). `Failed`/`FailedOutside` classifications
    /// always propagate unchanged, since every descendant of a copy this
    /// run can't localise has to be manually expanded too.
    pub fn propagate(
        &self,
        parent: &Classification,
        relative_child: &str,
        repo: &mut PathRepo,
    ) -> Result<Classification, path_repo::Error> {
        match parent {
            Classification::Copy { local_path, local_rev } => {
                let candidate = if relative_child.is_empty() {
                    local_path.clone()
                } else {
                    format!("{}/{}", local_path, relative_child)
                };
                if repo.exists(&candidate, *local_rev)? {
                    Ok(parent.clone())
                } else {
                    Ok(Classification::None)
                }
            }
            Classification::Failed | Classification::FailedOutside => Ok(parent.clone()),
            Classification::None => Ok(Classification::None),
        }
    }
}

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

#[cfg(test)]
mod tests {
    use super::*;

    fn revmap() -> Vec<RevisionMapEntry> {
        vec![
            RevisionMapEntry { local: 0, remote: 0 },
            RevisionMapEntry { local: 1, remote: 2 },
            RevisionMapEntry { local: 2, remote: 5 },
        ]
    }

    #[test]
    fn empty_prefix_whole_repo_dump_keeps_planes_coincident() {
        let resolver = CopyResolver::new("", 0, false, false);
        assert_eq!(
            resolver.resolve("trunk/a", 5, &revmap()),
            Classification::Copy {
                local_path: "trunk/a".into(),
                local_rev: 5,
            }
        );
    }

    #[test]
    fn prefix_inside_copy_resolves_through_the_revision_map() {
        let resolver = CopyResolver::new("trunk", 0, false, false);
        assert_eq!(
            resolver.resolve("trunk/a", 4, &revmap()),
            Classification::Copy {
                local_path: "a".into(),
                local_rev: 1,
            }
        );
    }

    #[test]
    fn unresolvable_source_inside_prefix_is_failed() {
        let resolver = CopyResolver::new("trunk", 3, false, false);
        assert_eq!(resolver.resolve("trunk/a", 1, &revmap()), Classification::Failed);
    }

    #[test]
    fn source_outside_prefix_is_failed_outside() {
        let resolver = CopyResolver::new("trunk", 0, false, false);
        assert_eq!(resolver.resolve("vendor/a", 4, &revmap()), Classification::FailedOutside);
    }

    #[test]
    fn keep_revnums_skips_the_revision_map_lookup() {
        let resolver = CopyResolver::new("trunk", 0, false, true);
        assert_eq!(
            resolver.resolve("trunk/a", 4, &[]),
            Classification::Copy {
                local_path: "a".into(),
                local_rev: 4,
            }
        );
    }

    #[test]
    fn propagation_reverts_to_none_when_child_did_not_exist_at_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = PathRepo::open(dir.path().join("paths.db")).unwrap();
        repo.add("vendor/x/a");
        repo.commit(1).unwrap();

        let resolver = CopyResolver::new("trunk", 0, false, false);
        let parent = Classification::Copy {
            local_path: "vendor/x".into(),
            local_rev: 1,
        };

        assert_eq!(resolver.propagate(&parent, "a", &mut repo).unwrap(), parent);
        assert_eq!(
            resolver.propagate(&parent, "missing", &mut repo).unwrap(),
            Classification::None
        );
    }
}
