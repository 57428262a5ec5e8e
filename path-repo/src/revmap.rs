/// One entry of the authoritative local-to-remote revision translation
/// table. `dump-writer` pushes exactly one entry per emitted revision,
/// including padding revisions, so `entries[i].local == i as u64` by
/// construction; `path-repo` and `copy-resolver` only ever consult it by
/// searching, never by indexing, so that invariant is not load-bearing
/// here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevisionMapEntry {
    pub local: u64,
    pub remote: u64,
}

/// The greatest local revision whose remote revision is `<= remote`, or
/// `None` if no entry qualifies (the copy source predates anything
/// dumped so far).
pub fn local_for_remote(revmap: &[RevisionMapEntry], remote: u64) -> Option<u64> {
    revmap
        .iter()
        .filter(|e| e.remote <= remote)
        .map(|e| e.local)
        .max()
}
