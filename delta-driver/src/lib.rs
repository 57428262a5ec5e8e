//! Drives one `RaSession::do_diff` call, turning the tree-editor callback
//! stream into the ordered sequence of `Node-*` records a revision dumps.
//!
//! This is the consumer side of `svn_client::DeltaConsumer`: every
//! `*_directory`/`*_file` callback just records what happened against an
//! arena-indexed node baton (see `arena`), and the actual decisions —
//! ordering, replace validation, content suppression — happen once, in
//! `close_edit`, by walking that tree. `content-cache` and `prop-store`
//! back the per-path state the walk needs; `copy-resolver` classifies
//! copies as they're reported.

use std::collections::{HashMap, HashSet};
use std::io::Write as _;

use async_trait::async_trait;

use content_cache::ContentCache;
use copy_resolver::{Classification, CopyResolver};
use dumpstream::{FormatVersion, NodeKind, NodeRecord, TextPayload};
use path_repo::{PathRepo, RevisionMapEntry};
use prop_store::PropStore;
use svn_client::{ChangeAction, CopyFrom, DeltaConsumer, LogEntry, PropertyValue};

mod arena;
use arena::{relative_to, NodeSlot};

mod error;
pub use error::Error;

mod svndiff;

/// Drives one revision's worth of tree-editor callbacks, accumulating the
/// ordered `Node-*` records to emit once `close_edit` walks the tree.
///
/// Borrows every component store rather than owning them, since all of
/// them outlive a single `do_diff` call by design (they carry state across
/// revisions). `RaSession::do_diff` takes its consumer by value and hands
/// it back, so the driver is constructed fresh per revision and consumed
/// by the caller for its `emitted` records afterwards.
pub struct DeltaDriver<'a> {
    content_cache: &'a mut ContentCache,
    prop_store: &'a mut PropStore,
    path_repo: &'a mut PathRepo,
    resolver: &'a CopyResolver,
    revmap: &'a [RevisionMapEntry],
    log_entry: &'a LogEntry,
    local_revnum: u64,
    format: FormatVersion,
    use_deltas: bool,
    dry_run: bool,

    arena: Vec<NodeSlot>,
    root: usize,
    applying: HashMap<usize, (svndiff::Applier, content_cache::TextSink)>,

    /// The node records accumulated by `close_edit`, in emission order.
    pub emitted: Vec<NodeRecord>,
}

impl<'a> DeltaDriver<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        content_cache: &'a mut ContentCache,
        prop_store: &'a mut PropStore,
        path_repo: &'a mut PathRepo,
        resolver: &'a CopyResolver,
        revmap: &'a [RevisionMapEntry],
        log_entry: &'a LogEntry,
        local_revnum: u64,
        format: FormatVersion,
        use_deltas: bool,
        dry_run: bool,
    ) -> Self {
        Self {
            content_cache,
            prop_store,
            path_repo,
            resolver,
            revmap,
            log_entry,
            local_revnum,
            format,
            use_deltas,
            dry_run,
            arena: Vec::new(),
            root: 0,
            applying: HashMap::new(),
            emitted: Vec::new(),
        }
    }

    fn push_node(&mut self, path: String, kind: NodeKind, action: dumpstream::NodeAction, parent: Option<usize>) -> usize {
        let idx = self.arena.len();
        self.arena.push(NodeSlot::new(path, kind, action, parent));
        if let Some(p) = parent {
            self.arena[p].children.push(idx);
        }
        idx
    }

    fn log_action(&self, path: &str) -> Option<ChangeAction> {
        self.log_entry.changed_paths.get(path).map(|c| c.action)
    }

    /// Classifies a reported copy and records it on the node. A `Copy`
    /// classification naming a local revision this run has not committed
    /// yet would mean the revision map lied — a protocol violation, not a
    /// resolvable case, so it is treated as fatal rather than silently
    /// downgraded like a genuine `Failed` classification.
    fn classify_copy(&mut self, idx: usize, copy_from: CopyFrom) -> Result<(), Error> {
        let classification = self.resolver.resolve(&copy_from.path, copy_from.revision, self.revmap);
        if let Classification::Copy { local_rev, .. } = &classification {
            if *local_rev >= self.local_revnum {
                return Err(Error::RevisionNotYetDumped(*local_rev));
            }
        }
        if matches!(classification, Classification::Failed | Classification::FailedOutside) {
            log::trace!("copy source {:?}@{} could not be localised, materialising as add", copy_from.path, copy_from.revision);
        }
        self.arena[idx].classification = classification;
        self.arena[idx].remote_copy_from = Some(copy_from);
        Ok(())
    }

    fn propagate_from_parent(&mut self, idx: usize) -> Result<(), Error> {
        let parent = match self.arena[idx].parent {
            Some(p) => p,
            None => return Ok(()),
        };
        let parent_classification = self.arena[parent].classification.clone();
        if matches!(parent_classification, Classification::None) {
            return Ok(());
        }
        let relative = relative_to(&self.arena[parent].path, &self.arena[idx].path);
        let classification = self.resolver.propagate(&parent_classification, &relative, self.path_repo)?;
        self.arena[idx].classification = classification;
        Ok(())
    }

    /// Loads the property set currently bound to `path` (consuming the
    /// association), seeding the node's inherited base before any
    /// `change_*_prop` calls arrive.
    fn load_base_props(&mut self, idx: usize) -> Result<(), Error> {
        let path = self.arena[idx].path.clone();
        if let Some(props) = self.prop_store.load(&path)? {
            self.arena[idx].base_props = props;
        }
        Ok(())
    }

    /// Merges a node's loaded base properties with whatever `change_*_prop`
    /// calls recorded, persists the result, and remembers it for emission.
    fn flush_properties(&mut self, idx: usize) -> Result<(), Error> {
        let node = &self.arena[idx];
        let mut final_props = node.base_props.clone();
        for (name, value) in &node.set_props {
            final_props.insert(name.clone(), value.clone());
        }
        for name in &node.deleted_props {
            final_props.remove(name);
        }
        let path = node.path.clone();
        self.prop_store.store(&path, &final_props)?;
        Ok(())
    }

    /// Builds the `Node-*` record for `idx`. `suppress_copy` forces the
    /// record to omit `Node-copyfrom-*` even if the node's classification
    /// resolved to a copy — used for the synthetic `Add` half of an
    /// invalidated `Replace`, which must not carry the old node's copy
    /// info forward.
    fn build_record(&mut self, idx: usize, suppress_copy: bool) -> Result<NodeRecord, Error> {
        let node = self.arena[idx].clone();

        let wire_action = match node.action {
            dumpstream::NodeAction::Replace => dumpstream::NodeAction::Add,
            other => other,
        };
        let mut record = NodeRecord::new(node.path.clone(), wire_action);
        if wire_action != dumpstream::NodeAction::Delete {
            record = record.kind(node.kind);
        }

        let copy = if suppress_copy {
            None
        } else {
            match &node.classification {
                Classification::Copy { local_path, local_rev } => Some((*local_rev, local_path.clone())),
                _ => None,
            }
        };
        if let Some((rev, path)) = &copy {
            record = record.copy_from(*rev, path.clone());
        }

        let dump_props = node.props_changed || wire_action == dumpstream::NodeAction::Add;
        if dump_props {
            let mut props = dumpstream::Properties::new();
            let mut has_deletions = false;
            match self.format {
                FormatVersion::V3 => {
                    for (name, value) in &node.set_props {
                        props.set(name.clone(), value.clone());
                    }
                    for name in &node.deleted_props {
                        props.delete(name.clone());
                        has_deletions = true;
                    }
                }
                FormatVersion::V2 => {
                    let mut final_props = node.base_props.clone();
                    for (name, value) in &node.set_props {
                        final_props.insert(name.clone(), value.clone());
                    }
                    for name in &node.deleted_props {
                        final_props.remove(name);
                    }
                    for (name, value) in &final_props {
                        props.set(name.clone(), value.clone());
                    }
                }
            }
            // A plain add has no prior property state to diff against, so
            // the set names already are the full set; the delta flag only
            // means something once there is a previous revision to compare.
            let is_delta = has_deletions
                || (self.format == FormatVersion::V3 && wire_action == dumpstream::NodeAction::Change);
            record = record.properties(props).prop_delta(is_delta);
        }

        let mut suppress_content = false;
        if wire_action == dumpstream::NodeAction::Add && copy.is_some() {
            if node.kind == NodeKind::Dir {
                suppress_content = true;
            } else if let Some(md5) = &node.md5 {
                if let Classification::Copy { local_path, .. } = &node.classification {
                    if self.content_cache.md5_of(local_path) == Some(md5.as_str()) {
                        suppress_content = true;
                    }
                }
            }
        }

        if node.kind == NodeKind::File && node.applied_delta && !suppress_content {
            if let Some(new_file) = &node.new_file {
                let fulltext = std::fs::read(new_file)?;
                let payload = if self.use_deltas {
                    TextPayload {
                        is_delta: true,
                        md5: node.md5.clone(),
                        bytes: svndiff::encode_single_window(&fulltext),
                    }
                } else {
                    TextPayload {
                        is_delta: false,
                        md5: node.md5.clone(),
                        bytes: fulltext,
                    }
                };
                record = record.text(payload);
            }
        }

        Ok(record)
    }

    /// Implements the replace-validation rule: a `Replace` is only valid if
    /// the affected path (or, when nested under a copied ancestor, the
    /// corresponding relative path at the ancestor's copy source) existed
    /// at the relevant previous revision. Returns `true` if the node
    /// should stay a `Replace`.
    fn validate_replace(&mut self, idx: usize) -> Result<bool, Error> {
        let path = self.arena[idx].path.clone();
        let mut ancestor = self.arena[idx].parent;
        let mut saw_copy_ancestor = false;
        let mut any_check_true = false;

        while let Some(aidx) = ancestor {
            let classification = self.arena[aidx].classification.clone();
            match classification {
                Classification::Copy { local_path, local_rev } => {
                    saw_copy_ancestor = true;
                    let ancestor_path = self.arena[aidx].path.clone();
                    let suffix = relative_to(&ancestor_path, &path);
                    let candidate = if suffix.is_empty() {
                        local_path
                    } else {
                        format!("{}/{}", local_path, suffix)
                    };
                    if self
                        .path_repo
                        .exists(&candidate, local_rev)
                        .map_err(|_| Error::ParentCheckFailed(local_rev))?
                    {
                        any_check_true = true;
                    }
                }
                Classification::Failed | Classification::FailedOutside => {
                    saw_copy_ancestor = true;
                    let prev = self.local_revnum.saturating_sub(1);
                    if self
                        .path_repo
                        .exists(&path, prev)
                        .map_err(|_| Error::ParentCheckFailed(prev))?
                    {
                        any_check_true = true;
                    }
                }
                Classification::None => {}
            }
            ancestor = self.arena[aidx].parent;
        }

        if saw_copy_ancestor {
            return Ok(any_check_true);
        }

        let prev = self.local_revnum.saturating_sub(1);
        self.path_repo
            .exists(&path, prev)
            .map_err(|_| Error::ParentCheckFailed(prev))
    }

    fn try_emit(&mut self, idx: usize, dumped: &mut HashSet<String>) -> Result<(), Error> {
        if !self.arena[idx].dump_needed {
            return Ok(());
        }
        let node = self.arena[idx].clone();

        // Step 1: an unmodified directory `Modify` carries nothing worth
        // dumping.
        if node.action == dumpstream::NodeAction::Change && node.kind == NodeKind::Dir && !node.props_changed {
            return Ok(());
        }

        // Step 2: an `Add` with no copy info of its own, nested under an
        // already-successfully-copied ancestor, is implied by that
        // ancestor's own copy and would be redundant to dump.
        if node.action == dumpstream::NodeAction::Add
            && node.remote_copy_from.is_none()
            && matches!(node.classification, Classification::Copy { .. })
        {
            return Ok(());
        }

        // Step 3: replace validation.
        if node.action == dumpstream::NodeAction::Replace {
            let stays = self.validate_replace(idx)?;
            if !stays {
                log::debug!("downgrading replace at {} to add (parent check failed)", node.path);
                self.arena[idx].action = dumpstream::NodeAction::Add;
                let record = self.build_record(idx, false)?;
                self.emitted.push(record);
                dumped.insert(node.path);
                return Ok(());
            }

            self.emitted.push(NodeRecord::new(node.path.clone(), dumpstream::NodeAction::Delete));
            self.arena[idx].action = dumpstream::NodeAction::Add;
            let record = self.build_record(idx, true)?;
            self.emitted.push(record);
            dumped.insert(node.path);
            return Ok(());
        }

        let record = self.build_record(idx, false)?;
        self.emitted.push(record);
        dumped.insert(node.path);
        Ok(())
    }

    fn emit_recursive(&mut self, idx: usize, dumped: &mut HashSet<String>) -> Result<(), Error> {
        let is_delete = self.arena[idx].action == dumpstream::NodeAction::Delete;
        let children = self.arena[idx].children.clone();

        if !is_delete {
            self.try_emit(idx, dumped)?;
            for child in &children {
                self.emit_recursive(*child, dumped)?;
            }
        } else {
            for child in &children {
                self.emit_recursive(*child, dumped)?;
            }
            self.try_emit(idx, dumped)?;
        }
        Ok(())
    }

    /// Finds the nearest emitted ancestor of `path`, returning `true` if it
    /// blocks a standalone delete from being emitted: either that ancestor
    /// was itself dumped as a `Delete` (this path is already gone as a
    /// side effect), or is under a classification the driver couldn't
    /// resolve (the subtree was expanded manually elsewhere and the delete
    /// would be redundant or wrong).
    fn nearest_emitted_ancestor_blocks(&self, path: &str, dumped: &HashSet<String>) -> bool {
        let mut current = path;
        while let Some(pos) = current.rfind('/') {
            current = &current[..pos];
            if dumped.contains(current) {
                return self
                    .arena
                    .iter()
                    .find(|n| n.path == current)
                    .map(|n| n.action == dumpstream::NodeAction::Delete)
                    .unwrap_or(false);
            }
            if let Some(node) = self.arena.iter().find(|n| n.path == current) {
                if matches!(node.classification, Classification::Failed | Classification::FailedOutside) {
                    return true;
                }
            }
        }
        false
    }

    fn emit_standalone_deletes(&mut self, dumped: &mut HashSet<String>) -> Result<(), Error> {
        let mut deletes: Vec<String> = self
            .log_entry
            .changed_paths
            .iter()
            .filter(|(_, c)| c.action == ChangeAction::Delete)
            .map(|(p, _)| p.clone())
            .collect();
        deletes.sort();

        for path in deletes {
            if dumped.contains(&path) {
                continue;
            }
            if self.nearest_emitted_ancestor_blocks(&path, dumped) {
                continue;
            }
            self.emitted.push(NodeRecord::new(path.clone(), dumpstream::NodeAction::Delete));
            dumped.insert(path);
        }
        Ok(())
    }
}

#[async_trait]
impl<'a> DeltaConsumer for DeltaDriver<'a> {
    type DirHandle = usize;
    type FileHandle = usize;

    async fn set_target_revision(&mut self, _revision: u64) -> Result<(), svn_client::Error> {
        Ok(())
    }

    async fn open_root(&mut self, _base_revision: u64) -> Result<Self::DirHandle, svn_client::Error> {
        let idx = self.push_node(String::new(), NodeKind::Dir, dumpstream::NodeAction::Change, None);
        self.root = idx;
        Ok(idx)
    }

    async fn delete_entry(&mut self, path: &str, _revision: u64, parent: Self::DirHandle) -> Result<(), svn_client::Error> {
        log::trace!("delete_entry {}", path);
        if !self.dry_run {
            let prev = self.local_revnum.saturating_sub(1);
            let descendants = map_err(self.path_repo.tree_at(prev).map_err(Error::from))?.subtree(path);
            for d in &descendants {
                map_err(self.prop_store.delete(d).map_err(Error::from))?;
                self.content_cache.remove(d);
            }
        }
        let idx = self.push_node(path.to_string(), NodeKind::Dir, dumpstream::NodeAction::Delete, Some(parent));
        self.arena[idx].dump_needed = true;
        Ok(())
    }

    async fn add_directory(
        &mut self,
        path: &str,
        parent: Self::DirHandle,
        copy_from: Option<CopyFrom>,
    ) -> Result<Self::DirHandle, svn_client::Error> {
        let action = if self.log_action(path) == Some(ChangeAction::Replace) {
            dumpstream::NodeAction::Replace
        } else {
            dumpstream::NodeAction::Add
        };
        let idx = self.push_node(path.to_string(), NodeKind::Dir, action, Some(parent));
        self.arena[idx].dump_needed = true;
        match copy_from {
            Some(cf) => map_err(self.classify_copy(idx, cf))?,
            None => map_err(self.propagate_from_parent(idx))?,
        }
        Ok(idx)
    }

    async fn open_directory(&mut self, path: &str, parent: Self::DirHandle, _base_revision: u64) -> Result<Self::DirHandle, svn_client::Error> {
        let idx = self.push_node(path.to_string(), NodeKind::Dir, dumpstream::NodeAction::Change, Some(parent));
        map_err(self.propagate_from_parent(idx))?;
        map_err(self.load_base_props(idx))?;
        Ok(idx)
    }

    async fn change_dir_prop(&mut self, dir: Self::DirHandle, name: &str, value: PropertyValue) -> Result<(), svn_client::Error> {
        apply_prop_change(&mut self.arena[dir], name, value);
        Ok(())
    }

    async fn close_directory(&mut self, dir: Self::DirHandle) -> Result<(), svn_client::Error> {
        map_err(self.flush_properties(dir))
    }

    async fn absent_directory(&mut self, _path: &str, _parent: Self::DirHandle) -> Result<(), svn_client::Error> {
        Ok(())
    }

    async fn add_file(
        &mut self,
        path: &str,
        parent: Self::DirHandle,
        copy_from: Option<CopyFrom>,
    ) -> Result<Self::FileHandle, svn_client::Error> {
        let action = if self.log_action(path) == Some(ChangeAction::Replace) {
            dumpstream::NodeAction::Replace
        } else {
            dumpstream::NodeAction::Add
        };
        let idx = self.push_node(path.to_string(), NodeKind::File, action, Some(parent));
        self.arena[idx].dump_needed = true;
        match copy_from {
            Some(cf) => map_err(self.classify_copy(idx, cf))?,
            None => map_err(self.propagate_from_parent(idx))?,
        }
        Ok(idx)
    }

    async fn open_file(&mut self, path: &str, parent: Self::DirHandle, _base_revision: u64) -> Result<Self::FileHandle, svn_client::Error> {
        let idx = self.push_node(path.to_string(), NodeKind::File, dumpstream::NodeAction::Change, Some(parent));
        map_err(self.propagate_from_parent(idx))?;
        map_err(self.load_base_props(idx))?;
        Ok(idx)
    }

    async fn apply_textdelta_window(&mut self, file: Self::FileHandle, window: &[u8]) -> Result<(), svn_client::Error> {
        if self.dry_run {
            return Ok(());
        }

        if !self.applying.contains_key(&file) {
            let source = match self.content_cache.source_path(&self.arena[file].path) {
                Some(p) => map_err(std::fs::read(p).map_err(Error::from))?,
                None => Vec::new(),
            };
            let sink = map_err(self.content_cache.begin_text().map_err(Error::from))?;
            self.applying.insert(file, (svndiff::Applier::new(source), sink));
        }

        let (applier, sink) = self.applying.get_mut(&file).expect("just inserted");
        let produced = map_err(applier.apply_window(window))?.to_vec();
        map_err(sink.write_all(&produced).map_err(Error::from))?;

        self.arena[file].applied_delta = true;
        self.arena[file].dump_needed = true;
        Ok(())
    }

    async fn change_file_prop(&mut self, file: Self::FileHandle, name: &str, value: PropertyValue) -> Result<(), svn_client::Error> {
        apply_prop_change(&mut self.arena[file], name, value);
        Ok(())
    }

    async fn close_file(&mut self, file: Self::FileHandle, _text_checksum: Option<&str>) -> Result<(), svn_client::Error> {
        if let Some((applier, sink)) = self.applying.remove(&file) {
            let _ = applier.into_fulltext();
            let (new_file, md5) = map_err(sink.finish().map_err(Error::from))?;
            let path = self.arena[file].path.clone();
            map_err(self.content_cache.commit(&path, new_file.clone(), md5.clone()).map_err(Error::from))?;
            self.arena[file].new_file = Some(new_file);
            self.arena[file].md5 = Some(md5);
        }
        map_err(self.flush_properties(file))
    }

    async fn absent_file(&mut self, _path: &str, _parent: Self::DirHandle) -> Result<(), svn_client::Error> {
        Ok(())
    }

    async fn close_edit(&mut self) -> Result<(), svn_client::Error> {
        if self.dry_run {
            return Ok(());
        }
        let root = self.root;
        let children = self.arena[root].children.clone();
        let mut dumped = HashSet::new();
        for child in children {
            map_err(self.emit_recursive(child, &mut dumped))?;
        }
        map_err(self.emit_standalone_deletes(&mut dumped))?;
        log::trace!("revision {}: {} node records", self.local_revnum, self.emitted.len());
        Ok(())
    }

    async fn abort_edit(&mut self) -> Result<(), svn_client::Error> {
        Ok(())
    }
}

fn apply_prop_change(node: &mut NodeSlot, name: &str, value: PropertyValue) {
    node.props_changed = true;
    node.dump_needed = true;
    match value {
        Some(v) => {
            node.deleted_props.retain(|n| n.as_slice() != name.as_bytes());
            node.set_props.insert(name.as_bytes().to_vec(), v);
        }
        None => {
            node.set_props.remove(name.as_bytes());
            node.deleted_props.push(name.as_bytes().to_vec());
        }
    }
}

/// `DeltaConsumer`'s methods return `svn_client::Error` (the remote
/// session's error type, shared across the editor callback boundary); this
/// crate's own richer `Error` carries the diagnostics, so every fallible
/// helper returns that internally and gets mapped at the trait seam.
fn map_err<T>(result: Result<T, Error>) -> Result<T, svn_client::Error> {
    result.map_err(|e| svn_client::Error::Consumer(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn log_entry() -> LogEntry {
        LogEntry {
            revision: 1,
            changed_paths: BTreeMap::new(),
            ..Default::default()
        }
    }

    fn stores(dir: &std::path::Path) -> (ContentCache, PropStore, PathRepo) {
        let cache = ContentCache::open(dir).unwrap();
        let props = PropStore::open(dir.join("props.db")).unwrap();
        let repo = PathRepo::open(dir.join("paths.db")).unwrap();
        (cache, props, repo)
    }

    #[tokio::test]
    async fn plain_add_file_emits_one_add_record() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cache, mut props, mut repo) = stores(dir.path());
        let resolver = CopyResolver::new("", 0, false, false);
        let revmap = Vec::new();
        let entry = log_entry();

        let mut driver = DeltaDriver::new(&mut cache, &mut props, &mut repo, &resolver, &revmap, &entry, 1, FormatVersion::V2, false, false);

        let root = driver.open_root(0).await.unwrap();
        let file = driver.add_file("README", root, None).await.unwrap();
        let encoded = svndiff::encode_single_window(b"hello\n");
        driver
            .apply_textdelta_window(file, &encoded[svndiff::FILE_HEADER.len()..])
            .await
            .unwrap();
        driver.close_file(file, None).await.unwrap();
        driver.close_edit().await.unwrap();

        assert_eq!(driver.emitted.len(), 1);
        let record = &driver.emitted[0];
        assert_eq!(record.path, "README");
        assert_eq!(record.action, dumpstream::NodeAction::Add);
        assert_eq!(record.text.as_ref().unwrap().bytes.as_slice(), b"hello\n");
    }

    #[tokio::test]
    async fn unmodified_directory_modify_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cache, mut props, mut repo) = stores(dir.path());
        let resolver = CopyResolver::new("", 0, false, false);
        let revmap = Vec::new();
        let entry = log_entry();

        let mut driver = DeltaDriver::new(&mut cache, &mut props, &mut repo, &resolver, &revmap, &entry, 1, FormatVersion::V2, false, false);

        let root = driver.open_root(0).await.unwrap();
        let dir_handle = driver.open_directory("trunk", root, 0).await.unwrap();
        driver.close_directory(dir_handle).await.unwrap();
        driver.close_edit().await.unwrap();

        assert!(driver.emitted.is_empty());
    }

    #[tokio::test]
    async fn copy_child_with_no_own_copy_info_is_suppressed() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cache, mut props, mut repo) = stores(dir.path());
        repo.add("trunk/a");
        repo.commit(0).unwrap();

        let resolver = CopyResolver::new("", 0, false, false);
        let revmap = vec![RevisionMapEntry { local: 0, remote: 0 }];
        let entry = log_entry();

        let mut driver = DeltaDriver::new(&mut cache, &mut props, &mut repo, &resolver, &revmap, &entry, 1, FormatVersion::V2, false, false);

        let root = driver.open_root(0).await.unwrap();
        let branch = driver
            .add_directory(
                "branch",
                root,
                Some(CopyFrom {
                    path: "trunk".into(),
                    revision: 0,
                }),
            )
            .await
            .unwrap();
        let _child = driver.add_directory("branch/a", branch, None).await.unwrap();
        driver.close_directory(branch).await.unwrap();
        driver.close_edit().await.unwrap();

        assert_eq!(driver.emitted.len(), 1);
        assert_eq!(driver.emitted[0].path, "branch");
    }
}
