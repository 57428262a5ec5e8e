//! The node-baton tree built up over one `do_diff` call.
//!
//! Every `*_directory`/`*_file` callback gets an arena index as its handle
//! instead of a heap-allocated baton; children reference their parent (and
//! vice versa) by index rather than through `Rc`/`Weak`, so the whole tree
//! is dropped for free when the driver is.

use std::path::PathBuf;

use copy_resolver::Classification;
use dumpstream::{NodeAction, NodeKind};
use prop_store::PropertySet;
use svn_client::CopyFrom;

#[derive(Debug, Clone)]
pub(crate) struct NodeSlot {
    pub path: String,
    pub kind: NodeKind,
    pub action: NodeAction,
    pub classification: Classification,
    /// The copy the remote itself reported for this node, as opposed to
    /// one inherited from an ancestor via propagation.
    pub remote_copy_from: Option<CopyFrom>,
    /// Properties loaded from `prop-store` at `open_*` time; empty for a
    /// plain `Add` (there is nothing to inherit).
    pub base_props: PropertySet,
    pub set_props: PropertySet,
    pub deleted_props: Vec<Vec<u8>>,
    pub props_changed: bool,
    pub applied_delta: bool,
    pub dump_needed: bool,
    pub md5: Option<String>,
    pub new_file: Option<PathBuf>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl NodeSlot {
    pub fn new(path: String, kind: NodeKind, action: NodeAction, parent: Option<usize>) -> Self {
        Self {
            path,
            kind,
            action,
            classification: Classification::None,
            remote_copy_from: None,
            base_props: PropertySet::new(),
            set_props: PropertySet::new(),
            deleted_props: Vec::new(),
            props_changed: false,
            applied_delta: false,
            dump_needed: false,
            md5: None,
            new_file: None,
            parent,
            children: Vec::new(),
        }
    }
}

/// The relative path of `child` underneath `parent`, given `parent`'s own
/// path (empty string for the session root).
pub(crate) fn relative_to(parent_path: &str, child_path: &str) -> String {
    if parent_path.is_empty() {
        return child_path.to_string();
    }
    child_path
        .strip_prefix(parent_path)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(child_path)
        .to_string()
}
