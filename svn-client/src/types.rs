use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Dir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Add,
    Delete,
    Replace,
    Modify,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFrom {
    pub path: String,
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedPath {
    pub action: ChangeAction,
    pub copy_from: Option<CopyFrom>,
}

/// One revision's worth of log metadata, as returned by `get_log`.
///
/// `changed_paths` keys are raw remote paths (no prefix stripped); callers
/// that only care about a subtree are expected to filter and re-key these
/// themselves (see `log-service`).
#[derive(Debug, Clone, Default)]
pub struct LogEntry {
    pub revision: u64,
    pub author: Option<String>,
    pub date: Option<String>,
    pub message: Option<String>,
    pub changed_paths: BTreeMap<String, ChangedPath>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dirent {
    pub kind: NodeKind,
    pub created_rev: u64,
}
