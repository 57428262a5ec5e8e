use crate::Properties;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Dir,
}

impl NodeKind {
    fn as_wire(self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Dir => "dir",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeAction {
    Change,
    Add,
    Delete,
    Replace,
}

impl NodeAction {
    fn as_wire(self) -> &'static str {
        match self {
            NodeAction::Change => "change",
            NodeAction::Add => "add",
            NodeAction::Delete => "delete",
            NodeAction::Replace => "replace",
        }
    }
}

/// Where a node's copy, if any, came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFrom {
    pub revision: u64,
    pub path: String,
}

/// The text payload of a node, either a full text or an svndiff window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPayload {
    pub is_delta: bool,
    pub md5: Option<String>,
    pub bytes: Vec<u8>,
}

/// A single node record, as described by the `Node-*` header block.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub path: String,
    pub kind: Option<NodeKind>,
    pub action: NodeAction,
    pub copy_from: Option<CopyFrom>,
    pub properties: Option<Properties>,
    /// Set when `properties` carries only the changed/removed names rather
    /// than the node's full live property set (format version 3 only).
    pub prop_delta: bool,
    pub text: Option<TextPayload>,
}

impl NodeRecord {
    pub fn new(path: impl Into<String>, action: NodeAction) -> Self {
        Self {
            path: path.into(),
            kind: None,
            action,
            copy_from: None,
            properties: None,
            prop_delta: false,
            text: None,
        }
    }

    pub fn kind(mut self, kind: NodeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn copy_from(mut self, revision: u64, path: impl Into<String>) -> Self {
        self.copy_from = Some(CopyFrom {
            revision,
            path: path.into(),
        });
        self
    }

    pub fn properties(mut self, properties: Properties) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Marks the attached properties as a delta (changed/removed names only)
    /// rather than the node's full live set, emitting `Prop-delta: true`.
    pub fn prop_delta(mut self, prop_delta: bool) -> Self {
        self.prop_delta = prop_delta;
        self
    }

    pub fn text(mut self, text: TextPayload) -> Self {
        self.text = Some(text);
        self
    }

    pub(crate) fn write_header(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(format!("Node-path: {}\n", self.path).as_bytes());
        if let Some(kind) = self.kind {
            buf.extend_from_slice(format!("Node-kind: {}\n", kind.as_wire()).as_bytes());
        }
        buf.extend_from_slice(format!("Node-action: {}\n", self.action.as_wire()).as_bytes());
        if let Some(copy_from) = &self.copy_from {
            buf.extend_from_slice(
                format!("Node-copyfrom-rev: {}\n", copy_from.revision).as_bytes(),
            );
            buf.extend_from_slice(format!("Node-copyfrom-path: {}\n", copy_from.path).as_bytes());
        }
        if self.prop_delta {
            buf.extend_from_slice(b"Prop-delta: true\n");
        }
    }
}
