//! The read-only remote session contract the dump engine is built against.
//!
//! This crate defines the boundary described as "external interfaces" for
//! the remote transport: a set of traits a real client library implements,
//! and the plain data types ([`LogEntry`], [`Dirent`], …) that cross it. No
//! transport is implemented here — authentication, TLS trust prompts,
//! connection pooling and the wire protocol itself are all out of scope and
//! live in whatever concrete `RaSession` a deployment plugs in.
//!
//! Per the design note against runtime vtables for the editor callback
//! table, [`RaSession::do_diff`] is generic over its [`DeltaConsumer`]
//! rather than taking a trait object: the callback table is a static
//! interface, resolved at compile time, not a dynamically dispatched one.

use async_trait::async_trait;

mod error;
pub use error::Error;

mod types;
pub use types::{ChangeAction, ChangedPath, CopyFrom, Dirent, LogEntry, NodeKind};

/// The revision sentinel meaning "youngest" when passed to [`RaSession::stat`]
/// or [`RaSession::check_path`], mirroring the real protocol's
/// `SVN_INVALID_REVNUM`-as-HEAD convention. A concrete session implementation
/// is expected to resolve this to the repository's actual youngest revision
/// at call time rather than treating it as a literal revision number.
pub const HEAD_REVISION: u64 = u64::MAX;

/// A change to a single property: either a new value, or an absence
/// meaning the property was removed.
pub type PropertyValue = Option<Vec<u8>>;

/// The read-only operations `log-service`, `path-repo`, and `dump-writer`
/// require of a remote session.
#[async_trait]
pub trait RaSession: Send + Sync {
    /// Fetches log entries for `paths` (relative to the session root)
    /// between `start` and `end` inclusive, in the direction implied by
    /// their relative order (ascending if `start <= end`, descending
    /// otherwise), stopping after `limit` entries (0 meaning unbounded).
    async fn get_log(
        &self,
        paths: &[String],
        start: u64,
        end: u64,
        limit: u32,
        discover_changed_paths: bool,
    ) -> Result<Vec<LogEntry>, Error>;

    /// Returns directory-entry metadata for `path` at `revision`, or
    /// `None` if it does not exist there.
    async fn stat(&self, path: &str, revision: u64) -> Result<Option<Dirent>, Error>;

    /// Returns the kind of `path` at `revision`, or `None` if absent.
    async fn check_path(&self, path: &str, revision: u64) -> Result<Option<NodeKind>, Error>;

    /// Returns the repository's UUID.
    async fn get_uuid(&self) -> Result<String, Error>;

    /// Lists the immediate children of `path` at `revision`.
    async fn get_dir(
        &self,
        path: &str,
        revision: u64,
    ) -> Result<std::collections::BTreeMap<String, Dirent>, Error>;

    /// Drives `consumer` through the tree edit between `base_revision` and
    /// `target_revision`, rooted at the session's target path. `start_empty`
    /// is forwarded to the internal `Reporter::set_path` call a concrete
    /// implementation makes against `base_revision`: true only for the very
    /// first diff of a run, when the caller has no prior working state to
    /// report.
    async fn do_diff<C>(
        &self,
        base_revision: u64,
        target_revision: u64,
        start_empty: bool,
        consumer: C,
    ) -> Result<C, Error>
    where
        C: DeltaConsumer + Send,
        Self: Sized;
}

/// The streaming tree-editor callback protocol a remote invokes to
/// describe an edit between two revisions.
///
/// Every `*_directory`/`*_file` callback returns an opaque handle that is
/// later passed back into the matching `close_*` call; concrete
/// implementations (see `delta-driver`) typically hand out arena indices.
#[async_trait]
pub trait DeltaConsumer {
    type DirHandle: Send + Copy;
    type FileHandle: Send + Copy;

    async fn set_target_revision(&mut self, revision: u64) -> Result<(), Error>;

    async fn open_root(&mut self, base_revision: u64) -> Result<Self::DirHandle, Error>;

    async fn delete_entry(
        &mut self,
        path: &str,
        revision: u64,
        parent: Self::DirHandle,
    ) -> Result<(), Error>;

    async fn add_directory(
        &mut self,
        path: &str,
        parent: Self::DirHandle,
        copy_from: Option<CopyFrom>,
    ) -> Result<Self::DirHandle, Error>;

    async fn open_directory(
        &mut self,
        path: &str,
        parent: Self::DirHandle,
        base_revision: u64,
    ) -> Result<Self::DirHandle, Error>;

    async fn change_dir_prop(
        &mut self,
        dir: Self::DirHandle,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), Error>;

    async fn close_directory(&mut self, dir: Self::DirHandle) -> Result<(), Error>;

    async fn absent_directory(&mut self, path: &str, parent: Self::DirHandle) -> Result<(), Error>;

    async fn add_file(
        &mut self,
        path: &str,
        parent: Self::DirHandle,
        copy_from: Option<CopyFrom>,
    ) -> Result<Self::FileHandle, Error>;

    async fn open_file(
        &mut self,
        path: &str,
        parent: Self::DirHandle,
        base_revision: u64,
    ) -> Result<Self::FileHandle, Error>;

    /// Streams one svndiff window of the text delta for `file`. Called
    /// zero or more times per file; the consumer is responsible for
    /// applying windows against whatever base text it has cached.
    async fn apply_textdelta_window(
        &mut self,
        file: Self::FileHandle,
        window: &[u8],
    ) -> Result<(), Error>;

    async fn change_file_prop(
        &mut self,
        file: Self::FileHandle,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), Error>;

    async fn close_file(&mut self, file: Self::FileHandle, text_checksum: Option<&str>) -> Result<(), Error>;

    async fn absent_file(&mut self, path: &str, parent: Self::DirHandle) -> Result<(), Error>;

    async fn close_edit(&mut self) -> Result<(), Error>;

    async fn abort_edit(&mut self) -> Result<(), Error>;
}

/// Reports the client's current state of the tree being diffed, so the
/// server knows what to compare against. A real RA implementation drives
/// this internally as part of `do_diff`; it is exposed here so a fake
/// session used in tests can assert against it.
#[async_trait]
pub trait Reporter: Send {
    async fn set_path(&mut self, path: &str, revision: u64, start_empty: bool) -> Result<(), Error>;
    async fn finish_report(self: Box<Self>) -> Result<(), Error>;
}
