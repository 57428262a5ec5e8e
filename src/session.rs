//! The concrete [`RaSession`] a deployment of this binary plugs in.
//!
//! §1 scopes the network transport itself out of this workspace: `svn-client`
//! only defines the trait, and every crate up through `dump-writer` is
//! written against it generically. This placeholder exists purely so the
//! binary links and its `--help`/argument-parsing path works standalone;
//! every operation it answers fails with `Transport`, pointing at the real
//! extension seam instead of silently pretending to dump anything.

use std::collections::BTreeMap;

use async_trait::async_trait;
use svn_client::{DeltaConsumer, Dirent, Error, LogEntry, NodeKind, RaSession};

pub struct UnconnectedSession {
    url: String,
}

impl UnconnectedSession {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    fn unplugged(&self) -> Error {
        Error::Transport(format!(
            "no RaSession is wired up for {} — link a concrete transport implementation against svn_client::RaSession",
            self.url
        ))
    }
}

#[async_trait]
impl RaSession for UnconnectedSession {
    async fn get_log(&self, _paths: &[String], _start: u64, _end: u64, _limit: u32, _discover_changed_paths: bool) -> Result<Vec<LogEntry>, Error> {
        Err(self.unplugged())
    }

    async fn stat(&self, _path: &str, _revision: u64) -> Result<Option<Dirent>, Error> {
        Err(self.unplugged())
    }

    async fn check_path(&self, _path: &str, _revision: u64) -> Result<Option<NodeKind>, Error> {
        Err(self.unplugged())
    }

    async fn get_uuid(&self) -> Result<String, Error> {
        Err(self.unplugged())
    }

    async fn get_dir(&self, _path: &str, _revision: u64) -> Result<BTreeMap<String, Dirent>, Error> {
        Err(self.unplugged())
    }

    async fn do_diff<C>(&self, _base_revision: u64, _target_revision: u64, _start_empty: bool, _consumer: C) -> Result<C, Error>
    where
        C: DeltaConsumer + Send,
        Self: Sized,
    {
        Err(self.unplugged())
    }
}
