use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    SvnClient(#[from] svn_client::Error),

    #[error("no log entry returned for revision {0}")]
    MissingEntry(u64),

    #[error("session root {root:?} was never touched between revisions {start} and {end}")]
    RootNeverTouched { root: String, start: u64, end: u64 },
}
