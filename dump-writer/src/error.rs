use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    ContentCache(#[from] content_cache::Error),

    #[error(transparent)]
    DeltaDriver(#[from] delta_driver::Error),

    #[error(transparent)]
    Dumpstream(#[from] dumpstream::Error),

    #[error(transparent)]
    LogService(#[from] log_service::Error),

    #[error(transparent)]
    PathRepo(#[from] path_repo::Error),

    #[error(transparent)]
    PropStore(#[from] prop_store::Error),

    #[error(transparent)]
    SvnClient(#[from] svn_client::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0} not found at revision {1}")]
    RootNotFound(String, u64),

    #[error("invalid dump options: {0}")]
    IncompatibleOptions(&'static str),
}
