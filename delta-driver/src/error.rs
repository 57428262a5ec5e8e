use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    ContentCache(#[from] content_cache::Error),

    #[error(transparent)]
    PathRepo(#[from] path_repo::Error),

    #[error(transparent)]
    PropStore(#[from] prop_store::Error),

    #[error(transparent)]
    SvnClient(#[from] svn_client::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed svndiff window: {0}")]
    MalformedWindow(&'static str),

    #[error("revision {0} has not been dumped yet")]
    RevisionNotYetDumped(u64),

    #[error("error checking parent relationship at previous revision {0}")]
    ParentCheckFailed(u64),
}
