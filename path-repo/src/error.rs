use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    BlobStore(#[from] blob_store::Error),

    #[error(transparent)]
    SvnClient(#[from] svn_client::Error),

    #[error("corrupt path-repo blob for revision {0}")]
    CorruptBlob(u64),

    #[error(transparent)]
    Zstd(#[from] std::io::Error),
}
