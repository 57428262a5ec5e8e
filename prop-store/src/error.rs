use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    BlobStore(#[from] blob_store::Error),

    #[error("refcount underflow for property id {0}")]
    RefcountUnderflow(String),
}
