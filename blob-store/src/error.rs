use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Refinery(#[from] refinery::Error),

    #[error(transparent)]
    Rusqlite(#[from] rusqlite::Error),

    #[error("blob {key:?} is too large to store: {size} bytes; maximum is {max} bytes")]
    LargeBlob { max: i32, size: usize, key: Vec<u8> },
}
