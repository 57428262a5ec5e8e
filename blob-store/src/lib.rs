//! A small, generic keyed byte-blob store backed by SQLite.
//!
//! This plays the same role as a classic on-disk key/value library: open a
//! file, store and fetch opaque byte blobs by an opaque byte key. `path-repo`
//! uses it to persist path-tree snapshots and deltas keyed by revision
//! number; `prop-store` uses it to persist serialised property sets keyed by
//! their content digest.

use std::path::{Path, PathBuf};

mod embedded {
    refinery::embed_migrations!("./migrations");
}

mod connection;
pub use connection::Connection;

mod error;
pub use error::Error;

/// A handle onto a blob-store file. Cheap to clone; each [`Connection`]
/// opens its own `rusqlite::Connection` against the same path.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Opens (creating if necessary) a blob store at `path`, applying
    /// migrations eagerly so later connections don't pay that cost.
    pub fn open<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };

        embedded::migrations::runner().run(&mut store.open_connection()?)?;

        Ok(store)
    }

    /// Opens a new connection onto this store.
    pub fn connection(&self) -> Result<Connection, Error> {
        Ok(Connection::new(self.open_connection()?))
    }

    fn open_connection(&self) -> rusqlite::Result<rusqlite::Connection> {
        rusqlite::Connection::open(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_fetch_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("blobs.db")).unwrap();
        let mut conn = store.connection().unwrap();

        assert!(!conn.exists(b"a").unwrap());
        assert_eq!(conn.fetch(b"a").unwrap(), None);

        conn.store(b"a", b"hello").unwrap();
        assert!(conn.exists(b"a").unwrap());
        assert_eq!(conn.fetch(b"a").unwrap(), Some(b"hello".to_vec()));

        conn.store(b"a", b"goodbye").unwrap();
        assert_eq!(conn.fetch(b"a").unwrap(), Some(b"goodbye".to_vec()));

        conn.delete(b"a").unwrap();
        assert!(!conn.exists(b"a").unwrap());
    }
}
