use std::{convert::TryInto, io};

use rusqlite::{blob::ZeroBlob, params, DatabaseName, OptionalExtension};

use crate::error::Error;

/// A single connection onto a [`Store`](crate::Store)'s underlying SQLite
/// database, exposing the generic keyed byte-blob operations that
/// `path-repo` and `prop-store` build their own semantics on top of.
#[derive(Debug)]
pub struct Connection {
    conn: rusqlite::Connection,
}

impl Connection {
    pub(crate) fn new(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Stores `value` under `key`, replacing any existing value.
    pub fn store(&mut self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        let blob_size: i32 = value.len().try_into().map_err(|_| Error::LargeBlob {
            max: i32::MAX,
            size: value.len(),
            key: key.to_vec(),
        })?;

        let txn = self.conn.transaction()?;
        txn.execute("DELETE FROM blobs WHERE key = ?", params![key])?;
        let row_id: i64 = txn.query_row(
            "INSERT INTO blobs (key, value) VALUES (?, ?) RETURNING ROWID",
            params![key, ZeroBlob(blob_size)],
            |row| row.get(0),
        )?;

        let mut blob = txn.blob_open(DatabaseName::Main, "blobs", "value", row_id, false)?;
        io::Write::write_all(&mut blob, value)?;
        drop(blob);

        Ok(txn.commit()?)
    }

    /// Retrieves the value bound to `key`, if any.
    pub fn fetch(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        self.conn
            .query_row("SELECT value FROM blobs WHERE key = ?", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(Error::from)
    }

    /// Deletes the record bound to `key`, if any. Not an error if absent.
    pub fn delete(&mut self, key: &[u8]) -> Result<(), Error> {
        self.conn.execute("DELETE FROM blobs WHERE key = ?", params![key])?;
        Ok(())
    }

    /// Checks whether a record exists for `key`.
    pub fn exists(&mut self, key: &[u8]) -> Result<bool, Error> {
        self.conn
            .query_row(
                "SELECT 1 FROM blobs WHERE key = ? LIMIT 1",
                params![key],
                |_| Ok(()),
            )
            .optional()
            .map(|found| found.is_some())
            .map_err(Error::from)
    }
}
