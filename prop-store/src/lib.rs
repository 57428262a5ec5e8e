//! Content-addressed, reference-counted store mapping a live path to its
//! property set.
//!
//! Many paths in a typical repository share an identical property set
//! (`svn:eol-style native` on thousands of files, say); rather than persist
//! one blob per path, this stores each distinct serialised property set
//! once, keyed by its digest, and counts how many paths currently point at
//! it. `path-repo` persists path existence the same way it persists
//! everything else — through `blob-store` — but the path→id and
//! id→refcount maps here stay in memory for the lifetime of the run, since
//! nothing outside the process ever needs to query them directly.

use std::collections::HashMap;
use std::path::Path;

use md5::{Digest, Md5};

mod encoding;
pub use encoding::PropertySet;

mod error;
pub use error::Error;

/// A property-id: the 128-bit MD5 digest of a serialised property set.
pub type PropertyId = [u8; 16];

pub struct PropStore {
    store: blob_store::Store,
    refcounts: HashMap<PropertyId, u64>,
    path_to_id: HashMap<String, PropertyId>,
}

impl PropStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self {
            store: blob_store::Store::open(path)?,
            refcounts: HashMap::new(),
            path_to_id: HashMap::new(),
        })
    }

    /// Binds `path` to `props`. An empty `props` just drops any existing
    /// association — an entry only exists for paths with at least one
    /// non-empty property (invariant 4).
    pub fn store(&mut self, path: &str, props: &PropertySet) -> Result<(), Error> {
        if props.is_empty() {
            self.drop_association(path)?;
            return Ok(());
        }

        let bytes = encoding::serialize(props);
        let id = digest_of(&bytes);

        if self.path_to_id.get(path) == Some(&id) {
            // Already bound to this exact property set; nothing to do.
            return Ok(());
        }

        self.drop_association(path)?;

        let refcount = self.refcounts.entry(id).or_insert(0);
        if *refcount == 0 {
            let mut conn = self.store.connection()?;
            conn.store(&id, &bytes)?;
        }
        *refcount += 1;

        self.path_to_id.insert(path.to_string(), id);
        Ok(())
    }

    /// Retrieves the property set bound to `path`, if any, and drops the
    /// association (the store is a write-once-read-once cache from the
    /// caller's point of view: loading a node's properties at `close_*`
    /// time consumes the association the previous revision's `store` left
    /// behind).
    pub fn load(&mut self, path: &str) -> Result<Option<PropertySet>, Error> {
        let id = match self.path_to_id.get(path).copied() {
            Some(id) => id,
            None => return Ok(None),
        };

        let bytes = {
            let mut conn = self.store.connection()?;
            conn.fetch(&id)?
        };
        let props = bytes.and_then(|b| encoding::deserialize(&b));

        self.drop_association(path)?;
        Ok(props)
    }

    /// Drops `path`'s association, if any, without returning its
    /// properties. Used when a path is deleted outright.
    pub fn delete(&mut self, path: &str) -> Result<(), Error> {
        self.drop_association(path)
    }

    fn drop_association(&mut self, path: &str) -> Result<(), Error> {
        let id = match self.path_to_id.remove(path) {
            Some(id) => id,
            None => return Ok(()),
        };

        let refcount = self
            .refcounts
            .get_mut(&id)
            .ok_or_else(|| Error::RefcountUnderflow(hex(&id)))?;
        *refcount -= 1;

        if *refcount == 0 {
            self.refcounts.remove(&id);
            let mut conn = self.store.connection()?;
            conn.delete(&id)?;
        }

        Ok(())
    }

    /// Current reference count for `id`, or zero if it is not bound to
    /// any path. Exposed for the refcount invariant tests.
    pub fn refcount(&self, id: &PropertyId) -> u64 {
        self.refcounts.get(id).copied().unwrap_or(0)
    }
}

fn digest_of(bytes: &[u8]) -> PropertyId {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

fn hex(id: &PropertyId) -> String {
    id.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> PropertySet {
        pairs
            .iter()
            .map(|(k, v)| (k.as_bytes().to_vec(), v.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn identical_property_sets_across_paths_share_one_blob_and_refcount() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PropStore::open(dir.path().join("props.db")).unwrap();

        let p = props(&[("svn:eol-style", "native")]);
        store.store("a.txt", &p).unwrap();
        store.store("b.txt", &p).unwrap();

        let id = digest_of(&encoding::serialize(&p));
        assert_eq!(store.refcount(&id), 2);

        store.delete("a.txt").unwrap();
        assert_eq!(store.refcount(&id), 1);

        store.delete("b.txt").unwrap();
        assert_eq!(store.refcount(&id), 0);
    }

    #[test]
    fn load_returns_props_and_consumes_the_association() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PropStore::open(dir.path().join("props.db")).unwrap();

        let p = props(&[("svn:mime-type", "text/plain")]);
        store.store("f", &p).unwrap();

        assert_eq!(store.load("f").unwrap(), Some(p));
        assert_eq!(store.load("f").unwrap(), None);
    }

    #[test]
    fn storing_empty_props_just_drops_the_association() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PropStore::open(dir.path().join("props.db")).unwrap();

        let p = props(&[("k", "v")]);
        store.store("f", &p).unwrap();
        store.store("f", &PropertySet::new()).unwrap();

        assert_eq!(store.load("f").unwrap(), None);
    }
}
