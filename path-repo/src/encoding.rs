use crate::{tree::Tree, Error};

/// A single staged change to the working tree, recorded in commit order so
/// a delta blob can be replayed deterministically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Operation {
    /// `+path`: the path becomes live.
    Add(String),
    /// `-path`: the path, and every descendant of it, stop being live.
    /// Recursive at apply time, mirroring [`Tree::remove_subtree`], so a
    /// single directory delete never needs to enumerate its children.
    Delete(String),
}

const TAG_ADD: u8 = b'+';
const TAG_DELETE: u8 = b'-';

/// Serialises a sequence of operations as `{u8 tag; u32 LE len; bytes}`
/// records with no terminator (the blob's length is known from the
/// blob-store row itself).
pub(crate) fn encode_ops(ops: &[Operation]) -> Vec<u8> {
    let mut buf = Vec::new();
    for op in ops {
        let (tag, path) = match op {
            Operation::Add(p) => (TAG_ADD, p),
            Operation::Delete(p) => (TAG_DELETE, p),
        };
        buf.push(tag);
        buf.extend_from_slice(&(path.len() as u32).to_le_bytes());
        buf.extend_from_slice(path.as_bytes());
    }
    buf
}

/// Encodes a full snapshot as a sequence of `Add` operations, one per live
/// path in sorted order.
pub(crate) fn encode_snapshot(tree: &Tree) -> Vec<u8> {
    let ops: Vec<Operation> = tree.iter().cloned().map(Operation::Add).collect();
    encode_ops(&ops)
}

pub(crate) fn decode_ops(bytes: &[u8], revision: u64) -> Result<Vec<Operation>, Error> {
    let mut ops = Vec::new();
    let mut cursor = 0usize;

    while cursor < bytes.len() {
        let tag = *bytes.get(cursor).ok_or(Error::CorruptBlob(revision))?;
        cursor += 1;

        let len_bytes = bytes
            .get(cursor..cursor + 4)
            .ok_or(Error::CorruptBlob(revision))?;
        let len = u32::from_le_bytes(len_bytes.try_into().unwrap()) as usize;
        cursor += 4;

        let path_bytes = bytes
            .get(cursor..cursor + len)
            .ok_or(Error::CorruptBlob(revision))?;
        let path = String::from_utf8(path_bytes.to_vec()).map_err(|_| Error::CorruptBlob(revision))?;
        cursor += len;

        ops.push(match tag {
            TAG_ADD => Operation::Add(path),
            TAG_DELETE => Operation::Delete(path),
            _ => return Err(Error::CorruptBlob(revision)),
        });
    }

    Ok(ops)
}

pub(crate) fn apply(tree: &mut Tree, op: &Operation) {
    match op {
        Operation::Add(path) => tree.insert(path.clone()),
        Operation::Delete(path) => tree.remove_subtree(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ops_roundtrip_through_encode_decode() {
        let ops = vec![
            Operation::Add("trunk".into()),
            Operation::Add("trunk/a".into()),
            Operation::Delete("trunk/b".into()),
        ];
        let bytes = encode_ops(&ops);
        assert_eq!(decode_ops(&bytes, 0).unwrap(), ops);
    }

    #[test]
    fn snapshot_encodes_every_live_path_as_an_add() {
        let mut tree = Tree::default();
        tree.insert("a".into());
        tree.insert("a/b".into());

        let bytes = encode_snapshot(&tree);
        let ops = decode_ops(&bytes, 0).unwrap();
        assert_eq!(
            ops,
            vec![Operation::Add("a".into()), Operation::Add("a/b".into())]
        );
    }
}
