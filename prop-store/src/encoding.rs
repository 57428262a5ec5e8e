use std::collections::BTreeMap;

/// An unordered mapping from property name to property value. Kept as a
/// `BTreeMap` so serialisation is deterministic — two equal property sets
/// always produce identical bytes and therefore the same digest.
pub type PropertySet = BTreeMap<Vec<u8>, Vec<u8>>;

/// Serialises a property set as a sequence of `{u32 LE key_len; key_bytes;
/// u32 LE value_len; value_bytes}` records terminated by a `u32 LE` zero.
///
/// The length prefixes are explicitly little-endian `u32`s rather than the
/// host's native `int` width, so the persisted blob format is portable
/// across architectures.
pub fn serialize(props: &PropertySet) -> Vec<u8> {
    let mut buf = Vec::new();
    for (key, value) in props {
        buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
        buf.extend_from_slice(key);
        buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
        buf.extend_from_slice(value);
    }
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf
}

/// Inverse of [`serialize`]. Returns `None` if the bytes are truncated or
/// malformed.
pub fn deserialize(bytes: &[u8]) -> Option<PropertySet> {
    let mut props = PropertySet::new();
    let mut cursor = 0usize;

    loop {
        let key_len = read_u32(bytes, &mut cursor)?;
        if key_len == 0 {
            return Some(props);
        }
        let key = read_bytes(bytes, &mut cursor, key_len as usize)?;
        let value_len = read_u32(bytes, &mut cursor)?;
        let value = read_bytes(bytes, &mut cursor, value_len as usize)?;
        props.insert(key, value);
    }
}

fn read_u32(bytes: &[u8], cursor: &mut usize) -> Option<u32> {
    let slice = bytes.get(*cursor..*cursor + 4)?;
    *cursor += 4;
    Some(u32::from_le_bytes(slice.try_into().ok()?))
}

fn read_bytes(bytes: &[u8], cursor: &mut usize, len: usize) -> Option<Vec<u8>> {
    let slice = bytes.get(*cursor..*cursor + len)?;
    *cursor += len;
    Some(slice.to_vec())
}
