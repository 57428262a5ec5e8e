/// One property record change within a [`Properties`] block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyChange {
    /// `K`/`V` pair: the property is set (or created) with this value.
    Set(Vec<u8>),
    /// `D` record (format version 3 only): the property is removed.
    Deleted,
}

/// An ordered set of property changes, as carried by a revision or node
/// record. Order is significant in the wire format, so this is a `Vec`
/// rather than a map; callers are expected to have already decided on an
/// order (property name, typically).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(Vec<u8>, PropertyChange)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set(&mut self, name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.push((name.into(), PropertyChange::Set(value.into())));
        self
    }

    pub fn delete(&mut self, name: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.push((name.into(), PropertyChange::Deleted));
        self
    }

    /// Serialises the `K`/`V`/`D` records plus the terminating `PROPS-END`
    /// line. The terminator is always present, even with zero entries —
    /// a properties block that is dumped at all is ten bytes
    /// (`PROPS-END\n`) at minimum; a block that should not be dumped at
    /// all is represented by `None` one level up, not by an empty
    /// `Properties`.
    pub(crate) fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for (name, change) in &self.entries {
            match change {
                PropertyChange::Set(value) => {
                    buf.extend_from_slice(format!("K {}\n", name.len()).as_bytes());
                    buf.extend_from_slice(name);
                    buf.push(b'\n');
                    buf.extend_from_slice(format!("V {}\n", value.len()).as_bytes());
                    buf.extend_from_slice(value);
                    buf.push(b'\n');
                }
                PropertyChange::Deleted => {
                    buf.extend_from_slice(format!("D {}\n", name.len()).as_bytes());
                    buf.extend_from_slice(name);
                    buf.push(b'\n');
                }
            }
        }
        buf.extend_from_slice(b"PROPS-END\n");
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_properties_still_carry_the_terminator() {
        assert_eq!(Properties::new().serialize(), b"PROPS-END\n".to_vec());
    }

    #[test]
    fn set_and_delete_serialize_in_order() {
        let mut props = Properties::new();
        props.set("svn:log", "hello").delete("svn:author");

        assert_eq!(
            String::from_utf8(props.serialize()).unwrap(),
            "K 7\nsvn:log\nV 5\nhello\nD 10\nsvn:author\nPROPS-END\n"
        );
    }
}
