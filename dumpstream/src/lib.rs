//! A writer for the canonical dumpstream format produced by a version
//! control system's own "dump" tool: the line-oriented, length-prefixed
//! format of magic header, revision records and node records described in
//! <https://svn.apache.org/repos/asf/subversion/trunk/notes/dump-load-format.txt>
//! and its equivalents.
//!
//! This plays the same role for the dump engine that `git-fast-import`'s
//! `Writer` plays for a Git import: a thin, stateful wrapper that knows how
//! to compute the wire format's length prefixes and never buffers more than
//! one record's properties at a time.

use std::io::Write;

mod error;
pub use error::Error;

mod node;
pub use node::{CopyFrom, NodeAction, NodeKind, NodeRecord, TextPayload};

mod properties;
pub use properties::{PropertyChange, Properties};

/// The dumpstream format version. Version 3 adds property-deletion (`D`)
/// records and svndiff-encoded text deltas; version 2 is the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatVersion {
    V2,
    V3,
}

impl FormatVersion {
    fn as_wire(self) -> u8 {
        match self {
            FormatVersion::V2 => 2,
            FormatVersion::V3 => 3,
        }
    }
}

/// Writes dumpstream records to an underlying [`Write`].
#[derive(Debug)]
pub struct Writer<W: Write> {
    writer: W,
    format: FormatVersion,
}

impl<W: Write> Writer<W> {
    pub fn new(writer: W, format: FormatVersion) -> Self {
        Self { writer, format }
    }

    /// Emits the leading `SVN-fs-dump-format-version` line, a blank line,
    /// and (if given) the `UUID:` line followed by a blank line. Callers
    /// doing an incremental dump with `no_incremental_header` set should
    /// skip calling this at all.
    pub fn header(&mut self, uuid: Option<&str>) -> Result<(), Error> {
        writeln!(
            self.writer,
            "SVN-fs-dump-format-version: {}",
            self.format.as_wire()
        )?;
        writeln!(self.writer)?;

        if let Some(uuid) = uuid {
            writeln!(self.writer, "UUID: {}", uuid)?;
            writeln!(self.writer)?;
        }

        Ok(())
    }

    /// Emits a revision record: the `Revision-number`/`Prop-content-length`/
    /// `Content-length` headers, a blank line, and the serialised
    /// properties block (which is empty, with length 0 and no `PROPS-END`,
    /// when `properties` has no entries).
    pub fn revision(&mut self, number: u64, properties: &Properties) -> Result<(), Error> {
        let body = properties.serialize();

        writeln!(self.writer, "Revision-number: {}", number)?;
        writeln!(self.writer, "Prop-content-length: {}", body.len())?;
        writeln!(self.writer, "Content-length: {}", body.len())?;
        writeln!(self.writer)?;
        self.writer.write_all(&body)?;
        writeln!(self.writer)?;

        Ok(())
    }

    /// Emits a single node record.
    pub fn node(&mut self, record: &NodeRecord) -> Result<(), Error> {
        let prop_body = record
            .properties
            .as_ref()
            .map(Properties::serialize)
            .unwrap_or_default();
        let text_len = record.text.as_ref().map(|t| t.bytes.len());

        let mut header = Vec::new();
        record.write_header(&mut header);

        if record.properties.is_some() {
            header.extend_from_slice(format!("Prop-content-length: {}\n", prop_body.len()).as_bytes());
        }
        if let Some(text) = &record.text {
            if text.is_delta {
                header.extend_from_slice(b"Text-delta: true\n");
            }
            header.extend_from_slice(format!("Text-content-length: {}\n", text.bytes.len()).as_bytes());
            if let Some(md5) = &text.md5 {
                header.extend_from_slice(format!("Text-content-md5: {}\n", md5).as_bytes());
            }
        }

        let content_length = prop_body.len() + text_len.unwrap_or(0);
        header.extend_from_slice(format!("Content-length: {}\n", content_length).as_bytes());

        self.writer.write_all(&header)?;
        writeln!(self.writer)?;
        self.writer.write_all(&prop_body)?;
        if let Some(text) = &record.text {
            self.writer.write_all(&text.bytes)?;
        }
        writeln!(self.writer)?;
        writeln!(self.writer)?;

        Ok(())
    }
}
