//! A minimal svndiff0 codec: enough to decode the windows a remote streams
//! through `apply_textdelta_window`, and to produce a (maximally simple,
//! always valid) encoding when dumping in `use_deltas` mode.
//!
//! Only the uncompressed `SVN\0` variant (version 0) is supported; the
//! zlib-compressed window variants (versions 1 and 2) are out of scope —
//! see `DESIGN.md`.

use crate::Error;

/// The four-byte file header every svndiff stream begins with.
pub const FILE_HEADER: [u8; 4] = *b"SVN\0";

/// Incrementally applies a sequence of svndiff windows against a fixed
/// source text, producing the target (new fulltext) bytes.
///
/// Holds the full, growing target buffer in memory — not to avoid
/// buffering windows (each window's instructions are still processed as
/// soon as it arrives, never queued), but because a "target copy"
/// instruction can reference bytes produced by an *earlier* window of the
/// same file, so something has to remember them.
pub struct Applier {
    source: Vec<u8>,
    target: Vec<u8>,
}

impl Applier {
    pub fn new(source: Vec<u8>) -> Self {
        Self {
            source,
            target: Vec::new(),
        }
    }

    /// Applies one window's worth of instructions, returning the bytes
    /// newly appended to the target by this window (the caller writes
    /// them straight through to a [`content_cache::TextSink`], which
    /// digests them as it writes — no separate digest pass).
    pub fn apply_window(&mut self, window: &[u8]) -> Result<&[u8], Error> {
        let mut cur = Cursor::new(window);
        let source_offset = cur.read_varint()?;
        let source_len = cur.read_varint()?;
        let target_len = cur.read_varint()?;
        let instructions_len = cur.read_varint()?;
        let newdata_len = cur.read_varint()?;

        let instructions = cur.take(instructions_len as usize)?;
        let newdata = cur.take(newdata_len as usize)?;

        if source_offset as usize + source_len as usize > self.source.len() {
            return Err(Error::MalformedWindow("source view exceeds base text"));
        }

        let before = self.target.len();
        let mut icur = Cursor::new(instructions);
        let mut newdata_pos = 0usize;

        while !icur.is_empty() {
            let opcode_byte = icur.read_u8()?;
            let opcode = opcode_byte >> 6;
            let mut length = (opcode_byte & 0x3f) as u64;
            if length == 0 {
                length = icur.read_varint()?;
            }
            let length = length as usize;

            match opcode {
                0 => {
                    // Copy from the source view.
                    let offset = icur.read_varint()? as usize;
                    let start = source_offset as usize + offset;
                    let end = start
                        .checked_add(length)
                        .ok_or(Error::MalformedWindow("source copy overflow"))?;
                    let slice = self
                        .source
                        .get(start..end)
                        .ok_or(Error::MalformedWindow("source copy out of range"))?;
                    self.target.extend_from_slice(slice);
                }
                1 => {
                    // Copy from the target view, byte by byte: the
                    // source range can overlap the bytes this same
                    // instruction is producing (a classic run-length
                    // trick for repeated content).
                    let mut pos = icur.read_varint()? as usize;
                    for _ in 0..length {
                        let byte = *self
                            .target
                            .get(pos)
                            .ok_or(Error::MalformedWindow("target copy out of range"))?;
                        self.target.push(byte);
                        pos += 1;
                    }
                }
                2 => {
                    let end = newdata_pos
                        .checked_add(length)
                        .ok_or(Error::MalformedWindow("insert overflow"))?;
                    let slice = newdata
                        .get(newdata_pos..end)
                        .ok_or(Error::MalformedWindow("insert out of range"))?;
                    self.target.extend_from_slice(slice);
                    newdata_pos = end;
                }
                _ => return Err(Error::MalformedWindow("reserved opcode")),
            }
        }

        if (self.target.len() - before) as u64 != target_len {
            return Err(Error::MalformedWindow("target length mismatch"));
        }

        Ok(&self.target[before..])
    }

    pub fn into_fulltext(self) -> Vec<u8> {
        self.target
    }
}

/// Produces a single svndiff window (including the file header) whose
/// target is byte-for-byte `fulltext`, encoded as one `insert`
/// instruction covering the whole thing. This is always decodable by any
/// conforming reader; it makes no attempt at byte-level diffing against
/// the previous text, per the design note in SPEC_FULL.md §4.5.2.
pub fn encode_single_window(fulltext: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(fulltext.len() + 16);
    out.extend_from_slice(&FILE_HEADER);

    let mut instructions = Vec::new();
    instructions.push(0b10_000000u8); // insert, length given separately
    write_varint(&mut instructions, fulltext.len() as u64);

    write_varint(&mut out, 0); // source view offset
    write_varint(&mut out, 0); // source view length
    write_varint(&mut out, fulltext.len() as u64); // target view length
    write_varint(&mut out, instructions.len() as u64);
    write_varint(&mut out, fulltext.len() as u64);
    out.extend_from_slice(&instructions);
    out.extend_from_slice(fulltext);

    out
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn read_u8(&mut self) -> Result<u8, Error> {
        let byte = *self
            .bytes
            .get(self.pos)
            .ok_or(Error::MalformedWindow("truncated stream"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_varint(&mut self) -> Result<u64, Error> {
        let mut value: u64 = 0;
        loop {
            let byte = self.read_u8()?;
            value = (value << 7) | (byte & 0x7f) as u64;
            if byte & 0x80 == 0 {
                break;
            }
        }
        Ok(value)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or(Error::MalformedWindow("length overflow"))?;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or(Error::MalformedWindow("truncated section"))?;
        self.pos = end;
        Ok(slice)
    }
}

fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    let mut stack = Vec::new();
    stack.push((value & 0x7f) as u8);
    value >>= 7;
    while value > 0 {
        stack.push(((value & 0x7f) as u8) | 0x80);
        value >>= 7;
    }
    out.extend(stack.into_iter().rev());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_only(fulltext: &[u8]) -> Vec<u8> {
        let encoded = encode_single_window(fulltext);
        encoded[FILE_HEADER.len()..].to_vec()
    }

    #[test]
    fn single_window_roundtrips_through_apply() {
        let fulltext = b"hello, world\n";
        let window = window_only(fulltext);

        let mut applier = Applier::new(Vec::new());
        let produced = applier.apply_window(&window).unwrap().to_vec();
        assert_eq!(produced, fulltext);
        assert_eq!(applier.into_fulltext(), fulltext);
    }

    #[test]
    fn source_copy_pulls_from_the_base_text() {
        // Window: copy "hello" from source, then insert " world".
        let mut window = Vec::new();
        write_varint(&mut window, 0); // source offset
        write_varint(&mut window, 5); // source len
        write_varint(&mut window, 11); // target len

        let mut instructions = Vec::new();
        instructions.push(0b00_000101u8); // source copy, length 5
        write_varint(&mut instructions, 0); // offset
        instructions.push(0b10_000110u8); // insert, length 6
        write_varint(&mut window, instructions.len() as u64);
        write_varint(&mut window, 6);
        window.extend_from_slice(&instructions);
        window.extend_from_slice(b" world");

        let mut applier = Applier::new(b"hello".to_vec());
        let produced = applier.apply_window(&window).unwrap().to_vec();
        assert_eq!(produced, b"hello world");
    }

    #[test]
    fn target_copy_repeats_earlier_output() {
        // Insert "ab", then target-copy 4 bytes starting at offset 0,
        // producing "ababab ab" via the overlapping run-length trick.
        let mut window = Vec::new();
        write_varint(&mut window, 0);
        write_varint(&mut window, 0);
        write_varint(&mut window, 6);

        let mut instructions = Vec::new();
        instructions.push(0b10_000010u8); // insert len 2
        instructions.push(0b01_000100u8); // target copy len 4
        write_varint(&mut instructions, 0); // offset 0
        write_varint(&mut window, instructions.len() as u64);
        write_varint(&mut window, 2);
        window.extend_from_slice(&instructions);
        window.extend_from_slice(b"ab");

        let mut applier = Applier::new(Vec::new());
        let produced = applier.apply_window(&window).unwrap().to_vec();
        assert_eq!(produced, b"ababab");
    }
}
