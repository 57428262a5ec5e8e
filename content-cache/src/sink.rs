use std::{
    fs::File,
    io::{self, Write},
    path::PathBuf,
};

use md5::{Digest, Md5};

use crate::Error;

/// A streaming destination for one path's new full text.
///
/// Bytes written here go straight to a fresh temp file *and* into a
/// running MD5 digest in the same call — the digest is never computed
/// from a second pass over a buffered copy. This is what lets
/// `delta-driver`'s svndiff window application stay sink-shaped: each
/// window's output bytes are written once, here.
pub struct TextSink {
    path: PathBuf,
    file: File,
    hasher: Md5,
}

impl TextSink {
    pub(crate) fn new(path: PathBuf, file: File) -> Self {
        Self {
            path,
            file,
            hasher: Md5::new(),
        }
    }

    /// Finishes writing, flushing the file and returning its path plus
    /// the hex-encoded MD5 of everything written.
    pub fn finish(mut self) -> Result<(PathBuf, String), Error> {
        self.file.flush()?;
        let digest = self.hasher.finalize();
        Ok((self.path, format!("{:x}", digest)))
    }
}

impl Write for TextSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.file.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
