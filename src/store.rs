use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::os::unix::fs::FileExt;
use std::path::Path;

use parking_lot::Mutex;

use crate::types::Result;

/// Width of the big-endian length prefix in front of every frame.
pub(crate) const LEN_WIDTH: u64 = 8;

/// Append-only byte file holding length-prefixed record payloads.
///
/// Appends go through a buffered writer; positioned reads flush that buffer
/// first so the file view is consistent. One exclusive lock guards every
/// operation, reads included, because reads touch the shared write buffer.
#[derive(Debug)]
pub(crate) struct Store {
    inner: Mutex<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    buf: BufWriter<File>,
    /// Bytes logically written, including what is still in the writer buffer.
    size: u64,
}

impl Store {
    /// Open (or create) the store file, resuming `size` from its on-disk length.
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            inner: Mutex::new(StoreInner {
                buf: BufWriter::new(file),
                size,
            }),
        })
    }

    /// Append a payload as an 8-byte big-endian length followed by the bytes.
    ///
    /// Returns the number of bytes written and the position of the frame's
    /// length prefix.
    pub(crate) fn append(&self, payload: &[u8]) -> Result<(u64, u64)> {
        let mut inner = self.inner.lock();

        let pos = inner.size;
        inner.buf.write_all(&(payload.len() as u64).to_be_bytes())?;
        inner.buf.write_all(payload)?;

        let written = LEN_WIDTH + payload.len() as u64;
        inner.size += written;

        Ok((written, pos))
    }

    /// Read back the payload whose length prefix starts at `pos`.
    pub(crate) fn read(&self, pos: u64) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock();
        inner.buf.flush()?;

        let file = inner.buf.get_ref();
        let mut len_buf = [0u8; LEN_WIDTH as usize];
        file.read_exact_at(&mut len_buf, pos)?;

        let mut payload = vec![0u8; u64::from_be_bytes(len_buf) as usize];
        file.read_exact_at(&mut payload, pos + LEN_WIDTH)?;

        Ok(payload)
    }

    /// Positioned read of raw bytes, flushing first. Returns the number of
    /// bytes read; 0 signals the end of the store.
    pub(crate) fn read_at(&self, buf: &mut [u8], off: u64) -> std::io::Result<usize> {
        let mut inner = self.inner.lock();
        inner.buf.flush()?;

        inner.buf.get_ref().read_at(buf, off)
    }

    pub(crate) fn size(&self) -> u64 {
        self.inner.lock().size
    }

    /// Flush any buffered bytes. The file handle itself is released when the
    /// last reference to the store drops.
    pub(crate) fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.buf.flush()?;
        Ok(())
    }
}
