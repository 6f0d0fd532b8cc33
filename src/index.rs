use std::fs::{File, OpenOptions};
use std::path::Path;

use memmap2::MmapMut;

use crate::types::{LogError, Result};

/// Width of the big-endian relative offset in an entry.
pub(crate) const OFF_WIDTH: u64 = 4;
/// Width of the big-endian store position in an entry.
pub(crate) const POS_WIDTH: u64 = 8;
/// Width of a full entry.
pub(crate) const ENT_WIDTH: u64 = OFF_WIDTH + POS_WIDTH;

/// Fixed-width table mapping a record's relative offset to its byte position
/// in the sibling store.
///
/// The backing file is grown to `max_index_bytes` up front and memory-mapped
/// read-write; the mapping cannot be resized afterwards. `size` tracks the
/// bytes logically occupied. Closing syncs the mapping and truncates the file
/// back to `size`, so the next open can tell how many entries are present
/// from the file length alone.
///
/// Not internally synchronized; the owning segment is serialized by the
/// log's outer lock.
#[derive(Debug)]
pub(crate) struct Index {
    file: File,
    mmap: MmapMut,
    size: u64,
}

impl Index {
    /// Open (or create) the index file, pre-sizing it to `max_index_bytes`
    /// before mapping. `size` resumes from the pre-truncation file length.
    pub(crate) fn open(path: &Path, max_index_bytes: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let size = file.metadata()?.len();

        file.set_len(max_index_bytes)?;
        // SAFETY: the file stays open and exclusively owned for the lifetime
        // of the mapping; all accesses are bounds-checked against `size`.
        let mmap = unsafe { MmapMut::map_mut(&file)? };

        Ok(Self { file, mmap, size })
    }

    /// Read entry `at` (0-indexed), or the last entry when `at` is -1.
    ///
    /// Returns the stored relative offset and store position. An empty index
    /// or an entry past `size` signals [`LogError::EndOfIndex`].
    pub(crate) fn read(&self, at: i64) -> Result<(u32, u64)> {
        if self.size == 0 {
            return Err(LogError::EndOfIndex);
        }

        let entry = if at == -1 {
            (self.size / ENT_WIDTH) - 1
        } else {
            at as u64
        };

        let pos = entry * ENT_WIDTH;
        if self.size < pos + ENT_WIDTH {
            return Err(LogError::EndOfIndex);
        }

        let pos = pos as usize;
        let mut off_buf = [0u8; OFF_WIDTH as usize];
        off_buf.copy_from_slice(&self.mmap[pos..pos + OFF_WIDTH as usize]);
        let mut pos_buf = [0u8; POS_WIDTH as usize];
        pos_buf.copy_from_slice(&self.mmap[pos + OFF_WIDTH as usize..pos + ENT_WIDTH as usize]);

        Ok((u32::from_be_bytes(off_buf), u64::from_be_bytes(pos_buf)))
    }

    /// Append an entry, failing with [`LogError::IndexFull`] when the mapping
    /// has no room left.
    pub(crate) fn write(&mut self, off: u32, pos: u64) -> Result<()> {
        if self.is_full() {
            return Err(LogError::IndexFull);
        }

        let at = self.size as usize;
        self.mmap[at..at + OFF_WIDTH as usize].copy_from_slice(&off.to_be_bytes());
        self.mmap[at + OFF_WIDTH as usize..at + ENT_WIDTH as usize]
            .copy_from_slice(&pos.to_be_bytes());
        self.size += ENT_WIDTH;

        Ok(())
    }

    /// Whether another entry would run past the mapping.
    pub(crate) fn is_full(&self) -> bool {
        (self.mmap.len() as u64) < self.size + ENT_WIDTH
    }

    pub(crate) fn size(&self) -> u64 {
        self.size
    }

    /// Sync the mapping, truncate the file back to the occupied size, and
    /// fsync. The truncation converts the pre-sized file into a compact
    /// artifact whose length encodes the entry count.
    pub(crate) fn close(self) -> Result<()> {
        let Index { file, mmap, size } = self;

        mmap.flush()?;
        // The mapping must be gone before the file shrinks underneath it.
        drop(mmap);

        file.set_len(size)?;
        file.sync_all()?;

        Ok(())
    }
}
