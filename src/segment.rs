use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::SegmentConfig;
use crate::index::Index;
use crate::store::Store;
use crate::types::{LogError, Offset, Record, Result};

/// Store filename for a segment, e.g. `16.store`.
pub(crate) fn store_filename(base_offset: Offset) -> String {
    format!("{base_offset}.store")
}

/// Index filename for a segment, e.g. `16.index`.
pub(crate) fn index_filename(base_offset: Offset) -> String {
    format!("{base_offset}.index")
}

/// Scan `dir` for segment files and return their base offsets, ascending.
///
/// Every segment contributes two files with the same decimal stem, so the
/// result is deduplicated. Files that don't parse as a segment are ignored.
pub(crate) fn list_base_offsets(dir: &Path) -> Vec<Offset> {
    let mut bases: Vec<Offset> = std::fs::read_dir(dir)
        .ok()
        .into_iter()
        .flatten()
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let name = entry.file_name().into_string().ok()?;
            let stem = name
                .strip_suffix(".store")
                .or_else(|| name.strip_suffix(".index"))?;
            stem.parse().ok()
        })
        .collect();

    bases.sort_unstable();
    bases.dedup();
    bases
}

/// One store plus one index, covering the half-open absolute offset range
/// `[base_offset, next_offset)`.
#[derive(Debug)]
pub(crate) struct Segment {
    store: Arc<Store>,
    index: Index,
    store_path: PathBuf,
    index_path: PathBuf,
    base_offset: Offset,
    next_offset: Offset,
    config: SegmentConfig,
}

impl Segment {
    /// Open (or create) the segment rooted at `base_offset` inside `dir`.
    ///
    /// A non-empty index determines `next_offset` from its last stored
    /// relative offset; an empty one starts at the base.
    pub(crate) fn open(dir: &Path, base_offset: Offset, config: &SegmentConfig) -> Result<Self> {
        let store_path = dir.join(store_filename(base_offset));
        let index_path = dir.join(index_filename(base_offset));

        let store = Arc::new(Store::open(&store_path)?);
        let index = Index::open(&index_path, config.max_index_bytes)?;

        let next_offset = match index.read(-1) {
            Ok((rel, _)) => base_offset + rel as Offset + 1,
            Err(LogError::EndOfIndex) => base_offset,
            Err(e) => return Err(e),
        };

        Ok(Self {
            store,
            index,
            store_path,
            index_path,
            base_offset,
            next_offset,
            config: config.clone(),
        })
    }

    /// Append a record, stamping it with the next absolute offset.
    ///
    /// The index is checked for room before anything hits the store, so a
    /// full index rejects the append without leaving unreferenced store
    /// bytes behind.
    pub(crate) fn append(&mut self, mut record: Record) -> Result<Offset> {
        if self.index.is_full() {
            return Err(LogError::IndexFull);
        }

        let cur = self.next_offset;
        record.offset = cur;

        let payload = bincode::encode_to_vec(&record, bincode::config::standard())?;
        let (_, pos) = self.store.append(&payload)?;
        self.index.write((cur - self.base_offset) as u32, pos)?;

        self.next_offset += 1;
        Ok(cur)
    }

    /// Read the record stored at an absolute offset within this segment.
    pub(crate) fn read(&self, offset: Offset) -> Result<Record> {
        let rel = (offset - self.base_offset) as i64;
        let (_, pos) = self.index.read(rel).map_err(|e| match e {
            LogError::EndOfIndex => LogError::OffsetOutOfRange { offset },
            other => other,
        })?;

        let payload = self.store.read(pos)?;
        let (record, _) = bincode::decode_from_slice(&payload, bincode::config::standard())?;
        Ok(record)
    }

    /// Whether `offset` falls inside `[base_offset, next_offset)`.
    pub(crate) fn contains(&self, offset: Offset) -> bool {
        self.base_offset <= offset && offset < self.next_offset
    }

    pub(crate) fn is_full(&self) -> bool {
        self.store.size() >= self.config.max_store_bytes
            || self.index.size() >= self.config.max_index_bytes
    }

    pub(crate) fn base_offset(&self) -> Offset {
        self.base_offset
    }

    pub(crate) fn next_offset(&self) -> Offset {
        self.next_offset
    }

    pub(crate) fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Close index then store. The index goes first: its close performs the
    /// truncation that defines the segment's reopened length.
    pub(crate) fn close(self) -> Result<()> {
        let Segment { store, index, .. } = self;
        index.close()?;
        store.close()?;
        Ok(())
    }

    /// Close the segment and delete both of its files.
    pub(crate) fn remove(self) -> Result<()> {
        let store_path = self.store_path.clone();
        let index_path = self.index_path.clone();

        self.close()?;
        std::fs::remove_file(index_path)?;
        std::fs::remove_file(store_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ENT_WIDTH;

    fn test_config(max_store_bytes: u64, max_index_bytes: u64) -> SegmentConfig {
        SegmentConfig {
            max_store_bytes,
            max_index_bytes,
            initial_offset: 0,
        }
    }

    #[test]
    fn append_read_and_index_full() {
        let dir = tempfile::tempdir().unwrap();
        let record = Record::new(b"Hello World!".to_vec());

        // Room for exactly three index entries.
        let config = test_config(1024, ENT_WIDTH * 3);
        let base_offset = 16;

        let mut segment = Segment::open(dir.path(), base_offset, &config).unwrap();
        assert_eq!(segment.next_offset(), base_offset);
        assert!(!segment.is_full());

        for i in 0..3 {
            let off = segment.append(record.clone()).unwrap();
            assert_eq!(off, base_offset + i);

            let got = segment.read(off).unwrap();
            assert_eq!(got.value, record.value);
            assert_eq!(got.offset, off);
        }

        // The index is out of space; the store stays untouched.
        let store_size = segment.store().size();
        assert!(matches!(
            segment.append(record.clone()),
            Err(LogError::IndexFull)
        ));
        assert_eq!(segment.store().size(), store_size);
        assert!(segment.is_full());
    }

    #[test]
    fn reopen_resumes_next_offset() {
        let dir = tempfile::tempdir().unwrap();
        let record = Record::new(b"Hello World!".to_vec());
        let config = test_config(1024, 1024);

        let mut segment = Segment::open(dir.path(), 16, &config).unwrap();
        for _ in 0..3 {
            segment.append(record.clone()).unwrap();
        }
        segment.close().unwrap();

        let segment = Segment::open(dir.path(), 16, &config).unwrap();
        assert_eq!(segment.next_offset(), 19);
        assert_eq!(segment.read(18).unwrap().value, record.value);
    }

    #[test]
    fn full_by_store_size_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let record = Record::new(b"Hello World!".to_vec());

        let mut segment = Segment::open(dir.path(), 16, &test_config(1024, 1024)).unwrap();
        for _ in 0..3 {
            segment.append(record.clone()).unwrap();
        }
        segment.close().unwrap();

        // Reload with a store limit smaller than what's already written.
        let config = test_config((record.value.len() * 3) as u64, 1024);
        let segment = Segment::open(dir.path(), 16, &config).unwrap();
        assert!(segment.is_full());

        segment.remove().unwrap();
        let segment = Segment::open(dir.path(), 16, &config).unwrap();
        assert!(!segment.is_full());
        assert_eq!(segment.next_offset(), 16);
    }

    #[test]
    fn read_past_tail_is_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut segment = Segment::open(dir.path(), 0, &test_config(1024, 1024)).unwrap();
        segment.append(Record::new(b"Hello World!".to_vec())).unwrap();

        assert!(matches!(
            segment.read(1),
            Err(LogError::OffsetOutOfRange { offset: 1 })
        ));
    }
}
