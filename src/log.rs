use std::path::{Path, PathBuf};

use log::{info, warn};
use tokio::sync::{RwLock, watch};

use crate::config::Config;
use crate::reader::LogReader;
use crate::segment::{self, Segment};
use crate::types::{LogError, Offset, Record, RecordProducer, Result};

/// The segmented commit log: an ordered list of segments with strictly
/// increasing base offsets, the last of which is the active one receiving
/// appends.
///
/// A single readers-writer lock coordinates everything: `append`,
/// `truncate`, `close`, `remove` and `reset` take it exclusively, reads and
/// offset queries take it shared. Appends are therefore totally ordered and
/// produce strictly increasing offsets with no gaps.
pub struct Log {
    dir: PathBuf,
    config: Config,
    segments: RwLock<Vec<Segment>>,
    highest_watch: watch::Sender<Offset>,
}

impl Log {
    /// Open the log rooted at `dir`, creating the directory if needed.
    ///
    /// Existing `<base>.store` / `<base>.index` pairs are discovered and
    /// rebuilt in base-offset order; an empty directory gets a first segment
    /// at the configured initial offset.
    pub fn open(dir: impl Into<PathBuf>, config: Config) -> Result<Self> {
        let dir = dir.into();
        let config = config.normalize();

        std::fs::create_dir_all(&dir)?;
        info!("opened log dir {dir:?}");

        let segments = Self::load_segments(&dir, &config)?;
        let highest = Self::highest_of(&segments);
        let (highest_watch, _) = watch::channel(highest);

        Ok(Self {
            dir,
            config,
            segments: RwLock::new(segments),
            highest_watch,
        })
    }

    /// Rebuild all segments found in `dir`. If one fails to open, every
    /// segment opened so far is closed before the error surfaces.
    fn load_segments(dir: &Path, config: &Config) -> Result<Vec<Segment>> {
        let mut segments = Vec::new();

        for base in segment::list_base_offsets(dir) {
            match Segment::open(dir, base, &config.segment) {
                Ok(seg) => segments.push(seg),
                Err(e) => {
                    for seg in segments.drain(..) {
                        if let Err(close_err) = seg.close() {
                            warn!("failed to close segment while unwinding open: {close_err}");
                        }
                    }
                    return Err(e);
                }
            }
        }

        if segments.is_empty() {
            segments.push(Segment::open(
                dir,
                config.segment.initial_offset,
                &config.segment,
            )?);
        }

        Ok(segments)
    }

    /// Append a record to the active segment and return its absolute offset.
    ///
    /// When the active segment comes back full, a fresh segment based at
    /// `offset + 1` takes over as the tail.
    pub async fn append(&self, record: Record) -> Result<Offset> {
        let mut segments = self.segments.write().await;
        let active = segments.last_mut().ok_or(LogError::Closed)?;

        let offset = active.append(record)?;

        if active.is_full() {
            info!(
                "segment at base {} is full, rotating to base {}",
                active.base_offset(),
                offset + 1
            );
            let next = Segment::open(&self.dir, offset + 1, &self.config.segment)?;
            segments.push(next);
        }

        let _ = self.highest_watch.send(offset);
        Ok(offset)
    }

    /// Read the record at an absolute offset.
    pub async fn read(&self, offset: Offset) -> Result<Record> {
        let segments = self.segments.read().await;
        let segment = segments
            .iter()
            .find(|s| s.contains(offset))
            .ok_or(LogError::OffsetOutOfRange { offset })?;

        segment.read(offset)
    }

    /// Base offset of the first segment, or 0 on a closed log.
    pub async fn lowest_offset(&self) -> Offset {
        let segments = self.segments.read().await;
        segments.first().map(Segment::base_offset).unwrap_or(0)
    }

    /// Offset of the most recently appended record, or 0 when nothing has
    /// ever been appended.
    pub async fn highest_offset(&self) -> Offset {
        let segments = self.segments.read().await;
        Self::highest_of(&segments)
    }

    fn highest_of(segments: &[Segment]) -> Offset {
        match segments.last().map(Segment::next_offset).unwrap_or(0) {
            0 => 0,
            next => next - 1,
        }
    }

    /// Discard every record with an absolute offset strictly below `lowest`.
    ///
    /// A segment is removed when its highest contained offset is at most
    /// `lowest`; the segment containing `lowest` itself is kept.
    pub async fn truncate(&self, lowest: Offset) -> Result<()> {
        let mut segments = self.segments.write().await;

        let mut kept = Vec::new();
        let mut iter = std::mem::take(&mut *segments).into_iter();
        while let Some(seg) = iter.next() {
            if seg.next_offset() <= lowest + 1 {
                let base = seg.base_offset();
                if let Err(e) = seg.remove() {
                    // Keep the log usable: put the unexamined tail back.
                    kept.extend(iter);
                    *segments = kept;
                    return Err(e);
                }
                info!("truncated segment at base {base}");
            } else {
                kept.push(seg);
            }
        }
        *segments = kept;

        Ok(())
    }

    /// A chained byte stream over every store in offset order, starting at
    /// position 0 of the first one. Used for snapshots and replication.
    pub async fn reader(&self) -> LogReader {
        let segments = self.segments.read().await;
        LogReader::new(segments.iter().map(|s| s.store().clone()).collect())
    }

    /// Subscribe to the highest offset. The receiver resolves whenever an
    /// append lands; consumers block on it to stream past the tail.
    pub fn offset_watcher(&self) -> watch::Receiver<Offset> {
        self.highest_watch.subscribe()
    }

    /// Close every segment. Each close syncs and trims its index and flushes
    /// its store.
    pub async fn close(&self) -> Result<()> {
        let mut segments = self.segments.write().await;
        Self::close_segments(&mut segments)
    }

    fn close_segments(segments: &mut Vec<Segment>) -> Result<()> {
        let mut first_err = None;

        for seg in segments.drain(..) {
            if let Err(e) = seg.close() {
                warn!("failed to close segment: {e}");
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Close the log and delete its directory.
    pub async fn remove(&self) -> Result<()> {
        let mut segments = self.segments.write().await;
        Self::close_segments(&mut segments)?;

        std::fs::remove_dir_all(&self.dir)?;
        info!("removed log dir {:?}", self.dir);
        Ok(())
    }

    /// Remove the log and reopen it fresh at the configured initial offset.
    pub async fn reset(&self) -> Result<()> {
        let mut segments = self.segments.write().await;
        Self::close_segments(&mut segments)?;

        std::fs::remove_dir_all(&self.dir)?;
        std::fs::create_dir_all(&self.dir)?;

        *segments = Self::load_segments(&self.dir, &self.config)?;
        let _ = self.highest_watch.send(Self::highest_of(&segments));
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn segment_count(&self) -> usize {
        self.segments.read().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn first_next_offset(&self) -> Offset {
        self.segments.read().await[0].next_offset()
    }
}

#[async_trait::async_trait]
impl RecordProducer for Log {
    async fn produce(&self, record: Record) -> Result<Offset> {
        self.append(record).await
    }
}
