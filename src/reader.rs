use std::collections::VecDeque;
use std::io::Read;
use std::sync::Arc;

use tokio::sync::watch;

use crate::log::Log;
use crate::store::Store;
use crate::types::{Offset, Record, RecordConsumer, Result};

/// Byte stream over the whole log: the concatenation of every store in
/// offset order, each read from position 0.
///
/// Reads block on the underlying positioned reads and flush each store's
/// write buffer on the way, so the stream always reflects what has been
/// appended so far. Holding a `LogReader` does not pin the log's lock;
/// stores stay readable through their shared handles even if the log
/// truncates them away mid-stream.
pub struct LogReader {
    sources: VecDeque<StoreReader>,
}

/// Stateful cursor over a single store. The cursor advances by the number
/// of bytes each positioned read returns.
struct StoreReader {
    store: Arc<Store>,
    off: u64,
}

impl LogReader {
    pub(crate) fn new(stores: Vec<Arc<Store>>) -> Self {
        Self {
            sources: stores
                .into_iter()
                .map(|store| StoreReader { store, off: 0 })
                .collect(),
        }
    }
}

impl Read for LogReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            let Some(src) = self.sources.front_mut() else {
                return Ok(0);
            };

            let n = src.store.read_at(buf, src.off)?;
            if n == 0 {
                // This store is drained; move on to the next one.
                self.sources.pop_front();
                continue;
            }

            src.off += n as u64;
            return Ok(n);
        }
    }
}

#[async_trait::async_trait]
impl RecordConsumer for Log {
    async fn consume(&self, offset: Offset) -> Result<Record> {
        self.read(offset).await
    }

    async fn offset_watcher(&self) -> watch::Receiver<Offset> {
        Log::offset_watcher(self)
    }
}
