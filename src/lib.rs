//! A file-backed, segmented append-only commit log.
//!
//! [`Log`] stores opaque records on disk as a sequence of segments, each a
//! `<base>.store` / `<base>.index` file pair named after the absolute offset
//! of its first record. Every record is assigned a monotonically increasing
//! **absolute offset** and can be read back by it.
//!
//! # Features
//!
//! - **Segmented** – when the active segment's store or index reaches its
//!   configured limit, a new segment takes over as the tail (rotation).
//! - **Indexed** – each segment keeps a memory-mapped, fixed-width index
//!   mapping relative offsets to byte positions, so reads are two positioned
//!   I/O operations.
//! - **Recoverable** – reopening a directory rediscovers its segments and
//!   resumes offsets where the previous process left off.
//! - **Reclaimable** – [`Log::truncate`] drops whole segments from the front
//!   once their records are no longer needed.
//! - **Offset watchers** – consumers subscribe to the highest offset via
//!   [`tokio::sync::watch`] channels and block until the next append.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use seglog::{Config, Log, Record};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1. Open (or reopen) the log. Segment limits default to 1 KiB each.
//!     let log = Log::open("./log_data", Config::default())?;
//!
//!     // 2. Append a record – returns its absolute offset.
//!     let offset = log.append(Record::new(b"hello".to_vec())).await?;
//!
//!     // 3. Read it back by offset.
//!     let record = log.read(offset).await?;
//!     assert_eq!(record.value, b"hello");
//!
//!     // 4. Watch for new offsets if needed (e.g. for streaming consumers).
//!     let mut watcher = log.offset_watcher();
//!     // watcher.changed().await resolves when the next record is appended.
//!
//!     // 5. Reclaim everything below an offset once it is safe to drop.
//!     log.truncate(offset).await?;
//!
//!     // 6. Flush and trim everything on the way out.
//!     log.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Recovery
//!
//! To resume after a restart, call [`Log::open`] on the same directory with
//! the same configuration. The log scans for `<base>.store`/`<base>.index`
//! pairs, rebuilds each segment, and continues appending after the highest
//! recovered offset. The index files' on-disk length is what encodes their
//! entry count, which is why closing the log matters: it trims each index
//! from its pre-sized, memory-mapped length back to the bytes actually used.


mod config;
mod index;
mod log;
mod reader;
mod segment;
#[cfg(feature = "http-server")]
pub mod server;
mod store;
mod types;

pub use crate::config::{Config, SegmentConfig};
pub use crate::log::Log;
pub use crate::reader::LogReader;
pub use crate::types::*;
