use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

/// Log-wide identifier of a record, assigned at append time and never reused.
pub type Offset = u64;

pub type Result<T> = std::result::Result<T, LogError>;

#[derive(Error, Debug)]
pub enum LogError {
    /// Read requested outside `[lowest, highest]`. Carries the offending offset.
    #[error("offset out of range: {offset}")]
    OffsetOutOfRange { offset: Offset },
    /// The segment's index has no room for another entry.
    #[error("index is full")]
    IndexFull,
    /// Relative offset past the index's last entry. Mapped to
    /// [`LogError::OffsetOutOfRange`] at the segment boundary.
    #[error("end of index")]
    EndOfIndex,
    #[error("log is closed")]
    Closed,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode record: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("failed to decode record: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

/// An opaque payload plus the absolute offset the log stamps on it before
/// serialization. Callers leave `offset` at 0 when producing.
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq, Eq, Default)]
pub struct Record {
    pub value: Vec<u8>,
    #[serde(default)]
    pub offset: Offset,
}

impl Record {
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self {
            value: value.into(),
            offset: 0,
        }
    }
}

/// The producing half of the boundary the network layer consumes.
#[async_trait::async_trait]
pub trait RecordProducer: Send + Sync {
    /// Append a record at the tail of the log and return its absolute offset.
    async fn produce(&self, record: Record) -> Result<Offset>;
}

/// The consuming half of the boundary the network layer consumes.
///
/// Streaming consumption is `consume` in a loop: read until the offset runs
/// past the highest, then block on the watcher for the next append.
#[async_trait::async_trait]
pub trait RecordConsumer: Send + Sync {
    /// Read the record stored at an absolute offset.
    async fn consume(&self, offset: Offset) -> Result<Record>;

    /// Subscribe to the highest offset. The receiver resolves whenever an
    /// append lands.
    async fn offset_watcher(&self) -> watch::Receiver<Offset>;
}
