//! The physical side of the namespace: blobs and the directory mirror.
//!
//! Paths handed to a [`StorageProvider`] are always relative to its root and
//! built by the namespace engine (`<username>/<folder path>/<file id>`).
//! Logical names never appear here.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;

use crate::result::AppResult;

/// Chunked blob content, as served to downloads and archive entries.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// What the store knows about one entry on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobStat {
    /// Length in bytes; zero for directories.
    pub len: u64,
    /// Modification time, when the platform reports one.
    pub modified_at: Option<DateTime<Utc>>,
    /// Set for directory-mirror entries.
    pub is_dir: bool,
}

/// Blob store backing the namespace.
///
/// Removal is idempotent: deleting a path that is already gone succeeds.
/// Every other operation on a missing path fails with `NotFound`.
#[async_trait]
pub trait StorageProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Whether the store root is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Open a blob for streaming.
    async fn read(&self, path: &str) -> AppResult<ByteStream>;

    /// Load a small blob whole.
    async fn read_bytes(&self, path: &str) -> AppResult<Bytes>;

    /// Write a blob, creating parent directories.
    async fn write(&self, path: &str, data: Bytes) -> AppResult<()>;

    async fn delete(&self, path: &str) -> AppResult<()>;

    /// Remove a directory with everything beneath it.
    async fn delete_dir(&self, path: &str) -> AppResult<()>;

    /// Move a blob or a whole directory. The target's parent is created.
    async fn rename(&self, from: &str, to: &str) -> AppResult<()>;

    async fn exists(&self, path: &str) -> AppResult<bool>;

    async fn stat(&self, path: &str) -> AppResult<BlobStat>;

    /// Create a directory and its missing parents.
    async fn create_dir(&self, path: &str) -> AppResult<()>;
}
