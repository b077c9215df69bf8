//! Core traits defined in `cloudnest-core` and implemented by other crates.

pub mod storage;

pub use storage::{BlobStat, ByteStream, StorageProvider};
