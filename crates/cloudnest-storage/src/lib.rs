//! # cloudnest-storage
//!
//! The physical side of CloudNest: a local filesystem [`StorageProvider`]
//! implementation, the mapping from logical locations to on-disk paths
//! ([`layout`]), and the staging area where the upload collaborator leaves
//! completed blobs ([`staging`]).
//!
//! [`StorageProvider`]: cloudnest_core::traits::StorageProvider

pub mod layout;
pub mod providers;
pub mod staging;

pub use providers::local::LocalStorageProvider;
pub use staging::{StagedUpload, StagingArea};
