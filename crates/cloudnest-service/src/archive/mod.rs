//! Zip archives of folders and selections.

pub mod builder;
pub mod naming;

pub use builder::{Archive, ArchiveService, ArchiveSummary};
pub use naming::{archive_name, content_disposition};
