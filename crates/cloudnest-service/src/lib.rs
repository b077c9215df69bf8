//! # cloudnest-service
//!
//! The namespace engine and the services layered on top of it. Every
//! mutation follows the same discipline: do the metadata work in one
//! transaction, commit, then touch the physical store. When the physical
//! step fails, the recorded [`saga::Saga`] reverses the committed metadata.
//!
//! Services follow constructor injection; all dependencies are provided
//! at construction time via `Arc` references.

pub mod archive;
pub mod context;
pub mod namespace;
pub mod request;
pub mod saga;
pub mod share;
pub mod user;

pub use archive::{Archive, ArchiveService, ArchiveSummary};
pub use context::RequestContext;
pub use namespace::{FileDownload, NamespaceService, PurgeReport};
pub use saga::{Compensation, Placement, Saga};
pub use share::{ShareOutcome, ShareService, SharedSpaceService};
pub use user::UserService;
